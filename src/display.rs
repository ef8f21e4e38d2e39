use crate::instruction::Instruction;
use crate::machine::Snapshot;
use crate::memory::MemoryMap;
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::{Constraint, Direction, Layout, Rect};
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::text::{Span, Spans};
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

/// Display is used to show the machine to the user. It only ever sees
/// snapshots, so it can't disturb the interpreter.
pub trait Display {
    fn draw(&mut self, snapshot: &Snapshot) -> Result<(), io::Error>;

    /// how big the display data should be
    fn get_display_size_bytes(&self) -> usize;
}

/// pixel dimensions of a monochrome, bit-packed screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: usize,
    pub height: usize,
}

impl Resolution {
    pub fn new(width: usize, height: usize) -> Self {
        Resolution { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn byte_count(&self) -> usize {
        self.pixel_count() / 8
    }

    pub fn bytes_per_row(&self) -> usize {
        self.width / 8
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.width - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.height - 1) as f64, 0.0]
    }

    /// canvas coordinates of every pixel in `data` matching `bitplane`
    fn bitplane_from_data<'a>(
        &self,
        data: &'a [u8],
        bitplane: u8,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let mut count = self.pixel_count().min(data.len() * 8);
        let w = self.width;
        std::iter::from_fn(move || {
            while count > 0 {
                count -= 1;
                let bit = 1 & (data[count / 8] >> (7 - count % 8));
                if bit == bitplane {
                    return Some((
                        (count % w) as f64,        // x
                        -1.0 * (count / w) as f64, // y
                    ));
                }
            }
            None
        })
    }
}

/// The machine's display memory: one bit per pixel, row-major, MSB is the
/// leftmost pixel of each byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    resolution: Resolution,
    bytes: Box<[u8]>,
}

impl MemoryMap for Framebuffer {
    fn bytes(&self) -> &[u8] {
        &self.bytes
    }
    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Framebuffer {
    pub fn new(resolution: Resolution) -> Self {
        Framebuffer {
            resolution,
            bytes: vec![0u8; resolution.byte_count()].into_boxed_slice(),
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn width(&self) -> usize {
        self.resolution.width
    }

    pub fn height(&self) -> usize {
        self.resolution.height
    }

    /// whether the pixel at (x, y) is lit; off-screen pixels are dark
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= self.width() || y >= self.height() {
            return false;
        }
        let idx = y * self.width() + x;
        self.bytes[idx / 8] & (0x80 >> (idx % 8)) != 0
    }
}

const MAIN_COLOUR: Color = Color::Cyan;
const TEXT_COLOUR: Color = Color::White;

/// monochrome display in a terminal, rendered using TUI and Crossterm, with a
/// debugger pane underneath
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new(resolution: Resolution) -> Result<MonoTermDisplay, io::Error> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution,
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, snapshot: &Snapshot) -> Result<(), io::Error> {
        // a snapshot from a differently-sized machine can't be drawn
        assert_eq!(
            snapshot.display.len(),
            self.resolution.byte_count(),
            "MonoTermDisplay must have correct-sized data to draw"
        );

        let resolution = self.resolution;
        let data = snapshot.display.as_slice();
        let registers = register_lines(snapshot);
        let stack = stack_lines(snapshot);
        let program = program_lines(snapshot);
        let status = status_lines(snapshot);

        // for now this assumes a 1:1 ratio between terminal cells and pixels
        self.terminal.draw(|f| {
            let screen = Rect::new(
                0,
                0,
                2 + resolution.width as u16,
                2 + resolution.height as u16,
            );
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &resolution.bitplane_from_data(data, 0).collect::<Vec<_>>(),
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &resolution.bitplane_from_data(data, 1).collect::<Vec<_>>(),
                        color: MAIN_COLOUR,
                    });
                });
            f.render_widget(canvas, screen.intersection(f.size()));

            let below = Rect::new(
                0,
                screen.height,
                f.size().width,
                f.size().height.saturating_sub(screen.height),
            );
            let panes = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Length(20),
                    Constraint::Length(22),
                    Constraint::Length(34),
                    Constraint::Min(0),
                ])
                .split(below);
            for ((title, lines), area) in [
                ("REGISTERS", &registers),
                ("STACK", &stack),
                ("PROGRAM", &program),
                ("MACHINE", &status),
            ]
            .into_iter()
            .zip(panes)
            {
                let text: Vec<Spans> = lines
                    .iter()
                    .map(|(line, highlight)| {
                        let colour = if *highlight { MAIN_COLOUR } else { TEXT_COLOUR };
                        Spans::from(Span::styled(line.clone(), Style::default().fg(colour)))
                    })
                    .collect();
                let pane =
                    Paragraph::new(text).block(Block::default().title(title).borders(Borders::ALL));
                f.render_widget(pane, area);
            }
        })?;
        Ok(())
    }

    fn get_display_size_bytes(&self) -> usize {
        self.resolution.byte_count()
    }
}

type Line = (String, bool);

fn register_lines(s: &Snapshot) -> Vec<Line> {
    let mut lines: Vec<Line> = s
        .registers
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("V{:X}    0x{:02x}", i, v), false))
        .collect();
    lines.push((format!("I     0x{:04x}", s.i), false));
    lines.push((format!("DELAY 0x{:02x}", s.delay_timer), false));
    lines.push((format!("SOUND 0x{:02x}", s.sound_timer), false));
    lines
}

fn stack_lines(s: &Snapshot) -> Vec<Line> {
    s.stack
        .iter()
        .enumerate()
        .map(|(i, addr)| {
            // the head is the last slot written, not the next free one
            let head = s.stack_pointer > 0 && i == s.stack_pointer - 1;
            let marker = if head { " <HEAD" } else { "" };
            (format!("0x{:x} 0x{:04x}{}", i, addr, marker), head)
        })
        .collect()
}

fn program_lines(s: &Snapshot) -> Vec<Line> {
    s.program
        .iter()
        .map(|&(addr, word)| {
            let current = addr == s.pc;
            let mnemonic = Instruction::decode(word)
                .map(|instruction| instruction.to_string())
                .unwrap_or_default();
            let marker = if current { " <PC" } else { "" };
            (
                format!("0x{:04x} {:04x} {}{}", addr, word, mnemonic, marker),
                current,
            )
        })
        .collect()
}

fn status_lines(s: &Snapshot) -> Vec<Line> {
    let next = match Instruction::decode(s.next_word) {
        Ok(instruction) => instruction.to_string(),
        Err(_) => "???".to_string(),
    };
    let keys: String = s
        .keys
        .iter()
        .enumerate()
        .map(|(k, &down)| if down { format!("{:X}", k) } else { ".".into() })
        .collect();
    let state = if s.paused {
        "PAUSED (p to resume)"
    } else if s.waiting_for_key {
        "WAITING FOR KEY"
    } else {
        "RUNNING"
    };
    vec![
        (format!("PC    0x{:04x} {:04x} {}", s.pc, s.next_word, next), true),
        (format!("CYCLE {}", s.cycle), false),
        (format!("KEYS  {}", keys), false),
        (state.to_string(), s.paused || s.waiting_for_key),
    ]
}

/// useful for testing non-display routines
pub struct DummyDisplay {
    resolution: Resolution,
    pub frames: Vec<Snapshot>,
}

impl DummyDisplay {
    pub fn new(resolution: Resolution) -> DummyDisplay {
        DummyDisplay {
            resolution,
            frames: Vec::new(),
        }
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, snapshot: &Snapshot) -> Result<(), io::Error> {
        self.frames.push(snapshot.clone());
        Ok(())
    }

    fn get_display_size_bytes(&self) -> usize {
        self.resolution.byte_count()
    }
}
