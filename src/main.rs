use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;
use log::info;

use chip8_vm::display::{MonoTermDisplay, Resolution};
use chip8_vm::input::TermInput;
use chip8_vm::{frontend, Config, Controller, Machine, Scheduler};

#[derive(Parser, Debug)]
#[command(version, about = "CHIP-8 virtual machine in the terminal")]
struct Args {
    /// program image to load at 0x200
    program: PathBuf,

    /// load the program but wait for `p` before running
    #[arg(long)]
    start_paused: bool,

    /// sprites wrap around the screen edges instead of clipping
    #[arg(long)]
    wrap: bool,

    /// instructions per second
    #[arg(long, default_value_t = 500)]
    clock_hz: u32,

    /// delay/sound timer rate
    #[arg(long, default_value_t = 60)]
    timer_hz: u32,

    /// screen refreshes per second
    #[arg(long, default_value_t = 60)]
    refresh_hz: u32,

    /// fixed seed for RND, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// write logs here instead of stderr, which the TUI owns
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init()?;
    Ok(())
}

/// Terminal set up, run and torn down; the terminal is restored on return.
fn run_ui(resolution: Resolution, controller: &Controller, refresh: Duration) -> io::Result<()> {
    let mut display = MonoTermDisplay::new(resolution)?;
    let mut input = TermInput::new()?;
    frontend::run(&mut display, &mut input, controller, refresh)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    if args.refresh_hz == 0 {
        return Err(anyhow!("--refresh-hz must be greater than zero"));
    }
    let config = Config {
        clock_hz: args.clock_hz,
        timer_hz: args.timer_hz,
        draw_wrap: args.wrap,
        seed: args.seed,
        ..Config::default()
    };
    let mut machine = Machine::new(config)?;

    let mut f = File::open(&args.program)
        .with_context(|| format!("failed to open {}", args.program.display()))?;
    machine
        .load_program(&mut f)
        .with_context(|| format!("failed to load {}", args.program.display()))?;

    let controller = Controller::new(&machine);
    if args.start_paused {
        controller.pause();
    }
    let resolution = Resolution::new(machine.config().width, machine.config().height);
    let cpu = Scheduler::new(machine, controller.clone()).spawn()?;

    let refresh = Duration::from_nanos(1_000_000_000 / args.refresh_hz as u64);
    let ui_result = run_ui(resolution, &controller, refresh);

    controller.stop();
    let machine = cpu
        .join()
        .map_err(|_| anyhow!("scheduler thread panicked"))?;
    ui_result?;
    info!("exited at pc 0x{:03x} after {} cycles", machine.pc(), machine.cycle());
    Ok(())
}
