//! CHIP-8 CLI.

use std::{
    path::PathBuf,
    process,
    time::{Duration, Instant},
};

use argh::FromArgs;
use chip8_core::{
    debugger::{Debugger, DebuggerContext},
    emulator::{EmulationState, Emulator, EmulatorContext},
    errors::CResult,
    peripherals::{cartridge::Cartridge, memory::INITIAL_MEMORY_POINTER},
};

/// CHIP-8 emulator
#[derive(FromArgs)]
struct Args {
    /// subcommand
    #[argh(subcommand)]
    nested: SubCommands,
}

/// Subcommands
#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommands {
    Run(RunCommand),
    Disassemble(DisassembleCommand),
}

/// run a cartridge headlessly
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
struct RunCommand {
    /// cartridge path
    #[argh(positional)]
    file: PathBuf,

    /// trace each decoded instruction to a file, or `-` for stdout
    #[argh(option, short = 't')]
    trace: Option<String>,

    /// add a breakpoint at a hex address; repeatable
    #[argh(option, short = 'b')]
    breakpoint: Vec<String>,
}

/// disassemble a cartridge
#[derive(FromArgs)]
#[argh(subcommand, name = "disassemble")]
struct DisassembleCommand {
    /// cartridge path
    #[argh(positional)]
    file: PathBuf,

    /// output file (omit for stdout)
    #[argh(option, short = 'o')]
    output: Option<String>,
}

fn main() {
    let args: Args = argh::from_env();

    tracing_subscriber::fmt().compact().init();

    let result = match args.nested {
        SubCommands::Disassemble(cmd) => run_disassemble(cmd),
        SubCommands::Run(cmd) => run_cartridge(cmd),
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run_disassemble(cmd: DisassembleCommand) -> CResult {
    let cartridge = Cartridge::load_from_path(&cmd.file)?;
    cartridge.write_disassembly_to_file(cmd.output.as_deref().unwrap_or("-"))?;
    Ok(())
}

fn run_cartridge(cmd: RunCommand) -> CResult {
    let cartridge = Cartridge::load_from_path(&cmd.file)?;

    let mut emulator = Emulator::new();
    emulator.load_game(&cartridge);

    let mut emulator_ctx = EmulatorContext::new();
    emulator_ctx.prepare_tracefile(&cmd.trace);

    let mut debug_ctx = if cmd.breakpoint.is_empty() {
        None
    } else {
        let mut ctx = DebuggerContext::new();
        ctx.set_address(INITIAL_MEMORY_POINTER);
        ctx.is_continuing = true;

        for addr in &cmd.breakpoint {
            ctx.register_breakpoint_str(addr)?;
        }

        Some(ctx)
    };

    let debugger = Debugger::new();
    let mut last_instant = Instant::now();

    loop {
        let now = Instant::now();
        let elapsed = now.duration_since(last_instant);
        last_instant = now;

        let state = match &mut debug_ctx {
            Some(ctx) => debugger.step(&mut emulator, &mut emulator_ctx, ctx, elapsed),
            None => emulator.step(&mut emulator_ctx, elapsed),
        };

        match state {
            EmulationState::Normal | EmulationState::WaitForInput => {}
            EmulationState::Quit | EmulationState::Reset => break,
            EmulationState::Halted(err) => {
                eprintln!("halted: {}", err);
                process::exit(1);
            }
        }

        std::thread::sleep(Duration::from_micros(500));
    }

    Ok(())
}
