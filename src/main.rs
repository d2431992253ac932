use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use vm8085::output::Output;
use vm8085::{read_image, Debugger, DebuggerOptions, Engine, Inspector, Machine, State};

/// vm8085 runs a raw Intel 8085 program image, with a debugger attached while it runs.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Raw program image, loaded at address 0x0800
    program: PathBuf,
    /// Delay between instructions, in milliseconds
    delay: Option<u64>,
    /// Read debugger commands from argument, separated by `;` or newlines
    #[arg(short, long)]
    command: Option<String>,
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
    /// Log every instruction as it is executed
    #[arg(short, long)]
    trace: bool,
}

fn main() -> Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    vm8085::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().build())
    }))?;

    Output::set_minimal(args.minimal);

    if !args.minimal {
        file_message(Green, "Loading", &args.program);
    }
    let image = read_image(&args.program).into_diagnostic()?;
    let mut state = State::from_image(&image).into_diagnostic()?;
    if let Some(delay) = args.delay {
        state.set_throttle(Duration::from_millis(delay));
    }

    let machine = Machine::new(state);
    let trace = args.trace || vm8085::env::is_trace_enabled();
    let engine = Engine::new(machine.clone()).with_trace(trace);
    if !args.minimal {
        message(Green, "Running", &format!("{} bytes", image.len()));
        if args.command.is_none() {
            message(Cyan, "Help", "type `help` for debugger commands");
        }
    }
    let mut debugger = Debugger::new(
        DebuggerOptions {
            command: args.command,
        },
        Inspector::new(machine.clone()),
    );
    let engine = thread::spawn(move || engine.run());
    debugger.run();
    let Ok(status) = engine.join() else {
        bail!("Engine thread panicked");
    };

    Output::Normal.start_new_line();
    if !args.minimal {
        message(Green, "Finished", &format!("execution {}", status));
    }
    Output::Normal.print_state(&machine.snapshot());
    Ok(())
}

enum MsgColor {
    Green,
    Cyan,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
    };
    println!("{left:>12} {right}");
}
