use std::io::{self, IsTerminal, Write};
use std::process;

use log::{debug, warn};
use msr_access::DevCpuMsr;
use prefetch_control::cli::{self, Command};
use prefetch_control::config::Config;
use prefetch_control::report::{format_error, format_report, Palette};
use prefetch_control::{logger, Controller, FailFast};

/// A closed pipe on stdout ends the output quietly, like SIGPIPE would.
fn output_status(result: io::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("stdout closed: {}", e);
            0
        }
        Err(e) => {
            eprintln!("Failed to write output: {}", e);
            127
        }
    }
}

fn run() -> i32 {
    let config = Config::from_env();
    if let Err(e) = logger::init(config.log_level) {
        eprintln!("Failed to install logger: {}", e);
    }
    let out = Palette::new(config.color && io::stdout().is_terminal());
    let err = Palette::new(config.color && io::stderr().is_terminal());

    let command = match cli::parse(std::env::args_os().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            if e.is_usage() {
                eprintln!("{}: {}", cli::PROGRAM, e);
                eprintln!("Use -h or --help to see usage information");
            } else {
                eprintln!("{} {}", err.error_tag(), e);
            }
            return e.exit_code();
        }
    };

    let mut stdout = io::stdout().lock();
    let (selection, operation) = match command {
        Command::Help => return output_status(write!(stdout, "{}", cli::usage())),
        Command::Version => return output_status(writeln!(stdout, "{}", cli::version())),
        Command::Run {
            selection,
            operation,
        } => (selection, operation),
    };

    // Once stdout fails the remaining cores are still processed, only their
    // lines are dropped.
    let mut written = Ok(());
    let controller = Controller::new(DevCpuMsr::new(&config.msr_root));
    let result = controller.run(selection, operation, &mut FailFast, |report| {
        if written.is_ok() {
            written = writeln!(stdout, "{}", format_report(report, &out)).and_then(|()| stdout.flush());
        }
    });
    let status = output_status(written);

    match result {
        Ok(summary) => {
            if summary.reported == 0 {
                warn!(
                    "no MSR channel found under {}, is the msr module loaded ?",
                    config.msr_root.display()
                );
            }
            status
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, &err));
            e.kind().exit_code()
        }
    }
}

fn main() {
    process::exit(run());
}
