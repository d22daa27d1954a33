//! getopt-style command line handling.
//!
//! Short flags may be bundled (`-ds`) and `-c` takes its value either attached
//! (`-c3`) or as the next argument. Long options accept `--core=3` and
//! `--core 3`, and any unambiguous prefix of a long name (`--stat`). Arguments are processed left to right, so a help request or an
//! error is acted upon as soon as it is seen.

use std::ffi::OsString;

use msr_access::CoreId;

use crate::control::{CoreSelection, Operation, MAX_CORE_NUM};

pub const PROGRAM: &str = "prefetch_control";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Version,
    Run {
        selection: CoreSelection,
        operation: Operation,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("Core number must be between 0 and {}", MAX_CORE_NUM)]
    InvalidCore(String),
    #[error("Please specify an operation (-d, -e, or -s)")]
    NoOperation,
    #[error("Please specify a CPU core number (-c) or use -a to operate on all cores")]
    NoTarget,
    #[error("unrecognized option '{0}'")]
    UnknownOption(String),
    #[error("option '{0}' requires an argument")]
    MissingValue(String),
    #[error("option '{0}' doesn't allow an argument")]
    UnexpectedValue(String),
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

impl ArgumentError {
    /// Malformed command lines get the usage hint rather than an `[ERROR]` tag.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            ArgumentError::UnknownOption(_)
                | ArgumentError::MissingValue(_)
                | ArgumentError::UnexpectedValue(_)
                | ArgumentError::UnexpectedArgument(_)
        )
    }

    pub fn exit_code(&self) -> i32 {
        1
    }
}

pub fn usage() -> String {
    format!(
        "Prefetch Control Tool - Enable or disable hardware prefetching on CPU cores

Usage:
  -c, --core NUM     Specify CPU core number to operate on (0-{max})
  -d, --disable      Disable prefetching on specified core(s)
  -e, --enable       Enable prefetching on specified core(s)
  -a, --all          Apply operation to all cores
  -s, --status       Show current prefetch status of specified core(s)
  -v, --version      Display version information
  -h, --help         Display this help information

Examples:
  Disable prefetch on core 0:    {p} -c 0 -d
  Enable prefetch on core 1:     {p} -c 1 -e
  Check status of core 2:        {p} -c 2 -s
  Disable prefetch on all cores: {p} -a -d
",
        max = MAX_CORE_NUM,
        p = PROGRAM
    )
}

pub fn version() -> String {
    format!("{} {}", PROGRAM, env!("CARGO_PKG_VERSION"))
}

fn parse_core(value: &str) -> Result<CoreId, ArgumentError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|core| (0..=MAX_CORE_NUM as i64).contains(core))
        .map(|core| core as CoreId)
        .ok_or_else(|| ArgumentError::InvalidCore(value.to_owned()))
}

#[derive(Default)]
struct Options {
    core: Option<CoreId>,
    all: bool,
    operation: Option<Operation>,
}

enum Flag {
    Core(String),
    Disable,
    Enable,
    All,
    Status,
    Help,
    Version,
}

impl Options {
    /// `Some` when the flag ends argument processing.
    fn apply(&mut self, flag: Flag) -> Result<Option<Command>, ArgumentError> {
        match flag {
            Flag::Core(value) => self.core = Some(parse_core(&value)?),
            Flag::Disable => self.operation = Some(Operation::Disable),
            Flag::Enable => self.operation = Some(Operation::Enable),
            Flag::Status => self.operation = Some(Operation::Status),
            Flag::All => self.all = true,
            Flag::Help => return Ok(Some(Command::Help)),
            Flag::Version => return Ok(Some(Command::Version)),
        }
        Ok(None)
    }

    fn finish(self) -> Result<Command, ArgumentError> {
        let operation = self.operation.ok_or(ArgumentError::NoOperation)?;
        let selection = match (self.all, self.core) {
            (true, _) => CoreSelection::All,
            (false, Some(core)) => CoreSelection::Single(core),
            (false, None) => return Err(ArgumentError::NoTarget),
        };
        Ok(Command::Run {
            selection,
            operation,
        })
    }
}

fn switch(name: &str) -> Option<Flag> {
    match name {
        "d" | "disable" => Some(Flag::Disable),
        "e" | "enable" => Some(Flag::Enable),
        "a" | "all" => Some(Flag::All),
        "s" | "status" => Some(Flag::Status),
        "h" | "help" => Some(Flag::Help),
        "v" | "version" => Some(Flag::Version),
        _ => None,
    }
}

const LONG_OPTIONS: [&str; 7] = ["core", "disable", "enable", "all", "status", "help", "version"];

/// Resolves an exact long option name or an unambiguous prefix of one.
fn long_option(prefix: &str) -> Option<&'static str> {
    if prefix.is_empty() {
        return None;
    }
    if let Some(exact) = LONG_OPTIONS.iter().find(|name| **name == prefix) {
        return Some(*exact);
    }
    let mut matches = LONG_OPTIONS.iter().filter(|name| name.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(name), None) => Some(*name),
        _ => None,
    }
}

// Core numbers and error messages only, where a lossy conversion is enough.
fn lossy(arg: OsString) -> String {
    arg.to_string_lossy().into_owned()
}

/// Parses the arguments, without the program name.
pub fn parse<I, S>(args: I) -> Result<Command, ArgumentError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut options = Options::default();

    while let Some(arg) = args.next() {
        let arg = match arg.into_string() {
            Ok(arg) => arg,
            Err(raw) => {
                let arg = lossy(raw);
                return Err(if arg.starts_with('-') {
                    ArgumentError::UnknownOption(arg)
                } else {
                    ArgumentError::UnexpectedArgument(arg)
                });
            }
        };
        if arg == "--" {
            if let Some(extra) = args.next() {
                return Err(ArgumentError::UnexpectedArgument(lossy(extra)));
            }
            break;
        } else if let Some(long) = arg.strip_prefix("--") {
            let (given, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value.to_owned())),
                None => (long, None),
            };
            let name =
                long_option(given).ok_or_else(|| ArgumentError::UnknownOption(arg.clone()))?;
            if name == "core" {
                let value = match inline {
                    Some(value) => value,
                    None => args
                        .next()
                        .map(lossy)
                        .ok_or_else(|| ArgumentError::MissingValue("--core".to_owned()))?,
                };
                options.apply(Flag::Core(value))?;
            } else {
                if inline.is_some() {
                    return Err(ArgumentError::UnexpectedValue(format!("--{}", name)));
                }
                if let Some(flag) = switch(name) {
                    if let Some(command) = options.apply(flag)? {
                        return Ok(command);
                    }
                }
            }
        } else if let Some(short) = arg.strip_prefix('-').filter(|s| !s.is_empty()) {
            for (i, c) in short.char_indices() {
                if c == 'c' {
                    let rest = &short[i + c.len_utf8()..];
                    let value = if rest.is_empty() {
                        args.next()
                            .map(lossy)
                            .ok_or_else(|| ArgumentError::MissingValue("-c".to_owned()))?
                    } else {
                        rest.to_owned()
                    };
                    options.apply(Flag::Core(value))?;
                    break;
                }
                let flag = switch(&c.to_string())
                    .ok_or_else(|| ArgumentError::UnknownOption(format!("-{}", c)))?;
                if let Some(command) = options.apply(flag)? {
                    return Ok(command);
                }
            }
        } else {
            return Err(ArgumentError::UnexpectedArgument(arg));
        }
    }

    options.finish()
}
