//! Formatting of the lines printed for reports and fatal errors.

use std::io::ErrorKind as IoErrorKind;

use msr_access::Error;

use crate::control::{CoreReport, Operation};
use crate::field::{PrefetchState, MSR_MISC_FEATURE_CONTROL};

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// ANSI coloring, or none at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub const PLAIN: Palette = Palette { color: false };
    pub const ANSI: Palette = Palette { color: true };

    pub fn new(color: bool) -> Self {
        Palette { color }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_owned()
        }
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    pub fn error_tag(&self) -> String {
        self.red("[ERROR]")
    }

    pub fn info_tag(&self) -> String {
        self.yellow("[INFO]")
    }

    fn state(&self, state: PrefetchState) -> String {
        let name = state.to_string();
        match state {
            PrefetchState::Enabled => self.green(&name),
            PrefetchState::Disabled => self.red(&name),
            PrefetchState::PartiallyEnabled => self.yellow(&name),
        }
    }
}

pub fn format_report(report: &CoreReport, palette: &Palette) -> String {
    let action = match report.operation {
        Operation::Enable => "enabled",
        Operation::Disable => "disabled",
        Operation::Status => {
            return format!(
                "CPU {} prefetch status: {} ({:#X} = {:x})",
                report.cpu,
                palette.state(report.state()),
                MSR_MISC_FEATURE_CONTROL,
                report.value
            )
        }
    };
    format!(
        "{} CPU {} prefetch {}. Current {:#X} register value: {:x}",
        palette.info_tag(),
        report.cpu,
        action,
        MSR_MISC_FEATURE_CONTROL,
        report.value
    )
}

pub fn format_error(error: &Error, palette: &Palette) -> String {
    match error {
        Error::Io { source, .. } if source.kind() == IoErrorKind::PermissionDenied => format!(
            "{} {}, are you running as root ?",
            palette.error_tag(),
            error
        ),
        _ => format!("{} {}", palette.error_tag(), error),
    }
}
