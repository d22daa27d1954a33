use core::ops::RangeInclusive;

use log::debug;
use msr_access::{CoreId, Error, MsrDevice};

use crate::field::{apply_disable, apply_enable, classify, PrefetchState, MSR_MISC_FEATURE_CONTROL};

/// Highest core number considered, both for `-c` and for "all cores".
pub const MAX_CORE_NUM: CoreId = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Enable,
    Disable,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreSelection {
    Single(CoreId),
    /// Every core up to [`MAX_CORE_NUM`] that has an MSR channel.
    All,
}

impl CoreSelection {
    fn candidates(self) -> RangeInclusive<CoreId> {
        match self {
            CoreSelection::Single(cpu) => cpu..=cpu,
            CoreSelection::All => 0..=MAX_CORE_NUM,
        }
    }
}

/// Outcome of one operation on one core. `value` is the last value read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreReport {
    pub cpu: CoreId,
    pub operation: Operation,
    pub value: u64,
}

impl CoreReport {
    pub fn state(&self) -> PrefetchState {
        classify(self.value)
    }
}

/// Decides what happens to the rest of the cores once one of them fails.
pub trait ErrorPolicy {
    /// Returning `Err` aborts the run with that error.
    fn on_error(&mut self, error: Error) -> Result<(), Error>;
}

/// Abort on the first failing core, abandoning the remaining ones.
#[derive(Debug, Default)]
pub struct FailFast;

impl ErrorPolicy for FailFast {
    fn on_error(&mut self, error: Error) -> Result<(), Error> {
        Err(error)
    }
}

/// Record failures and carry on with the next core.
#[derive(Debug, Default)]
pub struct KeepGoing {
    pub errors: Vec<Error>,
}

impl ErrorPolicy for KeepGoing {
    fn on_error(&mut self, error: Error) -> Result<(), Error> {
        debug!("continuing past {}", error);
        self.errors.push(error);
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub reported: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Controller<D> {
    device: D,
}

impl<D: MsrDevice> Controller<D> {
    pub fn new(device: D) -> Self {
        Controller { device }
    }

    fn set_field(&self, cpu: CoreId, update: fn(u64) -> u64) -> Result<u64, Error> {
        let value = self.device.read(cpu, MSR_MISC_FEATURE_CONTROL)?;
        self.device.write(cpu, MSR_MISC_FEATURE_CONTROL, update(value))?;
        self.device.read(cpu, MSR_MISC_FEATURE_CONTROL)
    }

    /// Runs `operation` on a single core.
    ///
    /// Enable and disable are read-modify-write sequences over separate
    /// opens of the channel. A concurrent writer of the same register between
    /// the read and the write loses its update.
    pub fn apply(&self, cpu: CoreId, operation: Operation) -> Result<CoreReport, Error> {
        let value = match operation {
            Operation::Enable => self.set_field(cpu, apply_enable)?,
            Operation::Disable => self.set_field(cpu, apply_disable)?,
            Operation::Status => self.device.read(cpu, MSR_MISC_FEATURE_CONTROL)?,
        };
        Ok(CoreReport {
            cpu,
            operation,
            value,
        })
    }

    /// Runs `operation` on every selected core in increasing order, handing
    /// each report to `sink` as soon as it is available.
    ///
    /// In [`CoreSelection::All`] mode, cores without a channel are skipped
    /// without being opened or reported. A single core is never probed, so a
    /// missing one surfaces as [`Error::CoreNotFound`].
    pub fn run<P, F>(
        &self,
        selection: CoreSelection,
        operation: Operation,
        policy: &mut P,
        mut sink: F,
    ) -> Result<Summary, Error>
    where
        P: ErrorPolicy + ?Sized,
        F: FnMut(&CoreReport),
    {
        let mut summary = Summary::default();
        for cpu in selection.candidates() {
            if selection == CoreSelection::All && !self.device.exists(cpu) {
                debug!("skipping cpu {}, no MSR channel", cpu);
                summary.skipped += 1;
                continue;
            }
            match self.apply(cpu, operation) {
                Ok(report) => {
                    sink(&report);
                    summary.reported += 1;
                }
                Err(error) => {
                    policy.on_error(error)?;
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }
}
