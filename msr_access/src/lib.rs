//! Per-core model specific register access through the Linux `msr` driver.
//!
//! Each core exposes its registers as `/dev/cpu/<core>/msr`, where the file
//! offset selects the register and every transfer is exactly 8 bytes.

use std::fmt;

pub mod msr;

pub use msr::{DevCpuMsr, DEFAULT_MSR_ROOT};

/// A logical CPU number, as used in `/dev/cpu/<core>`.
pub type CoreId = u8;

/// Width in bytes of every register transfer.
pub const MSR_WIDTH: usize = core::mem::size_of::<u64>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    fn verb(self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "set",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("CPU {cpu} not found")]
    CoreNotFound { cpu: CoreId },
    #[error("CPU {cpu} doesn't support MSR")]
    Unsupported { cpu: CoreId },
    #[error("CPU {cpu} cannot {} MSR", .access.verb())]
    Rejected { cpu: CoreId, access: Access },
    #[error("CPU {cpu} MSR {access} transferred {size} of 8 bytes")]
    ShortTransfer {
        cpu: CoreId,
        access: Access,
        size: usize,
    },
    #[error("MSR {access} failed on CPU {cpu}: {source}")]
    Io {
        cpu: CoreId,
        access: Access,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of [`Error`], one per process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CoreNotFound,
    UnsupportedOperation,
    AccessFailure,
    Unexpected,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::CoreNotFound => 2,
            ErrorKind::UnsupportedOperation => 3,
            ErrorKind::AccessFailure => 4,
            ErrorKind::Unexpected => 127,
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::CoreNotFound { .. } => ErrorKind::CoreNotFound,
            Error::Unsupported { .. } => ErrorKind::UnsupportedOperation,
            Error::Rejected { .. } | Error::ShortTransfer { .. } => ErrorKind::AccessFailure,
            Error::Io { .. } => ErrorKind::Unexpected,
        }
    }

    pub fn cpu(&self) -> CoreId {
        match self {
            Error::CoreNotFound { cpu }
            | Error::Unsupported { cpu }
            | Error::Rejected { cpu, .. }
            | Error::ShortTransfer { cpu, .. }
            | Error::Io { cpu, .. } => *cpu,
        }
    }
}

/// Something that can reach the MSRs of individual cores.
///
/// Every call is an independent open/transfer/close cycle. Nothing is held
/// across calls, so a `read` followed by a `write` is not atomic: the kernel,
/// firmware or another process may change the register in between, and such
/// a change is silently overwritten.
pub trait MsrDevice {
    /// Cheap presence check of the core's channel, without opening it.
    fn exists(&self, cpu: CoreId) -> bool;

    fn read(&self, cpu: CoreId, msr: u64) -> Result<u64, Error>;

    fn write(&self, cpu: CoreId, msr: u64, value: u64) -> Result<(), Error>;
}

impl<D: MsrDevice + ?Sized> MsrDevice for &D {
    fn exists(&self, cpu: CoreId) -> bool {
        (**self).exists(cpu)
    }

    fn read(&self, cpu: CoreId, msr: u64) -> Result<u64, Error> {
        (**self).read(cpu, msr)
    }

    fn write(&self, cpu: CoreId, msr: u64, value: u64) -> Result<(), Error> {
        (**self).write(cpu, msr, value)
    }
}
