use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;

use log::{debug, trace};
use nix::errno::Errno;
use nix::unistd::{access, AccessFlags};

use crate::{Access, CoreId, Error, MsrDevice, MSR_WIDTH};

pub const DEFAULT_MSR_ROOT: &str = "/dev/cpu";

/// The `msr` driver's device tree, `<root>/<core>/msr`.
#[derive(Debug, Clone)]
pub struct DevCpuMsr {
    root: PathBuf,
}

impl Default for DevCpuMsr {
    fn default() -> Self {
        Self::new(DEFAULT_MSR_ROOT)
    }
}

impl DevCpuMsr {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DevCpuMsr { root: root.into() }
    }

    pub fn path(&self, cpu: CoreId) -> PathBuf {
        self.root.join(cpu.to_string()).join("msr")
    }

    fn open(&self, cpu: CoreId, mode: Access) -> Result<File, Error> {
        let path = self.path(cpu);
        debug!("opening {} for {}", path.display(), mode);
        let mut options = OpenOptions::new();
        match mode {
            Access::Read => options.read(true),
            Access::Write => options.write(true),
        };
        options.open(&path).map_err(|e| open_error(cpu, mode, e))
    }
}

impl MsrDevice for DevCpuMsr {
    fn exists(&self, cpu: CoreId) -> bool {
        let present = access(self.path(cpu).as_path(), AccessFlags::F_OK).is_ok();
        trace!("probe cpu {}: {}", cpu, if present { "present" } else { "absent" });
        present
    }

    fn read(&self, cpu: CoreId, msr: u64) -> Result<u64, Error> {
        let file = self.open(cpu, Access::Read)?;
        let mut read_data = [0u8; MSR_WIDTH];
        let size = file
            .read_at(&mut read_data, msr)
            .map_err(|e| transfer_error(cpu, Access::Read, e))?;
        check_size(cpu, Access::Read, size)?;
        let value = u64::from_ne_bytes(read_data);
        debug!("cpu {} MSR {:#x} -> {:#x}", cpu, msr, value);
        Ok(value)
    }

    fn write(&self, cpu: CoreId, msr: u64, value: u64) -> Result<(), Error> {
        let file = self.open(cpu, Access::Write)?;
        debug!("cpu {} MSR {:#x} <- {:#x}", cpu, msr, value);
        let size = file
            .write_at(&value.to_ne_bytes(), msr)
            .map_err(|e| transfer_error(cpu, Access::Write, e))?;
        check_size(cpu, Access::Write, size)
    }
}

fn is_errno(e: &io::Error, errno: Errno) -> bool {
    e.raw_os_error() == Some(errno as i32)
}

// ENOENT: no node for this core. ENXIO: node present but the core is offline.
fn open_error(cpu: CoreId, access: Access, e: io::Error) -> Error {
    if is_errno(&e, Errno::ENXIO) || is_errno(&e, Errno::ENOENT) {
        Error::CoreNotFound { cpu }
    } else if is_errno(&e, Errno::EIO) {
        Error::Unsupported { cpu }
    } else {
        Error::Io {
            cpu,
            access,
            source: e,
        }
    }
}

fn transfer_error(cpu: CoreId, access: Access, e: io::Error) -> Error {
    if is_errno(&e, Errno::EIO) {
        Error::Rejected { cpu, access }
    } else {
        Error::Io {
            cpu,
            access,
            source: e,
        }
    }
}

fn check_size(cpu: CoreId, access: Access, size: usize) -> Result<(), Error> {
    if size == MSR_WIDTH {
        Ok(())
    } else {
        Err(Error::ShortTransfer { cpu, access, size })
    }
}
