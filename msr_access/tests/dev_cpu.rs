// The msr driver is emulated with regular files: positional reads and writes
// at the register offset behave the same way on them.

use std::fs;
use std::path::Path;

use msr_access::{Access, DevCpuMsr, Error, ErrorKind, MsrDevice};

const MSR: u64 = 0x1a4;

fn add_core(root: &Path, cpu: u8, value: u64) {
    let dir = root.join(cpu.to_string());
    fs::create_dir_all(&dir).unwrap();
    let mut contents = vec![0u8; MSR as usize];
    contents.extend_from_slice(&value.to_ne_bytes());
    fs::write(dir.join("msr"), contents).unwrap();
}

#[test]
fn read_write_round_trip() {
    let root = tempfile::tempdir().unwrap();
    add_core(root.path(), 0, 0x1234_5678_9abc_def0);
    let dev = DevCpuMsr::new(root.path());

    assert_eq!(dev.read(0, MSR).unwrap(), 0x1234_5678_9abc_def0);
    dev.write(0, MSR, 0x1234_5678_9abc_deff).unwrap();
    assert_eq!(dev.read(0, MSR).unwrap(), 0x1234_5678_9abc_deff);

    // Nothing outside the register moved.
    let raw = fs::read(dev.path(0)).unwrap();
    assert_eq!(raw.len(), MSR as usize + 8);
    assert!(raw[..MSR as usize].iter().all(|b| *b == 0));
}

#[test]
fn probe_does_not_need_the_register() {
    let root = tempfile::tempdir().unwrap();
    add_core(root.path(), 2, 0);
    let dev = DevCpuMsr::new(root.path());

    assert!(dev.exists(2));
    assert!(!dev.exists(0));
    assert!(!dev.exists(3));
}

#[test]
fn missing_core_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let dev = DevCpuMsr::new(root.path());

    assert!(matches!(dev.read(4, MSR), Err(Error::CoreNotFound { cpu: 4 })));
    let err = dev.write(4, MSR, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CoreNotFound);
    assert_eq!(err.kind().exit_code(), 2);
}

#[test]
fn truncated_channel_is_a_short_read() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("1");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("msr"), vec![0u8; MSR as usize + 3]).unwrap();
    let dev = DevCpuMsr::new(root.path());

    match dev.read(1, MSR) {
        Err(Error::ShortTransfer {
            cpu: 1,
            access: Access::Read,
            size: 3,
        }) => {}
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn channel_that_is_a_directory_is_unexpected() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("0").join("msr")).unwrap();
    let dev = DevCpuMsr::new(root.path());

    // EISDIR on open for write.
    let err = dev.write(0, MSR, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unexpected);
    assert_eq!(err.kind().exit_code(), 127);
}
