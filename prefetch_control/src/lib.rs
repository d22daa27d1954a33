//! Toggle and inspect the hardware prefetchers of individual cores through
//! `MSR_MISC_FEATURE_CONTROL` (0x1A4).

pub mod cli;
pub mod config;
pub mod control;
pub mod field;
pub mod logger;
pub mod report;

pub use control::{
    Controller, CoreReport, CoreSelection, ErrorPolicy, FailFast, KeepGoing, Operation, Summary,
    MAX_CORE_NUM,
};
pub use field::{apply_disable, apply_enable, classify, PrefetchState};
