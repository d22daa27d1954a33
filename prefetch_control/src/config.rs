//! Runtime settings, read once from the environment.

use std::ffi::OsString;
use std::path::PathBuf;

use log::LevelFilter;
use msr_access::DEFAULT_MSR_ROOT;

pub const MSR_ROOT_VAR: &str = "PREFETCH_CONTROL_MSR_ROOT";
pub const LOG_VAR: &str = "PREFETCH_CONTROL_LOG";
pub const NO_COLOR_VAR: &str = "NO_COLOR";

pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `<core>/msr`.
    pub msr_root: PathBuf,
    pub log_level: LevelFilter,
    /// Color is still only used on terminals.
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            msr_root: PathBuf::from(DEFAULT_MSR_ROOT),
            log_level: DEFAULT_LOG_LEVEL,
            color: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut config = Config::default();
        if let Some(root) = lookup(MSR_ROOT_VAR).filter(|r| !r.is_empty()) {
            config.msr_root = PathBuf::from(root);
        }
        if let Some(level) = lookup(LOG_VAR) {
            config.log_level = level
                .to_str()
                .and_then(|l| l.trim().parse().ok())
                .unwrap_or(DEFAULT_LOG_LEVEL);
        }
        // Any non-empty value counts, see no-color.org.
        config.color = lookup(NO_COLOR_VAR).map_or(true, |v| v.is_empty());
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    fn config_raw(vars: &[(&str, &[u8])]) -> Config {
        let vars: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), OsStr::from_bytes(v).to_owned()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: Vec<(&str, &[u8])> = vars.iter().map(|(k, v)| (*k, v.as_bytes())).collect();
        config_raw(&vars)
    }

    #[test]
    fn defaults() {
        let c = config(&[]);
        assert_eq!(c, Config::default());
        assert_eq!(c.msr_root, PathBuf::from("/dev/cpu"));
        assert_eq!(c.log_level, LevelFilter::Warn);
        assert!(c.color);
    }

    #[test]
    fn overrides() {
        let c = config(&[
            (MSR_ROOT_VAR, "/tmp/fake"),
            (LOG_VAR, "debug"),
            (NO_COLOR_VAR, "1"),
        ]);
        assert_eq!(c.msr_root, PathBuf::from("/tmp/fake"));
        assert_eq!(c.log_level, LevelFilter::Debug);
        assert!(!c.color);
    }

    #[test]
    fn bad_values_fall_back() {
        let c = config(&[(MSR_ROOT_VAR, ""), (LOG_VAR, "loud"), (NO_COLOR_VAR, "")]);
        assert_eq!(c.msr_root, PathBuf::from("/dev/cpu"));
        assert_eq!(c.log_level, DEFAULT_LOG_LEVEL);
        assert!(c.color);
    }

    #[test]
    fn non_utf8_root_is_kept() {
        let c = config_raw(&[
            (MSR_ROOT_VAR, &b"/tmp/fake-\xff"[..]),
            (LOG_VAR, &b"\xfe"[..]),
        ]);
        assert_eq!(c.msr_root, PathBuf::from(OsStr::from_bytes(b"/tmp/fake-\xff")));
        assert_ne!(c.msr_root, PathBuf::from("/dev/cpu"));
        assert_eq!(c.log_level, DEFAULT_LOG_LEVEL);
    }
}
