//! The prefetcher disable bits of `MSR_MISC_FEATURE_CONTROL`.
//!
//! Bits 0 to 3 each turn off one prefetcher (L2 streamer, L2 adjacent line,
//! DCU streamer, DCU IP) when set. The upper 60 bits belong to other features
//! and are always written back unchanged.

use core::fmt;

pub const MSR_MISC_FEATURE_CONTROL: u64 = 0x1a4;

pub const PREFETCH_FIELD_MASK: u64 = 0xf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchState {
    Enabled,
    Disabled,
    PartiallyEnabled,
}

impl fmt::Display for PrefetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrefetchState::Enabled => "Enabled",
            PrefetchState::Disabled => "Disabled",
            PrefetchState::PartiallyEnabled => "Partially enabled",
        })
    }
}

pub fn classify(value: u64) -> PrefetchState {
    match value & PREFETCH_FIELD_MASK {
        0 => PrefetchState::Enabled,
        PREFETCH_FIELD_MASK => PrefetchState::Disabled,
        _ => PrefetchState::PartiallyEnabled,
    }
}

pub fn apply_enable(value: u64) -> u64 {
    value & !PREFETCH_FIELD_MASK
}

pub fn apply_disable(value: u64) -> u64 {
    value | PREFETCH_FIELD_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [u64; 8] = [
        0,
        0xf,
        0x5,
        0xa,
        u64::MAX,
        0xffff_ffff_0000_0000,
        0x8000_0000_0000_0007,
        0x0123_4567_89ab_cdef,
    ];

    #[test]
    fn field_converges() {
        for v in SAMPLES {
            assert_eq!(apply_enable(apply_disable(v)) & 0xf, 0x0);
            assert_eq!(apply_disable(apply_enable(v)) & 0xf, 0xf);
            assert_eq!(apply_enable(apply_enable(v)), apply_enable(v));
            assert_eq!(apply_disable(apply_disable(v)), apply_disable(v));
        }
    }

    #[test]
    fn upper_bits_preserved() {
        for v in SAMPLES {
            assert_eq!(apply_enable(v) >> 4, v >> 4, "{:#x}", v);
            assert_eq!(apply_disable(v) >> 4, v >> 4, "{:#x}", v);
        }
        for bit in 4..64 {
            let v = 1u64 << bit;
            assert_eq!(apply_disable(v), v | 0xf);
            assert_eq!(apply_enable(v | 0x3), v);
        }
    }

    #[test]
    fn classification() {
        assert_eq!(classify(0x0), PrefetchState::Enabled);
        assert_eq!(classify(0xf), PrefetchState::Disabled);
        assert_eq!(classify(0x5), PrefetchState::PartiallyEnabled);
        assert_eq!(classify(0xffff_ffff_0000_0000), PrefetchState::Enabled);
        assert_eq!(classify(0xffff_ffff_ffff_fff0), PrefetchState::Enabled);
        assert_eq!(classify(0x10f), PrefetchState::Disabled);
        for partial in 1..0xf {
            assert_eq!(classify(partial), PrefetchState::PartiallyEnabled);
        }
    }

    #[test]
    fn state_names() {
        assert_eq!(PrefetchState::PartiallyEnabled.to_string(), "Partially enabled");
        assert_eq!(PrefetchState::Disabled.to_string(), "Disabled");
    }
}
