//! Live configuration.
//!
//! Consulted on every call rather than cached, since the spec allows the
//! two knobs below to change between allocator calls within a process
//! (e.g. a test harness flipping `ALLOCATOR_SCRIBBLE` mid-run).

use crate::placement::Algorithm;

pub(crate) const ALGORITHM_VAR: &str = "ALLOCATOR_ALGORITHM";
pub(crate) const SCRIBBLE_VAR: &str = "ALLOCATOR_SCRIBBLE";

/// Sentinel byte written across freshly allocated payloads when scribbling
/// is enabled, to surface uninitialized-read bugs in callers.
pub(crate) const SCRIBBLE_BYTE: u8 = 0xAA;

pub(crate) fn algorithm() -> Algorithm {
  Algorithm::from_env_value(std::env::var(ALGORITHM_VAR).ok().as_deref())
}

pub(crate) fn scribble_enabled() -> bool {
  std::env::var(SCRIBBLE_VAR).as_deref() == Ok("1")
}
