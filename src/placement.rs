//! Placement policy.
//!
//! A pure function over the current block list and a requested span length:
//! it never mutates a header, it only picks one. The active variant is
//! chosen per call by the live configuration (see [`crate::config`]).

use crate::block::{BlockHeader, Iter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Algorithm {
  FirstFit,
  BestFit,
  WorstFit,
}

impl Algorithm {
  /// Parses the `ALLOCATOR_ALGORITHM` value, falling back to first-fit for
  /// anything unset or unrecognized.
  pub(crate) fn from_env_value(value: Option<&str>) -> Self {
    match value {
      Some("best_fit") => Algorithm::BestFit,
      Some("worst_fit") => Algorithm::WorstFit,
      _ => Algorithm::FirstFit,
    }
  }
}

/// Qualifies when the block can hand over `required` bytes: a free block
/// qualifies by total size, a partially-used block by trailing slack.
fn qualifies(block: &BlockHeader, required: usize) -> bool {
  if block.is_free() {
    block.size >= required
  } else {
    block.slack() >= required
  }
}

fn available(block: &BlockHeader) -> usize {
  if block.is_free() {
    block.size
  } else {
    block.slack()
  }
}

/// Scans the list rooted at `head` for a block able to satisfy `required`
/// bytes, under the given placement algorithm. Front-to-back traversal;
/// ties are broken by earliest-in-order for best-fit and worst-fit.
pub(crate) fn find(head: *mut BlockHeader, required: usize, algorithm: Algorithm) -> *mut BlockHeader {
  match algorithm {
    Algorithm::FirstFit => find_first_fit(head, required),
    Algorithm::BestFit => find_extreme_fit(head, required, |candidate, incumbent| candidate < incumbent),
    Algorithm::WorstFit => find_extreme_fit(head, required, |candidate, incumbent| candidate > incumbent),
  }
}

fn find_first_fit(head: *mut BlockHeader, required: usize) -> *mut BlockHeader {
  for block in Iter::new(head) {
    if qualifies(unsafe { &*block }, required) {
      return block;
    }
  }
  std::ptr::null_mut()
}

fn find_extreme_fit(
  head: *mut BlockHeader,
  required: usize,
  better: impl Fn(usize, usize) -> bool,
) -> *mut BlockHeader {
  let mut best: *mut BlockHeader = std::ptr::null_mut();
  let mut best_slack = 0usize;

  for block in Iter::new(head) {
    let header = unsafe { &*block };
    if !qualifies(header, required) {
      continue;
    }
    let slack = available(header);
    if best.is_null() || better(slack, best_slack) {
      best = block;
      best_slack = slack;
    }
  }

  best
}
