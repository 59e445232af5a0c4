//! Virtual-memory provider.
//!
//! Thin wrapper around the two kernel primitives the allocation core needs:
//! mapping a fresh anonymous, read-write span of whole pages, and unmapping
//! one. Nothing above this module is allowed to call `libc::mmap` or
//! `libc::munmap` directly.

use std::ffi::c_void;
use std::ptr;
use std::sync::OnceLock;

/// Failure modes the allocation core must react to. Never exposed past the
/// public pointer-returning API: a null return is the only signal a caller
/// of this crate ever sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AllocError {
  /// The kernel refused to grow the mapping (`mmap` returned `MAP_FAILED`).
  OutOfMemory,
  /// The kernel refused to release a mapping (`munmap` returned non-zero).
  Unmap,
}

fn page_size() -> usize {
  static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
  *PAGE_SIZE.get_or_init(|| unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize })
}

/// Rounds `bytes` up to the next whole multiple of the kernel's page size.
pub(crate) fn round_to_page(bytes: usize) -> usize {
  let page = page_size();
  (bytes + page - 1) & !(page - 1)
}

/// Maps a fresh anonymous read-write region of at least `bytes` bytes.
///
/// Returns the base address and the actual (page-rounded) size of the
/// mapping. The caller owns the entire span until it calls [`unmap`].
pub(crate) fn map(bytes: usize) -> Result<(*mut u8, usize), AllocError> {
  let size = round_to_page(bytes);

  let addr = unsafe {
    libc::mmap(
      ptr::null_mut(),
      size,
      libc::PROT_READ | libc::PROT_WRITE,
      libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
      -1,
      0,
    )
  };

  if addr == libc::MAP_FAILED {
    return Err(AllocError::OutOfMemory);
  }

  Ok((addr as *mut u8, size))
}

/// Releases the span `[base, base + bytes)` previously returned by [`map`].
pub(crate) fn unmap(base: *mut u8, bytes: usize) -> Result<(), AllocError> {
  let rc = unsafe { libc::munmap(base as *mut c_void, bytes) };

  if rc != 0 {
    return Err(AllocError::Unmap);
  }

  Ok(())
}
