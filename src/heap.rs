//! Allocation core and serialization layer.
//!
//! `Heap` owns every piece of process-wide mutable state the spec calls
//! out: the block list root and the monotonic `alloc_id` counter. It lives
//! behind a single `Mutex` inside a lazily-initialized `OnceLock`, which is
//! the whole of the serialization layer — every public entry point below
//! acquires that lock before touching `Heap` and releases it on every exit
//! path, including early returns for null pointers and failed mappings.

use std::mem;
use std::ptr;
use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::align;
use crate::block::{self, BlockHeader};
use crate::config;
use crate::placement;
use crate::vmm::{self, AllocError};

/// Process-wide allocator state, reachable only through [`global`].
struct Heap {
  head: *mut BlockHeader,
  next_alloc_id: u64,
}

// `Heap` is only ever touched through `GLOBAL_HEAP`'s mutex, so the raw
// pointers it carries never cross threads without synchronization.
unsafe impl Send for Heap {}

impl Heap {
  const fn new() -> Self {
    Self { head: ptr::null_mut(), next_alloc_id: 0 }
  }

  fn next_id(&mut self) -> u64 {
    let id = self.next_alloc_id;
    self.next_alloc_id += 1;
    id
  }
}

fn global() -> &'static Mutex<Heap> {
  static GLOBAL_HEAP: OnceLock<Mutex<Heap>> = OnceLock::new();
  GLOBAL_HEAP.get_or_init(|| Mutex::new(Heap::new()))
}

fn lock() -> MutexGuard<'static, Heap> {
  global().lock().expect("heap lock poisoned by a prior panic mid-mutation")
}

/// Rounds `size` up to the next multiple of the platform word (8 bytes on
/// the 64-bit targets this crate supports).
fn round_payload(size: usize) -> usize {
  align!(size)
}

/// Grows the heap with a fresh region able to hold at least `required`
/// bytes (header included), appends it as a single free block, and returns
/// that block. Surfaces [`AllocError::OutOfMemory`] on kernel refusal.
fn grow(heap: &mut Heap, required: usize) -> Result<*mut BlockHeader, AllocError> {
  let (base, mapped_size) = vmm::map(required)?;
  let id = heap.next_id();
  let block = unsafe { block::append_region(&mut heap.head, base, mapped_size, id) };
  Ok(block)
}

/// Splits `donor`'s trailing slack into a fresh in-use block of span `need`,
/// or commits `need` in place if the donor was entirely free. Returns the
/// header that now owns the new allocation.
fn take(heap: &mut Heap, donor: *mut BlockHeader, need: usize) -> *mut BlockHeader {
  unsafe {
    if (*donor).is_free() {
      (*donor).name = [0u8; block::NAME_CAPACITY];
      (*donor).usage = need;
      return donor;
    }

    let new_header = (donor as *mut u8).add((*donor).usage) as *mut BlockHeader;
    let id = heap.next_id();
    ptr::write(
      new_header,
      BlockHeader {
        alloc_id: id,
        name: [0u8; block::NAME_CAPACITY],
        region_start: (*donor).region_start,
        region_size: (*donor).region_size,
        size: (*donor).size - (*donor).usage,
        usage: need,
        next: (*donor).next,
      },
    );

    (*donor).size = (*donor).usage;
    (*donor).next = new_header;

    new_header
  }
}

fn allocate_inner(heap: &mut Heap, payload_size: usize, name: Option<&str>) -> *mut u8 {
  let payload_size = round_payload(payload_size);
  let header_size = block::header_size();
  let needed = payload_size + header_size;

  let algorithm = config::algorithm();
  let mut candidate = placement::find(heap.head, needed, algorithm);

  if candidate.is_null() {
    match grow(heap, needed) {
      Ok(block) => candidate = block,
      Err(_) => return ptr::null_mut(),
    }
  }

  let header = take(heap, candidate, needed);

  unsafe {
    if let Some(label) = name {
      (*header).set_name(label);
    }

    let payload = (*header).payload();

    if config::scribble_enabled() {
      ptr::write_bytes(payload, config::SCRIBBLE_BYTE, payload_size);
    }

    payload
  }
}

/// Allocates `size` bytes, 8-byte aligned, with no label. A `size` of zero
/// is legal and yields a distinct address to the smallest possible block.
pub fn allocate(size: usize) -> *mut u8 {
  let mut heap = lock();
  allocate_inner(&mut heap, size, None)
}

/// As [`allocate`], but stores `name` on the block header (truncated to the
/// header's name capacity, NUL-terminated).
pub fn allocate_named(size: usize, name: &str) -> *mut u8 {
  let mut heap = lock();
  allocate_inner(&mut heap, size, Some(name))
}

/// Releases a pointer previously returned by this module. Null is a no-op.
///
/// # Safety
/// `ptr` must be null or a live payload base previously returned by this
/// module and not yet released. Any other value is undefined behavior.
pub unsafe fn release(ptr: *mut u8) {
  if ptr.is_null() {
    return;
  }

  let mut heap = lock();
  unsafe { release_inner(&mut heap, ptr) };
}

/// Debug-only plausibility check for a pointer recovered from a caller
/// address: a live header's own address must fall within the region it
/// claims to belong to. Passing `release`/`resize` a pointer that was never
/// returned by this allocator is undefined behavior per the spec (§7,
/// `InvalidPointer`); this does not change that contract, it only turns the
/// most common misuse into a debug-build panic instead of silent corruption.
fn debug_assert_plausible_header(header: *mut BlockHeader) {
  unsafe {
    let region_start = (*header).region_start;
    let region_size = (*region_start).region_size;
    let region_end = (region_start as usize).wrapping_add(region_size);
    debug_assert!(
      (header as usize) >= (region_start as usize) && (header as usize) < region_end,
      "release/resize called with a pointer that is not a live allocation from this allocator"
    );
  }
}

unsafe fn release_inner(heap: &mut Heap, ptr: *mut u8) {
  unsafe {
    let header = block::header_of(ptr);
    debug_assert_plausible_header(header);
    (*header).usage = 0;

    let region_start = (*header).region_start;
    let region_size = (*region_start).region_size;
    let region_end = (region_start as *mut u8).add(region_size) as *mut BlockHeader;

    let mut cur = region_start;
    let mut all_free = true;
    while !cur.is_null() && (cur as usize) < (region_end as usize) {
      if !(*cur).is_free() {
        all_free = false;
        break;
      }
      cur = (*cur).next;
    }

    if !all_free {
      return;
    }

    block::remove_region(&mut heap.head, region_start);

    if vmm::unmap(region_start as *mut u8, region_size).is_err() {
      // The kernel refused to release the mapping; the block records are
      // already spliced out above so we never try to re-free this region.
      // The virtual range leaks, which is the documented Unmap failure mode.
      eprintln!(
        "rallocator: munmap({:p}, {}) failed; leaking the virtual range",
        region_start, region_size
      );
    }
  }
}

/// Allocates `n * elemsize` bytes, zero-filled. Returns null rather than
/// wrapping silently if `n * elemsize` overflows `usize`.
pub fn zeroed_allocate(n: usize, elemsize: usize) -> *mut u8 {
  let Some(total) = n.checked_mul(elemsize) else {
    return ptr::null_mut();
  };

  let mut heap = lock();
  let payload = allocate_inner(&mut heap, total, None);

  if !payload.is_null() {
    unsafe { ptr::write_bytes(payload, 0, total) };
  }

  payload
}

/// Resizes the allocation at `ptr` to `newsize` bytes, preserving the
/// smaller of the old and new sizes' worth of leading bytes.
///
/// `ptr == null` delegates to [`allocate`]; `newsize == 0` delegates to
/// [`release`] and returns null.
///
/// Holds `heap_lock` for the whole operation, including the copy-grow path's
/// allocate-then-release: the spec treats Resize as one externally visible
/// operation, not three, so no other caller can observe the intermediate
/// state where both the old and new blocks are live.
///
/// # Safety
/// `ptr` must be null or a live payload base previously returned by this
/// module. See [`release`] for the null/liveness contract.
pub unsafe fn resize(ptr: *mut u8, newsize: usize) -> *mut u8 {
  if ptr.is_null() {
    let mut heap = lock();
    return allocate_inner(&mut heap, newsize, None);
  }

  if newsize == 0 {
    let mut heap = lock();
    unsafe { release_inner(&mut heap, ptr) };
    return ptr::null_mut();
  }

  let newsize = round_payload(newsize);
  let header_size = block::header_size();
  let needed = newsize + header_size;

  let mut heap = lock();

  let header = unsafe { block::header_of(ptr) };
  debug_assert_plausible_header(header);
  if unsafe { (*header).size } >= needed {
    unsafe { (*header).usage = needed };
    return ptr;
  }
  let old_size = unsafe { (*header).usage - header_size };

  let new_ptr = allocate_inner(&mut heap, newsize, None);
  if new_ptr.is_null() {
    return ptr::null_mut();
  }

  let copy_len = old_size.min(newsize);
  unsafe {
    ptr::copy_nonoverlapping(ptr, new_ptr, copy_len);
    release_inner(&mut heap, ptr);
  }

  new_ptr
}

/// Runs `f` with the current list head, under the heap lock. The sole
/// entry point the [`crate::dump`] module uses to read allocator state.
pub(crate) fn with_dump<R>(f: impl FnOnce(*mut BlockHeader) -> R) -> R {
  let heap = lock();
  f(heap.head)
}
