//! Debug dump.
//!
//! Renders the heap's block list to any [`std::io::Write`] sink. Used for
//! interactive debugging only — nothing in the allocation core depends on
//! this module's output format.

use std::io::{self, Write};

use crate::block::{self, BlockHeader};
use crate::heap;

fn fmt_addr(addr: *const u8) -> String {
  if addr.is_null() {
    "(nil)".to_string()
  } else {
    format!("{:#x}", addr as usize)
  }
}

/// Writes the textual memory map described by the crate's dump format to
/// `sink`:
///
/// ```text
/// -- Current Memory State --
/// [REGION] <base>-<end> <size>
/// [BLOCK]  <base>-<end> (<alloc_id>) '<name>' <size> <usage> <payload_usage>
/// ```
pub fn dump(sink: &mut impl Write) -> io::Result<()> {
  writeln!(sink, "-- Current Memory State --")?;

  heap::with_dump(|head| -> io::Result<()> {
    let mut current_region: *mut BlockHeader = std::ptr::null_mut();

    for block in block::Iter::new(head) {
      let region_start = unsafe { (*block).region_start };

      if region_start != current_region {
        current_region = region_start;
        let region_size = unsafe { (*region_start).region_size };
        let base = region_start as *const u8;
        let end = unsafe { base.add(region_size) };
        writeln!(sink, "[REGION] {}-{} {}", fmt_addr(base), fmt_addr(end), region_size)?;
      }

      let base = block as *const u8;
      let size = unsafe { (*block).size };
      let usage = unsafe { (*block).usage };
      let header_size = block::header_size();
      let payload_usage = usage.saturating_sub(header_size);
      let name = unsafe { (*block).name_str().to_string() };
      let alloc_id = unsafe { (*block).alloc_id };
      let end = unsafe { base.add(size) };

      writeln!(
        sink,
        "[BLOCK]  {}-{} ({}) '{}' {} {} {}",
        fmt_addr(base),
        fmt_addr(end),
        alloc_id,
        name,
        size,
        usage,
        payload_usage
      )?;
    }

    Ok(())
  })
}
