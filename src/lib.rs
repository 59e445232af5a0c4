//! # rallocator - A Region-Based Dynamic Memory Allocator
//!
//! This crate provides a drop-in replacement for the process-wide dynamic
//! memory allocator: a **region allocator** that carves caller-visible
//! blocks out of larger spans mapped from the kernel with `mmap`, and
//! returns those spans with `munmap` once every block inside one is free.
//!
//! ## Overview
//!
//! Unlike a pure bump allocator, this allocator can satisfy a request from
//! previously freed space as well as from fresh kernel memory:
//!
//! ```text
//!   Region Allocator Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                      REGION (one mmap call)                         │
//!   │                                                                      │
//!   │   ┌─────┬─────┬─────┬─────────────────────────────────────────────┐  │
//!   │   │ B1  │ B2  │ B3  │              free slack                     │  │
//!   │   └─────┴─────┴─────┴─────────────────────────────────────────────┘  │
//!   │                                                                      │
//!   │   A new allocation either takes free slack in place, splits it      │
//!   │   into an in-use block + a smaller free remainder, or triggers a    │
//!   │   fresh mmap when nothing in any region qualifies.                  │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rallocator
//!   ├── align      - Word-alignment macro (align!)
//!   ├── vmm        - Virtual-memory provider (mmap/munmap)
//!   ├── block      - Block/region data model
//!   ├── placement  - first-fit / best-fit / worst-fit search
//!   ├── config     - live ALLOCATOR_ALGORITHM / ALLOCATOR_SCRIBBLE knobs
//!   ├── heap       - allocation core + the process-global heap lock
//!   └── dump       - textual heap map for debugging
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rallocator::{allocate, release};
//!
//! unsafe {
//!     let ptr = allocate(64) as *mut u64;
//!     assert!(!ptr.is_null());
//!
//!     *ptr = 42;
//!     assert_eq!(*ptr, 42);
//!
//!     release(ptr as *mut u8);
//! }
//! ```
//!
//! ## How It Works
//!
//! Each block is preceded by a header recording its region, its span, and
//! how much of that span is currently committed to a caller:
//!
//! ```text
//!   Single Block:
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │     Block Header      │         Payload                │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ alloc_id: N      │  │  ┌──────────────────────────┐  │
//!   │  │ region_start/size│  │  │                          │  │
//!   │  │ size / usage     │  │  │   usage - header bytes   │  │
//!   │  │ next: null/ptr   │  │  │       usable            │  │
//!   │  └─────────────────┘  │  │                          │  │
//!   │    (word-aligned)     │  └──────────────────────────┘  │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to the caller
//! ```
//!
//! A region is destroyed — `munmap`'d in one call — the moment every block
//! inside it becomes free; individual blocks are never coalesced with their
//! neighbors while the region lives.
//!
//! ## Configuration
//!
//! Two environment variables are consulted live, on every call:
//!
//! - `ALLOCATOR_ALGORITHM`: `first_fit` (default), `best_fit`, or
//!   `worst_fit` — selects the placement policy.
//! - `ALLOCATOR_SCRIBBLE`: `1` fills freshly allocated payloads with
//!   `0xAA` before returning them, to surface uninitialized-read bugs.
//!
//! ## Limitations
//!
//! - **No coalescing**: freeing a block never merges it with free
//!   neighbors; only whole-region reclamation returns memory to the OS.
//! - **Fixed alignment**: payloads are aligned to the platform word size
//!   (8 bytes on 64-bit targets), not to an arbitrary caller-supplied
//!   alignment.
//! - **Process-wide single lock**: every call serializes on one mutex;
//!   there is no finer-grained or lock-free path.
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory management.
//! [`release`] and [`resize`] require the caller to pass either null or a
//! pointer this allocator itself returned and has not yet released;
//! anything else is undefined behavior, matching the convention of the
//! interface this crate replaces.

pub mod align;
mod block;
mod config;
mod dump;
mod heap;
mod placement;
mod vmm;

pub use dump::dump;
pub use heap::{allocate, allocate_named, release, resize, zeroed_allocate};
