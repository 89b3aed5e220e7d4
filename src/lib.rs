//! # ballocator - Escalating Manual Memory Allocators
//!
//! This crate implements three small manual allocators, each one step up in
//! bookkeeping from the last:
//!
//! ```text
//!   GrowthAllocator          TrackedAllocator          PooledAllocator
//!   ───────────────          ────────────────          ───────────────
//!   bump the process         bump + metadata           fixed arena + bitmap,
//!   break, never free        header per region         first-fit, reusable
//! ```
//!
//! ## Growth Allocation
//!
//! The baseline design only ever extends the program break via `sbrk(2)`:
//!
//! ```text
//!   Before allocate(24):
//!   ┌────────────────────┬────────────────────────────────────┐
//!   │    Used Memory     │            Free Memory             │
//!   └────────────────────┴────────────────────────────────────┘
//!                        ▲
//!                        program break
//!
//!   After allocate(24):
//!   ┌────────────────────┬──────────────┬─────────────────────┐
//!   │    Used Memory     │  New Region  │     Free Memory     │
//!   └────────────────────┴──────────────┴─────────────────────┘
//!                                       ▲
//!                                       new program break
//! ```
//!
//! Allocation is O(1) and every address is 8-byte aligned, but nothing is
//! ever reclaimed: total reserved space only grows.
//!
//! ## Tracked Allocation
//!
//! The second design prefixes each region with an 8-byte header so the
//! allocation can later be identified and checked:
//!
//! ```text
//!   ┌──────────────────────────┬────────────────────────────────┐
//!   │         Header           │           User Data            │
//!   │  ┌────────────────────┐  │  ┌──────────────────────────┐  │
//!   │  │ total_size: u32    │  │  │                          │  │
//!   │  │ tag: 0xDEADBEEF    │  │  │      N bytes usable      │  │
//!   │  └────────────────────┘  │  └──────────────────────────┘  │
//!   │         8 bytes          │                                │
//!   └──────────────────────────┴────────────────────────────────┘
//!                              ▲
//!                              └── Pointer returned to user
//! ```
//!
//! A caller that writes past its region tramples the next header; the tag
//! makes that detectable instead of silent.
//!
//! ## Pooled Allocation
//!
//! The complete design maps a fixed arena once, divides it into equal-size
//! blocks, and tracks each block's occupancy in a bitmap:
//!
//! ```text
//!   Arena (4096 bytes, 64-byte blocks):
//!   ┌────┬────┬────┬────┬────┬────┬─────────────────────┬────┐
//!   │ B0 │ B1 │ B2 │ B3 │ B4 │ B5 │         ...         │B63 │
//!   └────┴────┴────┴────┴────┴────┴─────────────────────┴────┘
//!   Bitmap:
//!     1    1    0    1    0    0            ...           0
//!     └─ allocate scans left to right for the first free run (first-fit),
//!        release validates the header and clears the run for reuse
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   ballocator
//!   ├── align      - round-up-to-alignment arithmetic (align_up!)
//!   ├── error      - AllocError returned by every operation
//!   ├── growth     - GrowthAllocator over sbrk
//!   ├── header     - allocation header codec and integrity tag
//!   ├── tracked    - TrackedAllocator (growth + header)
//!   ├── arena      - BlockPool, the mmap-backed bounds-checked arena
//!   ├── bitmap     - OccupancyBitmap, per-block free/used flags
//!   └── pool       - PooledAllocator (arena + bitmap + header)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ballocator::PooledAllocator;
//!
//! let mut pool = PooledAllocator::new();
//!
//! let ptr = pool.allocate(100).expect("fresh pool has room");
//! unsafe { ptr.as_ptr().write_bytes(0xAB, 100) };
//!
//! pool.release(ptr.as_ptr()).expect("header is intact");
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives; sharing an
//!   allocator across threads needs external mutual exclusion around every
//!   call.
//! - **No size classes, no coalescing**: the pool tracks whole blocks and
//!   nothing finer.
//! - **Freed runs stay mapped**: `release` makes blocks reusable but never
//!   returns pages to the operating system.
//! - **Unix-only**: the growth path requires `sbrk` and the pool requires
//!   `mmap` (POSIX systems).
//!
//! ## Safety
//!
//! Allocation returns raw pointers; reading or writing through them is the
//! caller's `unsafe` responsibility, as is not touching a region after
//! releasing it. The pool itself never dereferences caller-supplied
//! addresses: it converts them to bounds-checked arena offsets first, so a
//! bogus pointer is reported as an error rather than followed.

pub mod align;
mod arena;
mod bitmap;
mod error;
mod growth;
mod header;
mod pool;
mod tracked;

pub use align::ALIGNMENT;
pub use arena::BlockPool;
pub use bitmap::OccupancyBitmap;
pub use error::AllocError;
pub use growth::GrowthAllocator;
pub use header::{HEADER_SIZE, Header, INTEGRITY_TAG};
pub use pool::{BLOCK_SIZE, POOL_CAPACITY, PooledAllocator};
pub use tracked::TrackedAllocator;
