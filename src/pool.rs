use std::ptr::NonNull;

use tracing::{trace, warn};

use crate::align::ALIGNMENT;
use crate::arena::BlockPool;
use crate::bitmap::OccupancyBitmap;
use crate::error::AllocError;
use crate::header::{HEADER_SIZE, Header};

/// Default block granularity in bytes.
pub const BLOCK_SIZE: usize = 64;

/// Default arena capacity in bytes (64 blocks of [`BLOCK_SIZE`]).
pub const POOL_CAPACITY: usize = 4096;

enum PoolState {
  Unmapped,
  Mapped(BlockPool),
  Failed,
}

/// Fixed-capacity block allocator with reuse.
///
/// The arena is mapped lazily on the first allocation and divided into
/// equal-size blocks tracked by an [`OccupancyBitmap`]. `allocate` reserves
/// the first-fit run of free blocks and stamps a [`Header`] at the front of
/// the run; `release` re-derives that header from the returned pointer,
/// validates its integrity tag, and clears the run for reuse.
///
/// Instances are independent: each owns its arena and occupancy state.
/// Nothing here is synchronized; sharing one instance across threads needs
/// external mutual exclusion around every call.
pub struct PooledAllocator {
  state: PoolState,
  bitmap: OccupancyBitmap,
  block_size: usize,
  capacity: usize,
}

impl PooledAllocator {
  /// Creates an allocator with the default geometry: [`POOL_CAPACITY`]
  /// bytes in blocks of [`BLOCK_SIZE`].
  pub fn new() -> Self {
    Self::with_geometry(BLOCK_SIZE, POOL_CAPACITY)
  }

  /// Creates an allocator over `capacity` bytes split into `block_size`
  /// blocks. Geometry is fixed for the allocator's lifetime.
  pub fn with_geometry(
    block_size: usize,
    capacity: usize,
  ) -> Self {
    assert!(block_size >= HEADER_SIZE, "blocks must fit a header");
    assert!(block_size % ALIGNMENT == 0, "block size must keep payloads aligned");
    assert!(capacity > 0 && capacity % block_size == 0, "capacity must be a whole number of blocks");
    assert!(u32::try_from(capacity).is_ok(), "capacity must fit the header size field");

    Self {
      state: PoolState::Unmapped,
      bitmap: OccupancyBitmap::new(capacity / block_size),
      block_size,
      capacity,
    }
  }

  /// Reserves the first-fit run of blocks large enough for `size` payload
  /// bytes plus the header, and returns the payload address.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if size == 0 {
      return Err(AllocError::InvalidRequest);
    }

    if matches!(self.state, PoolState::Unmapped) {
      self.state = match BlockPool::map(self.capacity) {
        Ok(pool) => PoolState::Mapped(pool),
        Err(error) => {
          self.state = PoolState::Failed;
          return Err(error);
        }
      };
    }
    let PoolState::Mapped(pool) = &mut self.state else {
      // a failed mapping stays failed
      return Err(AllocError::OutOfMemory);
    };

    let total = size.checked_add(HEADER_SIZE).ok_or(AllocError::OutOfMemory)?;
    let needed = total.div_ceil(self.block_size);
    let reserved = needed
      .checked_mul(self.block_size)
      .and_then(|span| u32::try_from(span).ok())
      .ok_or(AllocError::OutOfMemory)?;

    let Some(start) = self.bitmap.find_free_run(needed) else {
      return Err(AllocError::OutOfMemory);
    };
    self.bitmap.mark_range(start, needed);

    let offset = start * self.block_size;
    pool.write_bytes(offset, &Header::new(reserved).encode());

    trace!(size, needed, start, "reserved block run");

    Ok(pool.ptr_at(offset + HEADER_SIZE))
  }

  /// Returns a previously allocated region to the pool.
  ///
  /// A null pointer is accepted and ignored. The header behind `ptr` must
  /// validate; otherwise the call reports [`AllocError::Corruption`] and
  /// deliberately leaks the run, since clearing occupancy from an
  /// unvalidated header could free blocks that belong to another live
  /// allocation.
  pub fn release(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), AllocError> {
    if ptr.is_null() {
      return Ok(());
    }

    let PoolState::Mapped(pool) = &self.state else {
      // nothing was ever handed out, so the address cannot be ours
      return Err(AllocError::Corruption);
    };

    let Some(header_offset) = (ptr as usize)
      .checked_sub(HEADER_SIZE)
      .and_then(|address| pool.offset_of(address))
    else {
      warn!(address = ptr as usize, "released address does not belong to the pool");
      return Err(AllocError::Corruption);
    };
    if header_offset % self.block_size != 0 {
      warn!(header_offset, "released address is not on a block boundary");
      return Err(AllocError::Corruption);
    }

    let header = Header::decode(pool.read_bytes(header_offset));
    if !header.is_valid() {
      warn!(found = header.tag, "integrity tag mismatch, leaking the block run");
      return Err(AllocError::Corruption);
    }

    let start = header_offset / self.block_size;
    let used = (header.total_size as usize).div_ceil(self.block_size);
    if used == 0 || start + used > self.bitmap.block_count() {
      warn!(total_size = header.total_size, "header names an impossible block run");
      return Err(AllocError::Corruption);
    }

    self.bitmap.clear_range(start, used);
    trace!(start, used, "cleared block run");

    Ok(())
  }

  /// Blocks currently marked used.
  pub fn used_blocks(&self) -> usize {
    self.bitmap.used_blocks()
  }

  /// Blocks currently free.
  pub fn free_blocks(&self) -> usize {
    self.bitmap.block_count() - self.bitmap.used_blocks()
  }

  pub fn block_size(&self) -> usize {
    self.block_size
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }
}

impl Default for PooledAllocator {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::header::INTEGRITY_TAG;

  fn header_behind(ptr: NonNull<u8>) -> Header {
    let mut bytes = [0u8; HEADER_SIZE];
    unsafe {
      std::ptr::copy_nonoverlapping(ptr.as_ptr().sub(HEADER_SIZE), bytes.as_mut_ptr(), HEADER_SIZE);
    }
    Header::decode(bytes)
  }

  #[test]
  fn rejects_zero_size_without_mapping() {
    let mut pool = PooledAllocator::new();

    assert_eq!(pool.allocate(0), Err(AllocError::InvalidRequest));
    assert!(matches!(pool.state, PoolState::Unmapped));
  }

  #[test]
  fn stamps_a_valid_header_behind_the_pointer() {
    let mut pool = PooledAllocator::new();

    let ptr = pool.allocate(24).unwrap();
    assert_eq!(ptr.as_ptr() as usize % ALIGNMENT, 0);

    let header = header_behind(ptr);
    assert_eq!(header.tag, INTEGRITY_TAG);
    assert!(header.total_size as usize >= 24 + HEADER_SIZE);
  }

  #[test]
  fn live_allocations_never_share_blocks() {
    let mut pool = PooledAllocator::new();

    let a = pool.allocate(100).unwrap(); // 2 blocks
    let b = pool.allocate(10).unwrap(); // 1 block
    let c = pool.allocate(64).unwrap(); // 2 blocks
    assert_eq!(pool.used_blocks(), 5);

    // each reserved span ends before the next one's header starts
    let mut spans: Vec<(usize, usize)> = [a, b, c]
      .iter()
      .map(|ptr| {
        let header_address = ptr.as_ptr() as usize - HEADER_SIZE;
        (header_address, header_address + header_behind(*ptr).total_size as usize)
      })
      .collect();
    spans.sort();
    for pair in spans.windows(2) {
      assert!(pair[0].1 <= pair[1].0);
    }
  }

  #[test]
  fn worked_example_on_a_64_block_pool() {
    let mut pool = PooledAllocator::new();

    let first = pool.allocate(100).unwrap();
    assert_eq!(pool.used_blocks(), 2);
    assert_eq!(header_behind(first).total_size, 128);

    // 62 free blocks hold 3968 bytes, not enough for 4000 plus a header
    assert_eq!(pool.allocate(4000), Err(AllocError::OutOfMemory));
    assert_eq!(pool.used_blocks(), 2);

    pool.release(first.as_ptr()).unwrap();
    assert_eq!(pool.used_blocks(), 0);

    // the freed run rejoins the left edge and the big request now fits
    let big = pool.allocate(4000).unwrap();
    assert_eq!(big, first);
    assert_eq!(pool.used_blocks(), 63);
  }

  #[test]
  fn whole_capacity_request_fails() {
    let mut pool = PooledAllocator::new();

    assert_eq!(pool.allocate(POOL_CAPACITY), Err(AllocError::OutOfMemory));
    assert_eq!(pool.used_blocks(), 0);
  }

  #[test]
  fn freed_run_is_reused_first_fit() {
    let mut pool = PooledAllocator::new();

    let first = pool.allocate(40).unwrap();
    let second = pool.allocate(40).unwrap();

    pool.release(first.as_ptr()).unwrap();

    let third = pool.allocate(40).unwrap();
    assert_eq!(third, first);
    assert_ne!(third, second);
  }

  #[test]
  fn corrupted_header_is_reported_and_leaked() {
    let mut pool = PooledAllocator::new();

    let ptr = pool.allocate(40).unwrap();
    let used = pool.used_blocks();

    // a caller overrunning the previous region tramples the header
    unsafe { ptr.as_ptr().sub(HEADER_SIZE).write_bytes(0x00, HEADER_SIZE) };

    assert_eq!(pool.release(ptr.as_ptr()), Err(AllocError::Corruption));
    assert_eq!(pool.used_blocks(), used);
  }

  #[test]
  fn foreign_pointers_are_rejected() {
    let mut pool = PooledAllocator::new();
    let mut other = PooledAllocator::new();

    pool.allocate(8).unwrap();
    let foreign = other.allocate(8).unwrap();
    assert_eq!(pool.release(foreign.as_ptr()), Err(AllocError::Corruption));

    // a stack address is just as foreign
    let mut local = [0u8; 16];
    assert_eq!(pool.release(local.as_mut_ptr()), Err(AllocError::Corruption));
    assert_eq!(pool.used_blocks(), 1);
  }

  #[test]
  fn interior_pointers_are_rejected() {
    let mut pool = PooledAllocator::new();

    let ptr = pool.allocate(100).unwrap();
    let interior = unsafe { ptr.as_ptr().add(16) };

    assert_eq!(pool.release(interior), Err(AllocError::Corruption));
    assert_eq!(pool.used_blocks(), 2);
  }

  #[test]
  fn releasing_null_is_a_no_op() {
    let mut pool = PooledAllocator::new();

    pool.allocate(8).unwrap();
    assert_eq!(pool.release(std::ptr::null_mut()), Ok(()));
    assert_eq!(pool.used_blocks(), 1);
  }

  #[test]
  fn repeated_release_is_not_detected() {
    // Known limitation: the bitmap cannot tell a second release of the
    // same run from a correct one, so the caller bug passes silently.
    let mut pool = PooledAllocator::new();

    let ptr = pool.allocate(8).unwrap();
    pool.release(ptr.as_ptr()).unwrap();

    assert_eq!(pool.release(ptr.as_ptr()), Ok(()));
    assert_eq!(pool.used_blocks(), 0);
  }

  #[test]
  fn geometry_is_per_instance() {
    let mut small = PooledAllocator::with_geometry(16, 64);

    small.allocate(8).unwrap(); // one 16-byte block
    assert_eq!(small.used_blocks(), 1);
    assert_eq!(small.free_blocks(), 3);

    small.allocate(40).unwrap(); // three more
    assert_eq!(small.free_blocks(), 0);
    assert_eq!(small.allocate(1), Err(AllocError::OutOfMemory));
  }
}
