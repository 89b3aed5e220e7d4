use std::ptr::{self, NonNull};

use tracing::trace;

use crate::align_up;
use crate::error::AllocError;
use crate::growth::GrowthAllocator;
use crate::header::{HEADER_SIZE, Header};

/// Growth allocator that prefixes every region with a [`Header`].
///
/// Same monotonic policy as [`GrowthAllocator`], but each returned pointer
/// carries recoverable metadata directly behind it: the total reserved size
/// and an integrity tag that later detects out-of-bounds writes into the
/// header.
pub struct TrackedAllocator {
  growth: GrowthAllocator,
}

impl TrackedAllocator {
  pub fn new() -> Self {
    Self {
      growth: GrowthAllocator::new(),
    }
  }

  /// Reserves room for `size` payload bytes plus the header, stamps the
  /// header, and returns the payload address.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if size == 0 {
      return Err(AllocError::InvalidRequest);
    }

    let total = size.checked_add(HEADER_SIZE).ok_or(AllocError::OutOfMemory)?;
    let recorded = u32::try_from(align_up!(total)).map_err(|_| AllocError::OutOfMemory)?;

    let base = self.growth.allocate(total)?;
    let header = Header::new(recorded);

    unsafe {
      ptr::copy_nonoverlapping(header.encode().as_ptr(), base.as_ptr(), HEADER_SIZE);
      trace!(size, total_size = recorded, "stamped allocation header");

      Ok(NonNull::new_unchecked(base.as_ptr().add(HEADER_SIZE)))
    }
  }

  /// Reads back the header stored behind a pointer previously returned by
  /// [`TrackedAllocator::allocate`].
  ///
  /// # Safety
  ///
  /// `ptr` must have been returned by `allocate`; the header region behind
  /// it must still be reserved.
  pub unsafe fn header_of(ptr: NonNull<u8>) -> Header {
    unsafe {
      let mut bytes = [0u8; HEADER_SIZE];
      ptr::copy_nonoverlapping(ptr.as_ptr().sub(HEADER_SIZE), bytes.as_mut_ptr(), HEADER_SIZE);

      Header::decode(bytes)
    }
  }

  /// Total bytes reserved through this allocator so far, headers included.
  pub fn reserved(&self) -> usize {
    self.growth.reserved()
  }
}

impl Default for TrackedAllocator {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::align::ALIGNMENT;
  use crate::growth::BRK_LOCK;
  use std::sync::PoisonError;

  #[test]
  fn rejects_zero_size() {
    let mut allocator = TrackedAllocator::new();

    assert_eq!(allocator.allocate(0), Err(AllocError::InvalidRequest));
  }

  #[test]
  fn stamps_a_valid_header_behind_the_pointer() {
    let _guard = BRK_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let mut allocator = TrackedAllocator::new();

    let ptr = allocator.allocate(24).unwrap();
    assert_eq!(ptr.as_ptr() as usize % ALIGNMENT, 0);

    let header = unsafe { TrackedAllocator::header_of(ptr) };
    assert!(header.is_valid());
    assert!(header.total_size as usize >= 24 + HEADER_SIZE);
  }

  #[test]
  fn successive_allocations_do_not_alias() {
    let _guard = BRK_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let mut allocator = TrackedAllocator::new();

    let mut regions = Vec::new();
    for fill in 0u8..5 {
      let ptr = allocator.allocate(16).unwrap();
      unsafe { ptr.as_ptr().write_bytes(fill, 16) };
      regions.push((ptr, fill));
    }

    // every region still holds its own pattern
    for (ptr, fill) in regions {
      for offset in 0..16 {
        unsafe { assert_eq!(ptr.as_ptr().add(offset).read(), fill) };
      }
    }
  }
}
