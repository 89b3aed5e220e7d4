use std::ptr::NonNull;

use libc::{c_void, intptr_t, sbrk};
use tracing::trace;

use crate::align_up;
use crate::error::AllocError;

/// Monotonic allocator over the process break.
///
/// Every successful call extends the break and hands out the region
/// immediately below the new boundary. Nothing is ever reclaimed; total
/// reserved space only grows. This is the simplest allocator that is still
/// correct, and the baseline the other two designs escalate from.
pub struct GrowthAllocator {
  reserved: usize,
}

/// The process break is global state and the test harness is
/// multi-threaded; tests that move the break serialize behind this lock.
#[cfg(test)]
pub(crate) static BRK_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

impl GrowthAllocator {
  pub fn new() -> Self {
    Self { reserved: 0 }
  }

  /// Reserves `size` bytes, rounded up to [`crate::align::ALIGNMENT`], and
  /// returns the aligned address of the new region.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if size == 0 {
      return Err(AllocError::InvalidRequest);
    }

    let aligned = align_up!(size);

    unsafe {
      let current = sbrk(0) as usize;
      // The break normally already sits on an aligned boundary; if another
      // caller left it misaligned, pad the request so the returned address
      // keeps the alignment guarantee.
      let pad = align_up!(current) - current;

      let previous = sbrk((pad + aligned) as intptr_t);
      if previous == usize::MAX as *mut c_void {
        return Err(AllocError::OutOfMemory);
      }

      self.reserved += pad + aligned;
      trace!(size, aligned, reserved = self.reserved, "extended process break");

      Ok(NonNull::new_unchecked((previous as *mut u8).add(pad)))
    }
  }

  /// Total bytes reserved through this allocator so far.
  pub fn reserved(&self) -> usize {
    self.reserved
  }
}

impl Default for GrowthAllocator {
  fn default() -> Self {
    Self::new()
  }
}
