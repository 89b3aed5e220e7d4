use std::ptr::{self, NonNull};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void, mmap, munmap};
use tracing::debug;

use crate::error::AllocError;

/// Fixed-capacity byte arena backed by a single anonymous mapping.
///
/// The arena owns its reservation exclusively and is unmapped when the
/// instance drops. All byte access goes through bounds-checked offsets: the
/// only raw addresses that leave this type come from
/// [`BlockPool::ptr_at`], and incoming addresses are converted back with
/// [`BlockPool::offset_of`] before any byte is touched.
pub struct BlockPool {
  base: NonNull<u8>,
  capacity: usize,
}

impl BlockPool {
  /// Maps a private, zero-filled arena of `capacity` bytes.
  pub fn map(capacity: usize) -> Result<Self, AllocError> {
    assert!(capacity > 0, "arena capacity must be non-zero");

    let address = unsafe {
      mmap(
        ptr::null_mut(),
        capacity,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };
    if address == MAP_FAILED {
      return Err(AllocError::OutOfMemory);
    }

    debug!(capacity, base = address as usize, "mapped backing arena");

    Ok(Self {
      base: NonNull::new(address as *mut u8).ok_or(AllocError::OutOfMemory)?,
      capacity,
    })
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Raw address of `offset`, for handing out to the caller.
  pub fn ptr_at(&self, offset: usize) -> NonNull<u8> {
    assert!(offset < self.capacity, "offset {offset} out of range");

    unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset)) }
  }

  /// Converts an address back into an arena offset, if it lies inside.
  pub fn offset_of(&self, address: usize) -> Option<usize> {
    let base = self.base.as_ptr() as usize;

    (base..base + self.capacity).contains(&address).then(|| address - base)
  }

  /// Copies `N` bytes out of the arena.
  pub fn read_bytes<const N: usize>(&self, offset: usize) -> [u8; N] {
    assert!(offset + N <= self.capacity, "read of {N} bytes at {offset} out of range");

    let mut bytes = [0u8; N];
    unsafe {
      ptr::copy_nonoverlapping(self.base.as_ptr().add(offset), bytes.as_mut_ptr(), N);
    }
    bytes
  }

  /// Copies `bytes` into the arena.
  pub fn write_bytes(
    &mut self,
    offset: usize,
    bytes: &[u8],
  ) {
    assert!(
      offset + bytes.len() <= self.capacity,
      "write of {} bytes at {offset} out of range",
      bytes.len()
    );

    unsafe {
      ptr::copy_nonoverlapping(bytes.as_ptr(), self.base.as_ptr().add(offset), bytes.len());
    }
  }
}

impl Drop for BlockPool {
  fn drop(&mut self) {
    unsafe {
      munmap(self.base.as_ptr() as *mut c_void, self.capacity);
    }
  }
}
