use thiserror::Error;

/// Failures surfaced by every allocator in this crate.
///
/// All of these are returned as values; the allocators never abort the
/// process on their own initiative. Callers must check for an error before
/// dereferencing a returned pointer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  /// The process break could not be extended, the backing arena could not
  /// be mapped, or no sufficiently large free run exists in the pool.
  #[error("out of memory")]
  OutOfMemory,

  /// Zero-size request, rejected before any state is touched.
  #[error("invalid request: size must be non-zero")]
  InvalidRequest,

  /// The metadata header behind a released pointer failed validation, or
  /// the pointer does not belong to the pool at all. The affected blocks
  /// are left occupied rather than guessed free.
  #[error("corrupted or foreign allocation header")]
  Corruption,
}
