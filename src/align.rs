/// Granularity, in bytes, that every address handed out by this crate honors.
pub const ALIGNMENT: usize = 8;

/// Rounds `$value` up to the next multiple of a granularity.
///
/// The one-argument form uses [`ALIGNMENT`]; the two-argument form takes an
/// explicit granularity, which must be a power of two.
///
/// Contract: the result is `>= $value`, is a multiple of the granularity,
/// and is the least value satisfying both.
///
/// # Examples
///
/// ```rust
/// use ballocator::align_up;
///
/// assert_eq!(align_up!(13), 16);
/// assert_eq!(align_up!(16), 16);
/// assert_eq!(align_up!(0), 0);
/// assert_eq!(align_up!(21, 4), 24);
/// ```
#[macro_export]
macro_rules! align_up {
  ($value:expr) => {
    $crate::align_up!($value, $crate::align::ALIGNMENT)
  };
  ($value:expr, $granularity:expr) => {
    ($value + $granularity - 1) & !($granularity - 1)
  };
}
