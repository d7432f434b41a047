//! 8-bit element domains and the shared accumulation primitive.
//!
//! Every kernel in this crate multiplies widened 8-bit operands into an `i32`
//! accumulator and narrows the final value with saturation. The narrowing rule is
//! fixed: no rescale, no rounding, clamp to the element range and cast.

use std::fmt;

/// An 8-bit quantized element type.
pub trait QuantElement: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Smallest representable value, widened.
    const MIN: i32;
    /// Largest representable value, widened.
    const MAX: i32;
    /// Largest magnitude any value of this type can have.
    const MAX_MAGNITUDE: i64;

    /// Widens the element into the accumulator domain.
    fn widen(self) -> i32;

    /// Narrows an accumulator into the element range, clamping instead of wrapping.
    fn saturate(acc: i32) -> Self;

    /// Longest reduction whose sum, plus one bias term, cannot overflow `i32`.
    fn max_reduction_len() -> usize {
        let product = Self::MAX_MAGNITUDE * Self::MAX_MAGNITUDE;
        ((i32::MAX as i64 - Self::MAX_MAGNITUDE) / product) as usize
    }
}

impl QuantElement for u8 {
    const MIN: i32 = u8::MIN as i32;
    const MAX: i32 = u8::MAX as i32;
    const MAX_MAGNITUDE: i64 = 255;

    #[inline(always)]
    fn widen(self) -> i32 {
        self as i32
    }

    #[inline(always)]
    fn saturate(acc: i32) -> Self {
        acc.clamp(<Self as QuantElement>::MIN, <Self as QuantElement>::MAX) as u8
    }
}

impl QuantElement for i8 {
    const MIN: i32 = i8::MIN as i32;
    const MAX: i32 = i8::MAX as i32;
    const MAX_MAGNITUDE: i64 = 128;

    #[inline(always)]
    fn widen(self) -> i32 {
        self as i32
    }

    #[inline(always)]
    fn saturate(acc: i32) -> Self {
        acc.clamp(<Self as QuantElement>::MIN, <Self as QuantElement>::MAX) as i8
    }
}

/// Sum of element-wise products of two equally long runs, accumulated in `i32`.
///
/// Four independent partial sums keep the dependency chains short; integer addition
/// is associative so the split does not change the result.
#[inline(always)]
pub(crate) fn dot<T: QuantElement>(a: &[T], b: &[T]) -> i32 {
    debug_assert_eq!(a.len(), b.len());

    let mut sum0 = 0i32;
    let mut sum1 = 0i32;
    let mut sum2 = 0i32;
    let mut sum3 = 0i32;

    let mut a_chunks = a.chunks_exact(4);
    let mut b_chunks = b.chunks_exact(4);
    for (ac, bc) in (&mut a_chunks).zip(&mut b_chunks) {
        sum0 += ac[0].widen() * bc[0].widen();
        sum1 += ac[1].widen() * bc[1].widen();
        sum2 += ac[2].widen() * bc[2].widen();
        sum3 += ac[3].widen() * bc[3].widen();
    }

    let mut sum = (sum0 + sum1) + (sum2 + sum3);
    for (&av, &bv) in a_chunks.remainder().iter().zip(b_chunks.remainder()) {
        sum += av.widen() * bv.widen();
    }

    sum
}
