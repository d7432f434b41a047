//! Deterministic operand generation for benchmarks.

use crate::element::QuantElement;

/// A buffer of `len` values cycling through `[low, high]` in a seed-dependent order.
pub fn pattern_buffer<T: QuantElement>(len: usize, seed: usize, low: i32, high: i32) -> Vec<T> {
    let span = (high - low + 1).max(1) as usize;
    (0..len)
        .map(|i| {
            let offset = (i.wrapping_mul(31).wrapping_add(seed.wrapping_mul(17))) % span;
            T::saturate(low + offset as i32)
        })
        .collect()
}
