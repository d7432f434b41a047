//! Requantization between two affine 8-bit encodings.
//!
//! A quantized value `q` encodes `scale * (q - zero_point)`. Requantizing re-expresses
//! the same real value in another encoding, rounding half away from zero and
//! saturating to the element range.

use serde::{Deserialize, Serialize};

use crate::element::QuantElement;
use crate::errors::{KernelError, KernelResult};
use crate::kernels::elementwise::{check_elementwise_buffers, map_elementwise};

/// Input and output encodings of a requantize pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequantizeParams {
    pub input_scale: f32,
    pub input_zero_point: i32,
    pub output_scale: f32,
    pub output_zero_point: i32,
}

impl RequantizeParams {
    pub fn new(
        input_scale: f32,
        input_zero_point: i32,
        output_scale: f32,
        output_zero_point: i32,
    ) -> Self {
        Self {
            input_scale,
            input_zero_point,
            output_scale,
            output_zero_point,
        }
    }

    /// Ratio applied to the zero-point-adjusted input.
    pub fn multiplier(&self) -> f32 {
        self.input_scale / self.output_scale
    }

    pub fn validate(&self) -> KernelResult<()> {
        for (name, value) in [
            ("input_scale", self.input_scale),
            ("output_scale", self.output_scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(KernelError::InvalidScale { name, value });
            }
        }
        Ok(())
    }

    /// Requantizes one element.
    #[inline(always)]
    pub fn apply<T: QuantElement>(&self, value: T, multiplier: f32) -> T {
        let centered = value.widen() - self.input_zero_point;
        let scaled = (centered as f32 * multiplier).round() as i32;
        T::saturate(scaled.saturating_add(self.output_zero_point))
    }
}

/// Requantizes `product(shape)` elements from `data` into `out`.
pub fn requantize<T: QuantElement>(
    data: &[T],
    out: &mut [T],
    shape: &[usize],
    params: &RequantizeParams,
) {
    let multiplier = params.multiplier();
    map_elementwise(data, out, shape, |value| params.apply(value, multiplier));
}

/// Validates the scales and both buffers, then runs [`requantize`].
pub fn try_requantize<T: QuantElement>(
    data: &[T],
    out: &mut [T],
    shape: &[usize],
    params: &RequantizeParams,
) -> KernelResult<()> {
    params.validate()?;
    check_elementwise_buffers(data.len(), out.len(), shape)?;
    requantize(data, out, shape, params);
    Ok(())
}
