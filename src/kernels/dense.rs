//! Fully-connected (dense) layer over 8-bit operands.
//!
//! `out[b, o] = sat(sum_i data[b, i] * weight[o, i])`, the same accumulate-then-saturate
//! policy as the convolution kernels. It is the 1x1 convolution over `(B, I, 1, 1)`
//! written directly as a matrix product.

use crate::element::{QuantElement, dot};
use crate::errors::KernelResult;
use crate::params::DenseParams;

/// Computes `(B, O)` from `(B, I)` data and `(O, I)` weights.
///
/// Shapes are not validated; see [`try_dense`] for a checked call.
pub fn dense<T: QuantElement>(data: &[T], weight: &[T], out: &mut [T], params: &DenseParams) {
    dense_rows(data, weight, &mut out[..params.output_len()], params);
}

/// Validates `params` and every buffer, then runs [`dense`].
pub fn try_dense<T: QuantElement>(
    data: &[T],
    weight: &[T],
    out: &mut [T],
    params: &DenseParams,
) -> KernelResult<()> {
    params.validate_buffers::<T>(data.len(), weight.len(), out.len())?;
    dense(data, weight, out, params);
    Ok(())
}

/// Computes whole output rows. `data` and `out` must cover the same batch rows.
pub(crate) fn dense_rows<T: QuantElement>(
    data: &[T],
    weight: &[T],
    out: &mut [T],
    params: &DenseParams,
) {
    if params.out_features == 0 {
        return;
    }
    if params.in_features == 0 {
        out.fill(T::saturate(0));
        return;
    }

    let weight = &weight[..params.weight_len()];
    for (input_row, out_row) in data
        .chunks_exact(params.in_features)
        .zip(out.chunks_exact_mut(params.out_features))
    {
        for (weights_row, out_value) in weight.chunks_exact(params.in_features).zip(out_row) {
            *out_value = T::saturate(dot(input_row, weights_row));
        }
    }
}
