//! Shape-agnostic elementwise kernels.
//!
//! The shape only determines how many elements are processed; the layout is never
//! interpreted, so any rank works as long as the product of extents matches the
//! buffers.

use crate::activation::Activation;
use crate::element::QuantElement;
use crate::errors::KernelResult;
use crate::params::{check_len, checked_element_count, element_count};

/// Writes `f(data[i])` to `out[i]` for every linear index of `shape`.
pub fn map_elementwise<T, F>(data: &[T], out: &mut [T], shape: &[usize], f: F)
where
    T: QuantElement,
    F: Fn(T) -> T,
{
    let len = element_count(shape);
    for (out_value, &value) in out[..len].iter_mut().zip(&data[..len]) {
        *out_value = f(value);
    }
}

/// `out[i] = max(data[i], 0)` over `product(shape)` elements.
pub fn relu<T: QuantElement>(data: &[T], out: &mut [T], shape: &[usize]) {
    map_elementwise(data, out, shape, |value| {
        Activation::Relu.apply_element(value)
    });
}

/// ReLU over a buffer that is both input and output.
pub fn relu_in_place<T: QuantElement>(values: &mut [T], shape: &[usize]) {
    let len = element_count(shape);
    Activation::Relu.apply_in_place(&mut values[..len]);
}

/// Validates the shape against both buffers, then runs [`relu`].
pub fn try_relu<T: QuantElement>(data: &[T], out: &mut [T], shape: &[usize]) -> KernelResult<()> {
    check_elementwise_buffers(data.len(), out.len(), shape)?;
    relu(data, out, shape);
    Ok(())
}

pub(crate) fn check_elementwise_buffers(
    data_len: usize,
    out_len: usize,
    shape: &[usize],
) -> KernelResult<()> {
    let len = checked_element_count(shape)?;
    check_len("data", len, data_len)?;
    check_len("output", len, out_len)
}
