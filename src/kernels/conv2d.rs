//! Grouped, padded, strided 2-D convolution over 8-bit operands.
//!
//! Each output element `(n, o, oh, ow)` reduces over the input channels of group
//! `o / (O/G)` and over the kernel taps that land inside the input. Taps that fall in
//! the padding contribute zero, so they are skipped by clipping the tap range instead
//! of being tested one by one.

use std::ops::Range;

use crate::activation::Epilogue;
use crate::element::{QuantElement, dot};
use crate::errors::KernelResult;
use crate::params::Conv2dParams;

/// Plain convolution, saturated to the element range.
pub fn conv2d<T: QuantElement>(data: &[T], weights: &[T], out: &mut [T], params: &Conv2dParams) {
    conv2d_with_epilogue(data, weights, Epilogue::None, out, params);
}

/// Convolution with ReLU applied to the accumulator before narrowing.
pub fn fused_conv2d_relu<T: QuantElement>(
    data: &[T],
    weights: &[T],
    out: &mut [T],
    params: &Conv2dParams,
) {
    conv2d_with_epilogue(data, weights, Epilogue::Relu, out, params);
}

/// Convolution with a per-output-channel bias and ReLU applied before narrowing.
pub fn fused_conv2d_bias_relu<T: QuantElement>(
    data: &[T],
    weights: &[T],
    bias: &[T],
    out: &mut [T],
    params: &Conv2dParams,
) {
    conv2d_with_epilogue(data, weights, Epilogue::BiasRelu(bias), out, params);
}

/// Convolution followed by `epilogue`, writing the whole `(N, O, Ho, Wo)` output.
///
/// Shapes are not validated; slice indexing panics if a buffer is shorter than
/// `params` implies. Use [`try_conv2d_with_epilogue`] for a checked call.
pub fn conv2d_with_epilogue<T: QuantElement>(
    data: &[T],
    weights: &[T],
    epilogue: Epilogue<'_, T>,
    out: &mut [T],
    params: &Conv2dParams,
) {
    let output_len = params.output_len();
    conv2d_planes(data, weights, epilogue, &mut out[..output_len], 0, params);
}

/// Validates `params` and every buffer, then runs [`conv2d_with_epilogue`].
pub fn try_conv2d_with_epilogue<T: QuantElement>(
    data: &[T],
    weights: &[T],
    epilogue: Epilogue<'_, T>,
    out: &mut [T],
    params: &Conv2dParams,
) -> KernelResult<()> {
    params.validate_buffers::<T>(
        data.len(),
        weights.len(),
        epilogue.bias().map(<[T]>::len),
        out.len(),
    )?;
    conv2d_with_epilogue(data, weights, epilogue, out, params);
    Ok(())
}

/// Computes a run of consecutive `(n, o)` output planes.
///
/// `out` holds whole planes, the first of which is plane number `first_plane` in
/// `n * O + o` order. Splitting the output on plane boundaries is what lets the
/// parallel dispatcher hand disjoint slices to each worker.
pub(crate) fn conv2d_planes<T: QuantElement>(
    data: &[T],
    weights: &[T],
    epilogue: Epilogue<'_, T>,
    out: &mut [T],
    first_plane: usize,
    params: &Conv2dParams,
) {
    let plane_len = params.plane_len();
    if plane_len == 0 {
        return;
    }

    let out_width = params.out_width();
    let in_plane_len = params.in_height * params.in_width;
    let kernel_len = params.kernel_height * params.kernel_width;
    let batch_len = params.in_channels * in_plane_len;

    for (plane_offset, out_plane) in out.chunks_exact_mut(plane_len).enumerate() {
        let plane = first_plane + plane_offset;
        let n = plane / params.out_channels;
        let o = plane % params.out_channels;

        let channels = params.group_channels(params.group_of(o));
        let batch_data = &data[n * batch_len..][..batch_len];
        let filter = &weights[o * params.reduction_len()..][..params.reduction_len()];

        for (oh, out_row) in out_plane.chunks_exact_mut(out_width).enumerate() {
            let origin_h = (oh * params.stride_height) as isize - params.pad_top as isize;
            let taps_h = valid_taps(origin_h, params.in_height, params.kernel_height);

            for (ow, out_value) in out_row.iter_mut().enumerate() {
                let origin_w = (ow * params.stride_width) as isize - params.pad_left as isize;
                let taps_w = valid_taps(origin_w, params.in_width, params.kernel_width);

                let mut acc = 0i32;
                if !taps_w.is_empty() {
                    for (group_channel, channel) in channels.clone().enumerate() {
                        let channel_data = &batch_data[channel * in_plane_len..][..in_plane_len];
                        let channel_filter = &filter[group_channel * kernel_len..][..kernel_len];

                        for kh in taps_h.clone() {
                            let ih = (origin_h + kh as isize) as usize;
                            let iw = (origin_w + taps_w.start as isize) as usize;
                            let input_run = &channel_data[ih * params.in_width + iw..]
                                [..taps_w.len()];
                            let filter_run = &channel_filter[kh * params.kernel_width..]
                                [taps_w.clone()];
                            acc += dot(input_run, filter_run);
                        }
                    }
                }

                *out_value = epilogue.finish(o, acc);
            }
        }
    }
}

/// Kernel taps `k` for which `origin + k` lies in `[0, extent)`.
#[inline(always)]
fn valid_taps(origin: isize, extent: usize, kernel: usize) -> Range<usize> {
    let start = (-origin).clamp(0, kernel as isize) as usize;
    let end = (extent as isize - origin).clamp(0, kernel as isize) as usize;
    start..end.max(start)
}
