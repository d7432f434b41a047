//! Convolution engine tests against an independent direct-sum reference.

use qnn_kernels::benchmarks::pattern_buffer;
use qnn_kernels::{
    Conv2dParams, Epilogue, QuantElement, conv2d, conv2d_with_epilogue, fused_conv2d_bias_relu,
    fused_conv2d_relu, relu, try_conv2d_with_epilogue,
};

/// Unsaturated accumulators of a grouped, padded, strided convolution, in `i64`.
fn reference_accumulators<T: QuantElement>(
    data: &[T],
    weights: &[T],
    p: &Conv2dParams,
) -> Vec<i64> {
    let out_h = p.out_height();
    let out_w = p.out_width();
    let cpg = p.in_channels / p.groups;
    let opg = p.out_channels / p.groups;
    let mut acc = vec![0i64; p.batch * p.out_channels * out_h * out_w];

    for n in 0..p.batch {
        for o in 0..p.out_channels {
            let g = o / opg;
            for oh in 0..out_h {
                for ow in 0..out_w {
                    let mut sum = 0i64;
                    for ci in 0..cpg {
                        let c = g * cpg + ci;
                        for kh in 0..p.kernel_height {
                            for kw in 0..p.kernel_width {
                                let ih = (oh * p.stride_height + kh) as i64 - p.pad_top as i64;
                                let iw = (ow * p.stride_width + kw) as i64 - p.pad_left as i64;
                                if ih < 0
                                    || iw < 0
                                    || ih >= p.in_height as i64
                                    || iw >= p.in_width as i64
                                {
                                    continue;
                                }
                                let d = data[((n * p.in_channels + c) * p.in_height
                                    + ih as usize)
                                    * p.in_width
                                    + iw as usize];
                                let w = weights[((o * cpg + ci) * p.kernel_height + kh)
                                    * p.kernel_width
                                    + kw];
                                sum += d.widen() as i64 * w.widen() as i64;
                            }
                        }
                    }
                    acc[((n * p.out_channels + o) * out_h + oh) * out_w + ow] = sum;
                }
            }
        }
    }
    acc
}

fn saturate_all<T: QuantElement>(acc: &[i64]) -> Vec<T> {
    acc.iter()
        .map(|&v| T::saturate(v.clamp(i32::MIN as i64, i32::MAX as i64) as i32))
        .collect()
}

fn output_shape(p: &Conv2dParams) -> [usize; 4] {
    [p.batch, p.out_channels, p.out_height(), p.out_width()]
}

#[test]
fn plain_conv_matches_naive_triple_loop() {
    let p = Conv2dParams::new(2, 3, 6, 5, 4, 3, 2);
    let data: Vec<u8> = pattern_buffer(p.input_len(), 1, 0, 5);
    let weights: Vec<u8> = pattern_buffer(p.weight_len(), 2, 0, 3);

    // Plain triple loop over (output element, input channel, kernel tap).
    let (out_h, out_w) = (p.out_height(), p.out_width());
    let mut expected = vec![0u8; p.output_len()];
    for (index, value) in expected.iter_mut().enumerate() {
        let ow = index % out_w;
        let oh = (index / out_w) % out_h;
        let o = (index / (out_w * out_h)) % p.out_channels;
        let n = index / (out_w * out_h * p.out_channels);
        let mut sum = 0i32;
        for c in 0..p.in_channels {
            for kh in 0..p.kernel_height {
                for kw in 0..p.kernel_width {
                    let d = data[((n * p.in_channels + c) * p.in_height + oh + kh) * p.in_width
                        + ow
                        + kw];
                    let w = weights[((o * p.in_channels + c) * p.kernel_height + kh)
                        * p.kernel_width
                        + kw];
                    sum += d as i32 * w as i32;
                }
            }
        }
        *value = sum.clamp(0, 255) as u8;
    }

    let mut out = vec![0u8; p.output_len()];
    conv2d(&data, &weights, &mut out, &p);
    assert_eq!(out, expected);
}

#[test]
fn grouped_conv_with_asymmetric_padding_and_stride_matches_reference() {
    let cases = [
        Conv2dParams::new(2, 6, 7, 5, 4, 3, 2)
            .with_groups(2)
            .with_padding(2, 0, 1, 3)
            .with_stride(2, 1),
        Conv2dParams::new(1, 6, 5, 6, 9, 2, 3)
            .with_groups(3)
            .with_padding(0, 1, 2, 0)
            .with_stride(1, 2),
        // Depthwise: one input channel per group.
        Conv2dParams::new(1, 4, 4, 4, 4, 3, 3)
            .with_groups(4)
            .with_padding(1, 1, 1, 1),
    ];

    for p in cases {
        let data: Vec<i8> = pattern_buffer(p.input_len(), 3, -3, 3);
        let weights: Vec<i8> = pattern_buffer(p.weight_len(), 4, -2, 2);
        let expected = saturate_all::<i8>(&reference_accumulators(&data, &weights, &p));

        let mut out = vec![0i8; p.output_len()];
        conv2d(&data, &weights, &mut out, &p);
        assert_eq!(out, expected, "mismatch for {:?}", p);
    }
}

#[test]
fn fused_relu_matches_relu_after_conv() {
    let p = Conv2dParams::new(2, 4, 6, 6, 6, 3, 3)
        .with_groups(2)
        .with_padding(1, 0, 0, 1);
    let data: Vec<i8> = pattern_buffer(p.input_len(), 5, -4, 4);
    let weights: Vec<i8> = pattern_buffer(p.weight_len(), 6, -3, 3);

    let mut conv_out = vec![0i8; p.output_len()];
    conv2d(&data, &weights, &mut conv_out, &p);
    assert!(conv_out.iter().any(|&v| v < 0), "test data should produce negatives");
    let mut expected = vec![0i8; p.output_len()];
    relu(&conv_out, &mut expected, &output_shape(&p));

    let mut fused = vec![0i8; p.output_len()];
    fused_conv2d_relu(&data, &weights, &mut fused, &p);
    assert_eq!(fused, expected);
}

#[test]
fn fused_relu_matches_relu_after_conv_when_saturating() {
    let p = Conv2dParams::new(1, 8, 4, 4, 2, 3, 3).with_padding(1, 1, 1, 1);
    let data: Vec<i8> = pattern_buffer(p.input_len(), 7, -128, 127);
    let weights: Vec<i8> = pattern_buffer(p.weight_len(), 8, -128, 127);

    let mut conv_out = vec![0i8; p.output_len()];
    conv2d(&data, &weights, &mut conv_out, &p);
    let mut expected = vec![0i8; p.output_len()];
    relu(&conv_out, &mut expected, &output_shape(&p));

    let mut fused = vec![0i8; p.output_len()];
    fused_conv2d_relu(&data, &weights, &mut fused, &p);
    assert_eq!(fused, expected);
}

#[test]
fn fused_bias_relu_matches_relu_of_conv_plus_bias() {
    let p = Conv2dParams::new(2, 4, 5, 5, 4, 3, 3)
        .with_groups(2)
        .with_padding(1, 1, 1, 1);
    let data: Vec<i8> = pattern_buffer(p.input_len(), 9, -2, 2);
    let weights: Vec<i8> = pattern_buffer(p.weight_len(), 10, -2, 2);
    let bias: Vec<i8> = vec![20, -20, 0, 5];

    let mut conv_out = vec![0i8; p.output_len()];
    conv2d(&data, &weights, &mut conv_out, &p);

    let plane = p.plane_len();
    let biased: Vec<i8> = conv_out
        .iter()
        .enumerate()
        .map(|(i, &v)| i8::saturate(v as i32 + bias[(i / plane) % p.out_channels] as i32))
        .collect();
    let mut expected = vec![0i8; p.output_len()];
    relu(&biased, &mut expected, &output_shape(&p));

    let mut fused = vec![0i8; p.output_len()];
    fused_conv2d_bias_relu(&data, &weights, &bias, &mut fused, &p);
    assert_eq!(fused, expected);
    assert!(fused.iter().all(|&v| v >= 0));
}

/// `relu(conv2d(x) + broadcast(bias))` computed from the saturated convolution output.
fn unfused_bias_relu<T: QuantElement>(
    data: &[T],
    weights: &[T],
    bias: &[T],
    p: &Conv2dParams,
) -> Vec<T> {
    let mut conv_out = vec![T::default(); p.output_len()];
    conv2d(data, weights, &mut conv_out, p);

    let plane = p.plane_len();
    let biased: Vec<T> = conv_out
        .iter()
        .enumerate()
        .map(|(i, &v)| T::saturate(v.widen() + bias[(i / plane) % p.out_channels].widen()))
        .collect();
    let mut expected = vec![T::default(); p.output_len()];
    relu(&biased, &mut expected, &output_shape(p));
    expected
}

#[test]
fn fused_bias_relu_matches_composition_when_unsigned_conv_saturates() {
    let p = Conv2dParams::new(1, 2, 3, 3, 2, 2, 2).with_padding(1, 1, 0, 0);
    let data = vec![255u8; p.input_len()];
    let weights = vec![255u8; p.weight_len()];
    let bias: Vec<u8> = vec![0, 17];

    let mut conv_out = vec![0u8; p.output_len()];
    conv2d(&data, &weights, &mut conv_out, &p);
    assert!(conv_out.iter().all(|&v| v == 255));

    let mut fused = vec![0u8; p.output_len()];
    fused_conv2d_bias_relu(&data, &weights, &bias, &mut fused, &p);
    assert_eq!(fused, unfused_bias_relu(&data, &weights, &bias, &p));
}

#[test]
fn fused_bias_relu_matches_composition_when_signed_conv_saturates() {
    // A 1x1 convolution of 20 * 10 saturates to 127 before a bias of -100.
    let p = Conv2dParams::new(1, 1, 1, 1, 1, 1, 1);
    let bias = vec![-100i8];
    let mut fused = vec![0i8; 1];
    fused_conv2d_bias_relu(&[20i8], &[10i8], &bias, &mut fused, &p);
    assert_eq!(fused, vec![27]);
    assert_eq!(fused, unfused_bias_relu(&[20i8], &[10i8], &bias, &p));

    // Full-range operands push accumulators past both ends of the i8 range.
    let p = Conv2dParams::new(2, 6, 5, 5, 4, 3, 3)
        .with_groups(2)
        .with_padding(1, 0, 1, 2);
    let data: Vec<i8> = pattern_buffer(p.input_len(), 11, -128, 127);
    let weights: Vec<i8> = pattern_buffer(p.weight_len(), 12, -128, 127);
    let bias: Vec<i8> = vec![-128, -60, 45, 127];

    let mut conv_out = vec![0i8; p.output_len()];
    conv2d(&data, &weights, &mut conv_out, &p);
    assert!(conv_out.iter().any(|&v| v == 127 || v == -128));

    let mut fused = vec![0i8; p.output_len()];
    fused_conv2d_bias_relu(&data, &weights, &bias, &mut fused, &p);
    assert_eq!(fused, unfused_bias_relu(&data, &weights, &bias, &p));
}

#[test]
fn grouped_conv_equals_concatenated_single_group_convs() {
    let p = Conv2dParams::new(2, 6, 5, 4, 6, 3, 3)
        .with_groups(3)
        .with_padding(1, 2, 0, 1)
        .with_stride(1, 2);
    let data: Vec<i8> = pattern_buffer(p.input_len(), 11, -3, 3);
    let weights: Vec<i8> = pattern_buffer(p.weight_len(), 12, -3, 3);

    let mut grouped = vec![0i8; p.output_len()];
    conv2d(&data, &weights, &mut grouped, &p);

    let cpg = p.in_channels_per_group();
    let opg = p.out_channels_per_group();
    let in_plane = p.in_height * p.in_width;
    let out_plane = p.plane_len();
    let sub = Conv2dParams {
        in_channels: cpg,
        out_channels: opg,
        groups: 1,
        ..p
    };

    let mut concatenated = vec![0i8; p.output_len()];
    for g in 0..p.groups {
        let mut sub_data = Vec::with_capacity(sub.input_len());
        for n in 0..p.batch {
            let start = (n * p.in_channels + g * cpg) * in_plane;
            sub_data.extend_from_slice(&data[start..start + cpg * in_plane]);
        }
        let sub_weights = &weights[g * opg * p.reduction_len()..(g + 1) * opg * p.reduction_len()];

        let mut sub_out = vec![0i8; sub.output_len()];
        conv2d(&sub_data, sub_weights, &mut sub_out, &sub);

        for n in 0..p.batch {
            let src = &sub_out[n * opg * out_plane..(n + 1) * opg * out_plane];
            let dst_start = (n * p.out_channels + g * opg) * out_plane;
            concatenated[dst_start..dst_start + opg * out_plane].copy_from_slice(src);
        }
    }

    assert_eq!(grouped, concatenated);
}

#[test]
fn identity_kernel_reproduces_input() {
    let p = Conv2dParams::new(1, 1, 3, 3, 1, 3, 3).with_padding(1, 1, 1, 1);
    let data = vec![1u8; 9];
    let weights: Vec<u8> = vec![0, 0, 0, 0, 1, 0, 0, 0, 0];

    let mut out = vec![0u8; p.output_len()];
    conv2d(&data, &weights, &mut out, &p);
    assert_eq!(out, data);

    let ramp: Vec<u8> = (1..=9).collect();
    conv2d(&ramp, &weights, &mut out, &p);
    assert_eq!(out, ramp);
}

#[test]
fn zero_weights_yield_zero_or_bias() {
    let p = Conv2dParams::new(2, 4, 5, 5, 4, 3, 3)
        .with_groups(2)
        .with_padding(0, 1, 2, 1)
        .with_stride(2, 2);
    let data: Vec<i8> = pattern_buffer(p.input_len(), 13, -128, 127);
    let weights = vec![0i8; p.weight_len()];
    let bias: Vec<i8> = vec![7, -7, 127, -128];

    let mut out = vec![1i8; p.output_len()];
    conv2d(&data, &weights, &mut out, &p);
    assert!(out.iter().all(|&v| v == 0));

    fused_conv2d_bias_relu(&data, &weights, &bias, &mut out, &p);
    let plane = p.plane_len();
    for (i, &v) in out.iter().enumerate() {
        let expected = bias[(i / plane) % p.out_channels].max(0);
        assert_eq!(v, expected, "output {}", i);
    }

    let bias_u8: Vec<u8> = vec![3, 0, 255, 9];
    let data_u8: Vec<u8> = pattern_buffer(p.input_len(), 14, 0, 255);
    let weights_u8 = vec![0u8; p.weight_len()];
    let mut out_u8 = vec![0u8; p.output_len()];
    fused_conv2d_bias_relu(&data_u8, &weights_u8, &bias_u8, &mut out_u8, &p);
    for (i, &v) in out_u8.iter().enumerate() {
        assert_eq!(v, bias_u8[(i / plane) % p.out_channels]);
    }
}

#[test]
fn narrowing_saturates_instead_of_wrapping() {
    let p = Conv2dParams::new(1, 2, 3, 3, 1, 3, 3);
    let mut out = vec![0u8; 1];

    conv2d(&vec![255u8; 18], &vec![255u8; 18], &mut out, &p);
    assert_eq!(out, vec![255]);

    let mut out_i8 = vec![0i8; 1];
    let data = vec![127i8; 18];
    let weights = vec![-128i8; 18];
    conv2d(&data, &weights, &mut out_i8, &p);
    assert_eq!(out_i8, vec![-128]);

    fused_conv2d_relu(&data, &weights, &mut out_i8, &p);
    assert_eq!(out_i8, vec![0]);

    conv2d(&data, &vec![127i8; 18], &mut out_i8, &p);
    assert_eq!(out_i8, vec![127]);
}

#[test]
fn window_entirely_in_padding_contributes_zero() {
    // Padding of 3 with a 2x2 kernel leaves corner windows that never touch the input.
    let p = Conv2dParams::new(1, 1, 2, 2, 1, 2, 2).with_padding(3, 3, 3, 3);
    let data = vec![5u8; 4];
    let weights = vec![1u8; 4];
    let bias = vec![4u8];

    let mut out = vec![9u8; p.output_len()];
    conv2d(&data, &weights, &mut out, &p);
    assert_eq!(p.out_height(), 7);
    assert_eq!(out[0], 0);
    // The centre window covers the whole input.
    assert_eq!(out[3 * 7 + 3], 20);

    fused_conv2d_bias_relu(&data, &weights, &bias, &mut out, &p);
    assert_eq!(out[0], 4);
    assert_eq!(out[3 * 7 + 3], 24);
}

#[test]
fn checked_call_matches_unchecked_call() {
    let p = Conv2dParams::new(1, 4, 6, 6, 2, 3, 3)
        .with_groups(2)
        .with_padding(1, 1, 1, 1);
    let data: Vec<u8> = pattern_buffer(p.input_len(), 15, 0, 4);
    let weights: Vec<u8> = pattern_buffer(p.weight_len(), 16, 0, 4);
    let bias: Vec<u8> = vec![1, 2];

    let mut unchecked = vec![0u8; p.output_len()];
    conv2d_with_epilogue(&data, &weights, Epilogue::BiasRelu(&bias), &mut unchecked, &p);

    let mut checked = vec![0u8; p.output_len()];
    try_conv2d_with_epilogue(&data, &weights, Epilogue::BiasRelu(&bias), &mut checked, &p)
        .expect("valid arguments should be accepted");
    assert_eq!(checked, unchecked);
}
