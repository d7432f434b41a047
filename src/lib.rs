//! Fixed-point 8-bit tensor kernels for inference runtimes.
//!
//! This library provides quantized 2-D convolution (plain, fused with ReLU, fused
//! with bias and ReLU), a fully-connected layer, and elementwise ReLU and
//! requantization over caller-owned buffers. Products are accumulated in `i32` and
//! narrowed back to 8 bits with saturation. Shapes travel separately from the
//! buffers, in [`Conv2dParams`], [`DenseParams`], or an extent slice.

pub mod activation;
pub mod benchmarks;
pub mod element;
pub mod errors;
pub mod kernels;
pub mod parallel;
pub mod params;

pub use activation::{Activation, Epilogue};
pub use element::QuantElement;
pub use kernels::{
    RequantizeParams, conv2d, conv2d_with_epilogue, dense, fused_conv2d_bias_relu,
    fused_conv2d_relu, map_elementwise, relu, relu_in_place, requantize,
    try_conv2d_with_epilogue, try_dense, try_relu, try_requantize,
};
pub use parallel::{ExecConfig, conv2d_parallel, dense_parallel};
pub use params::{Conv2dParams, DenseParams, element_count};
