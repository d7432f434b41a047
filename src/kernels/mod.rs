//! Kernel entry points.
//!
//! Every kernel is a stateless function over caller-owned slices. The plain entry
//! points trust their arguments; the `try_` variants validate shapes and buffer
//! lengths first and report a [`KernelError`](crate::errors::KernelError).

pub mod conv2d;
pub mod dense;
pub mod elementwise;
pub mod requantize;

pub use conv2d::{
    conv2d, conv2d_with_epilogue, fused_conv2d_bias_relu, fused_conv2d_relu,
    try_conv2d_with_epilogue,
};
pub use dense::{dense, try_dense};
pub use elementwise::{map_elementwise, relu, relu_in_place, try_relu};
pub use requantize::{RequantizeParams, requantize, try_requantize};
