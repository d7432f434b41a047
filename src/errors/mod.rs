//! Error types for the kernel library.
//!
//! The unchecked kernels never return errors. These types belong to the validated
//! entry points and to the parallel dispatcher, which check shapes and buffer
//! lengths before handing slices to the hot loops.

mod kernel_error;
mod parallel_exec_error;

pub use kernel_error::KernelError;
pub use parallel_exec_error::ParallelExecError;

/// Result type alias for validated kernel calls.
pub type KernelResult<T> = std::result::Result<T, KernelError>;

/// Result type alias for parallel kernel dispatch.
pub type ParallelExecResult<T> = std::result::Result<T, ParallelExecError>;
