//! Error types for kernel argument validation.

use thiserror::Error;

/// Errors reported by the validated kernel entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    #[error("The dimension {name} must be greater than 0")]
    ZeroDimension { name: &'static str },

    #[error("The number of groups {groups} must divide {name} ({channels})")]
    GroupsNotDivisor {
        name: &'static str,
        channels: usize,
        groups: usize,
    },

    #[error(
        "The {axis} kernel extent {kernel} exceeds the padded input extent {padded}, the output would be empty"
    )]
    EmptyOutput {
        axis: &'static str,
        padded: usize,
        kernel: usize,
    },

    #[error("The padded {axis} extent overflows usize")]
    ExtentOverflow { axis: &'static str },

    #[error(
        "The reduction length {len} exceeds the maximum {max} supported by the 32-bit accumulator"
    )]
    ReductionTooLong { len: usize, max: usize },

    #[error("The {buffer} buffer has {actual} elements, but {expected} are required")]
    BufferSizeMismatch {
        buffer: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("The element count of shape {shape:?} overflows usize")]
    ElementCountOverflow { shape: Vec<usize> },

    #[error("The {name} must be finite and greater than 0, got {value}")]
    InvalidScale { name: &'static str, value: f32 },
}
