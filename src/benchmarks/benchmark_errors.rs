//! Error types for benchmark operations.

use thiserror::Error;

use crate::errors::{KernelError, ParallelExecError};

#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Failed to parse configuration file '{path}': {source}")]
    ConfigParseError {
        path: String,
        source: serde_json::Error,
    },

    #[error("Configuration validation error for field '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid number of executions: {value}. Must be greater than 0")]
    InvalidNumExecutions { value: u32 },

    #[error("Unknown benchmark '{name}'")]
    UnknownBenchmark { name: String },

    #[error("{failures} benchmark(s) failed")]
    SuiteFailed { failures: usize },

    #[error("Benchmark '{benchmark_name}' produced mismatching outputs")]
    OutputMismatch { benchmark_name: String },

    #[error("Invalid kernel parameters: {0}")]
    Kernel(#[from] KernelError),

    #[error("Parallel execution failed: {0}")]
    Parallel(#[from] ParallelExecError),
}

pub type BenchmarkResult<T> = Result<T, BenchmarkError>;
