//! Errors reported by the multi-threaded dispatcher.

use thiserror::Error;

use super::KernelError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParallelExecError {
    #[error("Thread count must be at least 1, got {count}")]
    InvalidThreadCount { count: usize },

    #[error("Thread panicked while computing work units [{start}..{end})")]
    ThreadPanicked { start: usize, end: usize },

    #[error(transparent)]
    Kernel(#[from] KernelError),
}
