//! Benchmark suite for kernel performance testing.
//!
//! Each benchmark loads a JSON configuration (or a built-in default), checks that
//! the serial and parallel paths produce identical output, and then times both.

pub mod benchmark_errors;
pub mod benchmark_runner;
pub mod benchmark_types;
pub mod performance_metrics;
pub mod test_data;

pub use benchmark_errors::{BenchmarkError, BenchmarkResult};
pub use benchmark_runner::{BenchmarkRunner, ConfigLoader};
pub use benchmark_types::{
    BenchmarkConfig, Conv2dBenchConfig, DenseBenchConfig, EpilogueKind, PerformanceResults,
    ReluBenchConfig,
};
pub use test_data::pattern_buffer;
