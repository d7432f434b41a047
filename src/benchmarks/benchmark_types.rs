//! Benchmark type definitions and configuration structures.

use serde::{Deserialize, Serialize};

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use crate::activation::Epilogue;
use crate::params::{Conv2dParams, DenseParams, checked_element_count};

/// Which fused epilogue a convolution benchmark runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpilogueKind {
    #[default]
    None,
    Relu,
    BiasRelu,
}

impl EpilogueKind {
    /// Builds the epilogue, borrowing `bias` only for the bias variant.
    pub fn epilogue<'a, T>(self, bias: &'a [T]) -> Epilogue<'a, T> {
        match self {
            EpilogueKind::None => Epilogue::None,
            EpilogueKind::Relu => Epilogue::Relu,
            EpilogueKind::BiasRelu => Epilogue::BiasRelu(bias),
        }
    }
}

/// Configuration for the convolution benchmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conv2dBenchConfig {
    pub name: String,
    pub description: String,
    pub params: Conv2dParams,
    #[serde(default)]
    pub epilogue: EpilogueKind,
    pub num_executions: u32,
    #[serde(default)]
    pub threads: Option<usize>,
}

/// Configuration for the dense layer benchmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseBenchConfig {
    pub name: String,
    pub description: String,
    pub params: DenseParams,
    pub num_executions: u32,
    #[serde(default)]
    pub threads: Option<usize>,
}

/// Configuration for the elementwise ReLU benchmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReluBenchConfig {
    pub name: String,
    pub description: String,
    pub shape: Vec<usize>,
    pub num_executions: u32,
}

/// Enum representing all available benchmark types
#[derive(Debug, Clone)]
pub enum BenchmarkConfig {
    Conv2d(Conv2dBenchConfig),
    Dense(DenseBenchConfig),
    Relu(ReluBenchConfig),
}

impl Default for Conv2dBenchConfig {
    fn default() -> Self {
        Self {
            name: "conv2d".to_string(),
            description: "Grouped 3x3 convolution with bias and ReLU".to_string(),
            params: Conv2dParams::new(4, 32, 28, 28, 64, 3, 3)
                .with_groups(2)
                .with_padding(1, 1, 1, 1),
            epilogue: EpilogueKind::BiasRelu,
            num_executions: 50,
            threads: None,
        }
    }
}

impl Default for DenseBenchConfig {
    fn default() -> Self {
        Self {
            name: "dense".to_string(),
            description: "Fully-connected layer".to_string(),
            params: DenseParams::new(64, 1024, 512),
            num_executions: 100,
            threads: None,
        }
    }
}

impl Default for ReluBenchConfig {
    fn default() -> Self {
        Self {
            name: "relu".to_string(),
            description: "Elementwise ReLU over a 4-D tensor".to_string(),
            shape: vec![8, 64, 56, 56],
            num_executions: 200,
        }
    }
}

fn validate_num_executions(value: u32) -> BenchmarkResult<()> {
    if value == 0 {
        return Err(BenchmarkError::InvalidNumExecutions { value });
    }
    Ok(())
}

impl Conv2dBenchConfig {
    /// Validates the configuration
    pub fn validate(&self) -> BenchmarkResult<()> {
        validate_num_executions(self.num_executions)?;
        self.params.validate::<u8>()?;
        Ok(())
    }
}

impl DenseBenchConfig {
    /// Validates the configuration
    pub fn validate(&self) -> BenchmarkResult<()> {
        validate_num_executions(self.num_executions)?;
        self.params.validate::<u8>()?;
        Ok(())
    }
}

impl ReluBenchConfig {
    /// Validates the configuration
    pub fn validate(&self) -> BenchmarkResult<()> {
        validate_num_executions(self.num_executions)?;
        if checked_element_count(&self.shape)? == 0 {
            return Err(BenchmarkError::ConfigValidationError {
                field: "shape".to_string(),
                message: "Shape must describe at least one element".to_string(),
            });
        }
        Ok(())
    }
}

impl BenchmarkConfig {
    /// Gets the benchmark name
    pub fn name(&self) -> &str {
        match self {
            BenchmarkConfig::Conv2d(config) => &config.name,
            BenchmarkConfig::Dense(config) => &config.name,
            BenchmarkConfig::Relu(config) => &config.name,
        }
    }

    /// Gets the benchmark description
    pub fn description(&self) -> &str {
        match self {
            BenchmarkConfig::Conv2d(config) => &config.description,
            BenchmarkConfig::Dense(config) => &config.description,
            BenchmarkConfig::Relu(config) => &config.description,
        }
    }

    /// Gets the number of executions
    pub fn num_executions(&self) -> u32 {
        match self {
            BenchmarkConfig::Conv2d(config) => config.num_executions,
            BenchmarkConfig::Dense(config) => config.num_executions,
            BenchmarkConfig::Relu(config) => config.num_executions,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> BenchmarkResult<()> {
        match self {
            BenchmarkConfig::Conv2d(config) => config.validate(),
            BenchmarkConfig::Dense(config) => config.validate(),
            BenchmarkConfig::Relu(config) => config.validate(),
        }
    }
}

/// Performance measurement structure
#[derive(Debug, Clone)]
pub struct PerformanceResults {
    pub method: String,
    pub total_time_ns: u128,
    pub average_time_ns: u128,
    pub average_time_ms: f64,
    pub num_executions: u32,
    /// Output elements written per execution, used for throughput.
    pub elements: usize,
}

impl PerformanceResults {
    pub fn new(method: String, total_time_ns: u128, num_executions: u32, elements: usize) -> Self {
        let average_time_ns = total_time_ns / num_executions.max(1) as u128;
        let average_time_ms = average_time_ns as f64 / 1_000_000.0;

        Self {
            method,
            total_time_ns,
            average_time_ns,
            average_time_ms,
            num_executions,
            elements,
        }
    }

    pub fn speedup_over(&self, baseline: &PerformanceResults) -> f64 {
        baseline.average_time_ns as f64 / self.average_time_ns.max(1) as f64
    }

    /// Output elements per second.
    pub fn throughput(&self) -> f64 {
        self.elements as f64 * 1e9 / self.average_time_ns.max(1) as f64
    }
}
