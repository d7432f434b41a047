//! Core benchmark execution logic.

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use super::benchmark_types::{
    BenchmarkConfig, Conv2dBenchConfig, DenseBenchConfig, ReluBenchConfig,
};
use super::performance_metrics::{
    benchmark_method, print_performance_analysis, verify_outputs_match,
};
use super::test_data::pattern_buffer;
use crate::kernels::{conv2d_with_epilogue, dense, relu, relu_in_place};
use crate::parallel::{ExecConfig, conv2d_parallel, dense_parallel};
use crate::params::element_count;
use log::{error, info, warn};
use std::fs;

/// Configuration loader that handles JSON files with fallbacks
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a configuration file with fallback to defaults
    pub fn load_config<T>(path: &str, config_name: &str) -> BenchmarkResult<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse_config(path, &content),
            Err(_) => {
                warn!(
                    "Config file '{}' not found, using default configuration for {}",
                    path, config_name
                );
                Ok(T::default())
            }
        }
    }

    /// Parse configuration text read from `path`
    pub fn parse_config<T>(path: &str, content: &str) -> BenchmarkResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_str(content).map_err(|e| BenchmarkError::ConfigParseError {
            path: path.to_string(),
            source: e,
        })
    }

    pub fn load_conv2d_config() -> BenchmarkResult<Conv2dBenchConfig> {
        Self::load_config("configs/conv2d.json", "conv2d")
    }

    pub fn load_dense_config() -> BenchmarkResult<DenseBenchConfig> {
        Self::load_config("configs/dense.json", "dense")
    }

    pub fn load_relu_config() -> BenchmarkResult<ReluBenchConfig> {
        Self::load_config("configs/relu.json", "relu")
    }

    /// Load the configuration of the benchmark called `benchmark_name`
    pub fn load_benchmark_config(benchmark_name: &str) -> BenchmarkResult<BenchmarkConfig> {
        match benchmark_name {
            "conv2d" => Ok(BenchmarkConfig::Conv2d(Self::load_conv2d_config()?)),
            "dense" => Ok(BenchmarkConfig::Dense(Self::load_dense_config()?)),
            "relu" => Ok(BenchmarkConfig::Relu(Self::load_relu_config()?)),
            _ => Err(BenchmarkError::UnknownBenchmark {
                name: benchmark_name.to_string(),
            }),
        }
    }
}

fn exec_config(threads: Option<usize>) -> ExecConfig {
    match threads {
        Some(threads) => ExecConfig::new().with_threads(threads),
        None => ExecConfig::new(),
    }
}

fn print_banner(title: &str) {
    info!("{}", "=".repeat(80));
    info!("{}", title);
    info!("{}", "=".repeat(80));
}

/// Main benchmark runner
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Run all available benchmarks
    pub fn run_all_benchmarks() -> BenchmarkResult<()> {
        info!("Starting kernel benchmark suite");

        let mut failures = 0usize;
        for name in ["conv2d", "dense", "relu"] {
            if let Err(e) = Self::run_benchmark(name) {
                error!("{} benchmark failed: {}", name, e);
                failures += 1;
            }
        }

        if failures == 0 {
            info!("All benchmarks completed successfully");
            Ok(())
        } else {
            Err(BenchmarkError::SuiteFailed { failures })
        }
    }

    /// Run a specific benchmark by name
    pub fn run_benchmark(benchmark_name: &str) -> BenchmarkResult<()> {
        let config = ConfigLoader::load_benchmark_config(benchmark_name)?;
        config.validate()?;
        info!(
            "Running '{}': {} ({} executions)",
            config.name(),
            config.description(),
            config.num_executions()
        );

        match config {
            BenchmarkConfig::Conv2d(config) => Self::run_conv2d_benchmark(config),
            BenchmarkConfig::Dense(config) => Self::run_dense_benchmark(config),
            BenchmarkConfig::Relu(config) => Self::run_relu_benchmark(config),
        }
    }

    /// List available benchmarks
    pub fn list_benchmarks() {
        println!("Available benchmarks:");
        println!("  conv2d - Grouped convolution, serial vs parallel");
        println!("  dense  - Fully-connected layer, serial vs parallel");
        println!("  relu   - Elementwise ReLU, out-of-place vs in-place");
    }

    fn run_conv2d_benchmark(config: Conv2dBenchConfig) -> BenchmarkResult<()> {
        let params = config.params;

        print_banner("Convolution Performance Benchmark");
        info!(
            "N={} C={} H={} W={} -> O={} Ho={} Wo={}, groups={}, kernel={}x{}, epilogue={:?}",
            params.batch,
            params.in_channels,
            params.in_height,
            params.in_width,
            params.out_channels,
            params.out_height(),
            params.out_width(),
            params.groups,
            params.kernel_height,
            params.kernel_width,
            config.epilogue
        );

        let data = pattern_buffer::<u8>(params.input_len(), 1, 0, 3);
        let weights = pattern_buffer::<u8>(params.weight_len(), 2, 0, 2);
        let bias = pattern_buffer::<u8>(params.out_channels, 3, 0, 7);
        let epilogue = config.epilogue.epilogue(&bias);
        let exec = exec_config(config.threads);

        info!("Verifying serial and parallel outputs match...");
        let mut serial = vec![0u8; params.output_len()];
        conv2d_with_epilogue(&data, &weights, epilogue, &mut serial, &params);
        let mut parallel = vec![0u8; params.output_len()];
        conv2d_parallel(&data, &weights, epilogue, &mut parallel, &params, &exec)?;
        if !verify_outputs_match(&serial, &parallel) {
            error!("Outputs do not match - there may be an implementation bug");
            return Err(BenchmarkError::OutputMismatch {
                benchmark_name: config.name,
            });
        }
        info!("Outputs match, sample values: {:?}", &serial[..5.min(serial.len())]);

        print_banner("Performance Benchmarks");
        let elements = params.output_len();
        let mut results = Vec::new();
        results.push(benchmark_method(
            "Serial",
            config.num_executions,
            elements,
            || conv2d_with_epilogue(&data, &weights, epilogue, &mut serial, &params),
        ));
        let mut parallel_error = None;
        results.push(benchmark_method(
            &format!("Parallel ({} threads)", exec.get_threads()),
            config.num_executions,
            elements,
            || {
                let result =
                    conv2d_parallel(&data, &weights, epilogue, &mut parallel, &params, &exec);
                if let Err(e) = result {
                    parallel_error = Some(e);
                }
            },
        ));
        if let Some(e) = parallel_error {
            return Err(e.into());
        }

        print_performance_analysis(&results);
        Ok(())
    }

    fn run_dense_benchmark(config: DenseBenchConfig) -> BenchmarkResult<()> {
        let params = config.params;

        print_banner("Dense Layer Performance Benchmark");
        info!(
            "B={} I={} O={}",
            params.batch, params.in_features, params.out_features
        );

        let data = pattern_buffer::<u8>(params.input_len(), 4, 0, 3);
        let weight = pattern_buffer::<u8>(params.weight_len(), 5, 0, 3);
        let exec = exec_config(config.threads);

        info!("Verifying serial and parallel outputs match...");
        let mut serial = vec![0u8; params.output_len()];
        dense(&data, &weight, &mut serial, &params);
        let mut parallel = vec![0u8; params.output_len()];
        dense_parallel(&data, &weight, &mut parallel, &params, &exec)?;
        if !verify_outputs_match(&serial, &parallel) {
            error!("Outputs do not match - there may be an implementation bug");
            return Err(BenchmarkError::OutputMismatch {
                benchmark_name: config.name,
            });
        }

        print_banner("Performance Benchmarks");
        let elements = params.output_len();
        let mut results = Vec::new();
        results.push(benchmark_method(
            "Serial",
            config.num_executions,
            elements,
            || dense(&data, &weight, &mut serial, &params),
        ));
        let mut parallel_error = None;
        results.push(benchmark_method(
            &format!("Parallel ({} threads)", exec.get_threads()),
            config.num_executions,
            elements,
            || {
                if let Err(e) = dense_parallel(&data, &weight, &mut parallel, &params, &exec) {
                    parallel_error = Some(e);
                }
            },
        ));
        if let Some(e) = parallel_error {
            return Err(e.into());
        }

        print_performance_analysis(&results);
        Ok(())
    }

    fn run_relu_benchmark(config: ReluBenchConfig) -> BenchmarkResult<()> {
        let shape = config.shape.as_slice();
        let len = element_count(shape);

        print_banner("Elementwise ReLU Performance Benchmark");
        info!("shape={:?} ({} elements)", shape, len);

        let data = pattern_buffer::<i8>(len, 6, -64, 63);

        info!("Verifying out-of-place and in-place outputs match...");
        let mut out_of_place = vec![0i8; len];
        relu(&data, &mut out_of_place, shape);
        let mut in_place = data.clone();
        relu_in_place(&mut in_place, shape);
        if !verify_outputs_match(&out_of_place, &in_place) {
            error!("Outputs do not match - there may be an implementation bug");
            return Err(BenchmarkError::OutputMismatch {
                benchmark_name: config.name,
            });
        }

        print_banner("Performance Benchmarks");
        let mut results = Vec::new();
        results.push(benchmark_method(
            "Out-of-place",
            config.num_executions,
            len,
            || relu(&data, &mut out_of_place, shape),
        ));
        results.push(benchmark_method(
            "In-place",
            config.num_executions,
            len,
            || relu_in_place(&mut in_place, shape),
        ));

        print_performance_analysis(&results);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_benchmark() {
        assert!(matches!(
            BenchmarkRunner::run_benchmark("winograd"),
            Err(BenchmarkError::UnknownBenchmark { .. })
        ));
    }

    #[test]
    fn test_load_benchmark_config_by_name() {
        let config = ConfigLoader::load_benchmark_config("relu").unwrap();
        assert!(matches!(config, BenchmarkConfig::Relu(_)));
        assert!(config.validate().is_ok());
        assert!(config.num_executions() > 0);

        assert!(matches!(
            ConfigLoader::load_benchmark_config("im2col"),
            Err(BenchmarkError::UnknownBenchmark { .. })
        ));
    }

    #[test]
    fn test_parse_config_reports_path() {
        let result: BenchmarkResult<ReluBenchConfig> =
            ConfigLoader::parse_config("configs/broken.json", "{ not json");
        match result {
            Err(BenchmarkError::ConfigParseError { path, .. }) => {
                assert_eq!(path, "configs/broken.json")
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_config_falls_back_to_default() {
        let config: DenseBenchConfig =
            ConfigLoader::load_config("configs/does_not_exist.json", "dense").unwrap();
        assert_eq!(config.name, "dense");
    }
}
