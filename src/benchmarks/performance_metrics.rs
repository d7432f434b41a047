//! Performance measurement utilities for benchmarks.

use super::benchmark_types::PerformanceResults;
use crate::element::QuantElement;
use log::{info, warn};
use std::time::Instant;

/// Benchmark execution function that measures performance
pub fn benchmark_method<F>(
    name: &str,
    num_executions: u32,
    elements: usize,
    mut benchmark_fn: F,
) -> PerformanceResults
where
    F: FnMut(),
{
    info!("Benchmarking {} ({} executions)...", name, num_executions);

    // Warm-up runs so caches and thread stacks are primed before timing
    for _ in 0..3 {
        benchmark_fn();
    }

    let progress_step = (num_executions / 10).max(1);
    let start = Instant::now();
    for i in 0..num_executions {
        benchmark_fn();
        if (i + 1) % progress_step == 0 {
            info!("  Progress: {}/{}", i + 1, num_executions);
        }
    }
    let duration = start.elapsed();

    PerformanceResults::new(
        name.to_string(),
        duration.as_nanos(),
        num_executions,
        elements,
    )
}

/// Prints detailed performance analysis. The first result is the baseline.
pub fn print_performance_analysis(results: &[PerformanceResults]) {
    let Some(baseline) = results.first() else {
        return;
    };

    println!("\n{}", "=".repeat(80));
    println!("Detailed Results");
    println!("{}", "=".repeat(80));

    for result in results {
        println!("\n{}", result.method);
        println!(
            "   Average time: {:.3} ms ({} ns)",
            result.average_time_ms, result.average_time_ns
        );
        println!(
            "   Total time: {:.3} ms",
            result.total_time_ns as f64 / 1_000_000.0
        );
        println!("   Executions: {}", result.num_executions);
        println!(
            "   Throughput: {:.1} M outputs/s",
            result.throughput() / 1_000_000.0
        );

        if result.method != baseline.method {
            println!(
                "   Speedup vs {}: {:.2}x",
                baseline.method,
                result.speedup_over(baseline)
            );
        }
    }

    println!("\n{}", "=".repeat(80));
    println!("Speed Rankings (fastest to slowest)");
    println!("{}", "=".repeat(80));

    let mut sorted_results = results.to_vec();
    sorted_results.sort_by_key(|r| r.average_time_ns);
    for (i, result) in sorted_results.iter().enumerate() {
        println!(
            "   {}. {}: {:.3} ms",
            i + 1,
            result.method,
            result.average_time_ms
        );
    }
}

/// Verifies that two quantized outputs are identical element for element.
pub fn verify_outputs_match<T: QuantElement>(expected: &[T], actual: &[T]) -> bool {
    if expected.len() != actual.len() {
        warn!(
            "Output length mismatch: expected {}, got {}",
            expected.len(),
            actual.len()
        );
        return false;
    }
    match expected.iter().zip(actual).position(|(e, a)| e != a) {
        Some(index) => {
            warn!(
                "Output mismatch at {}: expected {:?}, got {:?}",
                index, expected[index], actual[index]
            );
            false
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_outputs_match() {
        assert!(verify_outputs_match::<u8>(&[1, 2, 3], &[1, 2, 3]));
        assert!(!verify_outputs_match::<u8>(&[1, 2, 3], &[1, 2, 4]));
        assert!(!verify_outputs_match::<i8>(&[1, 2], &[1, 2, 3]));
    }

    #[test]
    fn test_benchmark_method_counts_executions() {
        let mut calls = 0u32;
        let result = benchmark_method("count", 7, 1, || calls += 1);
        // Three warm-up runs plus the timed ones.
        assert_eq!(calls, 10);
        assert_eq!(result.num_executions, 7);
    }
}
