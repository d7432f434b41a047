//! Kernel benchmark CLI executable.

use log::error;
use qnn_kernels::benchmarks::{BenchmarkResult, BenchmarkRunner};
use std::env;

fn main() {
    env_logger::init();

    if let Err(e) = run_benchmarks() {
        error!("Benchmark execution failed: {}", e);
        std::process::exit(1);
    }
}

fn run_benchmarks() -> BenchmarkResult<()> {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => BenchmarkRunner::run_all_benchmarks(),
        2 => match args[1].as_str() {
            "--list" => {
                BenchmarkRunner::list_benchmarks();
                Ok(())
            }
            "--help" | "-h" => {
                print_usage();
                Ok(())
            }
            benchmark_name => BenchmarkRunner::run_benchmark(benchmark_name),
        },
        3 if args[1] == "--benchmark" => BenchmarkRunner::run_benchmark(&args[2]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("Usage:");
    println!("  cargo run --bin benchmark --release                    # Run all benchmarks");
    println!("  cargo run --bin benchmark --release -- --list         # List available benchmarks");
    println!("  cargo run --bin benchmark --release -- <benchmark>    # Run specific benchmark");
    println!("  cargo run --bin benchmark --release -- --benchmark <benchmark>");
    println!();
    println!("Configuration is read from configs/<benchmark>.json when present.");
    println!("Set RUST_LOG=info to see progress output.");
}
