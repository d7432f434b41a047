//! Multi-threaded dispatch of the convolution and dense kernels.
//!
//! The output is cut into contiguous runs of independent work units (whole `(n, o)`
//! planes for convolution, whole batch rows for dense) and each run is computed on a
//! scoped thread with its own disjoint `&mut` slice. Every output element is still
//! produced by a single accumulation, so results match the serial kernels exactly.

use std::thread;

use log::{debug, trace};

use crate::activation::Epilogue;
use crate::element::QuantElement;
use crate::errors::{ParallelExecError, ParallelExecResult};
use crate::kernels::conv2d::conv2d_planes;
use crate::kernels::dense::dense_rows;
use crate::params::{Conv2dParams, DenseParams};

#[derive(Debug, Clone, Default)]
pub struct ExecConfig {
    threads: Option<usize>,
}

impl ExecConfig {
    pub fn new() -> Self {
        Self { threads: None }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Requested thread count, or the available parallelism when none was set.
    pub fn get_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Work units per thread, or an error for a zero thread count.
fn units_per_thread(config: &ExecConfig, units: usize) -> ParallelExecResult<usize> {
    let threads = config.get_threads();
    if threads == 0 {
        return Err(ParallelExecError::InvalidThreadCount { count: 0 });
    }
    let threads = threads.min(units).max(1);
    Ok(units.div_ceil(threads).max(1))
}

/// Runs `work(first_unit, chunk)` for each chunk of `unit_len`-sized units on its own thread.
fn run_chunked<T, F>(
    out: &mut [T],
    unit_len: usize,
    units_per_chunk: usize,
    work: F,
) -> ParallelExecResult<()>
where
    T: QuantElement,
    F: Fn(usize, &mut [T]) + Sync,
{
    let chunk_len = unit_len * units_per_chunk;
    if chunk_len == 0 {
        return Ok(());
    }

    thread::scope(|scope| {
        let work = &work;
        let handles: Vec<_> = out
            .chunks_mut(chunk_len)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                let first_unit = chunk_index * units_per_chunk;
                let units = chunk.len() / unit_len;
                let handle = scope.spawn(move || {
                    trace!("computing units [{}..{})", first_unit, first_unit + units);
                    work(first_unit, chunk);
                });
                (first_unit, first_unit + units, handle)
            })
            .collect();

        let mut result = Ok(());
        for (start, end, handle) in handles {
            if handle.join().is_err() && result.is_ok() {
                result = Err(ParallelExecError::ThreadPanicked { start, end });
            }
        }

        result
    })
}

/// Validated convolution with `epilogue`, split by output planes across threads.
pub fn conv2d_parallel<T: QuantElement>(
    data: &[T],
    weights: &[T],
    epilogue: Epilogue<'_, T>,
    out: &mut [T],
    params: &Conv2dParams,
    config: &ExecConfig,
) -> ParallelExecResult<()> {
    params.validate_buffers::<T>(
        data.len(),
        weights.len(),
        epilogue.bias().map(<[T]>::len),
        out.len(),
    )?;

    let planes = params.batch * params.out_channels;
    let planes_per_thread = units_per_thread(config, planes)?;
    debug!(
        "conv2d: {} planes of {} elements, {} planes per thread",
        planes,
        params.plane_len(),
        planes_per_thread
    );

    run_chunked(out, params.plane_len(), planes_per_thread, |first_plane, chunk| {
        conv2d_planes(data, weights, epilogue, chunk, first_plane, params);
    })
}

/// Validated dense layer, split by batch rows across threads.
pub fn dense_parallel<T: QuantElement>(
    data: &[T],
    weight: &[T],
    out: &mut [T],
    params: &DenseParams,
    config: &ExecConfig,
) -> ParallelExecResult<()> {
    params.validate_buffers::<T>(data.len(), weight.len(), out.len())?;

    let rows_per_thread = units_per_thread(config, params.batch)?;
    debug!(
        "dense: {} rows of {} outputs, {} rows per thread",
        params.batch, params.out_features, rows_per_thread
    );

    run_chunked(out, params.out_features, rows_per_thread, |first_row, chunk| {
        let rows = chunk.len() / params.out_features;
        let input = &data[first_row * params.in_features..][..rows * params.in_features];
        dense_rows(input, weight, chunk, params);
    })
}
