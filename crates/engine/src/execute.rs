// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Chunked fork-join execution on a dedicated rayon pool.

use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tabpipe_core::{Dataset, Row};

/// The compute pool every stage row-effect runs on.
///
/// A stage is one fork-join round: the dataset is split into `ceil(N / P)`
/// sized contiguous chunks, all chunks are processed together, and the
/// results are reassembled in original chunk order before the next stage
/// starts. An error in any chunk aborts the whole round.
pub struct ComputePool {
	pool: ThreadPool,
	threads: usize,
}

impl ComputePool {
	/// Builds a pool with one worker per available execution unit.
	pub fn new() -> Self {
		Self::with_threads(num_cpus::get())
	}

	pub fn with_threads(threads: usize) -> Self {
		let threads = threads.max(1);
		let pool = ThreadPoolBuilder::new()
			.num_threads(threads)
			.thread_name(|i| format!("tabpipe-compute-{i}"))
			.build()
			.expect("failed to build rayon pool");
		Self {
			pool,
			threads,
		}
	}

	pub fn parallelism(&self) -> usize {
		self.threads
	}

	/// Applies `effect` to every chunk of `rows` and concatenates the
	/// results in chunk order.
	///
	/// `effect` receives the global index of the chunk's first row, so a
	/// stage that pairs rows by position (Merge) sees the same pairing
	/// regardless of the parallelism degree. Chunks may shrink or keep
	/// their rows, never reorder them.
	pub fn chunked<F>(&self, rows: Dataset, effect: F) -> crate::Result<Dataset>
	where
		F: Fn(usize, Vec<Row>) -> crate::Result<Vec<Row>> + Send + Sync,
	{
		if rows.is_empty() {
			return Ok(rows);
		}
		let chunk_size = rows.len().div_ceil(self.threads);
		let chunks = partition(rows, chunk_size);
		let results: Vec<Vec<Row>> = self.pool.install(|| {
			chunks.into_par_iter()
				.enumerate()
				.map(|(index, chunk)| effect(index * chunk_size, chunk))
				.collect::<crate::Result<Vec<_>>>()
		})?;
		Ok(results.into_iter().flatten().collect())
	}

	/// Maps `f` over independent work items in parallel, preserving input
	/// order in the output. Used for per-group reduction, where membership
	/// is already resolved and items never interact.
	pub fn map_ordered<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
	where
		T: Send,
		R: Send,
		F: Fn(T) -> R + Send + Sync,
	{
		self.pool.install(|| items.into_par_iter().map(f).collect())
	}
}

impl Default for ComputePool {
	fn default() -> Self {
		Self::new()
	}
}

fn partition(mut rows: Dataset, chunk_size: usize) -> Vec<Vec<Row>> {
	let mut chunks = Vec::with_capacity(rows.len().div_ceil(chunk_size));
	while rows.len() > chunk_size {
		let rest = rows.split_off(chunk_size);
		chunks.push(rows);
		rows = rest;
	}
	chunks.push(rows);
	chunks
}
