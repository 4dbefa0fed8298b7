// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tabpipe_core::diagnostic::file as diagnostic;
use tabpipe_core::{Dataset, Error, HeaderContext, Row};
use tracing::instrument;

use super::StageContext;
use crate::file::{FileSet, LoadState, TabulatedFile};
use crate::validity::Validity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeMode {
	Sequential,
	Random,
}

/// Extends every source row with a row of the target file, paired by
/// position.
///
/// The build phase materializes the target's selected columns into an array
/// at least as long as the source, repeating the target's rows round-robin
/// when it is shorter; random mode shuffles that array once. The apply
/// phase pairs by global row index, so chunking never changes which target
/// row a source row receives.
#[derive(Debug, Clone)]
pub struct Merge {
	pub file: Arc<TabulatedFile>,
	pub columns: Vec<String>,
	pub mode: MergeMode,
}

impl Merge {
	pub fn header_effect(&self, headers: &HeaderContext) -> HeaderContext {
		headers.appended(self.columns.iter().cloned())
	}

	#[instrument(name = "transform::merge", level = "trace", skip_all)]
	pub fn apply(&self, rows: Dataset, ctx: &StageContext<'_>) -> crate::Result<Dataset> {
		if self.columns.is_empty() || rows.is_empty() {
			return Ok(rows);
		}
		let target: Vec<Row> = self
			.file
			.with_data(|data| data.iter().map(|row| row.project(&self.columns)).collect())
			.ok_or_else(|| Error(diagnostic::not_loaded(self.file.name())))?;
		if target.is_empty() {
			return Err(Error(diagnostic::not_loaded(self.file.name())));
		}

		let mut materialized: Vec<Row> =
			(0..rows.len()).map(|i| target[i % target.len()].clone()).collect();
		if self.mode == MergeMode::Random {
			materialized.shuffle(&mut rand::thread_rng());
		}

		ctx.pool.chunked(rows, |offset, chunk| {
			Ok(chunk.into_iter()
				.enumerate()
				.map(|(local, mut row)| {
					row.extend(&materialized[offset + local]);
					row
				})
				.collect())
		})
	}

	pub fn validity(&self, _headers: &HeaderContext, files: &FileSet) -> Validity {
		if !files.contains(self.file.id()) {
			return Validity::invalid(format!("file '{}' is no longer part of the pipeline", self.file.name()));
		}
		for column in &self.columns {
			if !self.file.headers().contains(column) {
				return Validity::invalid(format!(
					"file '{}' has no column '{}'",
					self.file.name(),
					column
				));
			}
		}
		if self.file.state() != LoadState::Loaded {
			return Validity::invalid(format!("file '{}' is not loaded yet", self.file.name()));
		}
		if self.columns.is_empty() {
			return Validity::warning("no columns selected, the stage will be skipped");
		}
		if self.file.with_data(|data| data.is_empty()).unwrap_or(true) {
			return Validity::invalid(format!("file '{}' has no rows to merge", self.file.name()));
		}
		Validity::Valid
	}

	pub fn describe(&self) -> String {
		let mode = match self.mode {
			MergeMode::Sequential => "sequentially",
			MergeMode::Random => "randomly",
		};
		format!("merge {} columns of {} {}", self.columns.len(), self.file.name(), mode)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;
	use std::sync::Arc;

	use tabpipe_core::Row;

	use super::{Merge, MergeMode, StageContext};
	use crate::execute::ComputePool;
	use crate::file::{FileSet, TabulatedFile};

	fn target() -> Arc<TabulatedFile> {
		let file = TabulatedFile::open("colors.csv", vec!["color".to_string(), "hex".to_string()]).unwrap();
		file.supply(vec![
			vec!["red".to_string(), "#f00".to_string()],
			vec!["green".to_string(), "#0f0".to_string()],
		])
		.unwrap();
		file
	}

	fn source(n: usize) -> Vec<Row> {
		(0..n).map(|i| Row::from_pairs([("i", i.to_string())])).collect()
	}

	fn merge(mode: MergeMode) -> (Merge, FileSet) {
		let file = target();
		let mut files = FileSet::new();
		files.add(file.clone());
		let merge = Merge {
			file,
			columns: vec!["color".to_string()],
			mode,
		};
		(merge, files)
	}

	#[test]
	fn test_sequential_pairs_by_modulo() {
		let pool = ComputePool::with_threads(3);
		let (merge, files) = merge(MergeMode::Sequential);
		let ctx = StageContext {
			pool: &pool,
			files: &files,
		};
		let out = merge.apply(source(5), &ctx).unwrap();
		let colors: Vec<_> = out.iter().map(|r| r.get("color").unwrap()).collect();
		assert_eq!(colors, vec!["red", "green", "red", "green", "red"]);
		// only the selected column is taken over
		assert!(out[0].get("hex").is_none());
	}

	#[test]
	fn test_random_keeps_the_multiset() {
		let pool = ComputePool::with_threads(2);
		let (merge, files) = merge(MergeMode::Random);
		let ctx = StageContext {
			pool: &pool,
			files: &files,
		};
		let out = merge.apply(source(6), &ctx).unwrap();
		let mut histogram: HashMap<&str, usize> = HashMap::new();
		for row in &out {
			*histogram.entry(row.get("color").unwrap()).or_default() += 1;
		}
		assert_eq!(histogram.get("red"), Some(&3));
		assert_eq!(histogram.get("green"), Some(&3));
	}

	#[test]
	fn test_no_selected_columns_passes_through() {
		let pool = ComputePool::with_threads(2);
		let (mut merge, files) = merge(MergeMode::Sequential);
		merge.columns.clear();
		let ctx = StageContext {
			pool: &pool,
			files: &files,
		};
		let out = merge.apply(source(3), &ctx).unwrap();
		assert_eq!(out, source(3));
		assert!(matches!(merge.validity(&Default::default(), &files), crate::Validity::Warning(_)));
	}
}
