// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::sync::Arc;

use tabpipe_core::diagnostic::pipeline as diagnostic;
use tabpipe_core::{Dataset, Error, HeaderContext};
use tracing::{debug, instrument};

use crate::execute::ComputePool;
use crate::file::{FileId, FileSet, TabulatedFile};
use crate::transform::{StageContext, Transform};
use crate::validity::Validity;

/// The user-configured, ordered, reorderable transform pipeline.
///
/// The pipeline itself is the UI-mutable configuration. Running it never
/// touches the live configuration: [`run`](Pipeline::run) captures a
/// [`RunContext`] snapshot first, so concurrent edits cannot corrupt an
/// in-flight execution.
#[derive(Debug, Clone)]
pub struct Pipeline {
	base: Arc<TabulatedFile>,
	files: FileSet,
	transforms: Vec<Transform>,
}

impl Pipeline {
	pub fn new(base: Arc<TabulatedFile>) -> Self {
		let mut files = FileSet::new();
		files.add(base.clone());
		Self {
			base,
			files,
			transforms: Vec::new(),
		}
	}

	pub fn base(&self) -> &Arc<TabulatedFile> {
		&self.base
	}

	pub fn files(&self) -> &FileSet {
		&self.files
	}

	pub fn add_file(&mut self, file: Arc<TabulatedFile>) {
		self.files.add(file);
	}

	pub fn remove_file(&mut self, id: FileId) -> Option<Arc<TabulatedFile>> {
		if id == self.base.id() {
			// the base file cannot be removed
			return None;
		}
		self.files.remove(id)
	}

	pub fn transforms(&self) -> &[Transform] {
		&self.transforms
	}

	pub fn transform_mut(&mut self, stage: usize) -> Option<&mut Transform> {
		self.transforms.get_mut(stage)
	}

	pub fn push(&mut self, transform: Transform) {
		self.transforms.push(transform);
	}

	pub fn insert(&mut self, stage: usize, transform: Transform) {
		self.transforms.insert(stage, transform);
	}

	/// Removing a transform releases everything it owns: conditions,
	/// aggregates and nested actions go with it.
	pub fn remove(&mut self, stage: usize) -> Transform {
		self.transforms.remove(stage)
	}

	pub fn move_to(&mut self, from: usize, to: usize) {
		let transform = self.transforms.remove(from);
		self.transforms.insert(to, transform);
	}

	/// The headers entering (or, with `inclusive`, leaving) `stage`.
	///
	/// A pure left fold over the preceding transforms' header effects,
	/// seeded with the base file's headers; calling it repeatedly with an
	/// unchanged configuration yields the identical list.
	pub fn headers_up_to(&self, stage: usize, inclusive: bool) -> HeaderContext {
		let end = if inclusive {
			(stage + 1).min(self.transforms.len())
		} else {
			stage.min(self.transforms.len())
		};
		self.transforms[..end]
			.iter()
			.fold(self.base.headers().clone(), |headers, transform| transform.header_effect(&headers))
	}

	/// The recomputed verdict of one stage against the current
	/// configuration.
	pub fn validity(&self, stage: usize) -> Validity {
		let headers = self.headers_up_to(stage, false);
		self.transforms[stage].validity(&headers, &self.files)
	}

	/// Captures the immutable per-run snapshot: transform configurations
	/// and file handles as they are right now.
	pub fn snapshot(&self) -> RunContext {
		RunContext {
			base: self.base.clone(),
			files: self.files.clone(),
			transforms: self.transforms.clone(),
		}
	}

	pub fn run(&self, pool: &ComputePool) -> crate::Result<Dataset> {
		self.snapshot().execute(pool)
	}
}

/// The transient, read-only snapshot one execution runs against.
#[derive(Debug, Clone)]
pub struct RunContext {
	base: Arc<TabulatedFile>,
	files: FileSet,
	transforms: Vec<Transform>,
}

impl RunContext {
	/// Folds the base file's rows through every stage's row effect.
	///
	/// Any blocking stage verdict refuses the run up front; a failure
	/// inside a stage abandons the run as a whole, never surfacing partial
	/// output.
	#[instrument(name = "pipeline::run", level = "debug", skip_all)]
	pub fn execute(&self, pool: &ComputePool) -> crate::Result<Dataset> {
		let mut headers = self.base.headers().clone();
		for (stage, transform) in self.transforms.iter().enumerate() {
			if let Validity::Invalid(reason) = transform.validity(&headers, &self.files) {
				return Err(Error(diagnostic::stage_invalid(stage, &reason)));
			}
			headers = transform.header_effect(&headers);
		}

		let mut rows = self
			.base
			.with_data(|rows| rows.to_vec())
			.ok_or_else(|| Error(diagnostic::base_file_not_loaded(self.base.name())))?;
		debug!(rows = rows.len(), stages = self.transforms.len(), "run started");

		let ctx = StageContext {
			pool,
			files: &self.files,
		};
		for (stage, transform) in self.transforms.iter().enumerate() {
			rows = transform
				.apply(rows, &ctx)
				.map_err(|e| Error(diagnostic::execution_failed(stage, &e.diagnostic().message)))?;
			debug!(stage, rows = rows.len(), "stage complete");
		}
		Ok(rows)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use tabpipe_core::Row;

	use super::Pipeline;
	use crate::execute::ComputePool;
	use crate::file::TabulatedFile;
	use crate::transform::{Take, Transform};

	fn base() -> Arc<TabulatedFile> {
		let file = TabulatedFile::open("base.csv", vec!["id".to_string(), "name".to_string()]).unwrap();
		file.supply(vec![
			vec!["1".to_string(), "a".to_string()],
			vec!["2".to_string(), "b".to_string()],
		])
		.unwrap();
		file
	}

	#[test]
	fn test_empty_pipeline_yields_base_rows() {
		let pipeline = Pipeline::new(base());
		let pool = ComputePool::with_threads(2);
		let out = pipeline.run(&pool).unwrap();
		assert_eq!(out, vec![Row::from_pairs([("id", "1"), ("name", "a")]), Row::from_pairs([("id", "2"), ("name", "b")])]);
	}

	#[test]
	fn test_headers_up_to_is_deterministic() {
		let mut pipeline = Pipeline::new(base());
		pipeline.push(Transform::Take(Take {
			count: 1,
		}));
		let first = pipeline.headers_up_to(1, false);
		let second = pipeline.headers_up_to(1, false);
		assert_eq!(first, second);
		assert_eq!(first.names(), &["id", "name"]);
	}

	#[test]
	fn test_invalid_stage_blocks_the_run() {
		let mut pipeline = Pipeline::new(base());
		pipeline.push(Transform::Take(Take {
			count: 0,
		}));
		let pool = ComputePool::with_threads(2);
		let err = pipeline.run(&pool).unwrap_err();
		assert_eq!(err.code(), "PIPELINE_001");
	}

	#[test]
	fn test_run_blocked_before_base_loads() {
		let file = TabulatedFile::open("late.csv", vec!["id".to_string()]).unwrap();
		let pipeline = Pipeline::new(file);
		let pool = ComputePool::with_threads(2);
		let err = pipeline.run(&pool).unwrap_err();
		assert_eq!(err.code(), "PIPELINE_002");
	}

	#[test]
	fn test_reorder_moves_stage() {
		let mut pipeline = Pipeline::new(base());
		pipeline.push(Transform::Take(Take {
			count: 1,
		}));
		pipeline.push(Transform::Take(Take {
			count: 2,
		}));
		pipeline.move_to(1, 0);
		let counts: Vec<_> = pipeline
			.transforms()
			.iter()
			.map(|t| match t {
				Transform::Take(take) => take.count,
				_ => unreachable!(),
			})
			.collect();
		assert_eq!(counts, vec![2, 1]);
	}

	#[test]
	fn test_base_file_cannot_be_removed() {
		let mut pipeline = Pipeline::new(base());
		let id = pipeline.base().id();
		assert!(pipeline.remove_file(id).is_none());
		assert!(pipeline.files().contains(id));
	}
}
