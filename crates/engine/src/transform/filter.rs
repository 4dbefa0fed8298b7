// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use tabpipe_core::{Dataset, HeaderContext};
use tracing::instrument;

use super::StageContext;
use crate::condition::{Condition, Prepared};
use crate::file::FileSet;
use crate::validity::Validity;

/// Keeps only the rows satisfying every top-level condition.
#[derive(Debug, Clone, Default)]
pub struct Filter {
	pub conditions: Vec<Condition>,
}

impl Filter {
	#[instrument(name = "transform::filter", level = "trace", skip_all)]
	pub fn apply(&self, rows: Dataset, ctx: &StageContext<'_>) -> crate::Result<Dataset> {
		if self.conditions.is_empty() {
			return Ok(rows);
		}
		let prepared: Vec<Prepared> =
			self.conditions.iter().map(|c| c.prepare(ctx.files)).collect::<crate::Result<_>>()?;
		ctx.pool.chunked(rows, |_, chunk| {
			Ok(chunk.into_iter().filter(|row| prepared.iter().all(|p| p.check(row))).collect())
		})
	}

	pub fn validity(&self, headers: &HeaderContext, files: &FileSet) -> Validity {
		if self.conditions.is_empty() {
			return Validity::warning("no conditions, the stage will be skipped");
		}
		self.conditions
			.iter()
			.map(|condition| condition.validity(headers, files))
			.fold(Validity::Valid, Validity::merge)
	}

	pub fn describe(&self) -> String {
		match self.conditions.len() {
			0 => "filter (no conditions)".to_string(),
			1 => format!("filter where {}", self.conditions[0].describe()),
			n => format!("filter by {} conditions", n),
		}
	}
}
