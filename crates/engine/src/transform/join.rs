// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabpipe_core::diagnostic::file as diagnostic;
use tabpipe_core::{Dataset, Error, HeaderContext, Row};
use tracing::instrument;

use super::StageContext;
use crate::condition::fold_case;
use crate::file::{FileSet, LoadState, TabulatedFile};
use crate::validity::Validity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
	Inner,
	Left,
}

/// Hash join against another open file.
///
/// The build phase is serial: it materializes a key → fields lookup from
/// the target file, last row winning on duplicate keys. The probe phase is
/// chunked over the source rows.
#[derive(Debug, Clone)]
pub struct Join {
	pub column: String,
	pub kind: JoinKind,
	pub file: Arc<TabulatedFile>,
	pub file_column: String,
	pub case_insensitive: bool,
}

impl Join {
	/// Column names taken over from the target file: everything except the
	/// join column itself.
	fn joined_columns(&self) -> Vec<String> {
		self.file
			.headers()
			.iter()
			.filter(|name| **name != self.file_column)
			.cloned()
			.collect()
	}

	pub fn header_effect(&self, headers: &HeaderContext) -> HeaderContext {
		headers.appended(self.joined_columns())
	}

	#[instrument(name = "transform::join", level = "trace", skip_all)]
	pub fn apply(&self, rows: Dataset, ctx: &StageContext<'_>) -> crate::Result<Dataset> {
		let lookup = self
			.file
			.with_data(|target| {
				let mut lookup: HashMap<String, Row> = HashMap::with_capacity(target.len());
				for row in target {
					let Some(key) = row.get(&self.file_column) else {
						continue;
					};
					let mut fields = row.clone();
					fields.remove(&self.file_column);
					// last row wins
					lookup.insert(fold_case(key, self.case_insensitive), fields);
				}
				lookup
			})
			.ok_or_else(|| Error(diagnostic::not_loaded(self.file.name())))?;

		let empty_extension: Row =
			self.joined_columns().into_iter().map(|name| (name, String::new())).collect();

		ctx.pool.chunked(rows, |_, chunk| {
			let mut out = Vec::with_capacity(chunk.len());
			for mut row in chunk {
				let matched = row
					.get(&self.column)
					.map(|key| fold_case(key, self.case_insensitive))
					.and_then(|key| lookup.get(&key));
				match (matched, self.kind) {
					(Some(fields), _) => {
						row.extend(fields);
						out.push(row);
					}
					(None, JoinKind::Left) => {
						row.extend(&empty_extension);
						out.push(row);
					}
					// inner join drops the row
					(None, JoinKind::Inner) => {}
				}
			}
			Ok(out)
		})
	}

	pub fn validity(&self, headers: &HeaderContext, files: &FileSet) -> Validity {
		if self.column.is_empty() {
			return Validity::invalid("no join column selected");
		}
		if !headers.contains(&self.column) {
			return Validity::invalid(format!("column '{}' does not exist at this stage", self.column));
		}
		if !files.contains(self.file.id()) {
			return Validity::invalid(format!("file '{}' is no longer part of the pipeline", self.file.name()));
		}
		if !self.file.headers().contains(&self.file_column) {
			return Validity::invalid(format!(
				"file '{}' has no column '{}'",
				self.file.name(),
				self.file_column
			));
		}
		if self.file.state() != LoadState::Loaded {
			return Validity::invalid(format!("file '{}' is not loaded yet", self.file.name()));
		}
		Validity::Valid
	}

	pub fn describe(&self) -> String {
		let kind = match self.kind {
			JoinKind::Inner => "inner",
			JoinKind::Left => "left",
		};
		format!("{} join '{}' with {}.{}", kind, self.column, self.file.name(), self.file_column)
	}
}
