// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use serde::{Deserialize, Serialize};
use tabpipe_core::{Dataset, HeaderContext, Row};
use tracing::instrument;

use super::StageContext;
use crate::condition::{Condition, Prepared};
use crate::file::FileSet;
use crate::validity::Validity;

/// A per-row mutation applied inside a [`ConditionalSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionalAction {
	/// Overwrites an existing column with a literal value.
	SetColumn {
		column: String,
		value: String,
	},
}

impl ConditionalAction {
	pub fn header_effect(&self, headers: &HeaderContext) -> HeaderContext {
		match self {
			ConditionalAction::SetColumn {
				..
			} => headers.clone(),
		}
	}

	fn apply_row(&self, row: &mut Row) {
		match self {
			ConditionalAction::SetColumn {
				column,
				value,
			} => {
				// only mutate, never grow the row's key set
				if row.contains(column) {
					row.set(column.clone(), value.clone());
				}
			}
		}
	}

	pub fn validity(&self, headers: &HeaderContext) -> Validity {
		match self {
			ConditionalAction::SetColumn {
				column,
				..
			} => {
				if !headers.contains(column) {
					Validity::invalid(format!("column '{}' does not exist at this stage", column))
				} else {
					Validity::Valid
				}
			}
		}
	}

	pub fn describe(&self) -> String {
		match self {
			ConditionalAction::SetColumn {
				column,
				value,
			} => format!("set {} to '{}'", column, value),
		}
	}
}

/// Applies an ordered list of per-row mutations to every row satisfying all
/// top-level conditions; other rows pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct ConditionalSet {
	pub conditions: Vec<Condition>,
	pub actions: Vec<ConditionalAction>,
}

impl ConditionalSet {
	/// The fold of the nested actions' header effects. Currently all
	/// actions pass headers through.
	pub fn header_effect(&self, headers: &HeaderContext) -> HeaderContext {
		self.actions.iter().fold(headers.clone(), |acc, action| action.header_effect(&acc))
	}

	#[instrument(name = "transform::conditional_set", level = "trace", skip_all)]
	pub fn apply(&self, rows: Dataset, ctx: &StageContext<'_>) -> crate::Result<Dataset> {
		if self.actions.is_empty() {
			return Ok(rows);
		}
		let prepared: Vec<Prepared> =
			self.conditions.iter().map(|c| c.prepare(ctx.files)).collect::<crate::Result<_>>()?;
		ctx.pool.chunked(rows, |_, chunk| {
			Ok(chunk.into_iter()
				.map(|mut row| {
					if prepared.iter().all(|p| p.check(&row)) {
						for action in &self.actions {
							action.apply_row(&mut row);
						}
					}
					row
				})
				.collect())
		})
	}

	pub fn validity(&self, headers: &HeaderContext, files: &FileSet) -> Validity {
		let mut verdict = Validity::Valid;
		if self.conditions.is_empty() {
			verdict = verdict.merge(Validity::warning("no conditions, the stage could be non-conditional"));
		}
		if self.actions.is_empty() {
			verdict = verdict.merge(Validity::warning("no actions, the stage will be skipped"));
		}
		let conditions = self
			.conditions
			.iter()
			.map(|condition| condition.validity(headers, files))
			.fold(Validity::Valid, Validity::merge);
		let actions = self
			.actions
			.iter()
			.map(|action| action.validity(headers))
			.fold(Validity::Valid, Validity::merge);
		verdict.merge(conditions).merge(actions)
	}

	pub fn describe(&self) -> String {
		format!("conditionally apply {} actions ({} conditions)", self.actions.len(), self.conditions.len())
	}
}
