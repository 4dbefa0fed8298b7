// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use tabpipe_core::{Dataset, HeaderContext};
use tracing::instrument;

use crate::validity::Validity;

/// Projects headers and rows onto the checked subset of columns.
#[derive(Debug, Clone, Default)]
pub struct Select {
	pub columns: Vec<String>,
}

impl Select {
	pub fn header_effect(&self, headers: &HeaderContext) -> HeaderContext {
		headers.projected(&self.columns)
	}

	#[instrument(name = "transform::select", level = "trace", skip_all)]
	pub fn apply(&self, rows: Dataset) -> Dataset {
		rows.into_iter().map(|row| row.project(&self.columns)).collect()
	}

	pub fn validity(&self, headers: &HeaderContext) -> Validity {
		if self.columns.is_empty() {
			return Validity::invalid("no columns selected");
		}
		for column in &self.columns {
			if !headers.contains(column) {
				return Validity::invalid(format!("column '{}' does not exist at this stage", column));
			}
		}
		Validity::Valid
	}

	pub fn describe(&self) -> String {
		format!("keep the columns {}", self.columns.join(", "))
	}
}
