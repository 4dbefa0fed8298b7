// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use tabpipe_core::Dataset;
use tracing::instrument;

use crate::validity::Validity;

/// Truncates the dataset to its first `count` rows, after whatever ordering
/// precedes this stage.
#[derive(Debug, Clone)]
pub struct Take {
	pub count: usize,
}

impl Take {
	#[instrument(name = "transform::take", level = "trace", skip_all)]
	pub fn apply(&self, mut rows: Dataset) -> Dataset {
		rows.truncate(self.count);
		rows
	}

	pub fn validity(&self) -> Validity {
		if self.count == 0 {
			Validity::invalid("no data will pass")
		} else {
			Validity::Valid
		}
	}

	pub fn describe(&self) -> String {
		format!("keep the first {} rows", self.count)
	}
}

#[cfg(test)]
mod tests {
	use tabpipe_core::Row;

	use super::Take;

	#[test]
	fn test_truncates_preserving_columns() {
		let take = Take {
			count: 1,
		};
		let rows: Vec<Row> = (0..3).map(|i| Row::from_pairs([("i", i.to_string()), ("x", "v".to_string())])).collect();
		let out = take.apply(rows);
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].get("i"), Some("0"));
		assert_eq!(out[0].get("x"), Some("v"));
	}

	#[test]
	fn test_zero_is_invalid() {
		assert!(Take {
			count: 0,
		}
		.validity()
		.is_blocking());
	}
}
