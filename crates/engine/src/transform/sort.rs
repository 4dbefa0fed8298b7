// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use tabpipe_core::{Dataset, HeaderContext, SortDirection};
use tracing::instrument;

use crate::validity::Validity;

/// Stable ordering by one column's case-folded string value.
///
/// Runs on a single thread: a global order cannot be produced chunk-wise.
#[derive(Debug, Clone)]
pub struct Sort {
	pub column: String,
	pub direction: SortDirection,
}

impl Sort {
	#[instrument(name = "transform::sort", level = "trace", skip_all)]
	pub fn apply(&self, mut rows: Dataset) -> Dataset {
		rows.sort_by(|a, b| {
			let left = a.get(&self.column).unwrap_or_default().to_lowercase();
			let right = b.get(&self.column).unwrap_or_default().to_lowercase();
			let ordering = left.cmp(&right);
			match self.direction {
				SortDirection::Asc => ordering,
				SortDirection::Desc => ordering.reverse(),
			}
		});
		rows
	}

	pub fn validity(&self, headers: &HeaderContext) -> Validity {
		if self.column.is_empty() {
			Validity::invalid("no sort column selected")
		} else if !headers.contains(&self.column) {
			Validity::invalid(format!("column '{}' does not exist at this stage", self.column))
		} else {
			Validity::Valid
		}
	}

	pub fn describe(&self) -> String {
		format!("sort by '{}' {}", self.column, self.direction)
	}
}

#[cfg(test)]
mod tests {
	use tabpipe_core::{Row, SortDirection};

	use super::Sort;

	fn rows(values: &[(&str, &str)]) -> Vec<Row> {
		values.iter().map(|(k, i)| Row::from_pairs([("key", *k), ("i", *i)])).collect()
	}

	#[test]
	fn test_case_folded_ascending() {
		let sort = Sort {
			column: "key".to_string(),
			direction: SortDirection::Asc,
		};
		let out = sort.apply(rows(&[("b", "0"), ("A", "1"), ("c", "2")]));
		let keys: Vec<_> = out.iter().map(|r| r.get("key").unwrap()).collect();
		assert_eq!(keys, vec!["A", "b", "c"]);
	}

	#[test]
	fn test_descending_is_stable() {
		let sort = Sort {
			column: "key".to_string(),
			direction: SortDirection::Desc,
		};
		let out = sort.apply(rows(&[("a", "0"), ("b", "1"), ("B", "2"), ("a", "3")]));
		let indices: Vec<_> = out.iter().map(|r| r.get("i").unwrap()).collect();
		// equal keys keep their original relative order
		assert_eq!(indices, vec!["1", "2", "0", "3"]);
	}
}
