// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use indexmap::IndexMap;
use tabpipe_core::{Dataset, HeaderContext, Row};
use tracing::instrument;

use super::StageContext;
use crate::aggregate::Aggregate;
use crate::validity::Validity;

/// Partitions the dataset by the projection onto the selected columns and
/// reduces every group with the configured aggregates.
///
/// Distinct keys keep their first-occurrence order in the output. Reduction
/// parallelizes over groups, not rows: membership must be fully resolved
/// before any group reduction starts.
#[derive(Debug, Clone, Default)]
pub struct GroupBy {
	pub columns: Vec<String>,
	pub aggregates: Vec<Aggregate>,
}

impl GroupBy {
	pub fn header_effect(&self, headers: &HeaderContext) -> HeaderContext {
		if self.columns.is_empty() {
			// grouping is inactive
			return headers.clone();
		}
		let mut names = self.columns.clone();
		names.extend(self.aggregates.iter().map(Aggregate::output_name));
		HeaderContext::replaced(names)
	}

	#[instrument(name = "transform::group_by", level = "trace", skip_all)]
	pub fn apply(&self, rows: Dataset, ctx: &StageContext<'_>) -> crate::Result<Dataset> {
		if self.columns.is_empty() {
			return Ok(rows);
		}

		// membership resolution is the synchronization point
		let mut groups: IndexMap<Vec<String>, Vec<Row>> = IndexMap::new();
		for row in rows {
			let key = self
				.columns
				.iter()
				.map(|column| row.get(column).unwrap_or_default().to_string())
				.collect();
			groups.entry(key).or_default().push(row);
		}

		let reduced = ctx.pool.map_ordered(groups.into_iter().collect(), |(key, members): (Vec<String>, Vec<Row>)| {
			let mut out: Row = self.columns.iter().cloned().zip(key).collect();
			for aggregate in &self.aggregates {
				out.set(aggregate.output_name(), aggregate.apply(&members));
			}
			out
		});
		Ok(reduced)
	}

	pub fn validity(&self, headers: &HeaderContext) -> Validity {
		if self.columns.is_empty() {
			return Validity::warning("no columns selected, the stage will be skipped");
		}
		for column in &self.columns {
			if !headers.contains(column) {
				return Validity::invalid(format!("column '{}' does not exist at this stage", column));
			}
		}
		if headers.iter().all(|name| self.columns.contains(name)) {
			return Validity::invalid("grouping is not possible, every column is grouped by");
		}
		self.aggregates
			.iter()
			.map(|aggregate| aggregate.validity(headers))
			.fold(Validity::Valid, Validity::merge)
	}

	pub fn describe(&self) -> String {
		if self.columns.is_empty() {
			"group by (nothing selected)".to_string()
		} else {
			format!("group by {} with {} aggregates", self.columns.join(", "), self.aggregates.len())
		}
	}
}

#[cfg(test)]
mod tests {
	use tabpipe_core::Row;

	use super::{GroupBy, StageContext};
	use crate::aggregate::{Aggregate, AggregateKind};
	use crate::execute::ComputePool;
	use crate::file::FileSet;

	fn count() -> Aggregate {
		Aggregate {
			kind: AggregateKind::Count {
				distinct: false,
				case_insensitive: false,
			},
			column: String::new(),
			alias: "Count".to_string(),
		}
	}

	fn ctx<'a>(pool: &'a ComputePool, files: &'a FileSet) -> StageContext<'a> {
		StageContext {
			pool,
			files,
		}
	}

	#[test]
	fn test_first_occurrence_order_and_counts() {
		let pool = ComputePool::with_threads(2);
		let files = FileSet::new();
		let group = GroupBy {
			columns: vec!["a".to_string()],
			aggregates: vec![count()],
		};
		let rows = vec![
			Row::from_pairs([("a", "x"), ("b", "1")]),
			Row::from_pairs([("a", "x"), ("b", "2")]),
			Row::from_pairs([("a", "y"), ("b", "3")]),
		];
		let out = group.apply(rows, &ctx(&pool, &files)).unwrap();
		assert_eq!(out.len(), 2);
		assert_eq!(out[0], Row::from_pairs([("a", "x"), ("Count", "2")]));
		assert_eq!(out[1], Row::from_pairs([("a", "y"), ("Count", "1")]));
	}

	#[test]
	fn test_empty_selection_passes_through() {
		let pool = ComputePool::with_threads(2);
		let files = FileSet::new();
		let group = GroupBy::default();
		let rows = vec![Row::from_pairs([("a", "x")])];
		assert_eq!(group.apply(rows.clone(), &ctx(&pool, &files)).unwrap(), rows);
		let headers = ["a"].into_iter().collect();
		assert!(matches!(group.validity(&headers), crate::Validity::Warning(_)));
	}

	#[test]
	fn test_grouping_by_everything_is_invalid() {
		let group = GroupBy {
			columns: vec!["a".to_string(), "b".to_string()],
			aggregates: vec![],
		};
		let headers = ["a", "b"].into_iter().collect();
		assert!(group.validity(&headers).is_blocking());
	}

	#[test]
	fn test_header_effect_replaces_headers() {
		let group = GroupBy {
			columns: vec!["a".to_string()],
			aggregates: vec![count()],
		};
		let headers = ["a", "b", "c"].into_iter().collect();
		assert_eq!(group.header_effect(&headers).names(), &["a", "Count"]);
	}
}
