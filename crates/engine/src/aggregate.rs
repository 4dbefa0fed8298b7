// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Group reducers: each aggregate turns the member rows of one group into a
//! single output cell. Data-shape problems never abort a run; unparseable
//! cells are excluded and unresolvable references collapse into sentinel
//! strings.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tabpipe_core::num::{format_float, parse_float};
use tabpipe_core::{HeaderContext, NO_DATA, REF_ERROR, Row};

use crate::condition::fold_case;
use crate::validity::Validity;

/// How Min/Max order the member values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpret {
	Text {
		case_insensitive: bool,
	},
	Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateKind {
	Average,
	Sum,
	Count {
		distinct: bool,
		case_insensitive: bool,
	},
	Min(Interpret),
	Max(Interpret),
}

impl AggregateKind {
	fn label(&self) -> &'static str {
		match self {
			AggregateKind::Average => "AVG",
			AggregateKind::Sum => "SUM",
			AggregateKind::Count {
				..
			} => "COUNT",
			AggregateKind::Min(_) => "MIN",
			AggregateKind::Max(_) => "MAX",
		}
	}

	/// Plain Count is the only kind that works without a source column.
	fn needs_column(&self) -> bool {
		!matches!(
			self,
			AggregateKind::Count {
				distinct: false,
				..
			}
		)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
	pub kind: AggregateKind,
	pub column: String,
	/// User alias for the output column; a generated name is used if blank.
	pub alias: String,
}

impl Aggregate {
	pub fn output_name(&self) -> String {
		if self.alias.trim().is_empty() {
			format!("{}({})", self.kind.label(), self.column)
		} else {
			self.alias.clone()
		}
	}

	pub fn describe(&self) -> String {
		let generated = format!("{}({})", self.kind.label(), self.column);
		if self.alias.trim().is_empty() {
			generated
		} else {
			format!("{} as '{}'", generated, self.alias)
		}
	}

	pub fn validity(&self, headers: &HeaderContext) -> Validity {
		if self.kind.needs_column() {
			if self.column.is_empty() {
				return Validity::invalid(format!("{} needs a source column", self.kind.label()));
			}
			if !headers.contains(&self.column) {
				return Validity::invalid(format!("column '{}' does not exist at this stage", self.column));
			}
		}
		Validity::Valid
	}

	/// Reduces one group's member rows to the output cell value.
	pub fn apply(&self, rows: &[Row]) -> String {
		match &self.kind {
			AggregateKind::Average => match self.numeric_values(rows) {
				None => REF_ERROR.to_string(),
				Some(values) if values.is_empty() => NO_DATA.to_string(),
				Some(values) => format_float(values.iter().sum::<f64>() / values.len() as f64),
			},
			AggregateKind::Sum => match self.numeric_values(rows) {
				None => REF_ERROR.to_string(),
				Some(values) => format_float(values.iter().sum::<f64>()),
			},
			AggregateKind::Count {
				distinct: false,
				..
			} => rows.len().to_string(),
			AggregateKind::Count {
				distinct: true,
				case_insensitive,
			} => match self.cells(rows) {
				None => REF_ERROR.to_string(),
				Some(cells) => cells
					.iter()
					.map(|cell| fold_case(cell, *case_insensitive))
					.collect::<HashSet<_>>()
					.len()
					.to_string(),
			},
			AggregateKind::Min(interpret) => self.extremum(rows, interpret, true),
			AggregateKind::Max(interpret) => self.extremum(rows, interpret, false),
		}
	}

	/// All cells of the source column; None when the column is unresolvable.
	fn cells<'a>(&self, rows: &'a [Row]) -> Option<Vec<&'a str>> {
		if self.column.is_empty() {
			return None;
		}
		if !rows.is_empty() && rows.iter().all(|row| !row.contains(&self.column)) {
			return None;
		}
		Some(rows.iter().filter_map(|row| row.get(&self.column)).collect())
	}

	/// Parseable doubles of the source column, unparseable cells excluded.
	fn numeric_values(&self, rows: &[Row]) -> Option<Vec<f64>> {
		let cells = self.cells(rows)?;
		Some(cells.into_iter().map(parse_float).filter(|v| !v.is_nan()).collect())
	}

	fn extremum(&self, rows: &[Row], interpret: &Interpret, minimum: bool) -> String {
		let Some(cells) = self.cells(rows) else {
			return REF_ERROR.to_string();
		};
		match interpret {
			Interpret::Text {
				case_insensitive,
			} => {
				let winner = cells.into_iter().reduce(|best, cell| {
					let ordering =
						fold_case(cell, *case_insensitive).cmp(&fold_case(best, *case_insensitive));
					if (minimum && ordering.is_lt()) || (!minimum && ordering.is_gt()) {
						cell
					} else {
						best
					}
				});
				winner.map(str::to_string).unwrap_or_else(|| NO_DATA.to_string())
			}
			Interpret::Numeric => {
				let combine: fn(f64, f64) -> f64 = if minimum {
					f64::min
				} else {
					f64::max
				};
				let winner = cells.into_iter().map(parse_float).filter(|v| !v.is_nan()).reduce(combine);
				winner.map(format_float).unwrap_or_else(|| NO_DATA.to_string())
			}
		}
	}
}
