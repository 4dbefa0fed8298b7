// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::collections::HashSet;

use regex::Regex;
use tabpipe_core::diagnostic::{condition as diagnostic, file as file_diagnostic};
use tabpipe_core::num::parse_float;
use tabpipe_core::{Error, Row};

use super::{CompareOp, Condition, FileMembership, TextOp, fold_case};
use crate::file::FileSet;

/// The checkable form of a condition tree.
///
/// `prepare` runs once per execution, before any row is evaluated: it
/// compiles patterns, folds literal sets and materializes cross-file
/// lookups. Once prepared, [`check`](Prepared::check) is pure and safe to
/// call repeatedly across chunks. A condition whose preparation fails never
/// silently passes or rejects rows; the owning stage refuses to run.
#[derive(Debug, Clone)]
pub enum Prepared {
	Number {
		column: String,
		op: CompareOp,
		operand: f64,
	},
	Text {
		column: String,
		op: TextOp,
		value: String,
	},
	Regex {
		column: String,
		regex: Regex,
	},
	List {
		column: String,
		values: HashSet<String>,
		case_insensitive: bool,
	},
	File {
		column: String,
		lookup: HashSet<String>,
		case_insensitive: bool,
		membership: FileMembership,
	},
	All(Vec<Prepared>),
	Any(Vec<Prepared>),
}

impl Condition {
	/// Materializes this tree against the run's file snapshot.
	///
	/// Re-runnable: preparing again after upstream file data changed simply
	/// rebuilds the lookups.
	pub fn prepare(&self, files: &FileSet) -> crate::Result<Prepared> {
		Ok(match self {
			Condition::Number(c) => Prepared::Number {
				column: c.column.clone(),
				op: c.op,
				operand: parse_float(&c.value),
			},
			Condition::Text(c) => Prepared::Text {
				column: c.column.clone(),
				op: c.op,
				value: c.value.clone(),
			},
			Condition::Regex(c) => {
				// full-string match semantics
				let anchored = format!("^(?:{})$", c.pattern);
				let regex = Regex::new(&anchored)
					.map_err(|e| Error(diagnostic::invalid_pattern(&c.pattern, &e.to_string())))?;
				Prepared::Regex {
					column: c.column.clone(),
					regex,
				}
			}
			Condition::List(c) => Prepared::List {
				column: c.column.clone(),
				values: c.values.iter().map(|v| fold_case(v, c.case_insensitive)).collect(),
				case_insensitive: c.case_insensitive,
			},
			Condition::File(c) => {
				if !files.contains(c.file.id()) {
					return Err(Error(file_diagnostic::not_member(c.file.name())));
				}
				let lookup = c
					.file
					.with_data(|rows| {
						rows.iter()
							.filter_map(|row| row.get(&c.file_column))
							.map(|value| fold_case(value, c.case_insensitive))
							.collect::<HashSet<_>>()
					})
					.ok_or_else(|| Error(file_diagnostic::not_loaded(c.file.name())))?;
				Prepared::File {
					column: c.column.clone(),
					lookup,
					case_insensitive: c.case_insensitive,
					membership: c.membership,
				}
			}
			Condition::All(children) => Prepared::All(prepare_children(children, files)?),
			Condition::Any(children) => Prepared::Any(prepare_children(children, files)?),
		})
	}
}

fn prepare_children(children: &[Condition], files: &FileSet) -> crate::Result<Vec<Prepared>> {
	children.iter().map(|child| child.prepare(files)).collect()
}

impl Prepared {
	pub fn check(&self, row: &Row) -> bool {
		match self {
			Prepared::Number {
				column,
				op,
				operand,
			} => {
				let cell = row.get(column).map(parse_float).unwrap_or(f64::NAN);
				op.compare(cell, *operand)
			}
			Prepared::Text {
				column,
				op,
				value,
			} => {
				let Some(cell) = row.get(column) else {
					return false;
				};
				match op {
					TextOp::Equals => cell == value,
					TextOp::NotEquals => cell != value,
					TextOp::StartsWith => cell.starts_with(value.as_str()),
					TextOp::EndsWith => cell.ends_with(value.as_str()),
					TextOp::Contains => cell.contains(value.as_str()),
				}
			}
			Prepared::Regex {
				column,
				regex,
			} => row.get(column).is_some_and(|cell| regex.is_match(cell)),
			Prepared::List {
				column,
				values,
				case_insensitive,
			} => row.get(column).is_some_and(|cell| values.contains(&fold_case(cell, *case_insensitive))),
			Prepared::File {
				column,
				lookup,
				case_insensitive,
				membership,
			} => {
				let found = row
					.get(column)
					.is_some_and(|cell| lookup.contains(&fold_case(cell, *case_insensitive)));
				match membership {
					FileMembership::In => found,
					FileMembership::NotIn => !found,
				}
			}
			// vacuously true
			Prepared::All(children) => children.iter().all(|child| child.check(row)),
			// vacuously false
			Prepared::Any(children) => children.iter().any(|child| child.check(row)),
		}
	}
}
