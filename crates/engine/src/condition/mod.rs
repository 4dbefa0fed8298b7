// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Recursive boolean predicates over a row.
//!
//! Composites exclusively own their children in an ordered list, so cycles
//! are structurally impossible. Evaluation runs in two phases, see
//! [`prepare`](Condition::prepare).

mod prepare;

pub use prepare::Prepared;

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabpipe_core::HeaderContext;

use crate::file::{FileSet, LoadState, TabulatedFile};
use crate::validity::Validity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
}

impl CompareOp {
	/// IEEE-754 comparison; anything involving NaN is false, including `!=`.
	pub fn compare(&self, left: f64, right: f64) -> bool {
		if left.is_nan() || right.is_nan() {
			return false;
		}
		match self {
			CompareOp::Eq => left == right,
			CompareOp::Ne => left != right,
			CompareOp::Lt => left < right,
			CompareOp::Le => left <= right,
			CompareOp::Gt => left > right,
			CompareOp::Ge => left >= right,
		}
	}
}

impl Display for CompareOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			CompareOp::Eq => "==",
			CompareOp::Ne => "!=",
			CompareOp::Lt => "<",
			CompareOp::Le => "<=",
			CompareOp::Gt => ">",
			CompareOp::Ge => ">=",
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextOp {
	Equals,
	NotEquals,
	StartsWith,
	EndsWith,
	Contains,
}

impl Display for TextOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			TextOp::Equals => "equals",
			TextOp::NotEquals => "does not equal",
			TextOp::StartsWith => "starts with",
			TextOp::EndsWith => "ends with",
			TextOp::Contains => "contains",
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileMembership {
	In,
	NotIn,
}

/// Compares a column parsed as a double against a literal operand.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberCondition {
	pub column: String,
	pub op: CompareOp,
	pub value: String,
}

/// Exact string comparison, no case folding.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCondition {
	pub column: String,
	pub op: TextOp,
	pub value: String,
}

/// Full-string regular expression match.
#[derive(Debug, Clone, PartialEq)]
pub struct RegexCondition {
	pub column: String,
	pub pattern: String,
}

/// Membership in a literal, user-entered value set.
#[derive(Debug, Clone, PartialEq)]
pub struct ListCondition {
	pub column: String,
	pub values: Vec<String>,
	pub case_insensitive: bool,
}

/// Membership of the row's column value in another file's column values.
#[derive(Debug, Clone)]
pub struct FileCondition {
	pub column: String,
	pub file: Arc<TabulatedFile>,
	pub file_column: String,
	pub case_insensitive: bool,
	pub membership: FileMembership,
}

#[derive(Debug, Clone)]
pub enum Condition {
	Number(NumberCondition),
	Text(TextCondition),
	Regex(RegexCondition),
	List(ListCondition),
	File(FileCondition),
	All(Vec<Condition>),
	Any(Vec<Condition>),
}

pub(crate) fn fold_case(value: &str, case_insensitive: bool) -> String {
	if case_insensitive {
		value.to_lowercase()
	} else {
		value.to_string()
	}
}

impl Condition {
	/// A leaf is valid when its referenced column exists in the current
	/// headers and its referenced file (if any) is still a pipeline member;
	/// a composite is valid when all children are.
	pub fn validity(&self, headers: &HeaderContext, files: &FileSet) -> Validity {
		match self {
			Condition::Number(c) => column_validity(&c.column, headers),
			Condition::Text(c) => column_validity(&c.column, headers),
			Condition::Regex(c) => match regex::Regex::new(&c.pattern) {
				Ok(_) => column_validity(&c.column, headers),
				Err(_) => Validity::invalid(format!("pattern '{}' does not compile", c.pattern)),
			},
			Condition::List(c) => column_validity(&c.column, headers),
			Condition::File(c) => {
				let verdict = column_validity(&c.column, headers);
				if verdict.is_blocking() {
					return verdict;
				}
				if !files.contains(c.file.id()) {
					return Validity::invalid(format!(
						"file '{}' is no longer part of the pipeline",
						c.file.name()
					));
				}
				if !c.file.headers().contains(&c.file_column) {
					return Validity::invalid(format!(
						"file '{}' has no column '{}'",
						c.file.name(),
						c.file_column
					));
				}
				if c.file.state() == LoadState::Invalid {
					return Validity::invalid(format!("file '{}' failed to load", c.file.name()));
				}
				verdict
			}
			Condition::All(children) | Condition::Any(children) => children
				.iter()
				.map(|child| child.validity(headers, files))
				.fold(Validity::Valid, Validity::merge),
		}
	}

	pub fn describe(&self) -> String {
		match self {
			Condition::Number(c) => format!("{} {} {}", c.column, c.op, c.value),
			Condition::Text(c) => format!("{} {} '{}'", c.column, c.op, c.value),
			Condition::Regex(c) => format!("{} matches /{}/", c.column, c.pattern),
			Condition::List(c) => format!("{} is one of {} values", c.column, c.values.len()),
			Condition::File(c) => {
				let verb = match c.membership {
					FileMembership::In => "is in",
					FileMembership::NotIn => "is not in",
				};
				format!("{} {} {}.{}", c.column, verb, c.file.name(), c.file_column)
			}
			Condition::All(children) => format!("all of {} conditions", children.len()),
			Condition::Any(children) => format!("any of {} conditions", children.len()),
		}
	}
}

fn column_validity(column: &str, headers: &HeaderContext) -> Validity {
	if column.is_empty() {
		Validity::invalid("no column selected")
	} else if !headers.contains(column) {
		Validity::invalid(format!("column '{}' does not exist at this stage", column))
	} else {
		Validity::Valid
	}
}
