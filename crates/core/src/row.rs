// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An ordered mapping from column name to cell value.
///
/// Every cell is a string; numeric or date interpretation happens ad hoc in
/// the operation that needs it. Within one dataset all rows share the same
/// key set at a given pipeline stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row(IndexMap<String, String>);

/// An ordered sequence of rows. Order is user-visible output order.
pub type Dataset = Vec<Row>;

impl Row {
	pub fn new() -> Self {
		Self(IndexMap::new())
	}

	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}

	pub fn get(&self, column: &str) -> Option<&str> {
		self.0.get(column).map(String::as_str)
	}

	/// Sets a cell, appending the column if it is not present yet.
	pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
		self.0.insert(column.into(), value.into());
	}

	/// Removes a column, preserving the order of the remaining ones.
	pub fn remove(&mut self, column: &str) -> Option<String> {
		self.0.shift_remove(column)
	}

	pub fn contains(&self, column: &str) -> bool {
		self.0.contains_key(column)
	}

	pub fn columns(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// A new row holding only the named columns, in the order given.
	/// Missing columns are skipped.
	pub fn project(&self, columns: &[String]) -> Row {
		let mut out = Row::new();
		for column in columns {
			if let Some(value) = self.get(column) {
				out.set(column.clone(), value.to_string());
			}
		}
		out
	}

	/// Appends every pair of `other`, overwriting cells that already exist.
	pub fn extend(&mut self, other: &Row) {
		for (column, value) in other.iter() {
			self.set(column.to_string(), value.to_string());
		}
	}
}

impl Display for Row {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut first = true;
		f.write_str("{")?;
		for (column, value) in self.iter() {
			if !first {
				f.write_str(", ")?;
			}
			write!(f, "{}: {:?}", column, value)?;
			first = false;
		}
		f.write_str("}")
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self::from_pairs(iter)
	}
}

#[cfg(test)]
mod tests {
	use super::Row;

	#[test]
	fn test_preserves_insertion_order() {
		let mut row = Row::new();
		row.set("b", "2");
		row.set("a", "1");
		row.set("c", "3");
		let columns: Vec<_> = row.columns().collect();
		assert_eq!(columns, vec!["b", "a", "c"]);
	}

	#[test]
	fn test_remove_keeps_order() {
		let mut row = Row::from_pairs([("a", "1"), ("b", "2"), ("c", "3")]);
		assert_eq!(row.remove("b"), Some("2".to_string()));
		let columns: Vec<_> = row.columns().collect();
		assert_eq!(columns, vec!["a", "c"]);
	}

	#[test]
	fn test_project_skips_missing() {
		let row = Row::from_pairs([("a", "1"), ("b", "2")]);
		let projected = row.project(&["b".to_string(), "x".to_string()]);
		assert_eq!(projected, Row::from_pairs([("b", "2")]));
	}

	#[test]
	fn test_extend_overwrites() {
		let mut row = Row::from_pairs([("a", "1")]);
		row.extend(&Row::from_pairs([("a", "9"), ("b", "2")]));
		assert_eq!(row.get("a"), Some("9"));
		assert_eq!(row.get("b"), Some("2"));
	}
}
