// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::collections::HashSet;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// The ordered list of column names available entering a pipeline stage.
///
/// Header contexts are derived functionally: every transform produces a new
/// context from the previous one, so folding the same configuration twice
/// yields the identical list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaderContext(Vec<String>);

impl HeaderContext {
	pub fn new(names: Vec<String>) -> Self {
		Self(names)
	}

	pub fn names(&self) -> &[String] {
		&self.0
	}

	pub fn contains(&self, name: &str) -> bool {
		self.0.iter().any(|n| n == name)
	}

	/// A new context with `names` appended after the existing columns.
	pub fn appended<I, S>(&self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut out = self.0.clone();
		out.extend(names.into_iter().map(Into::into));
		Self(out)
	}

	/// A new context keeping only the columns in `keep`, in the current order.
	pub fn projected(&self, keep: &[String]) -> Self {
		Self(self.0.iter().filter(|n| keep.contains(n)).cloned().collect())
	}

	/// A new context discarding the current columns entirely.
	pub fn replaced(names: Vec<String>) -> Self {
		Self(names)
	}

	/// The first column name that occurs more than once, if any.
	pub fn duplicate(&self) -> Option<&str> {
		let mut seen = HashSet::with_capacity(self.0.len());
		self.0.iter().find(|name| !seen.insert(name.as_str())).map(String::as_str)
	}
}

impl Deref for HeaderContext {
	type Target = [String];

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl<S: Into<String>> FromIterator<S> for HeaderContext {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self(iter.into_iter().map(Into::into).collect())
	}
}
