// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

/// The recomputed configuration verdict of a stage, condition or aggregate.
///
/// `Warning` marks a stage that will run but do nothing useful; only
/// `Invalid` blocks a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
	Valid,
	Warning(String),
	Invalid(String),
}

impl Validity {
	pub fn warning(message: impl Into<String>) -> Self {
		Self::Warning(message.into())
	}

	pub fn invalid(message: impl Into<String>) -> Self {
		Self::Invalid(message.into())
	}

	pub fn is_valid(&self) -> bool {
		matches!(self, Validity::Valid)
	}

	pub fn is_blocking(&self) -> bool {
		matches!(self, Validity::Invalid(_))
	}

	pub fn message(&self) -> Option<&str> {
		match self {
			Validity::Valid => None,
			Validity::Warning(m) | Validity::Invalid(m) => Some(m),
		}
	}

	/// Keeps the first blocking verdict, otherwise the first warning.
	pub fn merge(self, other: Validity) -> Validity {
		match (&self, &other) {
			(Validity::Invalid(_), _) => self,
			(_, Validity::Invalid(_)) => other,
			(Validity::Warning(_), _) => self,
			_ => other,
		}
	}
}
