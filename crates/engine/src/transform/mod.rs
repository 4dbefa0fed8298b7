// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Pipeline stages. Each kind declares its effect on the header list, its
//! effect on the row list, and its configuration validity.

mod conditional;
mod filter;
mod group;
mod join;
mod merge;
mod select;
mod sort;
mod take;

pub use conditional::{ConditionalAction, ConditionalSet};
pub use filter::Filter;
pub use group::GroupBy;
pub use join::{Join, JoinKind};
pub use merge::{Merge, MergeMode};
pub use select::Select;
pub use sort::Sort;
pub use take::Take;

use tabpipe_core::{Dataset, HeaderContext};

use crate::execute::ComputePool;
use crate::file::FileSet;
use crate::validity::Validity;

/// What a stage's row effect gets to see: the compute pool and the run's
/// file snapshot. Configuration lives in the transform itself.
pub struct StageContext<'a> {
	pub pool: &'a ComputePool,
	pub files: &'a FileSet,
}

#[derive(Debug, Clone)]
pub enum Transform {
	Join(Join),
	Merge(Merge),
	Filter(Filter),
	GroupBy(GroupBy),
	ConditionalSet(ConditionalSet),
	Sort(Sort),
	Take(Take),
	Select(Select),
}

impl Transform {
	/// The headers leaving this stage, given the headers entering it.
	/// Pure: the same input always yields the same output.
	pub fn header_effect(&self, headers: &HeaderContext) -> HeaderContext {
		match self {
			Transform::Join(t) => t.header_effect(headers),
			Transform::Merge(t) => t.header_effect(headers),
			Transform::GroupBy(t) => t.header_effect(headers),
			Transform::Select(t) => t.header_effect(headers),
			Transform::ConditionalSet(t) => t.header_effect(headers),
			// pass-through kinds
			Transform::Filter(_) | Transform::Sort(_) | Transform::Take(_) => headers.clone(),
		}
	}

	pub fn apply(&self, rows: Dataset, ctx: &StageContext<'_>) -> crate::Result<Dataset> {
		match self {
			Transform::Join(t) => t.apply(rows, ctx),
			Transform::Merge(t) => t.apply(rows, ctx),
			Transform::Filter(t) => t.apply(rows, ctx),
			Transform::GroupBy(t) => t.apply(rows, ctx),
			Transform::ConditionalSet(t) => t.apply(rows, ctx),
			Transform::Sort(t) => Ok(t.apply(rows)),
			Transform::Take(t) => Ok(t.apply(rows)),
			Transform::Select(t) => Ok(t.apply(rows)),
		}
	}

	/// Kind-specific checks first, then the base rule every kind honors:
	/// the headers leaving the stage must be collision free.
	pub fn validity(&self, headers: &HeaderContext, files: &FileSet) -> Validity {
		let kind = match self {
			Transform::Join(t) => t.validity(headers, files),
			Transform::Merge(t) => t.validity(headers, files),
			Transform::Filter(t) => t.validity(headers, files),
			Transform::GroupBy(t) => t.validity(headers),
			Transform::ConditionalSet(t) => t.validity(headers, files),
			Transform::Sort(t) => t.validity(headers),
			Transform::Take(t) => t.validity(),
			Transform::Select(t) => t.validity(headers),
		};
		if kind.is_blocking() {
			return kind;
		}
		kind.merge(self.collision_check(headers))
	}

	fn collision_check(&self, headers: &HeaderContext) -> Validity {
		match self.header_effect(headers).duplicate() {
			Some(column) => Validity::invalid(format!("header collision on '{}'", column)),
			None => Validity::Valid,
		}
	}

	pub fn describe(&self) -> String {
		match self {
			Transform::Join(t) => t.describe(),
			Transform::Merge(t) => t.describe(),
			Transform::Filter(t) => t.describe(),
			Transform::GroupBy(t) => t.describe(),
			Transform::ConditionalSet(t) => t.describe(),
			Transform::Sort(t) => t.describe(),
			Transform::Take(t) => t.describe(),
			Transform::Select(t) => t.describe(),
		}
	}
}
