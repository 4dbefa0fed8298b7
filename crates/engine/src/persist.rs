// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Serializable surrogates for project save/load.
//!
//! A surrogate carries exactly a component's configuration fields, never
//! derived state. Cross-file references are persisted as the stable
//! [`FileId`]; resolving them back to live handles on load goes through the
//! [`ResolveFile`] hook.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabpipe_core::diagnostic::file as diagnostic;
use tabpipe_core::{Error, SortDirection};

use crate::aggregate::Aggregate;
use crate::condition::{
	CompareOp, Condition, FileCondition, FileMembership, ListCondition, NumberCondition, RegexCondition,
	TextCondition, TextOp,
};
use crate::file::{FileId, FileSet, TabulatedFile};
use crate::pipeline::Pipeline;
use crate::transform::{
	ConditionalAction, ConditionalSet, Filter, GroupBy, Join, JoinKind, Merge, MergeMode, Select, Sort, Take,
	Transform,
};

/// Resolves a persisted file identifier back to a live handle.
pub trait ResolveFile {
	fn resolve(&self, id: FileId) -> Option<Arc<TabulatedFile>>;
}

impl ResolveFile for FileSet {
	fn resolve(&self, id: FileId) -> Option<Arc<TabulatedFile>> {
		self.get(id).cloned()
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
	pub base: FileId,
	pub files: Vec<FileId>,
	pub transforms: Vec<TransformSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransformSpec {
	Join {
		column: String,
		kind: JoinKind,
		file: FileId,
		file_column: String,
		case_insensitive: bool,
	},
	Merge {
		file: FileId,
		columns: Vec<String>,
		mode: MergeMode,
	},
	Filter {
		conditions: Vec<ConditionSpec>,
	},
	GroupBy {
		columns: Vec<String>,
		aggregates: Vec<Aggregate>,
	},
	ConditionalSet {
		conditions: Vec<ConditionSpec>,
		actions: Vec<ConditionalAction>,
	},
	Sort {
		column: String,
		direction: SortDirection,
	},
	Take {
		count: usize,
	},
	Select {
		columns: Vec<String>,
	},
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionSpec {
	Number {
		column: String,
		op: CompareOp,
		value: String,
	},
	Text {
		column: String,
		op: TextOp,
		value: String,
	},
	Regex {
		column: String,
		pattern: String,
	},
	List {
		column: String,
		values: Vec<String>,
		case_insensitive: bool,
	},
	File {
		column: String,
		file: FileId,
		file_column: String,
		case_insensitive: bool,
		membership: FileMembership,
	},
	All(Vec<ConditionSpec>),
	Any(Vec<ConditionSpec>),
}

impl Pipeline {
	pub fn to_spec(&self) -> PipelineSpec {
		PipelineSpec {
			base: self.base().id(),
			files: self.files().iter().map(|f| f.id()).collect(),
			transforms: self.transforms().iter().map(transform_to_spec).collect(),
		}
	}

	/// The explicit post-load step: every persisted file reference must
	/// resolve before the pipeline comes back to life.
	pub fn from_spec(spec: &PipelineSpec, resolver: &dyn ResolveFile) -> crate::Result<Pipeline> {
		let base = resolve(resolver, spec.base)?;
		let mut pipeline = Pipeline::new(base);
		for id in &spec.files {
			pipeline.add_file(resolve(resolver, *id)?);
		}
		for transform in &spec.transforms {
			pipeline.push(transform_from_spec(transform, resolver)?);
		}
		Ok(pipeline)
	}
}

fn resolve(resolver: &dyn ResolveFile, id: FileId) -> crate::Result<Arc<TabulatedFile>> {
	resolver.resolve(id).ok_or_else(|| Error(diagnostic::unresolved(&id.to_string())))
}

fn transform_to_spec(transform: &Transform) -> TransformSpec {
	match transform {
		Transform::Join(t) => TransformSpec::Join {
			column: t.column.clone(),
			kind: t.kind,
			file: t.file.id(),
			file_column: t.file_column.clone(),
			case_insensitive: t.case_insensitive,
		},
		Transform::Merge(t) => TransformSpec::Merge {
			file: t.file.id(),
			columns: t.columns.clone(),
			mode: t.mode,
		},
		Transform::Filter(t) => TransformSpec::Filter {
			conditions: t.conditions.iter().map(condition_to_spec).collect(),
		},
		Transform::GroupBy(t) => TransformSpec::GroupBy {
			columns: t.columns.clone(),
			aggregates: t.aggregates.clone(),
		},
		Transform::ConditionalSet(t) => TransformSpec::ConditionalSet {
			conditions: t.conditions.iter().map(condition_to_spec).collect(),
			actions: t.actions.clone(),
		},
		Transform::Sort(t) => TransformSpec::Sort {
			column: t.column.clone(),
			direction: t.direction,
		},
		Transform::Take(t) => TransformSpec::Take {
			count: t.count,
		},
		Transform::Select(t) => TransformSpec::Select {
			columns: t.columns.clone(),
		},
	}
}

fn transform_from_spec(spec: &TransformSpec, resolver: &dyn ResolveFile) -> crate::Result<Transform> {
	Ok(match spec {
		TransformSpec::Join {
			column,
			kind,
			file,
			file_column,
			case_insensitive,
		} => Transform::Join(Join {
			column: column.clone(),
			kind: *kind,
			file: resolve(resolver, *file)?,
			file_column: file_column.clone(),
			case_insensitive: *case_insensitive,
		}),
		TransformSpec::Merge {
			file,
			columns,
			mode,
		} => Transform::Merge(Merge {
			file: resolve(resolver, *file)?,
			columns: columns.clone(),
			mode: *mode,
		}),
		TransformSpec::Filter {
			conditions,
		} => Transform::Filter(Filter {
			conditions: conditions_from_spec(conditions, resolver)?,
		}),
		TransformSpec::GroupBy {
			columns,
			aggregates,
		} => Transform::GroupBy(GroupBy {
			columns: columns.clone(),
			aggregates: aggregates.clone(),
		}),
		TransformSpec::ConditionalSet {
			conditions,
			actions,
		} => Transform::ConditionalSet(ConditionalSet {
			conditions: conditions_from_spec(conditions, resolver)?,
			actions: actions.clone(),
		}),
		TransformSpec::Sort {
			column,
			direction,
		} => Transform::Sort(Sort {
			column: column.clone(),
			direction: *direction,
		}),
		TransformSpec::Take {
			count,
		} => Transform::Take(Take {
			count: *count,
		}),
		TransformSpec::Select {
			columns,
		} => Transform::Select(Select {
			columns: columns.clone(),
		}),
	})
}

fn condition_to_spec(condition: &Condition) -> ConditionSpec {
	match condition {
		Condition::Number(c) => ConditionSpec::Number {
			column: c.column.clone(),
			op: c.op,
			value: c.value.clone(),
		},
		Condition::Text(c) => ConditionSpec::Text {
			column: c.column.clone(),
			op: c.op,
			value: c.value.clone(),
		},
		Condition::Regex(c) => ConditionSpec::Regex {
			column: c.column.clone(),
			pattern: c.pattern.clone(),
		},
		Condition::List(c) => ConditionSpec::List {
			column: c.column.clone(),
			values: c.values.clone(),
			case_insensitive: c.case_insensitive,
		},
		Condition::File(c) => ConditionSpec::File {
			column: c.column.clone(),
			file: c.file.id(),
			file_column: c.file_column.clone(),
			case_insensitive: c.case_insensitive,
			membership: c.membership,
		},
		Condition::All(children) => ConditionSpec::All(children.iter().map(condition_to_spec).collect()),
		Condition::Any(children) => ConditionSpec::Any(children.iter().map(condition_to_spec).collect()),
	}
}

fn condition_from_spec(spec: &ConditionSpec, resolver: &dyn ResolveFile) -> crate::Result<Condition> {
	Ok(match spec {
		ConditionSpec::Number {
			column,
			op,
			value,
		} => Condition::Number(NumberCondition {
			column: column.clone(),
			op: *op,
			value: value.clone(),
		}),
		ConditionSpec::Text {
			column,
			op,
			value,
		} => Condition::Text(TextCondition {
			column: column.clone(),
			op: *op,
			value: value.clone(),
		}),
		ConditionSpec::Regex {
			column,
			pattern,
		} => Condition::Regex(RegexCondition {
			column: column.clone(),
			pattern: pattern.clone(),
		}),
		ConditionSpec::List {
			column,
			values,
			case_insensitive,
		} => Condition::List(ListCondition {
			column: column.clone(),
			values: values.clone(),
			case_insensitive: *case_insensitive,
		}),
		ConditionSpec::File {
			column,
			file,
			file_column,
			case_insensitive,
			membership,
		} => Condition::File(FileCondition {
			column: column.clone(),
			file: resolve(resolver, *file)?,
			file_column: file_column.clone(),
			case_insensitive: *case_insensitive,
			membership: *membership,
		}),
		ConditionSpec::All(children) => Condition::All(conditions_from_spec(children, resolver)?),
		ConditionSpec::Any(children) => Condition::Any(conditions_from_spec(children, resolver)?),
	})
}

fn conditions_from_spec(specs: &[ConditionSpec], resolver: &dyn ResolveFile) -> crate::Result<Vec<Condition>> {
	specs.iter().map(|spec| condition_from_spec(spec, resolver)).collect()
}
