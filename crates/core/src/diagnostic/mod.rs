// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

pub mod condition;
pub mod file;
pub mod pipeline;

use serde::{Deserialize, Serialize};

/// A structured, user-facing description of a failure.
///
/// Diagnostics carry configuration and resource problems out of the engine;
/// per-cell data problems never become diagnostics, they are absorbed into
/// sentinel values instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
	pub code: String,
	pub message: String,
	pub label: Option<String>,
	pub help: Option<String>,
	pub notes: Vec<String>,
}

pub struct DefaultRenderer;

impl DefaultRenderer {
	pub fn render_string(diagnostic: &Diagnostic) -> String {
		let mut out = format!("[{}] {}", diagnostic.code, diagnostic.message);
		if let Some(label) = &diagnostic.label {
			out.push_str("\n  → ");
			out.push_str(label);
		}
		if let Some(help) = &diagnostic.help {
			out.push_str("\n  help: ");
			out.push_str(help);
		}
		for note in &diagnostic.notes {
			out.push_str("\n  note: ");
			out.push_str(note);
		}
		out
	}
}
