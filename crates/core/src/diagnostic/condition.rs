// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use crate::diagnostic::Diagnostic;

pub fn invalid_pattern(pattern: &str, reason: &str) -> Diagnostic {
	Diagnostic {
		code: "CONDITION_001".to_string(),
		message: format!("regular expression '{}' does not compile", pattern),
		label: Some(reason.to_string()),
		help: Some("correct the pattern in the condition configuration".to_string()),
		notes: vec![],
	}
}
