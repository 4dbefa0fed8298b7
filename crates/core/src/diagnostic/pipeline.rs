// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use crate::diagnostic::Diagnostic;

pub fn stage_invalid(stage: usize, reason: &str) -> Diagnostic {
	Diagnostic {
		code: "PIPELINE_001".to_string(),
		message: format!("stage {} is not runnable: {}", stage + 1, reason),
		label: Some("this stage blocks the run".to_string()),
		help: Some("fix the stage configuration before running the pipeline".to_string()),
		notes: vec![],
	}
}

pub fn base_file_not_loaded(name: &str) -> Diagnostic {
	Diagnostic {
		code: "PIPELINE_002".to_string(),
		message: format!("base file '{}' has no data available", name),
		label: Some("the file is still loading or failed to load".to_string()),
		help: Some("wait for the file to finish loading, or re-open it".to_string()),
		notes: vec![],
	}
}

pub fn execution_failed(stage: usize, reason: &str) -> Diagnostic {
	Diagnostic {
		code: "PIPELINE_003".to_string(),
		message: format!("execution aborted at stage {}: {}", stage + 1, reason),
		label: Some("no partial output was produced".to_string()),
		help: None,
		notes: vec![],
	}
}
