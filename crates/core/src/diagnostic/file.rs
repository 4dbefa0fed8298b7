// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use crate::diagnostic::Diagnostic;

pub fn duplicate_header(file: &str, column: &str) -> Diagnostic {
	Diagnostic {
		code: "FILE_001".to_string(),
		message: format!("file '{}' declares the column '{}' more than once", file, column),
		label: Some("column names must be unique within a file".to_string()),
		help: Some("rename the duplicated column in the source file".to_string()),
		notes: vec![],
	}
}

pub fn malformed_record(file: &str, record: usize, expected: usize, got: usize) -> Diagnostic {
	Diagnostic {
		code: "FILE_002".to_string(),
		message: format!("record {} of file '{}' has {} cells, expected {}", record + 1, file, got, expected),
		label: Some("every record must match the header width".to_string()),
		help: None,
		notes: vec![],
	}
}

pub fn not_loaded(name: &str) -> Diagnostic {
	Diagnostic {
		code: "FILE_003".to_string(),
		message: format!("file '{}' has no data available", name),
		label: Some("the file is still loading or failed to load".to_string()),
		help: Some("wait for the file to finish loading, or re-open it".to_string()),
		notes: vec![],
	}
}

pub fn not_member(name: &str) -> Diagnostic {
	Diagnostic {
		code: "FILE_004".to_string(),
		message: format!("file '{}' is not part of this pipeline", name),
		label: Some("the referenced file was removed from the pipeline".to_string()),
		help: Some("add the file back, or point the stage at another file".to_string()),
		notes: vec![],
	}
}

pub fn unresolved(id: &str) -> Diagnostic {
	Diagnostic {
		code: "FILE_005".to_string(),
		message: format!("file reference '{}' could not be resolved", id),
		label: Some("the saved pipeline references a file that is not open".to_string()),
		help: Some("open the missing file before restoring the pipeline".to_string()),
		notes: vec![],
	}
}
