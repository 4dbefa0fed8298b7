// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

/// Parses a cell as a double, yielding NaN when the cell does not parse.
///
/// Comparisons against the result follow IEEE-754 rules, so every ordering
/// comparison against an unparseable cell evaluates to false.
pub fn parse_float(cell: &str) -> f64 {
	cell.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Renders an f64 the way a spreadsheet cell would: integral values without
/// a trailing fraction, everything else in the shortest round-trip form.
pub fn format_float(value: f64) -> String {
	if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
		format!("{}", value as i64)
	} else {
		value.to_string()
	}
}
