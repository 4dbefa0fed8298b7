// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use error::Error;
pub use headers::HeaderContext;
pub use row::{Dataset, Row};
pub use sort::SortDirection;

pub mod diagnostic;
mod error;
mod headers;
pub mod num;
mod row;
mod sort;

/// Sentinel cell value for an unresolvable column reference.
pub const REF_ERROR: &str = "#REF!";

/// Sentinel cell value for an aggregate over no usable data.
pub const NO_DATA: &str = "#N/A!";

pub type Result<T> = std::result::Result<T, Error>;
