// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use execute::ComputePool;
pub use file::{FileId, FileSet, LoadState, TabulatedFile};
pub use pipeline::{Pipeline, RunContext};
pub use validity::Validity;

pub mod aggregate;
pub mod condition;
mod execute;
mod file;
pub mod persist;
mod pipeline;
pub mod transform;
mod validity;

pub type Result<T> = std::result::Result<T, tabpipe_core::Error>;
