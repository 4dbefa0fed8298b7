// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tabpipe_core::diagnostic::file as diagnostic;
use tabpipe_core::{Error, HeaderContext, Row};
use uuid::Uuid;

/// Stable identity of an open file, used by join/merge/file-condition
/// references and by the persistence surrogates. Identity never changes for
/// the lifetime of the pipeline, even if the file path does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(Uuid);

impl FileId {
	fn generate() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Display for FileId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Display::fmt(&self.0, f)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
	NotLoaded,
	Loaded,
	Invalid,
}

enum FileData {
	NotLoaded,
	Loaded(Vec<Row>),
	Invalid,
}

/// A tabulated source file as seen by the engine.
///
/// Headers are available synchronously once the file is opened; the row set
/// arrives later, supplied by the out-of-scope reader through [`supply`].
/// All row access goes through [`with_data`], which yields nothing unless
/// the file is fully loaded.
///
/// [`supply`]: TabulatedFile::supply
/// [`with_data`]: TabulatedFile::with_data
pub struct TabulatedFile {
	id: FileId,
	name: String,
	headers: HeaderContext,
	data: RwLock<FileData>,
}

impl TabulatedFile {
	/// Opens a file handle with known headers and no data yet.
	///
	/// Duplicate header names are rejected here, not auto-renamed, so that
	/// saved pipelines referencing columns by name stay unambiguous.
	pub fn open(name: impl Into<String>, headers: Vec<String>) -> crate::Result<Arc<Self>> {
		let name = name.into();
		let headers = HeaderContext::new(headers);
		if let Some(column) = headers.duplicate() {
			return Err(Error(diagnostic::duplicate_header(&name, column)));
		}
		Ok(Arc::new(Self {
			id: FileId::generate(),
			name,
			headers,
			data: RwLock::new(FileData::NotLoaded),
		}))
	}

	pub fn id(&self) -> FileId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn headers(&self) -> &HeaderContext {
		&self.headers
	}

	pub fn state(&self) -> LoadState {
		match &*self.data.read() {
			FileData::NotLoaded => LoadState::NotLoaded,
			FileData::Loaded(_) => LoadState::Loaded,
			FileData::Invalid => LoadState::Invalid,
		}
	}

	/// Called by the reader once parsing finishes. Records whose width does
	/// not match the header width mark the whole file invalid.
	pub fn supply(&self, records: Vec<Vec<String>>) -> crate::Result<()> {
		let width = self.headers.len();
		let mut rows = Vec::with_capacity(records.len());
		for (index, record) in records.into_iter().enumerate() {
			if record.len() != width {
				*self.data.write() = FileData::Invalid;
				return Err(Error(diagnostic::malformed_record(&self.name, index, width, record.len())));
			}
			rows.push(self.headers.iter().cloned().zip(record).collect());
		}
		*self.data.write() = FileData::Loaded(rows);
		Ok(())
	}

	/// Called by the reader when parsing fails.
	pub fn mark_invalid(&self) {
		*self.data.write() = FileData::Invalid;
	}

	/// Runs `block` against the loaded row set, or yields nothing if the
	/// file is not loaded. Never panics, never blocks on a pending load.
	pub fn with_data<R>(&self, block: impl FnOnce(&[Row]) -> R) -> Option<R> {
		match &*self.data.read() {
			FileData::Loaded(rows) => Some(block(rows)),
			_ => None,
		}
	}
}

impl fmt::Debug for TabulatedFile {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("TabulatedFile")
			.field("id", &self.id)
			.field("name", &self.name)
			.field("headers", &self.headers)
			.field("state", &self.state())
			.finish()
	}
}

/// The pipeline-level set of open files, ordered by insertion.
/// Membership is by identity, not by path.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
	files: Vec<Arc<TabulatedFile>>,
}

impl FileSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, file: Arc<TabulatedFile>) {
		if !self.contains(file.id()) {
			self.files.push(file);
		}
	}

	pub fn remove(&mut self, id: FileId) -> Option<Arc<TabulatedFile>> {
		let index = self.files.iter().position(|f| f.id() == id)?;
		Some(self.files.remove(index))
	}

	pub fn contains(&self, id: FileId) -> bool {
		self.files.iter().any(|f| f.id() == id)
	}

	pub fn get(&self, id: FileId) -> Option<&Arc<TabulatedFile>> {
		self.files.iter().find(|f| f.id() == id)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arc<TabulatedFile>> {
		self.files.iter()
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}
}
