// Copyright 2020 The QuantCoin Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Storage of core types in append-only JSON-lines journals.
//!
//! The chain and the peer set are both append-only by design, so the
//! durable form is a journal: one JSON object per line, replayed into
//! memory on open. Writers append and flush under a mutex; readers only
//! ever see the in-memory state rebuilt at open time.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![warn(missing_docs)]

#[macro_use]
extern crate log;

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use quantcoin_util::Mutex;

/// Main error type for this crate.
#[derive(Debug)]
pub enum Error {
	/// Wraps an error coming from the filesystem
	IoErr(io::Error),
	/// Wraps a serialization error of a journal entry
	SerErr(serde_json::Error),
	/// The journal on disk doesn't replay to a consistent state
	CorruptedJournal(String),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::IoErr(e) => write!(f, "I/O Error: {}", e),
			Error::SerErr(e) => write!(f, "Serialization Error: {}", e),
			Error::CorruptedJournal(s) => write!(f, "Corrupted Journal: {}", s),
		}
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::IoErr(e)
	}
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Error {
		Error::SerErr(e)
	}
}

/// An append-only journal of JSON-serializable entries, one per line.
pub struct Journal {
	path: PathBuf,
	file: Mutex<File>,
}

impl Journal {
	/// Opens the journal at the provided path, creating it (and any
	/// missing parent directory) if necessary, and replays all existing
	/// entries. A line that doesn't parse fails the open rather than
	/// being skipped.
	pub fn open<T: DeserializeOwned>(path: &Path) -> Result<(Journal, Vec<T>), Error> {
		if let Some(dir) = path.parent() {
			std::fs::create_dir_all(dir)?;
		}
		let mut file = OpenOptions::new()
			.read(true)
			.append(true)
			.create(true)
			.open(path)?;

		let mut entries = vec![];
		{
			let reader = BufReader::new(&mut file);
			for (n, line) in reader.lines().enumerate() {
				let line = line?;
				if line.trim().is_empty() {
					continue;
				}
				let entry = serde_json::from_str(&line).map_err(|e| {
					Error::CorruptedJournal(format!("{}:{}: {}", path.display(), n + 1, e))
				})?;
				entries.push(entry);
			}
		}
		file.seek(SeekFrom::End(0))?;

		debug!(
			"journal {} opened, {} entries replayed",
			path.display(),
			entries.len()
		);
		Ok((
			Journal {
				path: path.to_path_buf(),
				file: Mutex::new(file),
			},
			entries,
		))
	}

	/// Appends one entry to the journal and flushes it to disk before
	/// returning.
	pub fn append<T: Serialize>(&self, entry: &T) -> Result<(), Error> {
		let mut line = serde_json::to_vec(entry)?;
		line.push(b'\n');

		let mut file = self.file.lock();
		file.write_all(&line)?;
		file.sync_data()?;
		Ok(())
	}

	/// Path this journal is backed by.
	pub fn path(&self) -> &Path {
		&self.path
	}
}
