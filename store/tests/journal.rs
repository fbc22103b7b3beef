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

//! Journal replay tests

#[macro_use]
extern crate serde_derive;

use std::fs;

use quantcoin_store::{Error, Journal};

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
struct Entry {
	id: u64,
	payload: String,
}

fn entry(id: u64) -> Entry {
	Entry {
		id,
		payload: format!("entry-{}", id),
	}
}

#[test]
fn append_and_replay_across_reopen() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("entries.jsonl");

	{
		let (journal, existing): (Journal, Vec<Entry>) = Journal::open(&path).unwrap();
		assert!(existing.is_empty());
		journal.append(&entry(1)).unwrap();
		journal.append(&entry(2)).unwrap();
	}

	let (journal, replayed): (Journal, Vec<Entry>) = Journal::open(&path).unwrap();
	assert_eq!(replayed, vec![entry(1), entry(2)]);

	// appends after a replay land after the existing entries
	journal.append(&entry(3)).unwrap();
	let (_, replayed): (Journal, Vec<Entry>) = Journal::open(&path).unwrap();
	assert_eq!(replayed.len(), 3);
	assert_eq!(replayed[2], entry(3));
}

#[test]
fn corrupted_line_fails_the_open() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("entries.jsonl");

	{
		let (journal, _): (Journal, Vec<Entry>) = Journal::open(&path).unwrap();
		journal.append(&entry(1)).unwrap();
	}
	let mut raw = fs::read_to_string(&path).unwrap();
	raw.push_str("this is not json\n");
	fs::write(&path, raw).unwrap();

	match Journal::open::<Entry>(&path) {
		Err(Error::CorruptedJournal(_)) => (),
		other => panic!("expected corrupted journal, got {:?}", other.map(|_| ())),
	}
}

#[test]
fn creates_missing_parent_directories() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("nested").join("deep").join("entries.jsonl");
	let (journal, _): (Journal, Vec<Entry>) = Journal::open(&path).unwrap();
	journal.append(&entry(7)).unwrap();
	assert!(path.exists());
}
