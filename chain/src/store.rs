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

//! Durable chain store: a journal-backed implementation of the
//! [`ChainStore`](crate::types::ChainStore) contract.

use std::path::Path;

use quantcoin_core::{Address, Block, Previous};
use quantcoin_store::{Error, Journal};
use quantcoin_util::RwLock;

use crate::types::{balance, ChainStore};

const BLOCKS_JOURNAL: &str = "blocks.jsonl";

/// Chain store keeping the full chain in memory and appending every
/// accepted block to a JSON-lines journal for durability.
pub struct JournalChainStore {
	journal: Journal,
	blocks: RwLock<Vec<Block>>,
}

impl JournalChainStore {
	/// Opens the chain journal under the provided data directory,
	/// replaying and link-checking any existing chain.
	pub fn new(db_root: &str) -> Result<JournalChainStore, Error> {
		let path = Path::new(db_root).join(BLOCKS_JOURNAL);
		let (journal, blocks): (Journal, Vec<Block>) = Journal::open(&path)?;

		// a journal written by this node always replays to a linked
		// chain, anything else is corruption
		let mut previous = Previous::Genesis;
		for (n, b) in blocks.iter().enumerate() {
			if b.previous != previous {
				return Err(Error::CorruptedJournal(format!(
					"block {} does not link to its parent",
					n
				)));
			}
			previous = match b.digest {
				Some(d) => Previous::Block(d),
				None => {
					return Err(Error::CorruptedJournal(format!("block {} has no digest", n)));
				}
			};
		}

		Ok(JournalChainStore {
			journal,
			blocks: RwLock::new(blocks),
		})
	}
}

impl ChainStore for JournalChainStore {
	fn blocks(&self) -> Result<Vec<Block>, Error> {
		Ok(self.blocks.read().clone())
	}

	fn block_range(&self, lo: u64, hi: u64) -> Result<Vec<Block>, Error> {
		let blocks = self.blocks.read();
		let lo = (lo as usize).min(blocks.len());
		let hi = (hi as usize).min(blocks.len());
		if lo >= hi {
			return Ok(vec![]);
		}
		Ok(blocks[lo..hi].to_vec())
	}

	fn chain_length(&self) -> Result<u64, Error> {
		Ok(self.blocks.read().len() as u64)
	}

	fn tip_block(&self) -> Result<Option<Block>, Error> {
		Ok(self.blocks.read().last().cloned())
	}

	fn store_block(&self, b: &Block) -> Result<(), Error> {
		let mut blocks = self.blocks.write();

		// idempotent append: re-storing the tip is a no-op
		if let Some(tip) = blocks.last() {
			if tip.digest == b.digest {
				return Ok(());
			}
		}

		self.journal.append(b)?;
		blocks.push(b.clone());
		Ok(())
	}

	fn amount_owned(&self, addr: &Address) -> Result<u64, Error> {
		Ok(balance(&self.blocks.read(), addr))
	}
}
