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

//! Facade and handler for the rest of the blockchain implementation and
//! mostly the chain pipeline. Admission is serialized here: at most one
//! block goes through the pipeline at a time and the tip advances
//! atomically relative to observers.

use std::sync::Arc;

use quantcoin_core::consensus;
use quantcoin_core::{Address, Block, Previous};
use quantcoin_util::Mutex;

use crate::error::Error;
use crate::pipe::{self, BlockContext};
use crate::types::{ChainAdapter, ChainStore, Tip};

/// Facade to the blockchain block processing pipeline and storage.
pub struct Chain {
	store: Arc<dyn ChainStore>,
	adapter: Arc<dyn ChainAdapter>,
	// Serializes admission; also the authoritative in-memory tip.
	head: Mutex<Tip>,
}

impl Chain {
	/// Initializes the chain from what the store already holds and
	/// returns a new Chain instance.
	pub fn init(
		store: Arc<dyn ChainStore>,
		adapter: Arc<dyn ChainAdapter>,
	) -> Result<Chain, Error> {
		let height = store.chain_length()?;
		let last_block = match store.tip_block()? {
			Some(b) => match b.digest {
				Some(d) => Previous::Block(d),
				None => Previous::Genesis,
			},
			None => Previous::Genesis,
		};
		let head = Tip { height, last_block };

		info!(
			"chain init: {} blocks, tip {}",
			head.height, head.last_block
		);

		Ok(Chain {
			store,
			adapter,
			head: Mutex::new(head),
		})
	}

	/// Attempt to add a new block to the chain, running it through the
	/// full acceptance pipeline. Returns the new tip on acceptance. The
	/// store lock is only ever taken while holding the admission lock
	/// (lock order: admission, then store).
	pub fn process_block(&self, b: &Block) -> Result<Tip, Error> {
		let tip = {
			let mut head = self.head.lock();
			let ctx = BlockContext {
				store: self.store.as_ref(),
				head: head.clone(),
			};
			let tip = pipe::process_block(b, &ctx).map_err(|e| {
				info!(
					"block {} rejected: {}",
					b.digest
						.map(|d| d.to_string())
						.unwrap_or_else(|| "unmined".to_string()),
					e
				);
				e
			})?;
			*head = tip.clone();
			tip
		};

		debug!("block accepted, tip now {} @ {}", tip.height, tip.last_block);
		// adapter runs outside the admission lock
		self.adapter.block_accepted(b, &tip);
		Ok(tip)
	}

	/// The current tip of the chain.
	pub fn head(&self) -> Tip {
		self.head.lock().clone()
	}

	/// Number of blocks in the chain.
	pub fn height(&self) -> u64 {
		self.head.lock().height
	}

	/// Difficulty required of the next block, from the consensus
	/// schedule. The miner must use this rather than any local estimate.
	pub fn next_difficulty(&self) -> usize {
		consensus::network_difficulty(self.height())
	}

	/// Reward the next block may issue through its coinbase.
	pub fn next_reward(&self) -> u64 {
		consensus::reward(self.height())
	}

	/// The full chain, tip last.
	pub fn blocks(&self) -> Result<Vec<Block>, Error> {
		Ok(self.store.blocks()?)
	}

	/// Half-open range `[lo, hi)` of blocks.
	pub fn block_range(&self, lo: u64, hi: u64) -> Result<Vec<Block>, Error> {
		Ok(self.store.block_range(lo, hi)?)
	}

	/// The block currently at the tip, if the chain is non-empty.
	pub fn tip_block(&self) -> Result<Option<Block>, Error> {
		Ok(self.store.tip_block()?)
	}

	/// Balance of the provided address at the current chain state.
	pub fn amount_owned(&self, addr: &Address) -> Result<u64, Error> {
		Ok(self.store.amount_owned(addr)?)
	}
}
