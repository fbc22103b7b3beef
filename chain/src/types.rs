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

//! Base types the chain pipeline is built upon: the tip, the store
//! contract and the adapter notified of accepted blocks.

use quantcoin_core::{Address, Block, Previous};
use quantcoin_store as store;

/// The tip of the chain: its length and the digest of its last accepted
/// block (the genesis sentinel for an empty chain).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tip {
	/// Number of blocks in the chain up to and including this tip.
	pub height: u64,
	/// Digest of the tip block, or [`Previous::Genesis`] when empty.
	pub last_block: Previous,
}

impl Tip {
	/// The tip of an empty chain.
	pub fn empty() -> Tip {
		Tip {
			height: 0,
			last_block: Previous::Genesis,
		}
	}

	/// The tip that results from appending the provided accepted block.
	pub fn append(&self, b: &Block) -> Tip {
		Tip {
			height: self.height + 1,
			last_block: match b.digest {
				Some(d) => Previous::Block(d),
				None => self.last_block,
			},
		}
	}
}

/// Contract the chain requires from its durable store: ordered,
/// append-only block storage plus balance queries, all thread-safe and
/// serializable with respect to each other.
pub trait ChainStore: Send + Sync {
	/// The full chain, tip last.
	fn blocks(&self) -> Result<Vec<Block>, store::Error>;

	/// Half-open range `[lo, hi)` of blocks by position in the chain.
	fn block_range(&self, lo: u64, hi: u64) -> Result<Vec<Block>, store::Error>;

	/// Number of blocks stored.
	fn chain_length(&self) -> Result<u64, store::Error>;

	/// The last stored block, if any.
	fn tip_block(&self) -> Result<Option<Block>, store::Error>;

	/// Appends a block. Idempotent: re-storing the current tip block is a
	/// no-op. Overwriting or reordering is forbidden.
	fn store_block(&self, b: &Block) -> Result<(), store::Error>;

	/// Sum over accepted blocks of credits minus debits for this address,
	/// snapshot-consistent within a single call.
	fn amount_owned(&self, addr: &Address) -> Result<u64, store::Error>;
}

/// Bridge between the chain and the rest of the system: notified when a
/// block made it through the acceptance pipeline, after the tip advanced.
pub trait ChainAdapter: Send + Sync {
	/// The block was accepted and the tip advanced to it.
	fn block_accepted(&self, b: &Block, tip: &Tip);
}

/// Inert adapter used for testing and for nodes with nothing to notify.
pub struct NoopAdapter {}

impl ChainAdapter for NoopAdapter {
	fn block_accepted(&self, _b: &Block, _tip: &Tip) {}
}

/// Credits minus debits for `addr` over the provided blocks: amounts paid
/// to it, plus commissions of blocks it authored, minus everything spent
/// from it. Saturates at zero rather than going negative, which can only
/// happen on a chain that was not validated by this pipeline.
pub fn balance(blocks: &[Block], addr: &Address) -> u64 {
	let mut credit: u64 = 0;
	let mut debit: u64 = 0;
	for b in blocks {
		if b.author == *addr {
			credit += b.commission();
		}
		for tx in &b.transactions {
			for out in tx.outputs() {
				if out.address() == addr {
					credit += out.amount();
				}
			}
			if tx.from_wallet() == Some(addr) {
				debit += tx.amount_spent();
			}
		}
	}
	credit.saturating_sub(debit)
}

#[cfg(test)]
mod test {
	use super::*;
	use quantcoin_core::{Digest, Output, Transaction};

	#[test]
	fn tip_append_advances() {
		let addr = Address::from("QCminer");
		let mut b = Block::new(addr.clone(), vec![], Previous::Genesis);
		b.nonce = Some(0);
		b.digest = Some(Digest([0; 32]));

		let tip = Tip::empty().append(&b);
		assert_eq!(tip.height, 1);
		assert_eq!(tip.last_block, Previous::Block(Digest([0; 32])));
	}

	#[test]
	fn balance_counts_credits_debits_and_commissions() {
		let miner = Address::from("QCminer");
		let alice = Address::from("QCalice");
		let bob = Address::from("QCbob");

		let txs = vec![
			Transaction::coinbase(&miner, 100),
			Transaction::new(
				Some(alice.clone()),
				vec![Output(bob.clone(), 10, 2)],
				vec![1; 64],
				vec![1; 64],
			),
		];
		let b = Block::new(miner.clone(), txs, Previous::Genesis);
		let blocks = vec![b];

		assert_eq!(balance(&blocks, &miner), 102); // coinbase + commission
		assert_eq!(balance(&blocks, &bob), 10);
		assert_eq!(balance(&blocks, &alice), 0); // saturates, alice had nothing
	}
}
