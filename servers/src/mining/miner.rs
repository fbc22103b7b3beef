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

//! Mining service: drains the transaction pool once it satisfies the
//! configured thresholds, assembles a block on top of the current tip
//! and searches for its proof of work. Any valid mined block goes
//! through our own chain pipeline first and is then announced to the
//! network.
//!
//! The search runs in bounded nonce windows; between windows the miner
//! observes the stop flag and the chain tip, so both cancellation and a
//! better block from the network are picked up promptly. The miner
//! never holds the pool lock while hashing or talking to the chain.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use quantcoin_chain as chain;
use quantcoin_core::crypto::Address;
use quantcoin_core::{Block, Transaction};
use quantcoin_p2p as p2p;
use quantcoin_pool::TransactionPool;
use quantcoin_util::StopState;

use crate::common::types::MinerConfig;

/// Mining service, mines blocks from pooled transactions on its own
/// thread until stopped.
pub struct Miner {
	config: MinerConfig,
	chain: Arc<chain::Chain>,
	tx_pool: Arc<TransactionPool>,
	peers: Arc<p2p::Peers>,
	stop_state: Arc<StopState>,
}

enum SearchOutcome {
	Found(Block),
	TipChanged,
	Stopped,
}

impl Miner {
	/// Creates a new Miner. Needs references to the chain state, the
	/// pool it feeds from and the peers to announce mined blocks to.
	pub fn new(
		config: MinerConfig,
		chain: Arc<chain::Chain>,
		tx_pool: Arc<TransactionPool>,
		peers: Arc<p2p::Peers>,
		stop_state: Arc<StopState>,
	) -> Miner {
		Miner {
			config,
			chain,
			tx_pool,
			peers,
			stop_state,
		}
	}

	/// Starts the mining loop: gather, build, search, publish, over and
	/// over until the stop flag flips.
	pub fn run_loop(&self) {
		let author = Address(self.config.wallet_address.clone());
		info!("miner: starting loop, rewards to {}", author);

		let gather_sleep = Duration::from_millis(self.config.gather_sleep_ms);
		while !self.stop_state.is_stopped() {
			// gather: wait until the pool satisfies the thresholds
			let snapshot = match self.tx_pool.take_ready() {
				Some(txs) => txs,
				None => {
					trace!(
						"miner: pool not ready ({} txs, {} commission)",
						self.tx_pool.len(),
						self.tx_pool.total_commission()
					);
					thread::sleep(gather_sleep);
					continue;
				}
			};

			// build: block on top of the current tip, coinbase first
			let head = self.chain.head();
			let difficulty = self.chain.next_difficulty();
			let mut txs = snapshot.clone();
			txs.push(Transaction::coinbase(&author, self.chain.next_reward()));
			let block = Block::new(author.clone(), txs, head.last_block);

			info!(
				"miner: mining block with {} transactions at difficulty {} on tip {}",
				block.transactions.len(),
				difficulty,
				head.height
			);

			// search: bounded windows so stop and tip changes are seen
			match self.search(block, difficulty, &head) {
				SearchOutcome::Found(b) => self.publish(b, snapshot),
				SearchOutcome::TipChanged => {
					debug!("miner: tip changed mid-search, rebuilding");
					self.reinstate(snapshot);
				}
				SearchOutcome::Stopped => {
					self.reinstate(snapshot);
					break;
				}
			}
		}
		info!("miner: stopped");
	}

	fn search(&self, mut block: Block, difficulty: usize, head: &chain::Tip) -> SearchOutcome {
		let window = self.config.nonce_window.max(1);
		let mut nonce: u64 = 0;
		loop {
			let end = nonce.saturating_add(window - 1);
			if block.proof_of_work(difficulty, nonce, end) {
				return SearchOutcome::Found(block);
			}
			if self.stop_state.is_stopped() {
				return SearchOutcome::Stopped;
			}
			if self.chain.head() != *head {
				return SearchOutcome::TipChanged;
			}
			if end == u64::max_value() {
				// the whole nonce space is exhausted, start the attempt
				// over (practically unreachable)
				return SearchOutcome::TipChanged;
			}
			nonce = end + 1;
		}
	}

	/// Pushes the mined block through our own chain pipeline, then
	/// announces it to the network. Transactions that did not make it
	/// into the accepted chain go back to the pool.
	fn publish(&self, block: Block, snapshot: Vec<Transaction>) {
		info!(
			"miner: found valid proof of work, block {}",
			block
				.digest
				.map(|d| d.to_string())
				.unwrap_or_else(|| "unmined".to_string()),
		);
		match self.chain.process_block(&block) {
			Ok(tip) => {
				debug!("miner: own block accepted, tip at {}", tip.height);
				self.peers.broadcast_block(&block);
			}
			Err(e) => {
				// typically raced a network block onto the old tip
				warn!("miner: mined block rejected by own chain: {}", e);
				self.reinstate(snapshot);
			}
		}
	}

	/// Returns un-included, still-valid snapshot transactions to the
	/// pool rather than dropping them on the floor.
	fn reinstate(&self, snapshot: Vec<Transaction>) {
		let tip_block = self.chain.tip_block().unwrap_or_else(|e| {
			warn!("miner: could not read tip block: {}", e);
			None
		});
		self.tx_pool.reinstate(snapshot, tip_block.as_ref());
	}
}
