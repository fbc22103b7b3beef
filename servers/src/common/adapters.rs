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

//! Adapters connecting new block and new transaction events to the
//! consumers of those events. These break the reference cycles between
//! miner, network, chain and pool: the network only knows the chain
//! through its adapter, and the chain notifies the pool the same way.

use std::sync::Arc;

use quantcoin_chain as chain;
use quantcoin_core::{Block, Transaction};
use quantcoin_p2p as p2p;
use quantcoin_pool::TransactionPool;
use quantcoin_util::OneTime;

/// Implementation of the NetAdapter for the node. Gets notified when new
/// blocks and transactions are received and forwards to the chain and
/// pool implementations, re-gossiping whatever was accepted.
pub struct NetToChainAdapter {
	chain: Arc<chain::Chain>,
	tx_pool: Arc<TransactionPool>,
	peers: OneTime<Arc<p2p::Peers>>,
}

impl NetToChainAdapter {
	/// Builds the adapter over the chain and pool. The peer set is
	/// initialized later, once the p2p server exists.
	pub fn new(chain: Arc<chain::Chain>, tx_pool: Arc<TransactionPool>) -> NetToChainAdapter {
		NetToChainAdapter {
			chain,
			tx_pool,
			peers: OneTime::new(),
		}
	}

	/// Initialize the adapter with the dynamic set of known peers.
	pub fn init(&self, peers: Arc<p2p::Peers>) {
		self.peers.init(peers);
	}
}

impl p2p::NetAdapter for NetToChainAdapter {
	fn find_peer_addrs(&self) -> Vec<p2p::PeerAddr> {
		self.peers.borrow().all_peers()
	}

	fn peer_address_received(&self, addr: p2p::PeerAddr) {
		self.peers.borrow().add_peer(addr);
	}

	fn blocks_requested(&self, range: Option<(u64, u64)>) -> Vec<Block> {
		let res = match range {
			Some((lo, hi)) => self.chain.block_range(lo, hi),
			None => self.chain.blocks(),
		};
		res.unwrap_or_else(|e| {
			error!("could not read blocks for peer: {}", e);
			vec![]
		})
	}

	fn block_received(&self, b: Block) -> bool {
		match self.chain.process_block(&b) {
			Ok(tip) => {
				debug!("network block accepted, tip at {}", tip.height);
				// accepted blocks keep travelling; rejected ones stop here
				self.peers.borrow().broadcast_block(&b);
				true
			}
			Err(e) => {
				debug!("network block rejected: {}", e);
				false
			}
		}
	}

	fn transaction_received(&self, tx: Transaction) -> bool {
		match self.tx_pool.add_to_pool(tx.clone()) {
			Ok(()) => {
				// first sighting, keep it moving through the network
				self.peers.borrow().broadcast_transaction(&tx);
				true
			}
			Err(e) => {
				debug!("transaction not pooled: {}", e);
				false
			}
		}
	}
}

/// Implementation of the ChainAdapter for the node: accepted blocks are
/// reconciled against the transaction pool so the miner never re-mines
/// what the network already confirmed.
pub struct ChainToPoolAdapter {
	tx_pool: Arc<TransactionPool>,
}

impl ChainToPoolAdapter {
	/// Builds the adapter over the pool.
	pub fn new(tx_pool: Arc<TransactionPool>) -> ChainToPoolAdapter {
		ChainToPoolAdapter { tx_pool }
	}
}

impl chain::ChainAdapter for ChainToPoolAdapter {
	fn block_accepted(&self, b: &Block, tip: &chain::Tip) {
		trace!("reconciling pool against block at height {}", tip.height);
		self.tx_pool.reconcile(b);
	}
}
