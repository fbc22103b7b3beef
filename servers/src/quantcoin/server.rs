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

//! QuantCoin server implementation, glues the different parts of the
//! system (mostly the peer-to-peer server, the blockchain and the
//! transaction pool) and acts as a facade.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use fs2::FileExt;

use quantcoin_chain as chain;
use quantcoin_p2p as p2p;
use quantcoin_pool::TransactionPool;
use quantcoin_util::StopState;

use crate::common::adapters::{ChainToPoolAdapter, NetToChainAdapter};
use crate::common::types::{Error, ServerConfig};
use crate::mining::miner::Miner;

/// QuantCoin server holding internal structures.
pub struct Server {
	/// server config
	pub config: ServerConfig,
	/// data store access through the chain
	pub chain: Arc<chain::Chain>,
	/// every peer we know of and the gossip fan-out
	pub peers: Arc<p2p::Peers>,
	/// in-memory transaction pool
	pub tx_pool: Arc<TransactionPool>,
	/// Stop flag shared by the listener, the miner and the owner of this
	/// server.
	pub stop_state: Arc<StopState>,
	// Maintain a lock_file so we do not run multiple nodes from same dir.
	_lock_file: File,
	p2p_thread: JoinHandle<()>,
	miner_thread: Option<JoinHandle<()>>,
}

impl Server {
	/// Instantiates and starts a new server: opens the journals, wires
	/// the adapters, starts the listener and (when configured) the
	/// miner, and announces us to any configured seed.
	pub fn start(config: ServerConfig) -> Result<Server, Error> {
		// Obtain our lock_file or fail immediately.
		let lock_file = Server::one_node_at_a_time(&config)?;

		let stop_state = Arc::new(StopState::new());

		let tx_pool = Arc::new(TransactionPool::new(config.pool_config.clone()));

		let chain_adapter = Arc::new(ChainToPoolAdapter::new(tx_pool.clone()));
		let chain_store = Arc::new(chain::JournalChainStore::new(&config.db_root)?);
		let shared_chain = Arc::new(chain::Chain::init(chain_store, chain_adapter)?);

		let net_adapter = Arc::new(NetToChainAdapter::new(
			shared_chain.clone(),
			tx_pool.clone(),
		));

		let peer_store = p2p::PeerStore::new(&config.db_root)?;
		let peers = Arc::new(p2p::Peers::new(peer_store));
		net_adapter.init(peers.clone());

		let p2p_server = p2p::Server::new(
			config.p2p_config.clone(),
			net_adapter.clone(),
			stop_state.clone(),
		);
		let p2p_thread = thread::Builder::new()
			.name("p2p-server".to_string())
			.spawn(move || {
				if let Err(e) = p2p_server.listen() {
					error!("p2p server failed: {:?}", e);
				}
			})?;

		// seed the peer set and announce ourselves
		for seed in &config.seeds {
			let addr = crate::common::types::parse_seed(seed).ok_or_else(|| {
				Error::FatalConfig(format!("unparseable seed address: {}", seed))
			})?;
			peers.add_peer(addr);
		}
		if !config.seeds.is_empty() {
			if let Some(ref advertised) = config.advertised_address {
				peers.broadcast_register(advertised.clone(), config.p2p_config.port);
			}
		}

		let miner_thread = match config.mining_config {
			Some(ref mining_config) if mining_config.enable_mining => {
				if mining_config.wallet_address.is_empty() {
					return Err(Error::FatalConfig(
						"mining enabled but no wallet address configured".to_string(),
					));
				}
				let miner = Miner::new(
					mining_config.clone(),
					shared_chain.clone(),
					tx_pool.clone(),
					peers.clone(),
					stop_state.clone(),
				);
				Some(
					thread::Builder::new()
						.name("miner".to_string())
						.spawn(move || miner.run_loop())?,
				)
			}
			_ => None,
		};

		info!(
			"server started, chain at {} with {} known peers",
			shared_chain.height(),
			peers.peer_count()
		);

		Ok(Server {
			config,
			chain: shared_chain,
			peers,
			tx_pool,
			stop_state,
			_lock_file: lock_file,
			p2p_thread,
			miner_thread,
		})
	}

	// Exclusive (advisory) lock_file to ensure we do not run multiple
	// instances of the node from the same dir.
	fn one_node_at_a_time(config: &ServerConfig) -> Result<File, Error> {
		let path = Path::new(&config.db_root);
		fs::create_dir_all(path)?;
		let path = path.join("quantcoin.lock");
		let lock_file = fs::OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.open(&path)?;
		lock_file.try_lock_exclusive().map_err(|e| {
			error!(
				"Failed to lock {:?} (node already running against this dir?)",
				path
			);
			Error::IO(e)
		})?;
		Ok(lock_file)
	}

	/// Stops the server: flips the stop flag, waits for the listener,
	/// the miner and any outstanding gossip fan-out to wind down.
	pub fn stop(self) {
		info!("stopping server");
		self.stop_state.stop();
		if let Some(miner_thread) = self.miner_thread {
			let _ = miner_thread.join();
		}
		let _ = self.p2p_thread.join();
		self.peers.join_outstanding();
	}
}
