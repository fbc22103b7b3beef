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

//! Mining loop integration tests over a real chain and pool.

pub mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use self::common::TestWallet;
use quantcoin_chain::{Chain, JournalChainStore, NoopAdapter};
use quantcoin_core::Output;
use quantcoin_p2p::{PeerStore, Peers};
use quantcoin_pool::{PoolConfig, TransactionPool};
use quantcoin_servers::{Miner, MinerConfig};
use quantcoin_util::StopState;

struct Harness {
	chain: Arc<Chain>,
	tx_pool: Arc<TransactionPool>,
	stop_state: Arc<StopState>,
	miner_thread: thread::JoinHandle<()>,
}

fn start_miner(db_root: &str, wallet: &TestWallet, min_tx_count: usize) -> Harness {
	let tx_pool = Arc::new(TransactionPool::new(PoolConfig {
		min_tx_count,
		min_commission: -1,
	}));
	let store = Arc::new(JournalChainStore::new(db_root).unwrap());
	let chain = Arc::new(Chain::init(store, Arc::new(NoopAdapter {})).unwrap());
	let peers = Arc::new(Peers::new(PeerStore::new(db_root).unwrap()));
	let stop_state = Arc::new(StopState::new());

	let miner = Miner::new(
		MinerConfig {
			enable_mining: true,
			wallet_address: wallet.address.0.clone(),
			nonce_window: 1 << 14,
			gather_sleep_ms: 20,
		},
		chain.clone(),
		tx_pool.clone(),
		peers,
		stop_state.clone(),
	);
	let miner_thread = thread::spawn(move || miner.run_loop());

	Harness {
		chain,
		tx_pool,
		stop_state,
		miner_thread,
	}
}

fn wait_for_height(chain: &Chain, height: u64, timeout: Duration) {
	let deadline = Instant::now() + timeout;
	while chain.height() < height {
		assert!(
			Instant::now() < deadline,
			"chain stuck at {} waiting for {}",
			chain.height(),
			height
		);
		thread::sleep(Duration::from_millis(20));
	}
}

#[test]
fn miner_builds_the_chain_and_includes_transactions() {
	let dir = tempfile::tempdir().unwrap();
	let wallet = TestWallet::new(1);
	let receiver = TestWallet::new(2);

	// no transaction threshold: the miner bootstraps the chain with
	// coinbase-only blocks
	let harness = start_miner(dir.path().to_str().unwrap(), &wallet, 0);
	wait_for_height(&harness.chain, 1, Duration::from_secs(30));

	// the miner's wallet now owns at least one coinbase
	assert!(harness.chain.amount_owned(&wallet.address).unwrap() >= 100);

	// a pooled transaction gets picked up by a later block
	let tx = wallet.transaction(vec![Output(receiver.address.clone(), 40, 2)]);
	harness.tx_pool.add_to_pool(tx.clone()).unwrap();

	let deadline = Instant::now() + Duration::from_secs(30);
	loop {
		let blocks = harness.chain.blocks().unwrap();
		let included = blocks.iter().any(|b| {
			b.transactions
				.iter()
				.any(|t| t.signature == tx.signature)
		});
		if included {
			break;
		}
		assert!(Instant::now() < deadline, "transaction never mined");
		thread::sleep(Duration::from_millis(50));
	}
	assert_eq!(harness.chain.amount_owned(&receiver.address).unwrap(), 40);

	harness.stop_state.stop();
	harness.miner_thread.join().unwrap();
}

#[test]
fn stop_mining_reaches_idle_promptly() {
	let dir = tempfile::tempdir().unwrap();
	let wallet = TestWallet::new(1);

	// threshold of one transaction keeps the miner in the gather phase
	let harness = start_miner(dir.path().to_str().unwrap(), &wallet, 1);
	thread::sleep(Duration::from_millis(100));
	assert_eq!(harness.chain.height(), 0);

	let started = Instant::now();
	harness.stop_state.stop();
	harness.miner_thread.join().unwrap();
	// bounded exit: a gather sleep plus slack, nowhere near a full search
	assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn gather_phase_does_not_drain_a_small_pool() {
	let dir = tempfile::tempdir().unwrap();
	let wallet = TestWallet::new(1);
	let receiver = TestWallet::new(2);

	// needs two transactions before building a block
	let harness = start_miner(dir.path().to_str().unwrap(), &wallet, 2);
	let tx = wallet.transaction(vec![Output(receiver.address.clone(), 1, 0)]);
	harness.tx_pool.add_to_pool(tx).unwrap();

	// give the miner a few gather cycles
	thread::sleep(Duration::from_millis(300));
	assert_eq!(harness.tx_pool.len(), 1, "gather must leave the pool alone");
	assert_eq!(harness.chain.height(), 0);

	harness.stop_state.stop();
	harness.miner_thread.join().unwrap();
}
