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

//! Transaction pool implementation. All entries have passed signature
//! verification on the way in; economic validity is only decided by the
//! chain pipeline when a block carrying them is processed.

use quantcoin_core::{Block, Transaction};
use quantcoin_util::Mutex;

use crate::types::{PoolConfig, PoolError};

/// The pool itself. A single mutex guards the entries; holders never
/// perform I/O while holding it.
pub struct TransactionPool {
	/// Pool configuration
	pub config: PoolConfig,
	entries: Mutex<Vec<Transaction>>,
}

impl TransactionPool {
	/// Creates a new, empty transaction pool.
	pub fn new(config: PoolConfig) -> TransactionPool {
		TransactionPool {
			config,
			entries: Mutex::new(vec![]),
		}
	}

	/// Verifies and pools an incoming transaction. Succeeds only when the
	/// transaction was newly added; rebroadcast decisions key off this.
	pub fn add_to_pool(&self, tx: Transaction) -> Result<(), PoolError> {
		if tx.is_coinbase() {
			return Err(PoolError::Coinbase);
		}
		if !tx.verify() {
			return Err(PoolError::InvalidTx);
		}

		let mut entries = self.entries.lock();
		if entries.iter().any(|e| e.signature == tx.signature) {
			return Err(PoolError::Duplicate);
		}
		debug!(
			"pool: added tx from {:?}, {} now pooled",
			tx.from_wallet().map(|a| a.to_string()),
			entries.len() + 1
		);
		entries.push(tx);
		Ok(())
	}

	/// Number of pooled transactions.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Whether the pool holds nothing.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Total commission currently carried by the pool.
	pub fn total_commission(&self) -> u64 {
		self.entries.lock().iter().map(|t| t.commission()).sum()
	}

	/// Atomically drains the pool if it satisfies the configured
	/// thresholds (enough transactions, enough commission). Below the
	/// thresholds the pool is left untouched and `None` is returned.
	pub fn take_ready(&self) -> Option<Vec<Transaction>> {
		let mut entries = self.entries.lock();
		if entries.len() < self.config.min_tx_count {
			return None;
		}
		if self.config.min_commission > 0 {
			let commission: u64 = entries.iter().map(|t| t.commission()).sum();
			if commission < self.config.min_commission as u64 {
				return None;
			}
		}
		Some(entries.split_off(0))
	}

	/// Returns a drained snapshot to the pool after an abandoned or
	/// published mining attempt, keeping only transactions that were not
	/// included in the accepted block and still verify. Duplicates of
	/// entries pooled in the meantime are dropped.
	pub fn reinstate(&self, snapshot: Vec<Transaction>, accepted: Option<&Block>) {
		let mut entries = self.entries.lock();
		let mut restored = 0;
		for tx in snapshot {
			if tx.is_coinbase() || !tx.verify() {
				continue;
			}
			if let Some(b) = accepted {
				if b.transactions.iter().any(|t| t.signature == tx.signature) {
					continue;
				}
			}
			if entries.iter().any(|e| e.signature == tx.signature) {
				continue;
			}
			entries.push(tx);
			restored += 1;
		}
		if restored > 0 {
			debug!("pool: reinstated {} transactions", restored);
		}
	}

	/// Reconciles the pool against a block accepted by the chain,
	/// dropping every entry the block already carries.
	pub fn reconcile(&self, accepted: &Block) {
		let mut entries = self.entries.lock();
		let before = entries.len();
		entries.retain(|e| {
			!accepted
				.transactions
				.iter()
				.any(|t| t.signature == e.signature)
		});
		let dropped = before - entries.len();
		if dropped > 0 {
			debug!("pool: dropped {} transactions now in chain", dropped);
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use quantcoin_core::crypto::Address;
	use quantcoin_core::{Output, Previous};
	use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

	fn signed_tx(seed: u8, commission: u64) -> Transaction {
		let secp = Secp256k1::new();
		let mut seed_bytes = [0u8; 32];
		seed_bytes[31] = seed;
		let secret = SecretKey::from_slice(&seed_bytes).unwrap();
		let public = PublicKey::from_secret_key(&secp, &secret);
		let public_key = public.serialize_uncompressed()[1..].to_vec();
		let from = quantcoin_core::crypto::address_of(&public_key);

		let mut tx = Transaction::new(
			Some(from),
			vec![Output(Address::from("QCdest"), 5, commission)],
			vec![],
			public_key,
		);
		let digest = Message::from_digest(quantcoin_core::crypto::sha256(
			&tx.prepare_for_signature(),
		));
		tx.signature = secp
			.sign_ecdsa(&digest, &secret)
			.serialize_compact()
			.to_vec();
		tx
	}

	fn pool(min_tx_count: usize, min_commission: i64) -> TransactionPool {
		TransactionPool::new(PoolConfig {
			min_tx_count,
			min_commission,
		})
	}

	#[test]
	fn rejects_invalid_and_duplicate() {
		let pool = pool(1, -1);

		let mut bogus = signed_tx(1, 0);
		bogus.body.to[0].1 = 9_999;
		assert_eq!(pool.add_to_pool(bogus), Err(PoolError::InvalidTx));

		let tx = signed_tx(1, 0);
		pool.add_to_pool(tx.clone()).unwrap();
		assert_eq!(pool.add_to_pool(tx), Err(PoolError::Duplicate));
		assert_eq!(pool.len(), 1);
	}

	#[test]
	fn below_thresholds_pool_is_untouched() {
		// needs two transactions and commission of 10
		let pool = pool(2, 10);
		pool.add_to_pool(signed_tx(1, 3)).unwrap();

		assert_eq!(pool.take_ready(), None);
		assert_eq!(pool.len(), 1, "gathering must not drain the pool");

		pool.add_to_pool(signed_tx(2, 3)).unwrap();
		// two transactions but commission only 6
		assert_eq!(pool.take_ready(), None);
		assert_eq!(pool.len(), 2);

		pool.add_to_pool(signed_tx(3, 4)).unwrap();
		let drained = pool.take_ready().unwrap();
		assert_eq!(drained.len(), 3);
		assert!(pool.is_empty());
	}

	#[test]
	fn negative_commission_threshold_is_disabled() {
		let pool = pool(1, -1);
		pool.add_to_pool(signed_tx(1, 0)).unwrap();
		assert!(pool.take_ready().is_some());
	}

	#[test]
	fn reinstate_keeps_only_unpublished_transactions() {
		let pool = pool(1, -1);
		let published = signed_tx(1, 0);
		let unpublished = signed_tx(2, 0);

		let author = Address::from("QCminer");
		let b = Block::new(
			author,
			vec![published.clone()],
			Previous::Genesis,
		);

		pool.reinstate(vec![published, unpublished.clone()], Some(&b));
		assert_eq!(pool.len(), 1);
		assert_eq!(pool.take_ready().unwrap(), vec![unpublished]);
	}

	#[test]
	fn reconcile_drops_included_entries() {
		let pool = pool(1, -1);
		let included = signed_tx(1, 0);
		let waiting = signed_tx(2, 0);
		pool.add_to_pool(included.clone()).unwrap();
		pool.add_to_pool(waiting.clone()).unwrap();

		let b = Block::new(Address::from("QCminer"), vec![included], Previous::Genesis);
		pool.reconcile(&b);
		assert_eq!(pool.take_ready().unwrap(), vec![waiting]);
	}
}
