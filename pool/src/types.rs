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

//! The pool's configuration and error types.

use std::fmt;

/// Configuration of the transaction pool and of the thresholds the miner
/// applies before building a block from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolConfig {
	/// Minimum number of pooled transactions before a block is built.
	#[serde(default = "default_min_tx_count")]
	pub min_tx_count: usize,
	/// Minimum total commission the pooled transactions must carry
	/// before a block is built. Negative disables the check.
	#[serde(default = "default_min_commission")]
	pub min_commission: i64,
}

fn default_min_tx_count() -> usize {
	1
}

fn default_min_commission() -> i64 {
	-1
}

impl Default for PoolConfig {
	fn default() -> PoolConfig {
		PoolConfig {
			min_tx_count: default_min_tx_count(),
			min_commission: default_min_commission(),
		}
	}
}

/// Reasons the pool refuses a transaction.
#[derive(Debug, PartialEq)]
pub enum PoolError {
	/// Signature verification failed, or the key doesn't own the origin.
	InvalidTx,
	/// The coinbase transaction is built by the miner, never pooled.
	Coinbase,
	/// An identical signature is already pooled.
	Duplicate,
}

impl fmt::Display for PoolError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PoolError::InvalidTx => write!(f, "transaction does not verify"),
			PoolError::Coinbase => write!(f, "coinbase transactions are not pooled"),
			PoolError::Duplicate => write!(f, "transaction already pooled"),
		}
	}
}
