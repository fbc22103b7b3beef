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

//! Server types

use std::convert::From;
use std::io;

use quantcoin_chain as chain;
use quantcoin_p2p as p2p;
use quantcoin_pool::PoolConfig;
use quantcoin_store as store;

/// Error type wrapping underlying module errors.
#[derive(Debug)]
pub enum Error {
	/// Error originating from the blockchain implementation.
	Chain(chain::Error),
	/// Error originating from the peer-to-peer network.
	P2P(p2p::Error),
	/// Error originating from the db storage.
	Store(store::Error),
	/// Error originating from some I/O operation (lock file and such).
	IO(io::Error),
	/// Configuration cannot be acted upon; the process must not start.
	FatalConfig(String),
}

impl From<chain::Error> for Error {
	fn from(e: chain::Error) -> Error {
		Error::Chain(e)
	}
}

impl From<p2p::Error> for Error {
	fn from(e: p2p::Error) -> Error {
		Error::P2P(e)
	}
}

impl From<store::Error> for Error {
	fn from(e: store::Error) -> Error {
		Error::Store(e)
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::IO(e)
	}
}

/// Mining configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinerConfig {
	/// Whether this node mines at all.
	pub enable_mining: bool,
	/// Address of the wallet receiving coinbase and commissions.
	pub wallet_address: String,
	/// Size of the nonce window searched between checks of the stop
	/// flag and of the chain tip.
	#[serde(default = "default_nonce_window")]
	pub nonce_window: u64,
	/// How long the gather phase sleeps when the pool is not ready yet,
	/// in milliseconds.
	#[serde(default = "default_gather_sleep_ms")]
	pub gather_sleep_ms: u64,
}

fn default_nonce_window() -> u64 {
	1 << 14
}

fn default_gather_sleep_ms() -> u64 {
	500
}

impl Default for MinerConfig {
	fn default() -> MinerConfig {
		MinerConfig {
			enable_mining: false,
			wallet_address: String::new(),
			nonce_window: default_nonce_window(),
			gather_sleep_ms: default_gather_sleep_ms(),
		}
	}
}

/// Full server configuration, aggregating the member configurations.
/// Plain values come before the member tables so the whole thing
/// serializes cleanly to TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
	/// Directory under which journals and the lock file live.
	#[serde(default = "default_db_root")]
	pub db_root: String,
	/// Peers to seed the peer set with and announce ourselves to, in
	/// `host:port` form.
	#[serde(default)]
	pub seeds: Vec<String>,
	/// Address other peers can reach us at, announced on startup when
	/// seeds are configured.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub advertised_address: Option<String>,
	/// Network configuration.
	#[serde(default)]
	pub p2p_config: p2p::P2PConfig,
	/// Transaction pool configuration.
	#[serde(default)]
	pub pool_config: PoolConfig,
	/// Mining configuration, absent for non-mining nodes.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mining_config: Option<MinerConfig>,
}

fn default_db_root() -> String {
	".quantcoin".to_string()
}

impl Default for ServerConfig {
	fn default() -> ServerConfig {
		ServerConfig {
			db_root: default_db_root(),
			seeds: vec![],
			advertised_address: None,
			p2p_config: p2p::P2PConfig::default(),
			pool_config: PoolConfig::default(),
			mining_config: Some(MinerConfig::default()),
		}
	}
}

/// Parses a `host:port` seed entry.
pub fn parse_seed(seed: &str) -> Option<p2p::PeerAddr> {
	let idx = seed.rfind(':')?;
	let (host, port) = seed.split_at(idx);
	let port: u16 = port[1..].parse().ok()?;
	if host.is_empty() {
		return None;
	}
	Some(p2p::PeerAddr(host.to_string(), port))
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn seed_parsing() {
		assert_eq!(
			parse_seed("192.0.2.1:65345"),
			Some(p2p::PeerAddr("192.0.2.1".to_string(), 65345))
		);
		assert_eq!(parse_seed("no-port"), None);
		assert_eq!(parse_seed(":1234"), None);
		assert_eq!(parse_seed("host:99999"), None);
	}
}
