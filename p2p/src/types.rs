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

//! Shared types of the p2p crate: errors, peer addresses, configuration
//! and the adapter bridging the network to the rest of the node.

use std::fmt;
use std::io;
use std::net::IpAddr;

use quantcoin_core::{Block, Transaction};
use quantcoin_store as store;

/// Port the node listens on when nothing else is configured.
pub const DEFAULT_PORT: u16 = 65345;

#[derive(Debug)]
/// Errors of the peer protocol. Framing errors are not recoverable
/// within a connection.
pub enum Error {
	/// Frame or payload that doesn't parse; closes the connection
	MalformedFrame(String),
	/// Well-formed payload carrying a command not in the dispatch table
	UnknownCommand(String),
	/// Underlying socket error
	Connection(io::Error),
	/// The remote side didn't behave as the protocol requires
	ConnectionClose,
	/// Error from the peer store
	Store(store::Error),
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::Connection(e)
	}
}

impl From<store::Error> for Error {
	fn from(e: store::Error) -> Error {
		Error::Store(e)
	}
}

/// Network location of a peer, serialized as the JSON array
/// `[host, port]` the wire contract uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PeerAddr(pub String, pub u16);

impl PeerAddr {
	/// Host part, an IP address or name.
	pub fn host(&self) -> &str {
		&self.0
	}

	/// Port part.
	pub fn port(&self) -> u16 {
		self.1
	}
}

impl fmt::Display for PeerAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.0, self.1)
	}
}

/// Configuration for the peer-to-peer server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct P2PConfig {
	/// Interface the listener binds.
	pub host: IpAddr,
	/// Port the listener binds.
	pub port: u16,
}

/// Default address for peer-to-peer connections.
impl Default for P2PConfig {
	fn default() -> P2PConfig {
		P2PConfig {
			host: "0.0.0.0".parse().expect("default interface"),
			port: DEFAULT_PORT,
		}
	}
}

/// Bridge between the networking layer and the rest of the system.
/// Handles the forwarding or querying of blocks, transactions and peer
/// addresses from the network among other things.
pub trait NetAdapter: Send + Sync {
	/// All peers known to this node.
	fn find_peer_addrs(&self) -> Vec<PeerAddr>;

	/// A peer announced itself on the network.
	fn peer_address_received(&self, addr: PeerAddr);

	/// The chain (or a range of it) was requested by a peer.
	fn blocks_requested(&self, range: Option<(u64, u64)>) -> Vec<Block>;

	/// A block has been received from one of our peers. Returns whether
	/// the block was accepted onto our chain.
	fn block_received(&self, b: Block) -> bool;

	/// A transaction has been received from one of our peers. Returns
	/// whether it was newly added to the local pool.
	fn transaction_received(&self, tx: Transaction) -> bool;
}
