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

//! Gossip side of the network: keeps track of every peer we know of and
//! fans commands out to a sample of them. Delivery is best-effort, a
//! peer that can't be reached is simply skipped.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::thread_rng;

use quantcoin_core::{Block, Transaction};
use quantcoin_util::Mutex;

use crate::msg::{self, Command};
use crate::store::PeerStore;
use crate::types::{Error, PeerAddr};

/// Upper bound on how many peers a single fan-out talks to.
pub const MAX_PEER_FANOUT: usize = 100;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Callback receiving the decoded JSON response of a peer.
type ResponseCallback = Box<dyn FnMut(serde_json::Value) + Send>;

/// All the peers we know of and the fan-out machinery to talk to them.
/// Outbound gossip runs on registered threads so shutdown can join
/// anything still in flight.
pub struct Peers {
	store: PeerStore,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Peers {
	/// Wraps a peer store into the gossip fan-out.
	pub fn new(store: PeerStore) -> Peers {
		Peers {
			store,
			handles: Mutex::new(vec![]),
		}
	}

	/// Records a peer announced on the network. Idempotent.
	pub fn add_peer(&self, addr: PeerAddr) {
		match self.store.save_peer(&addr) {
			Ok(true) => debug!("new peer registered: {}", addr),
			Ok(false) => (),
			Err(e) => warn!("could not persist peer {}: {}", addr, e),
		}
	}

	/// All peers known to this node.
	pub fn all_peers(&self) -> Vec<PeerAddr> {
		self.store.all_peers()
	}

	/// Number of peers known to this node.
	pub fn peer_count(&self) -> usize {
		self.store.peer_count()
	}

	/// Fans the command out to a random sample of up to
	/// [`MAX_PEER_FANOUT`] known peers. For each peer: connect, send the
	/// frame and, when a callback is given, read one response frame and
	/// hand its decoded JSON to the callback. Per-peer failures are
	/// logged and skipped; partial delivery is acceptable. With no known
	/// peers this logs and becomes a no-op.
	pub fn forward<F>(&self, cmd: &Command, mut callback: Option<F>)
	where
		F: FnMut(serde_json::Value),
	{
		let addrs = self.all_peers();
		if addrs.is_empty() {
			warn!("no peers registered, not forwarding {}", cmd.name());
			return;
		}

		let mut rng = thread_rng();
		let sample: Vec<&PeerAddr> = addrs.choose_multiple(&mut rng, MAX_PEER_FANOUT).collect();
		let payload = cmd.encode();

		debug!("forwarding {} to {} peers", cmd.name(), sample.len());
		for addr in sample {
			if let Err(e) = send_to_peer(addr, &payload, &mut callback) {
				debug!("peer {} unreachable: {:?}", addr, e);
			}
		}
	}

	/// Announces our listening address to the network.
	pub fn broadcast_register(self: &Arc<Self>, address: String, port: u16) {
		self.spawn_forward(Command::Register { address, port }, None);
	}

	/// Announces a freshly mined (or re-gossiped) block to the network.
	pub fn broadcast_block(self: &Arc<Self>, b: &Block) {
		self.spawn_forward(Command::NewBlock { block: b.clone() }, None);
	}

	/// Announces a transaction to the network.
	pub fn broadcast_transaction(self: &Arc<Self>, tx: &Transaction) {
		self.spawn_forward(
			Command::Send {
				transaction: tx.clone(),
			},
			None,
		);
	}

	/// Asks the network for peers; responses flow into the callback.
	pub fn get_nodes(self: &Arc<Self>, callback: ResponseCallback) {
		self.spawn_forward(Command::GetNodes, Some(callback));
	}

	/// Asks the network for the full chain.
	pub fn get_blocks(self: &Arc<Self>, callback: ResponseCallback) {
		self.spawn_forward(Command::GetBlocks { range: None }, Some(callback));
	}

	/// Asks the network for a half-open range of the chain.
	pub fn get_range_blocks(self: &Arc<Self>, lo: u64, hi: u64, callback: ResponseCallback) {
		self.spawn_forward(
			Command::GetBlocks {
				range: Some((lo, hi)),
			},
			Some(callback),
		);
	}

	/// Runs a fan-out on its own registered thread.
	fn spawn_forward(self: &Arc<Self>, cmd: Command, callback: Option<ResponseCallback>) {
		let me = self.clone();
		let spawned = thread::Builder::new()
			.name("gossip-out".to_string())
			.spawn(move || {
				me.forward(&cmd, callback);
			});
		match spawned {
			Ok(handle) => self.handles.lock().push(handle),
			Err(e) => error!("could not spawn gossip thread: {}", e),
		}
	}

	/// Joins every outstanding gossip thread. Called on shutdown.
	pub fn join_outstanding(&self) {
		let handles: Vec<JoinHandle<()>> = self.handles.lock().drain(..).collect();
		for handle in handles {
			let _ = handle.join();
		}
	}
}

/// One leg of a fan-out: connect, send, optionally await the response.
fn send_to_peer<F>(
	addr: &PeerAddr,
	payload: &[u8],
	callback: &mut Option<F>,
) -> Result<(), Error>
where
	F: FnMut(serde_json::Value),
{
	let socket_addr = (addr.host(), addr.port())
		.to_socket_addrs()?
		.next()
		.ok_or(Error::ConnectionClose)?;
	let mut stream = TcpStream::connect_timeout(&socket_addr, CONNECT_TIMEOUT)?;
	stream.set_read_timeout(Some(IO_TIMEOUT))?;
	stream.set_write_timeout(Some(IO_TIMEOUT))?;

	msg::write_frame(&mut stream, payload)?;

	if let Some(cb) = callback {
		let response = msg::read_frame(&mut stream)?;
		let value: serde_json::Value = serde_json::from_slice(&response)
			.map_err(|e| Error::MalformedFrame(e.to_string()))?;
		cb(value);
	}
	Ok(())
}
