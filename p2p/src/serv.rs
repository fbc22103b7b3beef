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

//! P2P server implementation: accepts connections from other peers,
//! reads one framed command per connection and dispatches it.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use quantcoin_core::ser;
use quantcoin_core::{Block, Transaction};
use quantcoin_util::StopState;

use crate::msg::{self, Command};
use crate::types::{Error, NetAdapter, P2PConfig, PeerAddr};

// Generous bound on how long a peer may take to deliver its one command.
const IO_TIMEOUT: Duration = Duration::from_secs(10);

/// P2P server implementation, handling incoming connections from other
/// peers. Connections are independent: one command in, at most one
/// response out, no session state.
pub struct Server {
	config: P2PConfig,
	adapter: Arc<dyn NetAdapter>,
	stop_state: Arc<StopState>,
}

impl Server {
	/// Creates a new idle p2p server.
	pub fn new(config: P2PConfig, adapter: Arc<dyn NetAdapter>, stop_state: Arc<StopState>) -> Server {
		Server {
			config,
			adapter,
			stop_state,
		}
	}

	/// Starts the TCP listener and handles incoming connections. This is
	/// a blocking call until the server is stopped.
	pub fn listen(&self) -> Result<(), Error> {
		let addr = SocketAddr::new(self.config.host, self.config.port);
		let listener = TcpListener::bind(addr)?;
		listener.set_nonblocking(true)?;
		info!("p2p server listening on {}", addr);

		let sleep_time = Duration::from_millis(1);
		loop {
			match listener.accept() {
				Ok((stream, peer_addr)) => {
					let adapter = self.adapter.clone();
					let _ = thread::Builder::new()
						.name("peer-conn".to_string())
						.spawn(move || {
							if let Err(e) = handle_connection(stream, peer_addr, adapter) {
								debug!("connection from {} failed: {:?}", peer_addr, e);
							}
						});
				}
				Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
					// nothing to do, will retry in next iteration
				}
				Err(e) => {
					warn!("couldn't establish new client connection: {:?}", e);
				}
			}
			if self.stop_state.is_stopped() {
				break;
			}
			thread::sleep(sleep_time);
		}
		Ok(())
	}

	/// Asks the server to stop accepting connections. In-flight
	/// connections run to completion or socket error.
	pub fn stop(&self) {
		self.stop_state.stop();
	}
}

/// Handles one connection: one framed command in, dispatch, optional
/// response frame out. Any failure closes this connection and nothing
/// else.
fn handle_connection(
	mut stream: TcpStream,
	peer_addr: SocketAddr,
	adapter: Arc<dyn NetAdapter>,
) -> Result<(), Error> {
	// the listener is non-blocking, the accepted socket must not be
	stream.set_nonblocking(false)?;
	stream.set_read_timeout(Some(IO_TIMEOUT))?;
	stream.set_write_timeout(Some(IO_TIMEOUT))?;

	let payload = msg::read_frame(&mut stream)?;
	let command = Command::decode(&payload)?;
	debug!("handling {} from {}", command.name(), peer_addr);

	match command {
		Command::GetNodes => {
			let peers = adapter.find_peer_addrs();
			msg::write_frame(&mut stream, &ser::ser_vec(&peers))?;
		}
		Command::GetBlocks { range } => {
			let blocks = adapter.blocks_requested(range);
			msg::write_frame(&mut stream, &ser::ser_vec(&blocks))?;
		}
		Command::Register { address, port } => {
			adapter.peer_address_received(PeerAddr(address, port));
		}
		Command::NewBlock { block } => {
			adapter.block_received(block);
		}
		Command::Send { transaction } => {
			adapter.transaction_received(transaction);
		}
	}
	Ok(())
}

/// A no-op network adapter used for testing.
pub struct DummyAdapter {}

impl NetAdapter for DummyAdapter {
	fn find_peer_addrs(&self) -> Vec<PeerAddr> {
		vec![]
	}
	fn peer_address_received(&self, _: PeerAddr) {}
	fn blocks_requested(&self, _: Option<(u64, u64)>) -> Vec<Block> {
		vec![]
	}
	fn block_received(&self, _: Block) -> bool {
		true
	}
	fn transaction_received(&self, _: Transaction) -> bool {
		true
	}
}
