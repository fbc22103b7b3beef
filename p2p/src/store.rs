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

//! Storage implementation for peer addresses. The peer set only ever
//! grows; eviction is somebody else's policy.

use std::collections::HashSet;
use std::path::Path;

use quantcoin_store::{Error, Journal};
use quantcoin_util::RwLock;

use crate::types::PeerAddr;

const PEERS_JOURNAL: &str = "peers.jsonl";

/// Journal-backed set of every peer this node has ever heard of.
pub struct PeerStore {
	journal: Journal,
	peers: RwLock<HashSet<PeerAddr>>,
}

impl PeerStore {
	/// Opens the peer journal under the provided data directory.
	pub fn new(db_root: &str) -> Result<PeerStore, Error> {
		let path = Path::new(db_root).join(PEERS_JOURNAL);
		let (journal, replayed): (Journal, Vec<PeerAddr>) = Journal::open(&path)?;
		Ok(PeerStore {
			journal,
			peers: RwLock::new(replayed.into_iter().collect()),
		})
	}

	/// Idempotent insert. Returns whether the peer was previously
	/// unknown; only new peers touch the journal.
	pub fn save_peer(&self, addr: &PeerAddr) -> Result<bool, Error> {
		let mut peers = self.peers.write();
		if peers.contains(addr) {
			return Ok(false);
		}
		self.journal.append(addr)?;
		peers.insert(addr.clone());
		Ok(true)
	}

	/// All peers known to this node, in no particular order.
	pub fn all_peers(&self) -> Vec<PeerAddr> {
		self.peers.read().iter().cloned().collect()
	}

	/// Number of peers known.
	pub fn peer_count(&self) -> usize {
		self.peers.read().len()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn save_is_idempotent_and_survives_reopen() {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path().to_str().unwrap();

		{
			let store = PeerStore::new(root).unwrap();
			let addr = PeerAddr("10.0.0.1".to_string(), 65345);
			assert!(store.save_peer(&addr).unwrap());
			assert!(!store.save_peer(&addr).unwrap());
			assert_eq!(store.peer_count(), 1);
		}

		let store = PeerStore::new(root).unwrap();
		assert_eq!(
			store.all_peers(),
			vec![PeerAddr("10.0.0.1".to_string(), 65345)]
		);
	}
}
