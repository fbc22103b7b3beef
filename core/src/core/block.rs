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

//! Blocks: authored batches of transactions chained by digest and secured
//! by a SHA-256 proof of work.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::consensus::GENESIS_SENTINEL;
use crate::core::hash::Digest;
use crate::core::transaction::Transaction;
use crate::crypto::{self, Address};
use crate::ser;

use quantcoin_util as util;

/// Reference to the parent of a block: the digest of the previous block,
/// or the fixed sentinel for the first block of a chain. On the wire this
/// is either the literal string `"genesis_block"` or base64 of the parent
/// digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Previous {
	/// This block starts the chain.
	Genesis,
	/// Digest of the parent block.
	Block(Digest),
}

impl Previous {
	/// The bytes hashed into the block digest: the raw 32 parent digest
	/// bytes, or the 13 ASCII sentinel bytes for genesis.
	pub fn as_bytes(&self) -> &[u8] {
		match self {
			Previous::Genesis => GENESIS_SENTINEL.as_bytes(),
			Previous::Block(d) => d.as_bytes(),
		}
	}
}

impl fmt::Display for Previous {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Previous::Genesis => f.write_str(GENESIS_SENTINEL),
			Previous::Block(d) => write!(f, "{}", d),
		}
	}
}

impl Serialize for Previous {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Previous::Genesis => serializer.serialize_str(GENESIS_SENTINEL),
			Previous::Block(d) => serializer.serialize_str(&util::to_base64(d.as_bytes())),
		}
	}
}

impl<'de> Deserialize<'de> for Previous {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Previous, D::Error> {
		let s = String::deserialize(deserializer)?;
		if s == GENESIS_SENTINEL {
			return Ok(Previous::Genesis);
		}
		let bytes = util::from_base64(&s).map_err(D::Error::custom)?;
		Digest::from_slice(&bytes)
			.map(Previous::Block)
			.ok_or_else(|| D::Error::custom("parent digest must be 32 bytes"))
	}
}

/// A block of the chain. Field order here is the canonical JSON key
/// order, so it must not change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Block {
	/// Address of the wallet of the miner, receives the coinbase.
	pub author: Address,
	/// Nonce satisfying the proof of work, absent until mined.
	pub nonce: Option<u64>,
	/// Digest of the block, absent until mined.
	pub digest: Option<Digest>,
	/// Reference to the parent block.
	pub previous: Previous,
	/// Transactions carried by this block, in canonical order.
	pub transactions: Vec<Transaction>,
}

impl Block {
	/// Builds a new unmined block from an author, a batch of transactions
	/// and the parent reference. Transactions are put in canonical order;
	/// nonce and digest stay unset until [`Block::proof_of_work`] finds
	/// them.
	pub fn new(author: Address, transactions: Vec<Transaction>, previous: Previous) -> Block {
		let mut transactions = transactions;
		transactions.sort_by(|a, b| a.cmp_canonical(b));
		Block {
			author,
			nonce: None,
			digest: None,
			previous,
			transactions,
		}
	}

	/// Whether the transactions of this block are in canonical order
	/// (coinbase first, then by origin wallet and signature).
	pub fn is_canonically_sorted(&self) -> bool {
		self.transactions
			.windows(2)
			.all(|w| w[0].cmp_canonical(&w[1]) != std::cmp::Ordering::Greater)
	}

	/// The sum of all commissions carried by this block's transactions.
	pub fn commission(&self) -> u64 {
		self.transactions.iter().map(|t| t.commission()).sum()
	}

	/// Merkle-style aggregation of the block's transactions.
	///
	/// Leaves are the SHA-256 of each transaction's canonical JSON, in
	/// block order. At each level an odd node count is padded with an
	/// empty-byte leaf, then adjacent pairs are concatenated and hashed,
	/// until a single node remains. An empty transaction list hashes to
	/// `SHA-256("")`. The padding convention is part of the wire
	/// contract.
	pub fn transactions_root(&self) -> Digest {
		if self.transactions.is_empty() {
			return Digest(crypto::sha256(b""));
		}

		let mut nodes: Vec<Vec<u8>> = self
			.transactions
			.iter()
			.map(|t| crypto::sha256(&t.canonical_json()).to_vec())
			.collect();

		while nodes.len() > 1 {
			if nodes.len() % 2 == 1 {
				nodes.push(vec![]);
			}
			nodes = nodes
				.chunks(2)
				.map(|pair| {
					let mut buf = pair[0].clone();
					buf.extend_from_slice(&pair[1]);
					crypto::sha256(&buf).to_vec()
				})
				.collect();
		}

		// a 32-byte sha256 output, length can't be anything else
		Digest::from_slice(&nodes[0]).unwrap()
	}

	/// The digest this block would have under the provided nonce.
	pub fn digest_for_nonce(&self, nonce: u64) -> Digest {
		let root = self.transactions_root();
		let mut buf = Vec::with_capacity(self.author.as_bytes().len() + 64 + 20);
		buf.extend_from_slice(self.author.as_bytes());
		buf.extend_from_slice(self.previous.as_bytes());
		buf.extend_from_slice(root.as_bytes());
		buf.extend_from_slice(nonce.to_string().as_bytes());
		Digest(crypto::sha256(&buf))
	}

	/// Linearly searches `[start_nonce, end_nonce]` for a nonce whose
	/// digest begins with `difficulty` zero bytes. On success stores the
	/// nonce and digest and returns true; on exhaustion returns false
	/// without mutating the block. A block that already carries a nonce
	/// is left untouched (returns true).
	pub fn proof_of_work(&mut self, difficulty: usize, start_nonce: u64, end_nonce: u64) -> bool {
		if self.nonce.is_some() {
			return true;
		}

		// the transactions root is loop-invariant, hash it once
		let root = self.transactions_root();
		let mut prefix = Vec::new();
		prefix.extend_from_slice(self.author.as_bytes());
		prefix.extend_from_slice(self.previous.as_bytes());
		prefix.extend_from_slice(root.as_bytes());

		let mut nonce = start_nonce;
		loop {
			let mut buf = prefix.clone();
			buf.extend_from_slice(nonce.to_string().as_bytes());
			let digest = Digest(crypto::sha256(&buf));
			if digest.starts_with_zero_bytes(difficulty) {
				self.nonce = Some(nonce);
				self.digest = Some(digest);
				return true;
			}
			if nonce == end_nonce {
				return false;
			}
			nonce += 1;
		}
	}

	/// Checks the proof of work: recomputes the digest from the current
	/// fields and requires both equality with the stored digest and the
	/// leading zero byte prefix. A block without a nonce is not valid.
	pub fn valid(&self, difficulty: usize) -> bool {
		let (nonce, digest) = match (self.nonce, self.digest) {
			(Some(n), Some(d)) => (n, d),
			_ => return false,
		};
		let computed = self.digest_for_nonce(nonce);
		computed == digest && computed.starts_with_zero_bytes(difficulty)
	}

	/// Canonical JSON bytes of the block, byte-stable across a round trip
	/// through [`Block::from_canonical_json`].
	pub fn canonical_json(&self) -> Vec<u8> {
		ser::ser_vec(self)
	}

	/// Parses a block from its canonical JSON bytes. Transactions are
	/// kept exactly as transmitted; order is a validation concern, not a
	/// parsing one.
	pub fn from_canonical_json(data: &[u8]) -> Result<Block, ser::Error> {
		ser::deserialize(data)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::core::transaction::Output;

	fn addr(s: &str) -> Address {
		Address::from(s)
	}

	fn some_tx(seed: u8) -> Transaction {
		Transaction::new(
			Some(addr(&format!("QC{:02x}", seed))),
			vec![Output(addr("QCdest"), seed as u64, 1)],
			vec![seed; 64],
			vec![seed; 64],
		)
	}

	#[test]
	fn empty_root_is_sha256_of_empty_string() {
		let b = Block::new(addr("QCminer"), vec![], Previous::Genesis);
		assert_eq!(b.transactions_root(), Digest(crypto::sha256(b"")));
	}

	#[test]
	fn root_depends_on_transactions() {
		let one = Block::new(addr("QCminer"), vec![some_tx(1)], Previous::Genesis);
		let two = Block::new(
			addr("QCminer"),
			vec![some_tx(1), some_tx(2)],
			Previous::Genesis,
		);
		assert_ne!(one.transactions_root(), two.transactions_root());
		// and not on anything else
		let moved = Block::new(addr("QCother"), vec![some_tx(1)], Previous::Genesis);
		assert_eq!(one.transactions_root(), moved.transactions_root());
	}

	#[test]
	fn odd_level_padding_matches_manual_tree() {
		let b = Block::new(
			addr("QCminer"),
			vec![some_tx(1), some_tx(2), some_tx(3)],
			Previous::Genesis,
		);
		let leaves: Vec<Vec<u8>> = b
			.transactions
			.iter()
			.map(|t| crypto::sha256(&t.canonical_json()).to_vec())
			.collect();
		let h = |a: &[u8], c: &[u8]| {
			let mut buf = a.to_vec();
			buf.extend_from_slice(c);
			crypto::sha256(&buf).to_vec()
		};
		let l01 = h(&leaves[0], &leaves[1]);
		let l2pad = h(&leaves[2], b"");
		let root = h(&l01, &l2pad);
		assert_eq!(b.transactions_root().as_bytes(), &root[..]);
	}

	#[test]
	fn pow_finds_and_validates() {
		let mut b = Block::new(
			addr("QCminer"),
			vec![some_tx(1), some_tx(2), some_tx(3)],
			Previous::Genesis,
		);
		// one zero byte, expect a hit within a few thousand nonces
		assert!(b.proof_of_work(1, 0, 1 << 16));
		let digest = b.digest.unwrap();
		assert_eq!(digest.as_bytes()[0], 0);
		assert!(b.valid(1));
	}

	#[test]
	fn pow_exhaustion_leaves_block_unmined() {
		let mut b = Block::new(addr("QCminer"), vec![some_tx(1)], Previous::Genesis);
		// 32 zero bytes can't be found in two nonces
		assert!(!b.proof_of_work(32, 0, 1));
		assert_eq!(b.nonce, None);
		assert_eq!(b.digest, None);
		assert!(!b.valid(32));
	}

	#[test]
	fn pow_is_idempotent_once_mined() {
		let mut b = Block::new(addr("QCminer"), vec![], Previous::Genesis);
		assert!(b.proof_of_work(0, 0, 0));
		let (nonce, digest) = (b.nonce, b.digest);
		assert!(b.proof_of_work(2, 0, 0));
		assert_eq!((b.nonce, b.digest), (nonce, digest));
	}

	#[test]
	fn digest_recomputes_from_fields() {
		let mut b = Block::new(addr("QCminer"), vec![some_tx(1)], Previous::Genesis);
		assert!(b.proof_of_work(1, 0, 1 << 16));
		assert_eq!(b.digest_for_nonce(b.nonce.unwrap()), b.digest.unwrap());

		// tampering with the payload breaks validity
		let mut tampered = b.clone();
		tampered.transactions.push(some_tx(9));
		assert!(!tampered.valid(1));
	}

	#[test]
	fn canonical_json_round_trip() {
		let mut b = Block::new(
			addr("QCminer"),
			vec![
				Transaction::coinbase(&addr("QCminer"), 100),
				some_tx(1),
				some_tx(2),
			],
			Previous::Genesis,
		);
		assert!(b.proof_of_work(1, 0, 1 << 16));

		let json = b.canonical_json();
		let back = Block::from_canonical_json(&json).unwrap();
		assert_eq!(back, b);
		// byte-identical re-serialization
		assert_eq!(back.canonical_json(), json);
	}

	#[test]
	fn previous_wire_forms() {
		let genesis = serde_json::to_string(&Previous::Genesis).unwrap();
		assert_eq!(genesis, "\"genesis_block\"");

		let d = Digest([3; 32]);
		let linked: Previous = serde_json::from_str(
			&serde_json::to_string(&Previous::Block(d)).unwrap(),
		)
		.unwrap();
		assert_eq!(linked, Previous::Block(d));
	}

	#[test]
	fn constructor_sorts_canonically() {
		let b = Block::new(
			addr("QCminer"),
			vec![some_tx(2), Transaction::coinbase(&addr("QCminer"), 100), some_tx(1)],
			Previous::Genesis,
		);
		assert!(b.transactions[0].is_coinbase());
		assert!(b.is_canonically_sorted());
	}
}
