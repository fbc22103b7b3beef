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

//! Value-transfer transactions.
//!
//! A transaction moves coins from one wallet to an ordered list of
//! `(address, amount, commission)` outputs and is signed by the owner of
//! the originating wallet. The single coinbase transaction of a block has
//! no origin wallet and no signature; its economic limits are enforced by
//! the block validation pipeline rather than here.

use std::cmp::Ordering;

use crate::crypto::{self, Address};
use crate::ser;

/// A single transaction output: receiving address, amount paid and the
/// commission offered to the miner for carrying it. Serialized as the
/// JSON array `[address, amount, commission]`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Output(pub Address, pub u64, pub u64);

impl Output {
	/// The receiving address.
	pub fn address(&self) -> &Address {
		&self.0
	}

	/// Amount paid to the receiving address, in the coin's smallest unit.
	pub fn amount(&self) -> u64 {
		self.1
	}

	/// Commission offered to the miner.
	pub fn commission(&self) -> u64 {
		self.2
	}
}

/// The signed body of a transaction. These are exactly the bytes covered
/// by the signature, so field order here is part of the wire contract.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionBody {
	/// Originating wallet, `None` for the coinbase transaction.
	pub from: Option<Address>,
	/// Ordered outputs.
	pub to: Vec<Output>,
}

/// A value-transfer record, the signed body plus the signature material.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
	/// Signed body
	pub body: TransactionBody,
	/// Compact ECDSA signature over the canonical body bytes, empty for
	/// the coinbase transaction.
	#[serde(with = "ser::base64_bytes")]
	pub signature: Vec<u8>,
	/// Raw public key of the originating wallet, empty for the coinbase
	/// transaction.
	#[serde(with = "ser::base64_bytes")]
	pub public_key: Vec<u8>,
}

impl Transaction {
	/// Builds a transaction from its parts.
	pub fn new(
		from: Option<Address>,
		to: Vec<Output>,
		signature: Vec<u8>,
		public_key: Vec<u8>,
	) -> Transaction {
		Transaction {
			body: TransactionBody { from, to },
			signature,
			public_key,
		}
	}

	/// Builds the coinbase transaction issuing `amount` new coins to the
	/// block author.
	pub fn coinbase(author: &Address, amount: u64) -> Transaction {
		Transaction {
			body: TransactionBody {
				from: None,
				to: vec![Output(author.clone(), amount, 0)],
			},
			signature: vec![],
			public_key: vec![],
		}
	}

	/// Whether this is a coinbase (coin creation) transaction.
	pub fn is_coinbase(&self) -> bool {
		self.body.from.is_none()
	}

	/// The originating wallet, `None` for coinbase.
	pub fn from_wallet(&self) -> Option<&Address> {
		self.body.from.as_ref()
	}

	/// Outputs of this transaction.
	pub fn outputs(&self) -> &[Output] {
		&self.body.to
	}

	/// Everything leaving the originating wallet: the sum of all output
	/// amounts plus all commissions.
	pub fn amount_spent(&self) -> u64 {
		self.body
			.to
			.iter()
			.map(|o| o.amount() + o.commission())
			.sum()
	}

	/// The total commission offered to the miner.
	pub fn commission(&self) -> u64 {
		self.body.to.iter().map(|o| o.commission()).sum()
	}

	/// The exact bytes covered by the signature: the canonical JSON of
	/// the transaction body.
	pub fn prepare_for_signature(&self) -> Vec<u8> {
		ser::ser_vec(&self.body)
	}

	/// The canonical JSON bytes of the full transaction, as hashed into
	/// the transactions root of a block.
	pub fn canonical_json(&self) -> Vec<u8> {
		ser::ser_vec(self)
	}

	/// Verifies the signature over the canonical body bytes under the
	/// declared public key, and that the key actually owns the origin
	/// address. Coinbase transactions verify unconditionally; malformed
	/// cryptographic material counts as a failed verification.
	pub fn verify(&self) -> bool {
		let from = match self.body.from {
			Some(ref from) => from,
			None => return true,
		};
		if crypto::address_of(&self.public_key) != *from {
			return false;
		}
		crypto::verify(&self.public_key, &self.signature, &self.prepare_for_signature())
			.unwrap_or(false)
	}

	/// Canonical ordering of transactions within a block: the coinbase
	/// sorts first, the rest by origin wallet then signature bytes.
	pub fn cmp_canonical(&self, other: &Transaction) -> Ordering {
		let rank = |t: &Transaction| if t.is_coinbase() { 0u8 } else { 1u8 };
		rank(self)
			.cmp(&rank(other))
			.then_with(|| self.body.from.cmp(&other.body.from))
			.then_with(|| self.signature.cmp(&other.signature))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn addr(s: &str) -> Address {
		Address::from(s)
	}

	#[test]
	fn amounts() {
		let tx = Transaction::new(
			Some(addr("QCaa")),
			vec![
				Output(addr("QCbb"), 10, 1),
				Output(addr("QCcc"), 5, 2),
			],
			vec![1, 2, 3],
			vec![4, 5, 6],
		);
		assert_eq!(tx.amount_spent(), 18);
		assert_eq!(tx.commission(), 3);
	}

	#[test]
	fn coinbase_verifies_unconditionally() {
		let tx = Transaction::coinbase(&addr("QCminer"), 100);
		assert!(tx.is_coinbase());
		assert!(tx.verify());
	}

	#[test]
	fn non_coinbase_with_bogus_key_fails() {
		let tx = Transaction::new(
			Some(addr("QCaa")),
			vec![Output(addr("QCbb"), 1, 0)],
			vec![0; 64],
			vec![0; 64],
		);
		assert!(!tx.verify());
	}

	#[test]
	fn canonical_order_puts_coinbase_first() {
		let coinbase = Transaction::coinbase(&addr("QCminer"), 100);
		let tx = Transaction::new(
			Some(addr("QCaa")),
			vec![Output(addr("QCbb"), 1, 0)],
			vec![9; 64],
			vec![9; 64],
		);
		assert_eq!(coinbase.cmp_canonical(&tx), Ordering::Less);
		assert_eq!(tx.cmp_canonical(&coinbase), Ordering::Greater);
	}

	#[test]
	fn signing_body_is_stable() {
		let tx = Transaction::new(
			Some(addr("QCaa")),
			vec![Output(addr("QCbb"), 7, 1)],
			vec![],
			vec![],
		);
		let body = String::from_utf8(tx.prepare_for_signature()).unwrap();
		assert_eq!(body, r#"{"from":"QCaa","to":[["QCbb",7,1]]}"#);
	}
}
