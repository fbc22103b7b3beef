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

//! Common test helpers: deterministic wallets standing in for the
//! external wallet collaborator.

use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

use quantcoin_core::crypto::{self, Address};
use quantcoin_core::{Output, Transaction};

/// A deterministic test wallet derived from a one-byte seed.
pub struct TestWallet {
	secret: SecretKey,
	/// Raw 64-byte public key as carried on the wire.
	pub public_key: Vec<u8>,
	/// Address owned by this wallet.
	pub address: Address,
}

impl TestWallet {
	pub fn new(seed: u8) -> TestWallet {
		let secp = Secp256k1::new();
		let mut seed_bytes = [0u8; 32];
		seed_bytes[31] = seed;
		let secret = SecretKey::from_slice(&seed_bytes).expect("non-zero seed");
		let public = PublicKey::from_secret_key(&secp, &secret);
		let public_key = public.serialize_uncompressed()[1..].to_vec();
		let address = crypto::address_of(&public_key);
		TestWallet {
			secret,
			public_key,
			address,
		}
	}

	pub fn sign(&self, message: &[u8]) -> Vec<u8> {
		let secp = Secp256k1::new();
		let digest = Message::from_digest(crypto::sha256(message));
		secp.sign_ecdsa(&digest, &self.secret)
			.serialize_compact()
			.to_vec()
	}

	/// Builds and signs a transaction from this wallet.
	pub fn transaction(&self, to: Vec<Output>) -> Transaction {
		let mut tx = Transaction::new(
			Some(self.address.clone()),
			to,
			vec![],
			self.public_key.clone(),
		);
		tx.signature = self.sign(&tx.prepare_for_signature());
		tx
	}
}
