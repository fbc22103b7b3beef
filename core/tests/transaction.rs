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

//! Transaction integration tests

pub mod common;

use self::common::TestWallet;
use quantcoin_core::crypto::{self, Address};
use quantcoin_core::{Output, Transaction};

#[test]
fn signed_transaction_verifies() {
	let wallet = TestWallet::new(1);
	let receiver = TestWallet::new(2);

	let tx = wallet.transaction(vec![Output(receiver.address.clone(), 10, 2)]);
	assert!(tx.verify());
	assert_eq!(tx.amount_spent(), 12);
	assert_eq!(tx.commission(), 2);
}

#[test]
fn signature_binds_key_to_origin_address() {
	let wallet = TestWallet::new(1);
	let receiver = TestWallet::new(2);

	// valid signature but the declared origin is not the key's address
	let mut tx = wallet.transaction(vec![Output(receiver.address.clone(), 10, 0)]);
	tx.body.from = Some(receiver.address.clone());
	tx.signature = wallet.sign(&tx.prepare_for_signature());
	assert!(!tx.verify());

	// and the other way around: whenever verify() holds, the public key
	// derives to the origin address
	let tx = wallet.transaction(vec![Output(receiver.address.clone(), 10, 0)]);
	assert!(tx.verify());
	assert_eq!(crypto::address_of(&tx.public_key), wallet.address);
}

#[test]
fn tampered_body_fails_verification() {
	let wallet = TestWallet::new(1);
	let receiver = TestWallet::new(2);

	let mut tx = wallet.transaction(vec![Output(receiver.address.clone(), 10, 0)]);
	tx.body.to[0].1 = 1_000;
	assert!(!tx.verify());
}

#[test]
fn wire_round_trip_preserves_signature_validity() {
	let wallet = TestWallet::new(1);
	let tx = wallet.transaction(vec![Output(Address::from("QCdest"), 3, 1)]);

	let json = serde_json::to_vec(&tx).unwrap();
	let back: Transaction = serde_json::from_slice(&json).unwrap();
	assert_eq!(back, tx);
	assert!(back.verify());
}
