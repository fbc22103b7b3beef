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

//! Cryptographic primitives: hashing, ECDSA signature verification over
//! secp256k1 and wallet address derivation. No side effects anywhere in
//! this module.

use std::fmt;

use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, VerifyOnly};
use sha1::Sha1;
use sha2::{Digest as _, Sha256};

use quantcoin_util as util;

lazy_static! {
	static ref SECP: Secp256k1<VerifyOnly> = Secp256k1::verification_only();
}

/// Prefix identifying a wallet address on this network.
pub const ADDRESS_PREFIX: &str = "QC";

/// Errors raised on malformed cryptographic material. Callers in the
/// validation pipeline treat any of these as a failed verification.
#[derive(Clone, Debug, Eq, PartialEq, Fail)]
pub enum Error {
	/// Public key bytes don't parse to a curve point
	#[fail(display = "Malformed public key")]
	MalformedPublicKey,
	/// Signature bytes are not a valid compact ECDSA signature
	#[fail(display = "Malformed signature")]
	MalformedSignature,
}

/// An opaque printable identifier of a wallet, derived from the hash of
/// its public key. Two addresses are equal iff they are byte-identical.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
	/// The raw bytes of the address string, as hashed into block digests.
	pub fn as_bytes(&self) -> &[u8] {
		self.0.as_bytes()
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for Address {
	fn from(s: &str) -> Address {
		Address(s.to_owned())
	}
}

/// SHA-256 digest of the provided bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
	let mut hasher = Sha256::new();
	hasher.update(data);
	hasher.finalize().into()
}

/// SHA-1 digest of the provided bytes. Only used for address derivation,
/// never for anything consensus-critical beyond identifying a wallet.
pub fn sha1(data: &[u8]) -> [u8; 20] {
	let mut hasher = Sha1::new();
	hasher.update(data);
	hasher.finalize().into()
}

/// Derive the wallet address owned by the provided public key:
/// `"QC"` followed by the lowercase hex SHA-1 of the raw key bytes.
pub fn address_of(public_key: &[u8]) -> Address {
	Address(format!(
		"{}{}",
		ADDRESS_PREFIX,
		util::to_hex(&sha1(public_key))
	))
}

/// Verify an ECDSA signature over the SHA-256 digest of `message` under
/// the provided public key. A failed verification returns `Ok(false)`;
/// malformed keys or signatures are an `Err`.
pub fn verify(public_key: &[u8], signature: &[u8], message: &[u8]) -> Result<bool, Error> {
	let pk = parse_public_key(public_key)?;
	let sig = Signature::from_compact(signature).map_err(|_| Error::MalformedSignature)?;
	let msg = Message::from_digest(sha256(message));
	Ok(SECP.verify_ecdsa(&msg, &sig, &pk).is_ok())
}

/// Wire public keys are the raw 64-byte uncompressed curve point (x ‖ y),
/// without the SEC1 0x04 tag. Tagged 65-byte and compressed 33-byte forms
/// are accepted as well.
fn parse_public_key(bytes: &[u8]) -> Result<PublicKey, Error> {
	if bytes.len() == 64 {
		let mut tagged = [0u8; 65];
		tagged[0] = 0x04;
		tagged[1..].copy_from_slice(bytes);
		PublicKey::from_slice(&tagged).map_err(|_| Error::MalformedPublicKey)
	} else {
		PublicKey::from_slice(bytes).map_err(|_| Error::MalformedPublicKey)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use secp256k1::SecretKey;

	fn keypair() -> (SecretKey, Vec<u8>) {
		let secp = Secp256k1::new();
		let sk = SecretKey::from_slice(&[7u8; 32]).unwrap();
		let pk = PublicKey::from_secret_key(&secp, &sk);
		// raw point, no SEC1 tag
		(sk, pk.serialize_uncompressed()[1..].to_vec())
	}

	#[test]
	fn address_derivation() {
		let (_, pk) = keypair();
		let addr = address_of(&pk);
		assert!(addr.0.starts_with(ADDRESS_PREFIX));
		// "QC" + 20 bytes of hex
		assert_eq!(addr.0.len(), 2 + 40);
		// deterministic
		assert_eq!(addr, address_of(&pk));
	}

	#[test]
	fn verify_round_trip() {
		let secp = Secp256k1::new();
		let (sk, pk) = keypair();
		let msg = b"pay to the order of";
		let digest = Message::from_digest(sha256(msg));
		let sig = secp.sign_ecdsa(&digest, &sk).serialize_compact().to_vec();

		assert_eq!(verify(&pk, &sig, msg), Ok(true));
		assert_eq!(verify(&pk, &sig, b"some other message"), Ok(false));
	}

	#[test]
	fn malformed_material() {
		let (_, pk) = keypair();
		assert_eq!(
			verify(&[1, 2, 3], &[0u8; 64], b"m"),
			Err(Error::MalformedPublicKey)
		);
		assert_eq!(
			verify(&pk, &[1, 2, 3], b"m"),
			Err(Error::MalformedSignature)
		);
	}
}
