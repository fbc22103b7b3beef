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

//! Digest type used to identify blocks and to anchor the proof of work.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use quantcoin_util as util;

/// A SHA-256 digest identifying one of the main blockchain constructs.
/// Displayed as hex, carried over the wire as base64.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
	/// Builds a digest from a byte slice, which must be 32 bytes long.
	pub fn from_slice(v: &[u8]) -> Option<Digest> {
		if v.len() != 32 {
			return None;
		}
		let mut a = [0; 32];
		a.copy_from_slice(v);
		Some(Digest(a))
	}

	/// The digest as a byte slice.
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Whether the first `n` bytes of the digest are all zero. This is
	/// the proof-of-work target check.
	pub fn starts_with_zero_bytes(&self, n: usize) -> bool {
		n <= self.0.len() && self.0[..n].iter().all(|b| *b == 0)
	}
}

impl fmt::Display for Digest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&util::to_hex(&self.0))
	}
}

impl Serialize for Digest {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&util::to_base64(&self.0))
	}
}

impl<'de> Deserialize<'de> for Digest {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Digest, D::Error> {
		let s = String::deserialize(deserializer)?;
		let bytes = util::from_base64(&s).map_err(D::Error::custom)?;
		Digest::from_slice(&bytes).ok_or_else(|| D::Error::custom("digest must be 32 bytes"))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn zero_prefix() {
		let mut d = Digest([0; 32]);
		assert!(d.starts_with_zero_bytes(32));
		d.0[2] = 1;
		assert!(d.starts_with_zero_bytes(2));
		assert!(!d.starts_with_zero_bytes(3));
	}

	#[test]
	fn serde_base64() {
		let d = Digest([7; 32]);
		let json = serde_json::to_string(&d).unwrap();
		let back: Digest = serde_json::from_str(&json).unwrap();
		assert_eq!(d, back);

		// wrong length must not deserialize
		let short = serde_json::to_string(&quantcoin_util::to_base64(&[7; 31])).unwrap();
		assert!(serde_json::from_str::<Digest>(&short).is_err());
	}
}
