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

//! Canonical JSON serialization for wire and hashing purposes.
//!
//! The wire encoding of every chain construct is JSON with object keys in
//! struct declaration order and binary fields carried as base64 strings.
//! Since the same bytes are fed to SHA-256, serialization must be
//! byte-stable: serializing a deserialized value yields the input again.

use serde::Serialize;

/// Error serializing or deserializing a wire type.
#[derive(Debug, Fail)]
pub enum Error {
	/// Underlying JSON error
	#[fail(display = "JSON error: {}", _0)]
	Json(serde_json::Error),
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Error {
		Error::Json(e)
	}
}

/// Serialize a wire type to its canonical JSON bytes. The wire types
/// contain no maps and no floats, so serialization cannot fail; a failure
/// here is a bug in the type definitions.
pub fn ser_vec<T: Serialize>(value: &T) -> Vec<u8> {
	serde_json::to_vec(value).expect("canonical JSON serialization")
}

/// Deserialize a wire type from canonical JSON bytes.
pub fn deserialize<'a, T: serde::Deserialize<'a>>(data: &'a [u8]) -> Result<T, Error> {
	serde_json::from_slice(data).map_err(Error::Json)
}

/// Serde adapter carrying `Vec<u8>` fields as base64 strings, as the wire
/// contract requires for signatures and public keys.
pub mod base64_bytes {
	use quantcoin_util as util;
	use serde::{Deserialize, Deserializer, Serializer};

	/// bytes -> base64 string
	pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&util::to_base64(bytes))
	}

	/// base64 string -> bytes
	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
		let s = String::deserialize(deserializer)?;
		util::from_base64(&s).map_err(serde::de::Error::custom)
	}
}
