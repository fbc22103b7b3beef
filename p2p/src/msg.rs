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

//! Message types that transit over the network and related framing code.
//!
//! A frame is a 4-byte little-endian unsigned length followed by exactly
//! that many bytes of UTF-8 JSON. The payload is a JSON object whose
//! mandatory `cmd` field selects one of the five protocol commands. A
//! reader consumes exactly the advertised length; short reads and
//! framing errors fail the connection.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use quantcoin_core::ser;
use quantcoin_core::{Block, Transaction};

use crate::types::Error;

/// Upper bound on a frame payload, plenty for any block the consensus
/// rules accept. Only for DoS protection.
pub const MAX_FRAME_LEN: u32 = 8 * 1024 * 1024;

/// The five commands of the protocol, tagged by the `cmd` payload field.
/// Dispatch over these is exhaustive by construction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
	/// Ask a peer for every peer it knows. Response: array of [host, port].
	GetNodes,
	/// Ask a peer for its chain, or a half-open range of it.
	GetBlocks {
		/// Optional `[lo, hi)` range of block positions.
		#[serde(skip_serializing_if = "Option::is_none")]
		range: Option<(u64, u64)>,
	},
	/// Announce a peer's listening address.
	Register {
		/// Host the announcing peer can be reached at.
		address: String,
		/// Port the announcing peer listens on.
		port: u16,
	},
	/// Announce a freshly mined block.
	NewBlock {
		/// The mined block.
		block: Block,
	},
	/// Announce a transaction looking for a miner.
	Send {
		/// The signed transaction.
		transaction: Transaction,
	},
}

const COMMAND_TABLE: [&str; 5] = ["get_nodes", "get_blocks", "register", "new_block", "send"];

impl Command {
	/// The wire name of this command.
	pub fn name(&self) -> &'static str {
		match self {
			Command::GetNodes => "get_nodes",
			Command::GetBlocks { .. } => "get_blocks",
			Command::Register { .. } => "register",
			Command::NewBlock { .. } => "new_block",
			Command::Send { .. } => "send",
		}
	}

	/// Canonical JSON payload of this command.
	pub fn encode(&self) -> Vec<u8> {
		ser::ser_vec(self)
	}

	/// Decodes a frame payload, distinguishing garbage from well-formed
	/// payloads carrying a command we don't know.
	pub fn decode(payload: &[u8]) -> Result<Command, Error> {
		let value: serde_json::Value = serde_json::from_slice(payload)
			.map_err(|e| Error::MalformedFrame(e.to_string()))?;
		let cmd = value
			.get("cmd")
			.and_then(|c| c.as_str())
			.ok_or_else(|| Error::MalformedFrame("missing cmd field".to_string()))?;
		if !COMMAND_TABLE.contains(&cmd) {
			return Err(Error::UnknownCommand(cmd.to_string()));
		}
		serde_json::from_value(value).map_err(|e| Error::MalformedFrame(e.to_string()))
	}
}

/// Reads one frame, consuming exactly the advertised number of payload
/// bytes.
pub fn read_frame<R: Read>(stream: &mut R) -> Result<Vec<u8>, Error> {
	let len = stream.read_u32::<LittleEndian>()?;
	if len > MAX_FRAME_LEN {
		return Err(Error::MalformedFrame(format!(
			"frame of {} bytes exceeds maximum",
			len
		)));
	}
	let mut payload = vec![0u8; len as usize];
	stream.read_exact(&mut payload)?;
	Ok(payload)
}

/// Writes one frame: little-endian length, then the payload bytes.
pub fn write_frame<W: Write>(stream: &mut W, payload: &[u8]) -> Result<(), Error> {
	stream.write_u32::<LittleEndian>(payload.len() as u32)?;
	stream.write_all(payload)?;
	Ok(())
}
