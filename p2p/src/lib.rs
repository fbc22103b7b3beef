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

//! Networking code to connect to other peers and exchange blocks,
//! transactions and peer addresses over the framed command protocol.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![warn(missing_docs)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod msg;
mod peers;
mod serv;
mod store;
mod types;

pub use crate::msg::{read_frame, write_frame, Command, MAX_FRAME_LEN};
pub use crate::peers::{Peers, MAX_PEER_FANOUT};
pub use crate::serv::{DummyAdapter, Server};
pub use crate::store::PeerStore;
pub use crate::types::{Error, NetAdapter, P2PConfig, PeerAddr};
