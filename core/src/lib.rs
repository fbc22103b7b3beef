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

//! Implementation of the QuantCoin data model: addresses, transactions,
//! blocks with their proof of work, the canonical JSON wire encoding and
//! the consensus schedules that bind them all together.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![warn(missing_docs)]

#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde_derive;

pub mod consensus;
pub mod core;
pub mod crypto;
pub mod ser;

pub use crate::core::block::{Block, Previous};
pub use crate::core::hash::Digest;
pub use crate::core::transaction::{Output, Transaction, TransactionBody};
pub use crate::crypto::Address;
