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

//! Error types for chain
use failure::{Backtrace, Context, Fail};
use std::fmt::{self, Display};

use quantcoin_store as store;

/// Error definition
#[derive(Debug, Fail)]
pub struct Error {
	inner: Context<ErrorKind>,
}

/// Chain error definitions
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ErrorKind {
	/// The block doesn't extend the current tip
	#[fail(display = "Block is unfit: {}", _0)]
	Unfit(String),
	/// The proof of work is invalid for the current difficulty
	#[fail(display = "Invalid PoW")]
	InvalidPow,
	/// Transactions are not in canonical order
	#[fail(display = "Transactions out of canonical order")]
	TxOutOfOrder,
	/// The same signature appears more than once in the block
	#[fail(display = "Duplicate transaction")]
	DuplicateTx,
	/// More than one coin creation transaction in the block
	#[fail(display = "More than one coinbase transaction")]
	MultipleCoinbase,
	/// The coinbase issues more than the scheduled reward
	#[fail(display = "Coinbase issues {} but reward is {}", spent, reward)]
	CoinbaseOverspend {
		/// what the coinbase tried to issue
		spent: u64,
		/// the scheduled reward at this chain length
		reward: u64,
	},
	/// A transaction signature doesn't verify or doesn't bind its origin
	#[fail(display = "Invalid transaction signature")]
	InvalidTxSignature,
	/// A transaction pays its own origin wallet
	#[fail(display = "Transaction pays back its origin wallet")]
	SelfSend,
	/// A transaction spends more than its origin wallet owns
	#[fail(display = "Wallet owns {} but transaction spends {}", owned, spent)]
	Overspend {
		/// balance of the origin wallet before this block
		owned: u64,
		/// what the transaction tried to spend
		spent: u64,
	},
	/// Internal issue when trying to save or load data from store
	#[fail(display = "Store Error: {}", _0)]
	StoreErr(String),
	/// Anything else
	#[fail(display = "Other Error: {}", _0)]
	Other(String),
}

impl Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		Display::fmt(&self.inner, f)
	}
}

impl Error {
	/// get kind
	pub fn kind(&self) -> ErrorKind {
		self.inner.get_context().clone()
	}
	/// get cause
	pub fn cause(&self) -> Option<&dyn Fail> {
		self.inner.cause()
	}
	/// get backtrace
	pub fn backtrace(&self) -> Option<&Backtrace> {
		self.inner.backtrace()
	}
}

impl From<ErrorKind> for Error {
	fn from(kind: ErrorKind) -> Error {
		Error {
			inner: Context::new(kind),
		}
	}
}

impl From<Context<ErrorKind>> for Error {
	fn from(inner: Context<ErrorKind>) -> Error {
		Error { inner }
	}
}

impl From<store::Error> for Error {
	fn from(error: store::Error) -> Error {
		Error {
			inner: Context::new(ErrorKind::StoreErr(format!("{}", error))),
		}
	}
}
