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

//! Implementation of the chain block acceptance (or refusal) pipeline.
//!
//! The pipeline is bias-to-reject: every check must pass before anything
//! is persisted, so a rejection leaves the store byte-unchanged. Checks
//! are arranged by cost, cheapest first, to keep the DoS surface small.

use std::collections::HashSet;

use quantcoin_core::consensus;
use quantcoin_core::{Block, Transaction};

use crate::error::{Error, ErrorKind};
use crate::types::{ChainStore, Tip};

/// Contextual information required to process a new block and either
/// reject or accept it.
pub struct BlockContext<'a> {
	/// The store balances are answered from, at pre-block state.
	pub store: &'a dyn ChainStore,
	/// The tip this block must extend.
	pub head: Tip,
}

/// Runs the full acceptance pipeline on the provided block. On success
/// the block has been appended to the store and the new tip is returned;
/// on failure nothing was mutated and the error names the first rule the
/// block broke.
pub fn process_block(b: &Block, ctx: &BlockContext<'_>) -> Result<Tip, Error> {
	check_parent(b, ctx)?;
	check_pow(b, ctx)?;
	check_order_and_uniqueness(b)?;
	check_coinbase(b, ctx)?;
	check_transactions(b, ctx)?;
	add_block(b, ctx)
}

/// Rule 1: the block must link to the current tip (or to the genesis
/// sentinel when the chain is empty).
fn check_parent(b: &Block, ctx: &BlockContext<'_>) -> Result<(), Error> {
	if b.previous != ctx.head.last_block {
		return Err(ErrorKind::Unfit(format!(
			"previous {} is not our tip {}",
			b.previous, ctx.head.last_block
		))
		.into());
	}
	Ok(())
}

/// Rule 2: proof of work at the difficulty scheduled for this chain
/// length.
fn check_pow(b: &Block, ctx: &BlockContext<'_>) -> Result<(), Error> {
	let difficulty = consensus::network_difficulty(ctx.head.height);
	if !b.valid(difficulty) {
		return Err(ErrorKind::InvalidPow.into());
	}
	Ok(())
}

/// Rule 3: canonical transaction order, no duplicate signatures.
fn check_order_and_uniqueness(b: &Block) -> Result<(), Error> {
	if !b.is_canonically_sorted() {
		return Err(ErrorKind::TxOutOfOrder.into());
	}
	let mut seen: HashSet<&[u8]> = HashSet::new();
	for tx in b.transactions.iter().filter(|t| !t.is_coinbase()) {
		if !seen.insert(&tx.signature) {
			return Err(ErrorKind::DuplicateTx.into());
		}
	}
	Ok(())
}

/// Rules 4 and 5: at most one coinbase, issuing at most the scheduled
/// reward.
fn check_coinbase(b: &Block, ctx: &BlockContext<'_>) -> Result<(), Error> {
	let coinbases: Vec<&Transaction> =
		b.transactions.iter().filter(|t| t.is_coinbase()).collect();
	if coinbases.len() > 1 {
		return Err(ErrorKind::MultipleCoinbase.into());
	}
	if let Some(coinbase) = coinbases.first() {
		let reward = consensus::reward(ctx.head.height);
		let spent = coinbase.amount_spent();
		if spent > reward {
			return Err(ErrorKind::CoinbaseOverspend { spent, reward }.into());
		}
	}
	Ok(())
}

/// Rule 6: every non-coinbase transaction verifies, doesn't pay itself
/// and is covered by its wallet's balance at pre-block state.
fn check_transactions(b: &Block, ctx: &BlockContext<'_>) -> Result<(), Error> {
	for tx in b.transactions.iter().filter(|t| !t.is_coinbase()) {
		// verify() also binds address_of(public_key) to the origin
		if !tx.verify() {
			return Err(ErrorKind::InvalidTxSignature.into());
		}

		let from = match tx.from_wallet() {
			Some(from) => from,
			None => continue,
		};

		if tx.outputs().iter().any(|o| o.address() == from) {
			return Err(ErrorKind::SelfSend.into());
		}

		let owned = ctx.store.amount_owned(from)?;
		let spent = tx.amount_spent();
		if spent > owned {
			return Err(ErrorKind::Overspend { owned, spent }.into());
		}
	}
	Ok(())
}

fn add_block(b: &Block, ctx: &BlockContext<'_>) -> Result<Tip, Error> {
	ctx.store.store_block(b)?;
	Ok(ctx.head.append(b))
}
