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

//! Logging, as well as various low-level utilities that factor Rust
//! patterns that are frequent within the quantcoin codebase.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![warn(missing_docs)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

// Re-export so only has to be included once
pub use parking_lot::{Mutex, RwLock};

// Logging related
pub mod logger;
pub use crate::logger::{init_logger, init_test_logger};

pub mod types;
pub use crate::types::{LogLevel, LoggingConfig};

mod hex;
pub use crate::hex::*;

use std::sync::Arc;

/// Encapsulation of a RwLock<Option<T>> for one-time initialization.
/// This implementation will purposefully fail hard if not used
/// properly, for example if not initialized before being first used
/// (borrowed).
#[derive(Clone)]
pub struct OneTime<T> {
	/// The inner value.
	inner: Arc<RwLock<Option<T>>>,
}

impl<T> OneTime<T>
where
	T: Clone,
{
	/// Builds a new uninitialized OneTime.
	pub fn new() -> OneTime<T> {
		OneTime {
			inner: Arc::new(RwLock::new(None)),
		}
	}

	/// Initializes the OneTime, should only be called once after construction.
	/// Will panic (via assert) if called more than once.
	pub fn init(&self, value: T) {
		let mut inner = self.inner.write();
		assert!(inner.is_none());
		*inner = Some(value);
	}

	/// Borrows the OneTime, should only be called after initialization.
	/// Will panic if called before initialization.
	pub fn borrow(&self) -> T {
		let inner = self.inner.read();
		inner
			.clone()
			.expect("Cannot borrow one_time before initialization.")
	}

	/// Whether the OneTime has been initialized.
	pub fn is_init(&self) -> bool {
		self.inner.read().is_some()
	}
}

/// Global stopped state shared across the different subsystems of a node
/// instance. Once stopped it cannot be restarted.
pub struct StopState {
	stopped: Mutex<bool>,
}

impl StopState {
	/// Create a new stop state in a running state.
	pub fn new() -> StopState {
		StopState {
			stopped: Mutex::new(false),
		}
	}

	/// Check if we are stopped.
	pub fn is_stopped(&self) -> bool {
		*self.stopped.lock()
	}

	/// Stop the server. Cannot be undone.
	pub fn stop(&self) {
		*self.stopped.lock() = true;
	}
}

/// Encode an u8 slice into a base64 string.
pub fn to_base64(d: &[u8]) -> String {
	base64::encode(d)
}

/// Decode a base64 string into an u8 vector.
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
	base64::decode(s)
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn base64_round_trip() {
		let data = vec![0u8, 1, 2, 254, 255];
		let enc = to_base64(&data);
		assert_eq!(from_base64(&enc).unwrap(), data);
	}

	#[test]
	fn one_time_borrow_after_init() {
		let v: OneTime<u32> = OneTime::new();
		assert!(!v.is_init());
		v.init(42);
		assert_eq!(v.borrow(), 42);
	}
}
