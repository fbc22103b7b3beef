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

//! Logging wrapper to be used throughout all crates in the workspace.
//!
//! Logging is assembled from a list of sinks (stdout, file), each with
//! its own threshold. A sink that cannot be opened is dropped with a
//! note on stderr instead of taking the node down. Panics on any thread
//! are routed into the log.

use std::{panic, thread};

use backtrace::Backtrace;
use log::{LevelFilter, Record};
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::Append;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::filter::threshold::ThresholdFilter;
use log4rs::filter::{Filter, Response};

use crate::types::{LogLevel, LoggingConfig};
use crate::Mutex;

/// How many rolled log files are kept before the oldest is overwritten.
const ROLLED_LOG_FILES: u32 = 32;

lazy_static! {
	// the active configuration, present once logging was set up; also
	// serializes initialization
	static ref LOG_INIT: Mutex<Option<LoggingConfig>> = Mutex::new(None);
}

impl From<&LogLevel> for LevelFilter {
	fn from(level: &LogLevel) -> LevelFilter {
		match level {
			LogLevel::Error => LevelFilter::Error,
			LogLevel::Warning => LevelFilter::Warn,
			LogLevel::Info => LevelFilter::Info,
			LogLevel::Debug => LevelFilter::Debug,
			LogLevel::Trace => LevelFilter::Trace,
		}
	}
}

/// Keeps only records emitted by the node's own crates, so chatty
/// third-party modules never reach the appenders.
#[derive(Debug)]
struct OwnCratesFilter;

impl Filter for OwnCratesFilter {
	fn filter(&self, record: &Record<'_>) -> Response {
		match record.module_path() {
			Some(path) if path.starts_with("quantcoin") => Response::Neutral,
			_ => Response::Reject,
		}
	}
}

fn encoder() -> Box<PatternEncoder> {
	Box::new(PatternEncoder::new(
		"{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l})} {M} - {m}{n}",
	))
}

fn stdout_appender() -> Box<dyn Append> {
	Box::new(ConsoleAppender::builder().encoder(encoder()).build())
}

/// Plain or rolling file appender, depending on whether a maximum size
/// was configured. `None` if the file (or its roller) can't be set up.
fn file_appender(config: &LoggingConfig) -> Option<Box<dyn Append>> {
	match config.log_max_size {
		Some(max_size) => {
			let roller = FixedWindowRoller::builder()
				.build(&format!("{}.{{}}", config.log_file_path), ROLLED_LOG_FILES)
				.ok()?;
			let policy =
				CompoundPolicy::new(Box::new(SizeTrigger::new(max_size)), Box::new(roller));
			RollingFileAppender::builder()
				.append(config.log_file_append)
				.encoder(encoder())
				.build(&config.log_file_path, Box::new(policy))
				.ok()
				.map(|a| Box::new(a) as Box<dyn Append>)
		}
		None => FileAppender::builder()
			.append(config.log_file_append)
			.encoder(encoder())
			.build(&config.log_file_path)
			.ok()
			.map(|a| Box::new(a) as Box<dyn Append>),
	}
}

/// Every sink the configuration asks for, as (name, threshold, appender).
fn sinks(config: &LoggingConfig) -> Vec<(&'static str, LevelFilter, Box<dyn Append>)> {
	let mut sinks: Vec<(&'static str, LevelFilter, Box<dyn Append>)> = vec![];
	if config.log_to_stdout {
		sinks.push((
			"stdout",
			(&config.stdout_log_level).into(),
			stdout_appender(),
		));
	}
	if config.log_to_file {
		match file_appender(config) {
			Some(appender) => {
				sinks.push(("file", (&config.file_log_level).into(), appender));
			}
			None => eprintln!(
				"Could not open log file {}, file logging disabled",
				config.log_file_path
			),
		}
	}
	sinks
}

fn build_config(config: &LoggingConfig) -> Config {
	let sinks = sinks(config);

	// the root runs at the most verbose threshold of any sink, each
	// sink then filters down to its own
	let root_level = sinks
		.iter()
		.map(|(_, level, _)| *level)
		.max()
		.unwrap_or(LevelFilter::Off);

	let mut builder = Config::builder();
	let mut root = Root::builder();
	for (name, level, appender) in sinks {
		builder = builder.appender(
			Appender::builder()
				.filter(Box::new(ThresholdFilter::new(level)))
				.filter(Box::new(OwnCratesFilter))
				.build(name, appender),
		);
		root = root.appender(name);
	}
	builder
		.build(root.build(root_level))
		.expect("valid logging configuration")
}

/// Initialize logging with the given configuration, once per process;
/// later calls keep the first configuration. Without a configuration
/// only the panic hook is installed and nothing is logged.
pub fn init_logger(config: Option<LoggingConfig>) {
	if let Some(config) = config {
		let mut init = LOG_INIT.lock();
		if init.is_none() {
			let _ = log4rs::init_config(build_config(&config));
			*init = Some(config);
			info!("logging initialized: {:?}", *init);
		}
	}
	route_panics_to_log();
}

/// Initializes stdout-only debug logging for unit and integration
/// tests. Safe to call from every test.
pub fn init_test_logger() {
	let mut config = LoggingConfig::default();
	config.log_to_file = false;
	config.stdout_log_level = LogLevel::Debug;
	init_logger(Some(config));
}

/// Routes panics on any thread into the log so background crashes
/// leave a trace, with a pointer on stderr when the console isn't
/// already receiving log records.
fn route_panics_to_log() {
	panic::set_hook(Box::new(|info| {
		let thread = thread::current();
		let name = thread.name().unwrap_or("unnamed");
		let message = match info.payload().downcast_ref::<&'static str>() {
			Some(s) => (*s).to_string(),
			None => info
				.payload()
				.downcast_ref::<String>()
				.cloned()
				.unwrap_or_else(|| "unknown panic payload".to_string()),
		};
		let location = info
			.location()
			.map(|l| format!("{}:{}", l.file(), l.line()))
			.unwrap_or_else(|| "unknown location".to_string());

		error!(
			"thread '{}' panicked at {}: {}\n{:?}",
			name,
			location,
			message,
			Backtrace::new()
		);

		// try_lock: a panic raised while the init lock is held must not
		// deadlock the hook
		let active = LOG_INIT.try_lock();
		match active.as_ref().and_then(|init| init.as_ref()) {
			// the console appender already carried the report
			Some(c) if c.log_to_stdout => (),
			Some(c) if c.log_to_file => eprintln!(
				"thread '{}' panicked: {}, see {} for details",
				name, message, c.log_file_path
			),
			_ => eprintln!("thread '{}' panicked at {}: {}", name, location, message),
		}
	}));
}
