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

//! Main for building the binary of a QuantCoin peer-to-peer node.

#[macro_use]
extern crate log;

use std::path::PathBuf;
use std::process::exit;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use clap::{App, Arg};

use quantcoin_config as config;
use quantcoin_servers as servers;
use quantcoin_util as util;

fn main() {
	let args = App::new("quantcoin")
		.version("0.1.0")
		.about("Peer-to-peer cryptocurrency node")
		.arg(
			Arg::with_name("config")
				.short("c")
				.long("config")
				.help("Path to the configuration file")
				.takes_value(true),
		)
		.arg(
			Arg::with_name("port")
				.short("p")
				.long("port")
				.help("Port to listen on, overrides the configuration")
				.takes_value(true),
		)
		.arg(
			Arg::with_name("seed")
				.short("s")
				.long("seed")
				.help("host:port of a node to bootstrap from, repeatable")
				.takes_value(true)
				.multiple(true),
		)
		.arg(
			Arg::with_name("mine")
				.short("m")
				.long("mine")
				.help("Address of the wallet mining rewards are paid to; enables mining")
				.takes_value(true),
		)
		.get_matches();

	let global_config =
		match config::initial_setup_server(args.value_of("config").map(PathBuf::from)) {
			Ok(c) => c,
			Err(e) => {
				eprintln!("Failed to load configuration: {}", e);
				exit(1);
			}
		};

	util::init_logger(global_config.logging_config());
	if let Some(ref path) = global_config.config_file_path {
		info!("Using configuration file at {}", path.display());
	} else {
		info!("No configuration file found, using defaults");
	}

	let mut server_config = global_config.server_config();
	if let Some(port) = args.value_of("port") {
		match port.parse() {
			Ok(port) => server_config.p2p_config.port = port,
			Err(_) => {
				eprintln!("Invalid port: {}", port);
				exit(1);
			}
		}
	}
	if let Some(seeds) = args.values_of("seed") {
		server_config.seeds = seeds.map(|s| s.to_string()).collect();
	}
	if let Some(wallet_address) = args.value_of("mine") {
		let mut mining_config = server_config.mining_config.unwrap_or_default();
		mining_config.enable_mining = true;
		mining_config.wallet_address = wallet_address.to_string();
		server_config.mining_config = Some(mining_config);
	}

	info!("Starting the QuantCoin server...");
	let server = match servers::Server::start(server_config) {
		Ok(s) => s,
		Err(e) => {
			error!("Failed to start server: {:?}", e);
			eprintln!("Failed to start server: {:?}", e);
			exit(1);
		}
	};

	// park until ctrl-c, then wind the server down
	let (tx, rx) = mpsc::channel();
	ctrlc::set_handler(move || {
		let _ = tx.send(());
	})
	.expect("setting termination handler");

	rx.recv().expect("termination channel");
	warn!("Shutdown signal received, stopping...");
	server.stop();
	// give the log appenders a moment to drain
	thread::sleep(Duration::from_millis(100));
}
