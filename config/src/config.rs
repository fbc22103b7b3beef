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

//! Configuration file management

use std::env;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

use quantcoin_servers::ServerConfig;
use quantcoin_util::LoggingConfig;

use crate::types::{ConfigError, ConfigMembers, GlobalConfig};

/// The default file the node reads its configuration from.
pub const CONFIG_FILE_NAME: &str = "quantcoin.toml";
const NODE_HOME: &str = ".quantcoin";

fn home_config_path() -> Option<PathBuf> {
	dirs::home_dir().map(|mut p| {
		p.push(NODE_HOME);
		p.push(CONFIG_FILE_NAME);
		p
	})
}

/// Whether a config file exists in either of the locations the node
/// looks at: the current directory, then the home directory.
pub fn config_file_exists() -> bool {
	if let Ok(mut p) = env::current_dir() {
		p.push(CONFIG_FILE_NAME);
		if p.exists() {
			return true;
		}
	}
	home_config_path().map(|p| p.exists()).unwrap_or(false)
}

/// Discovers and loads the node configuration: an explicitly provided
/// path must exist and wins; otherwise `quantcoin.toml` in the current
/// directory, then in the home directory. With no file anywhere,
/// returns the built-in defaults (and reports that no file was used).
pub fn initial_setup_server(config_path: Option<PathBuf>) -> Result<GlobalConfig, ConfigError> {
	// a path the operator asked for must not fall back silently
	if let Some(path) = config_path {
		return GlobalConfig::load(path);
	}

	let mut candidates = vec![];
	if let Ok(mut p) = env::current_dir() {
		p.push(CONFIG_FILE_NAME);
		candidates.push(p);
	}
	if let Some(p) = home_config_path() {
		candidates.push(p);
	}

	for path in candidates {
		if path.exists() {
			return GlobalConfig::load(path);
		}
	}

	Ok(GlobalConfig::default())
}

impl Default for GlobalConfig {
	fn default() -> GlobalConfig {
		GlobalConfig {
			config_file_path: None,
			using_config_file: false,
			members: Some(ConfigMembers {
				server: ServerConfig::default(),
				logging: Some(LoggingConfig::default()),
			}),
		}
	}
}

impl GlobalConfig {
	/// Loads and parses the provided TOML config file.
	pub fn load(path: PathBuf) -> Result<GlobalConfig, ConfigError> {
		let file_name = path.to_string_lossy().to_string();
		if !path.exists() {
			return Err(ConfigError::FileNotFoundError(file_name));
		}
		let mut file = File::open(&path)
			.map_err(|e| ConfigError::FileIOError(file_name.clone(), e.to_string()))?;
		let mut contents = String::new();
		file.read_to_string(&mut contents)
			.map_err(|e| ConfigError::FileIOError(file_name.clone(), e.to_string()))?;

		let members: ConfigMembers = toml::from_str(&contents)
			.map_err(|e| ConfigError::ParseError(file_name.clone(), e.to_string()))?;

		Ok(GlobalConfig {
			config_file_path: Some(path),
			using_config_file: true,
			members: Some(members),
		})
	}

	/// Serializes the current configuration back to TOML.
	pub fn ser_config(&self) -> Result<String, ConfigError> {
		toml::to_string(self.members.as_ref().expect("config members"))
			.map_err(|e| ConfigError::SerializationError(e.to_string()))
	}

	/// Writes the current configuration to the provided path, for first
	/// run convenience.
	pub fn write_to_file(&self, path: &PathBuf) -> Result<(), ConfigError> {
		let contents = self.ser_config()?;
		if let Some(dir) = path.parent() {
			std::fs::create_dir_all(dir)
				.map_err(|e| ConfigError::FileIOError(path.to_string_lossy().to_string(), e.to_string()))?;
		}
		let mut file = File::create(path)
			.map_err(|e| ConfigError::FileIOError(path.to_string_lossy().to_string(), e.to_string()))?;
		file.write_all(contents.as_bytes())
			.map_err(|e| ConfigError::FileIOError(path.to_string_lossy().to_string(), e.to_string()))?;
		Ok(())
	}

	/// The server configuration carried by this global config.
	pub fn server_config(&self) -> ServerConfig {
		self.members
			.as_ref()
			.map(|m| m.server.clone())
			.unwrap_or_default()
	}

	/// The logging configuration carried by this global config.
	pub fn logging_config(&self) -> Option<LoggingConfig> {
		self.members.as_ref().and_then(|m| m.logging.clone())
	}
}
