use std::collections::HashSet;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activities::{Activity, generate_id};
use crate::grid::SLICES_PER_DAY;
use crate::window::DEFAULT_WINDOW_SIZE;

const APP_DIR: &str = "bubble_timer";
const CONFIG_FILE: &str = "config.toml";

const DEFAULT_ACTIVITIES: [(&str, &str); 6] = [
	("Sleep", "blue"),
	("Work", "green"),
	("Exercise", "light_red"),
	("Reading", "yellow"),
	("Chores", "magenta"),
	("Leisure", "cyan"),
];

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("io error on {}: {source}", path.display())]
	Io {
		path: PathBuf,
		source: std::io::Error,
	},
	#[error("failed to parse config {}: {source}", path.display())]
	Decode {
		path: PathBuf,
		source: toml::de::Error,
	},
	#[error("failed to encode config: {0}")]
	Encode(#[from] toml::ser::Error),
	#[error("invalid config: {0}")]
	Invalid(String),
	#[error("config already exists at {}", .0.display())]
	AlreadyExists(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	pub user_id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub email: String,
	#[serde(default = "default_window_size")]
	pub window_size: usize,
	#[serde(default)]
	pub activities: Vec<Activity>,
}

fn default_window_size() -> usize {
	DEFAULT_WINDOW_SIZE
}

impl Config {
	/// A fresh config with a new user id and a starter set of activities.
	pub fn starter() -> Self {
		Self {
			user_id: generate_id(),
			name: String::new(),
			email: String::new(),
			window_size: DEFAULT_WINDOW_SIZE,
			activities: DEFAULT_ACTIVITIES
				.iter()
				.map(|(name, color)| Activity::new(*name, Some(*color)))
				.collect(),
		}
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.user_id.trim().is_empty() {
			return Err(ConfigError::Invalid("user_id is required".to_string()));
		}

		if self.window_size == 0 || self.window_size > SLICES_PER_DAY {
			return Err(ConfigError::Invalid(format!(
				"window_size must be between 1 and {SLICES_PER_DAY}, got {}",
				self.window_size
			)));
		}

		let mut seen = HashSet::new();
		for activity in &self.activities {
			if activity.id.trim().is_empty() {
				return Err(ConfigError::Invalid(format!(
					"activity '{}' has no id",
					activity.name
				)));
			}
			if !seen.insert(activity.id.as_str()) {
				return Err(ConfigError::Invalid(format!(
					"activity id '{}' is used more than once",
					activity.id
				)));
			}
		}

		Ok(())
	}
}

/// Reads the config at `path`. `Ok(None)` means no file exists yet.
pub fn load_config(path: &Path) -> Result<Option<Config>, ConfigError> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
		Err(source) => {
			return Err(ConfigError::Io {
				path: path.to_path_buf(),
				source,
			});
		}
	};

	let config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Decode {
		path: path.to_path_buf(),
		source,
	})?;
	config.validate()?;
	Ok(Some(config))
}

/// Writes a starter config to `path`, refusing to overwrite an existing one.
pub fn write_default_config(path: &Path) -> Result<Config, ConfigError> {
	if path.exists() {
		return Err(ConfigError::AlreadyExists(path.to_path_buf()));
	}

	let io_error = |source| ConfigError::Io {
		path: path.to_path_buf(),
		source,
	};
	if let Some(parent) = path.parent() {
		if !parent.as_os_str().is_empty() {
			fs::create_dir_all(parent).map_err(io_error)?;
		}
	}

	let config = Config::starter();
	let body = toml::to_string_pretty(&config)?;
	fs::write(path, body).map_err(io_error)?;
	Ok(config)
}

pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
	if let Some(path) = cli_path {
		return path;
	}

	if let Some(path) = non_empty_env("BUBBLETIMER_CONFIG") {
		return path;
	}

	if let Some(path) = non_empty_env("XDG_CONFIG_HOME") {
		return path.join(APP_DIR).join(CONFIG_FILE);
	}

	if let Some(path) = non_empty_env("HOME") {
		return path.join(".config").join(APP_DIR).join(CONFIG_FILE);
	}

	PathBuf::from(CONFIG_FILE)
}

pub fn resolve_data_dir(cli_path: Option<PathBuf>) -> PathBuf {
	if let Some(path) = cli_path {
		return path;
	}

	if let Some(path) = non_empty_env("BUBBLETIMER_DATA_DIR") {
		return path;
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = non_empty_env("LOCALAPPDATA") {
			return path.join(APP_DIR);
		}
	}

	if let Some(path) = non_empty_env("XDG_DATA_HOME") {
		return path.join(APP_DIR);
	}

	if let Some(path) = non_empty_env("HOME") {
		return path.join(".local").join("share").join(APP_DIR);
	}

	PathBuf::from(".bubble_timer")
}

fn non_empty_env(key: &str) -> Option<PathBuf> {
	env::var_os(key)
		.filter(|value| !value.is_empty())
		.map(PathBuf::from)
}
