use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::calendar::Granularity;
use crate::dimension::{Dimension, GroupResolver};

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_TOP_N: usize = 6;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("failed to parse TOML config: {0}")]
	TomlDecode(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
	pub granularity: Granularity,
	pub dimension: Dimension,
	pub top_n: usize,
	pub category_labels: BTreeMap<String, String>,
}

impl Default for ReportConfig {
	fn default() -> Self {
		Self {
			granularity: Granularity::Week,
			dimension: Dimension::Goal,
			top_n: DEFAULT_TOP_N,
			category_labels: BTreeMap::new(),
		}
	}
}

impl ReportConfig {
	pub fn resolver(&self) -> GroupResolver {
		GroupResolver::with_category_labels(self.category_labels.clone())
	}
}

/// Picks the config file: the CLI flag, then `CHRONOS_INSIGHTS_CONFIG`, then
/// the per-user config directory.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> Option<PathBuf> {
	if let Some(path) = cli_path {
		return Some(path);
	}

	if let Some(path) = env::var_os("CHRONOS_INSIGHTS_CONFIG") {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return Some(path);
		}
	}

	config_dir().map(|dir| dir.join(CONFIG_FILE))
}

pub fn load_config(path: Option<&Path>) -> Result<ReportConfig, ConfigError> {
	let Some(path) = path else {
		return Ok(ReportConfig::default());
	};

	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => {
			debug!("no config at {}, using defaults", path.display());
			return Ok(ReportConfig::default());
		}
		Err(err) => return Err(ConfigError::Io(err)),
	};

	parse_config(&raw)
}

pub fn parse_config(raw: &str) -> Result<ReportConfig, ConfigError> {
	Ok(toml::from_str(raw)?)
}

fn config_dir() -> Option<PathBuf> {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("APPDATA") {
			return Some(PathBuf::from(path).join("chronos_insights"));
		}
	}

	if let Some(path) = env::var_os("XDG_CONFIG_HOME") {
		return Some(PathBuf::from(path).join("chronos_insights"));
	}

	env::var_os("HOME").map(|path| PathBuf::from(path).join(".config").join("chronos_insights"))
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::path::PathBuf;

	use super::{ConfigError, ReportConfig, load_config, parse_config};
	use crate::calendar::Granularity;
	use crate::dimension::Dimension;

	#[test]
	fn fills_missing_keys_with_defaults() {
		let config = parse_config("granularity = \"month\"\n").expect("config should parse");
		assert_eq!(config.granularity, Granularity::Month);
		assert_eq!(config.dimension, Dimension::Goal);
		assert_eq!(config.top_n, 6);
	}

	#[test]
	fn reads_category_labels() {
		let path = temp_file("chronos_insights_config.toml");
		fs::write(
			&path,
			"dimension = \"category\"\ntop_n = 3\n\n[category_labels]\ndeep = \"Deep work\"\n",
		)
		.expect("write should succeed");

		let config = load_config(Some(path.as_path())).expect("config should load");
		assert_eq!(config.dimension, Dimension::Category);
		assert_eq!(config.top_n, 3);
		assert_eq!(config.category_labels.get("deep").map(String::as_str), Some("Deep work"));
		let _ = fs::remove_file(path);
	}

	#[test]
	fn missing_file_yields_defaults() {
		let config = load_config(Some(temp_file("chronos_insights_missing.toml").as_path()))
			.expect("missing config should load");
		assert_eq!(config, ReportConfig::default());
	}

	#[test]
	fn rejects_unknown_granularity() {
		assert!(matches!(
			parse_config("granularity = \"fortnight\""),
			Err(ConfigError::TomlDecode(_))
		));
	}

	fn temp_file(name: &str) -> PathBuf {
		let mut path = std::env::temp_dir();
		path.push(format!("{}_{}", name, std::process::id()));
		path
	}
}
