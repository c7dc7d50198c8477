// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment variables.

use std::collections::BTreeMap;
use std::path::PathBuf;

use switchboard_core::Environment;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::FlagsConfigLayer;
use crate::sections::{
	AuditLevel, CacheConfigLayer, EnvironmentConfigLayer, EnvironmentsConfigLayer, LogFormat,
	LoggingConfigLayer, StoreConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<FlagsConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<FlagsConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(FlagsConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/switchboard/flags.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<FlagsConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(FlagsConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: FlagsConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `SWITCHBOARD_<SECTION>_<FIELD>`, and
/// `SWITCHBOARD_<ENVIRONMENT>_<FIELD>` for per-environment settings.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<FlagsConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from_lookup(&|name: &str| std::env::var(name).ok())
	}
}

/// Builds a layer from an arbitrary variable lookup.
pub fn load_from_lookup(
	lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<FlagsConfigLayer, ConfigError> {
	let vars = Vars { lookup };

	let mut environments = BTreeMap::new();
	for environment in Environment::ALL {
		environments.insert(
			environment.as_str().to_string(),
			load_environment_from(&vars, environment)?,
		);
	}

	Ok(FlagsConfigLayer {
		environment: vars.string("SWITCHBOARD_ENV"),
		environments: Some(EnvironmentsConfigLayer(environments)),
		cache: Some(CacheConfigLayer {
			ttl_secs: vars.u64("SWITCHBOARD_CACHE_TTL_SECS")?,
			sweep_interval_secs: vars.u64("SWITCHBOARD_CACHE_SWEEP_INTERVAL_SECS")?,
		}),
		store: Some(StoreConfigLayer {
			timeout_ms: vars.u64("SWITCHBOARD_STORE_TIMEOUT_MS")?,
			database_url: vars.string("SWITCHBOARD_DATABASE_URL"),
		}),
		logging: Some(LoggingConfigLayer {
			level: vars.string("SWITCHBOARD_LOG_LEVEL"),
			format: vars.parsed::<LogFormat>("SWITCHBOARD_LOG_FORMAT")?,
		}),
	})
}

fn load_environment_from(
	vars: &Vars<'_>,
	environment: Environment,
) -> Result<EnvironmentConfigLayer, ConfigError> {
	let key = |field: &str| format!("SWITCHBOARD_{}_{field}", environment.env_token());

	Ok(EnvironmentConfigLayer {
		namespace: vars.string(&key("NAMESPACE")),
		max_cache_ttl_secs: vars.u64(&key("MAX_CACHE_TTL_SECS"))?,
		allowed_roles: vars.list(&key("ALLOWED_ROLES")),
		requires_approval: vars.bool(&key("REQUIRE_APPROVAL"))?,
		audit_level: vars.parsed::<AuditLevel>(&key("AUDIT_LEVEL"))?,
		endpoint: vars.string(&key("ENDPOINT")),
		region: vars
			.string(&key("REGION"))
			.or_else(|| vars.string("SWITCHBOARD_REGION")),
	})
}

struct Vars<'a> {
	lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Vars<'_> {
	fn string(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
		match self.string(name) {
			Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(Some(true)),
			Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(Some(false)),
			Some(v) => Err(ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid bool value '{v}', expected true, false, 1 or 0"),
			}),
			None => Ok(None),
		}
	}

	fn u64(&self, name: &str) -> Result<Option<u64>, ConfigError> {
		match self.string(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid u64 value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	fn parsed<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
	where
		T: std::str::FromStr<Err = String>,
	{
		match self.string(name) {
			Some(v) => v.parse().map(Some).map_err(|message| ConfigError::InvalidValue {
				key: name.to_string(),
				message,
			}),
			None => Ok(None),
		}
	}

	fn list(&self, name: &str) -> Option<Vec<String>> {
		self.string(name).map(|s| {
			s.split(',')
				.map(|s| s.trim().to_string())
				.filter(|s| !s.is_empty())
				.collect()
		})
	}
}
