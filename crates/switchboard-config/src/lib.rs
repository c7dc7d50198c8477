// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Switchboard flag engine.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Per-environment namespaces, cache ceilings and override policy
//! - Consistent environment variable naming (`SWITCHBOARD_*`)
//!
//! # Usage
//!
//! ```ignore
//! use switchboard_config::load_config;
//!
//! let config = load_config()?;
//! println!("serving {} from {}", config.environment, config.active().namespace);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

use std::collections::BTreeSet;
use std::time::Duration;

pub use error::ConfigError;
pub use layer::FlagsConfigLayer;
pub use sections::*;
pub use sources::{
	load_from_lookup, ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource,
};

use switchboard_core::{Environment, KEY_DELIMITER};
use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlagsConfig {
	/// Environment this process serves. Fixed for the process lifetime.
	pub environment: Environment,
	pub environments: EnvironmentsConfig,
	pub cache: CacheConfig,
	pub store: StoreConfig,
	pub logging: LoggingConfig,
}

impl FlagsConfig {
	/// Settings for the environment this process serves.
	pub fn active(&self) -> &EnvironmentConfig {
		self.environments.get(self.environment)
	}

	/// Cache TTL after applying the active environment's ceiling.
	pub fn effective_cache_ttl(&self) -> Duration {
		self.cache.ttl.min(self.active().max_cache_ttl)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`SWITCHBOARD_*`)
/// 2. Config file (`/etc/switchboard/flags.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<FlagsConfig, ConfigError> {
	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<FlagsConfig, ConfigError> {
	let mut merged = FlagsConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<FlagsConfig, ConfigError> {
	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge an explicit set of sources in precedence order.
pub fn load_config_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<FlagsConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = FlagsConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: FlagsConfigLayer) -> Result<FlagsConfig, ConfigError> {
	let environment = match layer.environment {
		Some(name) => name
			.parse::<Environment>()
			.map_err(|_| ConfigError::UnknownEnvironment {
				name,
				origin: "SWITCHBOARD_ENV/environment".to_string(),
			})?,
		None => Environment::Development,
	};

	let config = FlagsConfig {
		environment,
		environments: layer.environments.unwrap_or_default().finalize()?,
		cache: layer.cache.unwrap_or_default().finalize(),
		store: layer.store.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	let active = config.active();
	info!(
		environment = %config.environment,
		namespace = %active.namespace,
		cache_ttl_secs = config.effective_cache_ttl().as_secs(),
		store_timeout_ms = config.store.timeout.as_millis() as u64,
		requires_approval = active.override_policy.requires_approval,
		audit_level = %active.audit_level,
		"Flags configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &FlagsConfig) -> Result<(), ConfigError> {
	let mut seen = BTreeSet::new();
	for env in config.environments.iter() {
		if env.namespace.trim().is_empty() {
			return Err(ConfigError::Validation(format!(
				"namespace for {} must not be empty",
				env.environment
			)));
		}
		if env.namespace.contains(KEY_DELIMITER) {
			return Err(ConfigError::Validation(format!(
				"namespace '{}' for {} must not contain '{KEY_DELIMITER}'",
				env.namespace, env.environment
			)));
		}
		if !seen.insert(env.namespace.as_str()) {
			return Err(ConfigError::Validation(format!(
				"namespace '{}' is shared by more than one environment; \
				 each environment needs its own namespace on a shared store",
				env.namespace
			)));
		}
		if env.max_cache_ttl.is_zero() {
			return Err(ConfigError::Validation(format!(
				"max_cache_ttl_secs for {} must be greater than zero",
				env.environment
			)));
		}
	}

	if config.store.timeout.is_zero() {
		return Err(ConfigError::Validation(
			"SWITCHBOARD_STORE_TIMEOUT_MS must be greater than zero".to_string(),
		));
	}

	Ok(())
}
