// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-environment namespace, cache ceiling and override/audit policy.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use switchboard_core::Environment;

use crate::error::ConfigError;

/// How much detail administrative changes are recorded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
	Minimal,
	Standard,
	Verbose,
}

impl fmt::Display for AuditLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			AuditLevel::Minimal => "minimal",
			AuditLevel::Standard => "standard",
			AuditLevel::Verbose => "verbose",
		})
	}
}

impl FromStr for AuditLevel {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"minimal" => Ok(AuditLevel::Minimal),
			"standard" => Ok(AuditLevel::Standard),
			"verbose" => Ok(AuditLevel::Verbose),
			other => Err(format!("unknown audit level '{other}'")),
		}
	}
}

/// Who may set tenant overrides, and whether a second person must approve.
///
/// Advisory: the engine exposes it, enforcement belongs to whatever layer
/// authenticates the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverridePolicy {
	pub allowed_roles: Vec<String>,
	pub requires_approval: bool,
}

impl OverridePolicy {
	pub fn permits_role(&self, role: &str) -> bool {
		self.allowed_roles.iter().any(|r| r.eq_ignore_ascii_case(role))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
	pub environment: Environment,
	/// Isolates this environment's records on a shared store.
	pub namespace: String,
	pub max_cache_ttl: Duration,
	pub override_policy: OverridePolicy,
	pub audit_level: AuditLevel,
	/// Points the store at a local emulator outside production.
	pub endpoint: Option<String>,
	pub region: Option<String>,
}

impl EnvironmentConfig {
	/// Compiled defaults for an environment.
	pub fn defaults_for(environment: Environment) -> Self {
		let (max_ttl_secs, roles, requires_approval, audit_level, endpoint): (
			u64,
			&[&str],
			bool,
			AuditLevel,
			Option<&str>,
		) = match environment {
			Environment::Development => (
				30,
				&["developer", "admin"],
				false,
				AuditLevel::Minimal,
				Some("http://localhost:8000"),
			),
			Environment::Staging => (
				300,
				&["admin", "release_manager"],
				false,
				AuditLevel::Standard,
				None,
			),
			Environment::Production => (300, &["admin"], true, AuditLevel::Verbose, None),
		};

		Self {
			environment,
			namespace: format!("switchboard-{}", environment.as_str()),
			max_cache_ttl: Duration::from_secs(max_ttl_secs),
			override_policy: OverridePolicy {
				allowed_roles: roles.iter().map(|r| r.to_string()).collect(),
				requires_approval,
			},
			audit_level,
			endpoint: endpoint.map(str::to_string),
			region: None,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentConfigLayer {
	pub namespace: Option<String>,
	pub max_cache_ttl_secs: Option<u64>,
	pub allowed_roles: Option<Vec<String>>,
	pub requires_approval: Option<bool>,
	pub audit_level: Option<AuditLevel>,
	pub endpoint: Option<String>,
	pub region: Option<String>,
}

impl EnvironmentConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.namespace.is_some() {
			self.namespace = other.namespace;
		}
		if other.max_cache_ttl_secs.is_some() {
			self.max_cache_ttl_secs = other.max_cache_ttl_secs;
		}
		if other.allowed_roles.is_some() {
			self.allowed_roles = other.allowed_roles;
		}
		if other.requires_approval.is_some() {
			self.requires_approval = other.requires_approval;
		}
		if other.audit_level.is_some() {
			self.audit_level = other.audit_level;
		}
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint;
		}
		if other.region.is_some() {
			self.region = other.region;
		}
	}

	pub fn finalize(self, environment: Environment) -> EnvironmentConfig {
		let defaults = EnvironmentConfig::defaults_for(environment);
		EnvironmentConfig {
			environment,
			namespace: self.namespace.unwrap_or(defaults.namespace),
			max_cache_ttl: self
				.max_cache_ttl_secs
				.map(Duration::from_secs)
				.unwrap_or(defaults.max_cache_ttl),
			override_policy: OverridePolicy {
				allowed_roles: self
					.allowed_roles
					.unwrap_or(defaults.override_policy.allowed_roles),
				requires_approval: self
					.requires_approval
					.unwrap_or(defaults.override_policy.requires_approval),
			},
			audit_level: self.audit_level.unwrap_or(defaults.audit_level),
			endpoint: self.endpoint.or(defaults.endpoint),
			region: self.region.or(defaults.region),
		}
	}
}

/// Environment sections keyed by name as written in the source. Names are
/// only checked at finalize time so a typo surfaces as a startup error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EnvironmentsConfigLayer(pub BTreeMap<String, EnvironmentConfigLayer>);

impl EnvironmentsConfigLayer {
	/// Merges `other` on top. Aliases are folded into the canonical name first
	/// so `prod` from a later source still wins over `production` from an
	/// earlier one.
	pub fn merge(&mut self, other: Self) {
		let current = std::mem::take(&mut self.0);
		for (name, layer) in current.into_iter().chain(other.0) {
			let name = canonical_name(&name);
			match self.0.get_mut(&name) {
				Some(existing) => existing.merge(layer),
				None => {
					self.0.insert(name, layer);
				}
			}
		}
	}

	pub fn finalize(self) -> Result<EnvironmentsConfig, ConfigError> {
		let mut by_env: BTreeMap<Environment, EnvironmentConfigLayer> = BTreeMap::new();
		for (name, layer) in self.0 {
			let environment: Environment =
				name
					.parse()
					.map_err(|_| ConfigError::UnknownEnvironment {
						name: name.clone(),
						origin: "environments section".to_string(),
					})?;
			// Aliases ("prod" and "production") collapse into one section.
			by_env.entry(environment).or_default().merge(layer);
		}

		let mut take = |env: Environment| by_env.remove(&env).unwrap_or_default().finalize(env);

		Ok(EnvironmentsConfig {
			development: take(Environment::Development),
			staging: take(Environment::Staging),
			production: take(Environment::Production),
		})
	}
}

/// Unknown names are kept as written so finalize can reject them.
fn canonical_name(name: &str) -> String {
	name
		.parse::<Environment>()
		.map(|env| env.to_string())
		.unwrap_or_else(|_| name.to_string())
}

/// Resolved configuration for every recognised environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentsConfig {
	pub development: EnvironmentConfig,
	pub staging: EnvironmentConfig,
	pub production: EnvironmentConfig,
}

impl EnvironmentsConfig {
	pub fn get(&self, environment: Environment) -> &EnvironmentConfig {
		match environment {
			Environment::Development => &self.development,
			Environment::Staging => &self.staging,
			Environment::Production => &self.production,
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = &EnvironmentConfig> {
		[&self.development, &self.staging, &self.production].into_iter()
	}

	/// Reverse lookup used by stores that only see namespaces.
	pub fn environment_for_namespace(&self, namespace: &str) -> Option<Environment> {
		self
			.iter()
			.find(|c| c.namespace == namespace)
			.map(|c| c.environment)
	}
}

impl Default for EnvironmentsConfig {
	fn default() -> Self {
		Self {
			development: EnvironmentConfig::defaults_for(Environment::Development),
			staging: EnvironmentConfig::defaults_for(Environment::Staging),
			production: EnvironmentConfig::defaults_for(Environment::Production),
		}
	}
}
