// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deployment environment. The set is closed: flags, overrides and kill
/// switches never cross from one environment into another.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
	#[default]
	Development,
	Staging,
	Production,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown environment '{0}' (expected development, staging or production)")]
pub struct UnknownEnvironment(pub String);

impl Environment {
	pub const ALL: [Environment; 3] = [
		Environment::Development,
		Environment::Staging,
		Environment::Production,
	];

	/// Canonical lowercase name, e.g. `"production"`.
	pub fn as_str(&self) -> &'static str {
		match self {
			Environment::Development => "development",
			Environment::Staging => "staging",
			Environment::Production => "production",
		}
	}

	/// Uppercase token used in environment variable names.
	pub fn env_token(&self) -> &'static str {
		match self {
			Environment::Development => "DEVELOPMENT",
			Environment::Staging => "STAGING",
			Environment::Production => "PRODUCTION",
		}
	}

	pub fn is_production(&self) -> bool {
		matches!(self, Environment::Production)
	}

	/// Returns true when `declared` (as supplied by a caller) names this
	/// environment. Aliases are accepted; anything else is a mismatch.
	pub fn matches(&self, declared: &str) -> bool {
		declared.parse::<Environment>().ok() == Some(*self)
	}
}

impl fmt::Display for Environment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Environment {
	type Err = UnknownEnvironment;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"development" | "dev" => Ok(Environment::Development),
			"staging" | "stage" => Ok(Environment::Staging),
			"production" | "prod" => Ok(Environment::Production),
			_ => Err(UnknownEnvironment(s.to_string())),
		}
	}
}
