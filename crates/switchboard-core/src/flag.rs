// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Environment;

/// Separator used in composite storage keys. Identifiers may not contain it.
pub const KEY_DELIMITER: char = '#';

/// A named boolean capability, unique per (environment, flag key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDefinition {
	pub environment: Environment,
	/// e.g., "advanced_analytics"
	pub flag_key: String,
	pub description: String,
	pub default_enabled: bool,
	pub owner: String,
	/// Variant served by `get_variant` when the flag resolves enabled.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_variant: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<DateTime<Utc>>,
}

impl FlagDefinition {
	/// Validates the flag key format.
	///
	/// Valid keys:
	/// - 3-100 characters
	/// - Start with a lowercase letter
	/// - Contain only lowercase letters, digits, `_`, `.` and `-`
	pub fn validate_key(key: &str) -> bool {
		if key.len() < 3 || key.len() > 100 {
			return false;
		}

		let mut chars = key.chars();

		match chars.next() {
			Some(c) if c.is_ascii_lowercase() => {}
			_ => return false,
		}

		chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'))
	}

	pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
		self.expires_at.is_some_and(|at| at <= now)
	}

	/// Applies a partial update in place and stamps `updated_at`.
	pub fn apply(&mut self, update: &FlagUpdate, now: DateTime<Utc>) {
		if let Some(description) = &update.description {
			self.description = description.clone();
		}
		if let Some(default_enabled) = update.default_enabled {
			self.default_enabled = default_enabled;
		}
		if let Some(owner) = &update.owner {
			self.owner = owner.clone();
		}
		if let Some(default_variant) = &update.default_variant {
			self.default_variant = default_variant.clone();
		}
		if let Some(expires_at) = update.expires_at {
			self.expires_at = expires_at;
		}
		self.updated_at = now;
	}
}

/// Input for the create operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlag {
	pub flag_key: String,
	#[serde(default)]
	pub description: String,
	pub default_enabled: bool,
	pub owner: String,
	#[serde(default)]
	pub default_variant: Option<String>,
	#[serde(default)]
	pub expires_at: Option<DateTime<Utc>>,
}

impl NewFlag {
	pub fn new(flag_key: impl Into<String>, default_enabled: bool, owner: impl Into<String>) -> Self {
		Self {
			flag_key: flag_key.into(),
			description: String::new(),
			default_enabled,
			owner: owner.into(),
			default_variant: None,
			expires_at: None,
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	pub fn with_default_variant(mut self, variant: impl Into<String>) -> Self {
		self.default_variant = Some(variant.into());
		self
	}

	pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
		self.expires_at = Some(expires_at);
		self
	}

	pub fn into_definition(self, environment: Environment, now: DateTime<Utc>) -> FlagDefinition {
		FlagDefinition {
			environment,
			flag_key: self.flag_key,
			description: self.description,
			default_enabled: self.default_enabled,
			owner: self.owner,
			default_variant: self.default_variant,
			created_at: now,
			updated_at: now,
			expires_at: self.expires_at,
		}
	}
}

/// Partial update. `None` leaves a field untouched; `expires_at: Some(None)`
/// clears the expiry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagUpdate {
	pub description: Option<String>,
	pub default_enabled: Option<bool>,
	pub owner: Option<String>,
	pub default_variant: Option<Option<String>>,
	pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl FlagUpdate {
	pub fn is_empty(&self) -> bool {
		self.description.is_none()
			&& self.default_enabled.is_none()
			&& self.owner.is_none()
			&& self.default_variant.is_none()
			&& self.expires_at.is_none()
	}

	pub fn default_enabled(mut self, enabled: bool) -> Self {
		self.default_enabled = Some(enabled);
		self
	}

	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn owner(mut self, owner: impl Into<String>) -> Self {
		self.owner = Some(owner.into());
		self
	}

	pub fn expires_at(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
		self.expires_at = Some(expires_at);
		self
	}

	pub fn default_variant(mut self, variant: Option<String>) -> Self {
		self.default_variant = Some(variant);
		self
	}
}

/// Tenant ids: 1-128 characters, no key delimiter, no control characters.
pub fn validate_tenant_id(tenant_id: &str) -> bool {
	!tenant_id.is_empty()
		&& tenant_id.len() <= 128
		&& !tenant_id
			.chars()
			.any(|c| c == KEY_DELIMITER || c.is_control())
}

/// Owners are free-form (team names, emails) but must be usable inside a key.
pub fn validate_owner(owner: &str) -> bool {
	!owner.trim().is_empty() && !owner.chars().any(|c| c == KEY_DELIMITER || c.is_control())
}
