// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flag store contract and implementations.

pub mod keys;
mod memory;
mod schema;
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use switchboard_core::{
	EmergencyControl, Environment, FlagDefinition, FlagUpdate, KillSwitchScope, StoreError,
	StoreResult, TenantOverride, KEY_DELIMITER,
};

pub use memory::InMemoryFlagStore;
pub use schema::run_migrations;
pub use sqlite::{classify_sqlx_error, SqliteFlagStore};

/// Upper bound on keys per `batch_get_flags` call.
pub const MAX_BATCH_GET_KEYS: usize = 50;

/// Persistence for flags, tenant overrides and kill switches.
///
/// Every operation is scoped to one environment. Failures are returned
/// classified and never swallowed.
#[async_trait]
pub trait FlagStore: Send + Sync {
	async fn get_flag(
		&self,
		environment: Environment,
		flag_key: &str,
	) -> StoreResult<Option<FlagDefinition>>;

	/// Creates a flag. Fails with `ConditionalCheckFailed` if the key exists.
	async fn put_flag(&self, flag: &FlagDefinition) -> StoreResult<()>;

	/// Merges `update` into an existing flag. Fails with `NotFound` if absent.
	async fn update_flag(
		&self,
		environment: Environment,
		flag_key: &str,
		update: &FlagUpdate,
	) -> StoreResult<FlagDefinition>;

	/// All flags, newest first, served from the recency view.
	async fn list_flags(&self, environment: Environment) -> StoreResult<Vec<FlagDefinition>>;

	async fn list_flags_by_owner(
		&self,
		environment: Environment,
		owner: &str,
	) -> StoreResult<Vec<FlagDefinition>>;

	/// Flags with an expiry, soonest first, optionally only those expiring
	/// before `expiring_before`.
	async fn list_flags_by_expiry(
		&self,
		environment: Environment,
		expiring_before: Option<DateTime<Utc>>,
	) -> StoreResult<Vec<FlagDefinition>>;

	/// Environments in which `flag_key` is defined.
	async fn find_flag_environments(&self, flag_key: &str) -> StoreResult<Vec<Environment>>;

	/// Degraded listing that reads primary records only. Stays correct when
	/// index views are stale or missing.
	async fn list_flags_with_full_scan(
		&self,
		environment: Environment,
	) -> StoreResult<Vec<FlagDefinition>>;

	async fn get_tenant_override(
		&self,
		environment: Environment,
		tenant_id: &str,
		flag_key: &str,
	) -> StoreResult<Option<TenantOverride>>;

	/// Upsert.
	async fn set_tenant_override(&self, tenant_override: &TenantOverride) -> StoreResult<()>;

	async fn list_tenant_overrides(
		&self,
		environment: Environment,
		tenant_id: &str,
	) -> StoreResult<Vec<TenantOverride>>;

	async fn get_kill_switch(
		&self,
		environment: Environment,
		scope: &KillSwitchScope,
	) -> StoreResult<Option<EmergencyControl>>;

	/// Blind overwrite. Last writer wins.
	async fn set_kill_switch(&self, control: &EmergencyControl) -> StoreResult<()>;

	async fn list_kill_switches(&self, environment: Environment)
		-> StoreResult<Vec<EmergencyControl>>;

	/// Fetches up to [`MAX_BATCH_GET_KEYS`] flags. Missing keys are omitted.
	async fn batch_get_flags(
		&self,
		environment: Environment,
		flag_keys: &[String],
	) -> StoreResult<Vec<FlagDefinition>>;

	async fn health_check(&self) -> StoreResult<()>;
}

/// Rejects identifiers that would corrupt composite keys.
pub(crate) fn ensure_key_safe(what: &str, value: &str) -> StoreResult<()> {
	if value.is_empty() {
		return Err(StoreError::validation(format!("{what} must not be empty")));
	}
	if value.contains(KEY_DELIMITER) {
		return Err(StoreError::validation(format!(
			"{what} '{value}' must not contain '{KEY_DELIMITER}'"
		)));
	}
	Ok(())
}

/// Enforces the batch bound and collapses duplicates, keeping first-seen order.
pub(crate) fn batch_keys(flag_keys: &[String]) -> StoreResult<Vec<&str>> {
	let mut unique: Vec<&str> = Vec::with_capacity(flag_keys.len());
	for key in flag_keys {
		if !unique.contains(&key.as_str()) {
			unique.push(key.as_str());
		}
	}
	if unique.len() > MAX_BATCH_GET_KEYS {
		return Err(StoreError::validation(format!(
			"batch_get_flags accepts at most {MAX_BATCH_GET_KEYS} keys, got {}",
			unique.len()
		)));
	}
	for key in &unique {
		ensure_key_safe("flag key", key)?;
	}
	Ok(unique)
}
