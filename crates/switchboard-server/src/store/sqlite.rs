// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use switchboard_config::EnvironmentsConfig;
use switchboard_core::{
	EmergencyControl, Environment, ErrorKind, FlagDefinition, FlagUpdate, KillSwitchScope,
	StoreError, StoreResult, TenantOverride,
};
use tracing::{debug, instrument};

use super::keys;
use super::schema::run_migrations;
use super::{batch_keys, ensure_key_safe, FlagStore};

const FLAG_COLUMNS: &str = "environment, flag_key, description, default_enabled, owner, \
	default_variant, created_at, updated_at, expires_at";

/// Reduces a sqlx failure to the store taxonomy.
pub fn classify_sqlx_error(err: &sqlx::Error) -> ErrorKind {
	match err {
		sqlx::Error::RowNotFound => ErrorKind::NotFound,
		sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
			ErrorKind::ServiceUnavailable
		}
		sqlx::Error::Io(_) => ErrorKind::ServiceUnavailable,
		sqlx::Error::Configuration(_) => ErrorKind::Validation,
		sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => ErrorKind::Unknown,
		sqlx::Error::Database(db_err) => {
			if db_err.is_unique_violation() {
				return ErrorKind::ConditionalCheckFailed;
			}
			if db_err.is_check_violation()
				|| db_err.is_foreign_key_violation()
				|| db_err.kind() == sqlx::error::ErrorKind::NotNullViolation
			{
				return ErrorKind::Validation;
			}
			let primary_code = db_err
				.code()
				.and_then(|c| c.parse::<i32>().ok())
				.map(|c| c & 0xff);
			match primary_code {
				// SQLITE_BUSY, SQLITE_LOCKED
				Some(5) | Some(6) => ErrorKind::ResourceOrTableInUse,
				// SQLITE_FULL, SQLITE_TOOBIG
				Some(13) | Some(18) => ErrorKind::LimitExceeded,
				// SQLITE_PERM, SQLITE_READONLY, SQLITE_AUTH
				Some(3) | Some(8) | Some(23) => ErrorKind::AccessDenied,
				// SQLITE_IOERR, SQLITE_CANTOPEN
				Some(10) | Some(14) => ErrorKind::ServiceUnavailable,
				// SQLITE_CORRUPT, SQLITE_NOTADB
				Some(11) | Some(26) => ErrorKind::InternalServiceError,
				_ => ErrorKind::Unknown,
			}
		}
		_ => ErrorKind::Unknown,
	}
}

fn store_error(operation: &str, err: sqlx::Error) -> StoreError {
	let kind = classify_sqlx_error(&err);
	StoreError::new(kind, format!("{operation}: {err}")).with_source(err)
}

fn parse_timestamp(column: &str, value: &str) -> StoreResult<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| StoreError::new(ErrorKind::Unknown, format!("invalid {column} '{value}'")).with_source(e))
}

fn parse_environment(value: &str) -> StoreResult<Environment> {
	value
		.parse()
		.map_err(|e| StoreError::new(ErrorKind::Unknown, "invalid environment column").with_source(e))
}

#[derive(sqlx::FromRow)]
struct FlagRow {
	environment: String,
	flag_key: String,
	description: String,
	default_enabled: bool,
	owner: String,
	default_variant: Option<String>,
	created_at: String,
	updated_at: String,
	expires_at: Option<String>,
}

impl TryFrom<FlagRow> for FlagDefinition {
	type Error = StoreError;

	fn try_from(row: FlagRow) -> StoreResult<Self> {
		Ok(FlagDefinition {
			environment: parse_environment(&row.environment)?,
			flag_key: row.flag_key,
			description: row.description,
			default_enabled: row.default_enabled,
			owner: row.owner,
			default_variant: row.default_variant,
			created_at: parse_timestamp("created_at", &row.created_at)?,
			updated_at: parse_timestamp("updated_at", &row.updated_at)?,
			expires_at: row
				.expires_at
				.as_deref()
				.map(|v| parse_timestamp("expires_at", v))
				.transpose()?,
		})
	}
}

#[derive(sqlx::FromRow)]
struct OverrideRow {
	environment: String,
	tenant_id: String,
	flag_key: String,
	enabled: bool,
	variant: Option<String>,
	updated_at: String,
	updated_by: String,
}

impl TryFrom<OverrideRow> for TenantOverride {
	type Error = StoreError;

	fn try_from(row: OverrideRow) -> StoreResult<Self> {
		Ok(TenantOverride {
			environment: parse_environment(&row.environment)?,
			tenant_id: row.tenant_id,
			flag_key: row.flag_key,
			enabled: row.enabled,
			variant: row.variant,
			updated_at: parse_timestamp("updated_at", &row.updated_at)?,
			updated_by: row.updated_by,
		})
	}
}

#[derive(sqlx::FromRow)]
struct EmergencyRow {
	environment: String,
	scope: String,
	enabled: bool,
	reason: String,
	activated_at: String,
	activated_by: String,
}

impl TryFrom<EmergencyRow> for EmergencyControl {
	type Error = StoreError;

	fn try_from(row: EmergencyRow) -> StoreResult<Self> {
		let scope = keys::parse_kill_switch_sort_key(&row.scope).ok_or_else(|| {
			StoreError::new(ErrorKind::Unknown, format!("invalid scope '{}'", row.scope))
		})?;
		Ok(EmergencyControl {
			environment: parse_environment(&row.environment)?,
			scope,
			enabled: row.enabled,
			reason: row.reason,
			activated_at: parse_timestamp("activated_at", &row.activated_at)?,
			activated_by: row.activated_by,
		})
	}
}

fn into_flags(rows: Vec<FlagRow>) -> StoreResult<Vec<FlagDefinition>> {
	rows.into_iter().map(TryInto::try_into).collect()
}

/// Flag store on SQLite.
///
/// Derived views are real SQL indexes; see `run_migrations`.
#[derive(Clone)]
pub struct SqliteFlagStore {
	pool: SqlitePool,
	environments: EnvironmentsConfig,
}

impl SqliteFlagStore {
	pub fn new(pool: SqlitePool, environments: EnvironmentsConfig) -> Self {
		Self { pool, environments }
	}

	/// Opens a pool for `database_url` and applies migrations.
	pub async fn connect(
		database_url: &str,
		environments: EnvironmentsConfig,
	) -> StoreResult<Self> {
		let options = SqliteConnectOptions::from_str(database_url)
			.map_err(|e| store_error("connect", e))?
			.create_if_missing(true);

		// Each connection to an in-memory database is a separate database.
		let max_connections = if database_url.contains(":memory:") {
			1
		} else {
			5
		};

		let pool = SqlitePoolOptions::new()
			.max_connections(max_connections)
			.connect_with(options)
			.await
			.map_err(|e| store_error("connect", e))?;

		run_migrations(&pool)
			.await
			.map_err(|e| store_error("run_migrations", e))?;

		Ok(Self::new(pool, environments))
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	fn namespace(&self, environment: Environment) -> &str {
		&self.environments.get(environment).namespace
	}
}

#[async_trait]
impl FlagStore for SqliteFlagStore {
	#[instrument(skip(self), fields(environment = %environment))]
	async fn get_flag(
		&self,
		environment: Environment,
		flag_key: &str,
	) -> StoreResult<Option<FlagDefinition>> {
		ensure_key_safe("flag key", flag_key)?;
		let row = sqlx::query_as::<_, FlagRow>(&format!(
			"SELECT {FLAG_COLUMNS} FROM flag_definitions WHERE namespace = ? AND flag_key = ?"
		))
		.bind(self.namespace(environment))
		.bind(flag_key)
		.fetch_optional(&self.pool)
		.await
		.map_err(|e| store_error("get_flag", e))?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self, flag), fields(environment = %flag.environment, flag_key = %flag.flag_key))]
	async fn put_flag(&self, flag: &FlagDefinition) -> StoreResult<()> {
		ensure_key_safe("flag key", &flag.flag_key)?;
		ensure_key_safe("owner", &flag.owner)?;

		sqlx::query(
			r#"
			INSERT INTO flag_definitions (namespace, environment, flag_key, description,
										  default_enabled, owner, default_variant,
										  created_at, updated_at, expires_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(self.namespace(flag.environment))
		.bind(flag.environment.as_str())
		.bind(&flag.flag_key)
		.bind(&flag.description)
		.bind(flag.default_enabled)
		.bind(&flag.owner)
		.bind(&flag.default_variant)
		.bind(keys::timestamp(flag.created_at))
		.bind(keys::timestamp(flag.updated_at))
		.bind(flag.expires_at.map(keys::timestamp))
		.execute(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				StoreError::conditional_check_failed(format!(
					"flag '{}' already exists in {}",
					flag.flag_key, flag.environment
				))
				.with_source(e)
			}
			_ => store_error("put_flag", e),
		})?;

		Ok(())
	}

	#[instrument(skip(self, update), fields(environment = %environment))]
	async fn update_flag(
		&self,
		environment: Environment,
		flag_key: &str,
		update: &FlagUpdate,
	) -> StoreResult<FlagDefinition> {
		ensure_key_safe("flag key", flag_key)?;
		if let Some(owner) = &update.owner {
			ensure_key_safe("owner", owner)?;
		}

		// One statement, so a concurrent update can never be lost between a
		// read and a write.
		let row = sqlx::query_as::<_, FlagRow>(&format!(
			r#"
			UPDATE flag_definitions SET
				description = COALESCE(?, description),
				default_enabled = COALESCE(?, default_enabled),
				owner = COALESCE(?, owner),
				default_variant = CASE WHEN ? THEN ? ELSE default_variant END,
				expires_at = CASE WHEN ? THEN ? ELSE expires_at END,
				updated_at = ?
			WHERE namespace = ? AND flag_key = ?
			RETURNING {FLAG_COLUMNS}
			"#
		))
		.bind(&update.description)
		.bind(update.default_enabled)
		.bind(&update.owner)
		.bind(update.default_variant.is_some())
		.bind(update.default_variant.clone().flatten())
		.bind(update.expires_at.is_some())
		.bind(update.expires_at.flatten().map(keys::timestamp))
		.bind(keys::timestamp(Utc::now()))
		.bind(self.namespace(environment))
		.bind(flag_key)
		.fetch_optional(&self.pool)
		.await
		.map_err(|e| store_error("update_flag", e))?;

		match row {
			Some(row) => row.try_into(),
			None => Err(StoreError::not_found(format!(
				"flag '{flag_key}' does not exist in {environment}"
			))),
		}
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn list_flags(&self, environment: Environment) -> StoreResult<Vec<FlagDefinition>> {
		let rows = sqlx::query_as::<_, FlagRow>(&format!(
			r#"
			SELECT {FLAG_COLUMNS} FROM flag_definitions
			WHERE namespace = ?
			ORDER BY created_at DESC, flag_key DESC
			"#
		))
		.bind(self.namespace(environment))
		.fetch_all(&self.pool)
		.await
		.map_err(|e| store_error("list_flags", e))?;

		into_flags(rows)
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn list_flags_by_owner(
		&self,
		environment: Environment,
		owner: &str,
	) -> StoreResult<Vec<FlagDefinition>> {
		ensure_key_safe("owner", owner)?;
		let rows = sqlx::query_as::<_, FlagRow>(&format!(
			r#"
			SELECT {FLAG_COLUMNS} FROM flag_definitions
			WHERE namespace = ? AND owner = ?
			ORDER BY flag_key ASC
			"#
		))
		.bind(self.namespace(environment))
		.bind(owner)
		.fetch_all(&self.pool)
		.await
		.map_err(|e| store_error("list_flags_by_owner", e))?;

		into_flags(rows)
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn list_flags_by_expiry(
		&self,
		environment: Environment,
		expiring_before: Option<DateTime<Utc>>,
	) -> StoreResult<Vec<FlagDefinition>> {
		let cutoff = expiring_before.map(keys::timestamp);
		let rows = sqlx::query_as::<_, FlagRow>(&format!(
			r#"
			SELECT {FLAG_COLUMNS} FROM flag_definitions
			WHERE namespace = ? AND expires_at IS NOT NULL
			  AND (? IS NULL OR expires_at < ?)
			ORDER BY expires_at ASC, flag_key ASC
			"#
		))
		.bind(self.namespace(environment))
		.bind(&cutoff)
		.bind(&cutoff)
		.fetch_all(&self.pool)
		.await
		.map_err(|e| store_error("list_flags_by_expiry", e))?;

		into_flags(rows)
	}

	#[instrument(skip(self))]
	async fn find_flag_environments(&self, flag_key: &str) -> StoreResult<Vec<Environment>> {
		ensure_key_safe("flag key", flag_key)?;
		let namespaces: Vec<(String,)> = sqlx::query_as(
			"SELECT namespace FROM flag_definitions WHERE flag_key = ? ORDER BY namespace",
		)
		.bind(flag_key)
		.fetch_all(&self.pool)
		.await
		.map_err(|e| store_error("find_flag_environments", e))?;

		// Namespaces belonging to other deployments on the same database are ignored.
		let mut found: Vec<Environment> = namespaces
			.iter()
			.filter_map(|(ns,)| self.environments.environment_for_namespace(ns))
			.collect();
		found.sort();
		Ok(found)
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn list_flags_with_full_scan(
		&self,
		environment: Environment,
	) -> StoreResult<Vec<FlagDefinition>> {
		let rows = sqlx::query_as::<_, FlagRow>(&format!(
			r#"
			SELECT {FLAG_COLUMNS} FROM flag_definitions NOT INDEXED
			WHERE namespace = ?
			ORDER BY created_at DESC, flag_key DESC
			"#
		))
		.bind(self.namespace(environment))
		.fetch_all(&self.pool)
		.await
		.map_err(|e| store_error("list_flags_with_full_scan", e))?;

		debug!(count = rows.len(), "full scan of flag records");
		into_flags(rows)
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn get_tenant_override(
		&self,
		environment: Environment,
		tenant_id: &str,
		flag_key: &str,
	) -> StoreResult<Option<TenantOverride>> {
		ensure_key_safe("tenant id", tenant_id)?;
		ensure_key_safe("flag key", flag_key)?;
		let row = sqlx::query_as::<_, OverrideRow>(
			r#"
			SELECT environment, tenant_id, flag_key, enabled, variant, updated_at, updated_by
			FROM tenant_overrides
			WHERE namespace = ? AND tenant_id = ? AND flag_key = ?
			"#,
		)
		.bind(self.namespace(environment))
		.bind(tenant_id)
		.bind(flag_key)
		.fetch_optional(&self.pool)
		.await
		.map_err(|e| store_error("get_tenant_override", e))?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self, tenant_override), fields(
		environment = %tenant_override.environment,
		tenant_id = %tenant_override.tenant_id,
		flag_key = %tenant_override.flag_key,
	))]
	async fn set_tenant_override(&self, tenant_override: &TenantOverride) -> StoreResult<()> {
		ensure_key_safe("tenant id", &tenant_override.tenant_id)?;
		ensure_key_safe("flag key", &tenant_override.flag_key)?;

		sqlx::query(
			r#"
			INSERT INTO tenant_overrides (namespace, tenant_id, flag_key, environment, enabled,
										  variant, updated_at, updated_by)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT (namespace, tenant_id, flag_key) DO UPDATE SET
				enabled = excluded.enabled,
				variant = excluded.variant,
				updated_at = excluded.updated_at,
				updated_by = excluded.updated_by
			"#,
		)
		.bind(self.namespace(tenant_override.environment))
		.bind(&tenant_override.tenant_id)
		.bind(&tenant_override.flag_key)
		.bind(tenant_override.environment.as_str())
		.bind(tenant_override.enabled)
		.bind(&tenant_override.variant)
		.bind(keys::timestamp(tenant_override.updated_at))
		.bind(&tenant_override.updated_by)
		.execute(&self.pool)
		.await
		.map_err(|e| store_error("set_tenant_override", e))?;

		Ok(())
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn list_tenant_overrides(
		&self,
		environment: Environment,
		tenant_id: &str,
	) -> StoreResult<Vec<TenantOverride>> {
		ensure_key_safe("tenant id", tenant_id)?;
		let rows = sqlx::query_as::<_, OverrideRow>(
			r#"
			SELECT environment, tenant_id, flag_key, enabled, variant, updated_at, updated_by
			FROM tenant_overrides
			WHERE namespace = ? AND tenant_id = ?
			ORDER BY flag_key ASC
			"#,
		)
		.bind(self.namespace(environment))
		.bind(tenant_id)
		.fetch_all(&self.pool)
		.await
		.map_err(|e| store_error("list_tenant_overrides", e))?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self), fields(environment = %environment, scope = %scope))]
	async fn get_kill_switch(
		&self,
		environment: Environment,
		scope: &KillSwitchScope,
	) -> StoreResult<Option<EmergencyControl>> {
		if let Some(flag_key) = scope.flag_key() {
			ensure_key_safe("flag key", flag_key)?;
		}
		let row = sqlx::query_as::<_, EmergencyRow>(
			r#"
			SELECT environment, scope, enabled, reason, activated_at, activated_by
			FROM emergency_controls
			WHERE namespace = ? AND scope = ?
			"#,
		)
		.bind(self.namespace(environment))
		.bind(keys::kill_switch_sort_key(scope))
		.fetch_optional(&self.pool)
		.await
		.map_err(|e| store_error("get_kill_switch", e))?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self, control), fields(environment = %control.environment, scope = %control.scope))]
	async fn set_kill_switch(&self, control: &EmergencyControl) -> StoreResult<()> {
		if let Some(flag_key) = control.scope.flag_key() {
			ensure_key_safe("flag key", flag_key)?;
		}

		sqlx::query(
			r#"
			INSERT OR REPLACE INTO emergency_controls (namespace, scope, environment, enabled,
													   reason, activated_at, activated_by)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(self.namespace(control.environment))
		.bind(keys::kill_switch_sort_key(&control.scope))
		.bind(control.environment.as_str())
		.bind(control.enabled)
		.bind(&control.reason)
		.bind(keys::timestamp(control.activated_at))
		.bind(&control.activated_by)
		.execute(&self.pool)
		.await
		.map_err(|e| store_error("set_kill_switch", e))?;

		Ok(())
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn list_kill_switches(
		&self,
		environment: Environment,
	) -> StoreResult<Vec<EmergencyControl>> {
		let rows = sqlx::query_as::<_, EmergencyRow>(
			r#"
			SELECT environment, scope, enabled, reason, activated_at, activated_by
			FROM emergency_controls
			WHERE namespace = ?
			ORDER BY scope ASC
			"#,
		)
		.bind(self.namespace(environment))
		.fetch_all(&self.pool)
		.await
		.map_err(|e| store_error("list_kill_switches", e))?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self, flag_keys), fields(environment = %environment, count = flag_keys.len()))]
	async fn batch_get_flags(
		&self,
		environment: Environment,
		flag_keys: &[String],
	) -> StoreResult<Vec<FlagDefinition>> {
		let wanted = batch_keys(flag_keys)?;
		if wanted.is_empty() {
			return Ok(Vec::new());
		}

		let placeholders = vec!["?"; wanted.len()].join(", ");
		let sql = format!(
			"SELECT {FLAG_COLUMNS} FROM flag_definitions WHERE namespace = ? AND flag_key IN ({placeholders})"
		);
		let mut query = sqlx::query_as::<_, FlagRow>(&sql).bind(self.namespace(environment));
		for key in &wanted {
			query = query.bind(*key);
		}
		let rows = query
			.fetch_all(&self.pool)
			.await
			.map_err(|e| store_error("batch_get_flags", e))?;

		// Return in request order.
		let mut flags = into_flags(rows)?;
		flags.sort_by_key(|f| wanted.iter().position(|k| *k == f.flag_key));
		Ok(flags)
	}

	async fn health_check(&self) -> StoreResult<()> {
		sqlx::query("SELECT 1")
			.execute(&self.pool)
			.await
			.map_err(|e| store_error("health_check", e))?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use switchboard_core::NewFlag;

	async fn store() -> SqliteFlagStore {
		SqliteFlagStore::connect("sqlite::memory:", EnvironmentsConfig::default())
			.await
			.expect("Failed to create test store")
	}

	fn definition(key: &str, env: Environment) -> FlagDefinition {
		NewFlag::new(key, true, "growth").into_definition(env, Utc::now())
	}

	#[tokio::test]
	async fn test_create_then_get() {
		let store = store().await;
		let flag = NewFlag::new("advanced_analytics", true, "analytics-team")
			.with_description("Deep dive dashboards")
			.with_default_variant("v2")
			.into_definition(Environment::Production, Utc::now());
		store.put_flag(&flag).await.unwrap();

		let stored = store
			.get_flag(Environment::Production, "advanced_analytics")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(stored.description, "Deep dive dashboards");
		assert_eq!(stored.default_variant.as_deref(), Some("v2"));
		assert!(stored.default_enabled);
		assert_eq!(
			stored.created_at.timestamp_millis(),
			flag.created_at.timestamp_millis()
		);
	}

	#[tokio::test]
	async fn test_duplicate_create_is_conditional_check_failed() {
		let store = store().await;
		store
			.put_flag(&definition("beta", Environment::Production))
			.await
			.unwrap();

		let mut again = definition("beta", Environment::Production);
		again.default_enabled = false;
		let err = store.put_flag(&again).await.unwrap_err();
		assert_eq!(err.kind, ErrorKind::ConditionalCheckFailed);

		let stored = store
			.get_flag(Environment::Production, "beta")
			.await
			.unwrap()
			.unwrap();
		assert!(stored.default_enabled);
	}

	#[tokio::test]
	async fn test_same_key_in_two_environments() {
		let store = store().await;
		store
			.put_flag(&definition("beta", Environment::Production))
			.await
			.unwrap();
		store
			.put_flag(&definition("beta", Environment::Development))
			.await
			.unwrap();
		assert_eq!(
			store.find_flag_environments("beta").await.unwrap(),
			vec![Environment::Development, Environment::Production]
		);
	}

	#[tokio::test]
	async fn test_update_merges_fields() {
		let store = store().await;
		let now = Utc::now();
		let flag = NewFlag::new("beta", false, "growth")
			.with_description("original")
			.with_expires_at(now + Duration::days(3))
			.into_definition(Environment::Staging, now);
		store.put_flag(&flag).await.unwrap();

		let updated = store
			.update_flag(
				Environment::Staging,
				"beta",
				&FlagUpdate::default()
					.default_enabled(true)
					.expires_at(None),
			)
			.await
			.unwrap();
		assert!(updated.default_enabled);
		assert_eq!(updated.description, "original");
		assert_eq!(updated.owner, "growth");
		assert!(updated.expires_at.is_none());
		assert!(updated.updated_at >= flag.updated_at);
	}

	#[tokio::test]
	async fn test_update_missing_is_not_found() {
		let err = store()
			.await
			.update_flag(
				Environment::Production,
				"ghost",
				&FlagUpdate::default().default_enabled(true),
			)
			.await
			.unwrap_err();
		assert_eq!(err.kind, ErrorKind::NotFound);
	}

	#[tokio::test]
	async fn test_listing_views() {
		let store = store().await;
		let now = Utc::now();
		let env = Environment::Production;
		let flags = [
			NewFlag::new("alpha", true, "growth")
				.with_expires_at(now + Duration::days(10))
				.into_definition(env, now - Duration::minutes(3)),
			NewFlag::new("beta", true, "platform")
				.with_expires_at(now + Duration::days(1))
				.into_definition(env, now - Duration::minutes(2)),
			NewFlag::new("gamma", true, "growth").into_definition(env, now - Duration::minutes(1)),
		];
		for flag in &flags {
			store.put_flag(flag).await.unwrap();
		}

		let recent: Vec<_> = store
			.list_flags(env)
			.await
			.unwrap()
			.into_iter()
			.map(|f| f.flag_key)
			.collect();
		assert_eq!(recent, vec!["gamma", "beta", "alpha"]);

		let scanned: Vec<_> = store
			.list_flags_with_full_scan(env)
			.await
			.unwrap()
			.into_iter()
			.map(|f| f.flag_key)
			.collect();
		assert_eq!(scanned, recent);

		let growth: Vec<_> = store
			.list_flags_by_owner(env, "growth")
			.await
			.unwrap()
			.into_iter()
			.map(|f| f.flag_key)
			.collect();
		assert_eq!(growth, vec!["alpha", "gamma"]);

		let expiring: Vec<_> = store
			.list_flags_by_expiry(env, None)
			.await
			.unwrap()
			.into_iter()
			.map(|f| f.flag_key)
			.collect();
		assert_eq!(expiring, vec!["beta", "alpha"]);

		let this_week = store
			.list_flags_by_expiry(env, Some(now + Duration::days(7)))
			.await
			.unwrap();
		assert_eq!(this_week.len(), 1);
		assert_eq!(this_week[0].flag_key, "beta");
	}

	#[tokio::test]
	async fn test_override_upsert() {
		let store = store().await;
		let env = Environment::Production;
		store
			.set_tenant_override(&TenantOverride::new(env, "startup-inc", "beta", true, "admin"))
			.await
			.unwrap();
		store
			.set_tenant_override(
				&TenantOverride::new(env, "startup-inc", "beta", false, "release").with_variant("b"),
			)
			.await
			.unwrap();

		let o = store
			.get_tenant_override(env, "startup-inc", "beta")
			.await
			.unwrap()
			.unwrap();
		assert!(!o.enabled);
		assert_eq!(o.updated_by, "release");
		assert_eq!(o.variant.as_deref(), Some("b"));
		assert_eq!(
			store
				.list_tenant_overrides(env, "startup-inc")
				.await
				.unwrap()
				.len(),
			1
		);
		assert!(store
			.get_tenant_override(Environment::Staging, "startup-inc", "beta")
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn test_kill_switch_overwrite() {
		let store = store().await;
		let env = Environment::Production;
		store
			.set_kill_switch(&EmergencyControl::activate(
				env,
				KillSwitchScope::flag("beta"),
				"errors",
				"oncall",
			))
			.await
			.unwrap();
		store
			.set_kill_switch(&EmergencyControl::deactivate(
				env,
				KillSwitchScope::flag("beta"),
				"fixed",
				"oncall",
			))
			.await
			.unwrap();

		let control = store
			.get_kill_switch(env, &KillSwitchScope::flag("beta"))
			.await
			.unwrap()
			.unwrap();
		assert!(!control.is_active());
		assert_eq!(control.scope, KillSwitchScope::flag("beta"));
		assert_eq!(store.list_kill_switches(env).await.unwrap().len(), 1);
		assert!(store
			.get_kill_switch(env, &KillSwitchScope::Global)
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn test_batch_get() {
		let store = store().await;
		for key in ["alpha", "beta", "gamma"] {
			store
				.put_flag(&definition(key, Environment::Production))
				.await
				.unwrap();
		}
		let keys: Vec<String> = ["gamma", "ghost", "alpha", "gamma"]
			.iter()
			.map(|s| s.to_string())
			.collect();
		let found: Vec<_> = store
			.batch_get_flags(Environment::Production, &keys)
			.await
			.unwrap()
			.into_iter()
			.map(|f| f.flag_key)
			.collect();
		assert_eq!(found, vec!["gamma", "alpha"]);

		let too_many: Vec<String> = (0..51).map(|i| format!("flag_{i}")).collect();
		let err = store
			.batch_get_flags(Environment::Production, &too_many)
			.await
			.unwrap_err();
		assert_eq!(err.kind, ErrorKind::Validation);
	}

	#[tokio::test]
	async fn test_health_check_and_closed_pool() {
		let store = store().await;
		store.health_check().await.unwrap();

		store.pool().close().await;
		let err = store.health_check().await.unwrap_err();
		assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
		assert!(err.is_retryable());
	}

	#[tokio::test]
	async fn test_file_database_survives_reconnect() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite://{}", dir.path().join("flags.db").display());

		let store = SqliteFlagStore::connect(&url, EnvironmentsConfig::default())
			.await
			.unwrap();
		store
			.put_flag(&definition("beta", Environment::Staging))
			.await
			.unwrap();
		store.pool().close().await;

		let reopened = SqliteFlagStore::connect(&url, EnvironmentsConfig::default())
			.await
			.unwrap();
		let flag = reopened
			.get_flag(Environment::Staging, "beta")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(flag.owner, "growth");
		assert!(reopened
			.get_flag(Environment::Production, "beta")
			.await
			.unwrap()
			.is_none());
	}

	#[test]
	fn test_classify_basic_errors() {
		assert_eq!(
			classify_sqlx_error(&sqlx::Error::RowNotFound),
			ErrorKind::NotFound
		);
		assert_eq!(
			classify_sqlx_error(&sqlx::Error::PoolTimedOut),
			ErrorKind::ServiceUnavailable
		);
		assert_eq!(
			classify_sqlx_error(&sqlx::Error::Io(std::io::Error::other("reset"))),
			ErrorKind::ServiceUnavailable
		);
	}
}
