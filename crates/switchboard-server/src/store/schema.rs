// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::SqlitePool;
use tracing::{debug, instrument};

/// Tables are keyed by namespace first so environments sharing a database
/// never collide. The four `idx_flag_*` indexes back the derived views:
/// recency, owner, expiry and cross-environment presence.
const MIGRATIONS: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS flag_definitions (
		namespace TEXT NOT NULL,
		flag_key TEXT NOT NULL,
		environment TEXT NOT NULL,
		description TEXT NOT NULL,
		default_enabled INTEGER NOT NULL,
		owner TEXT NOT NULL,
		default_variant TEXT,
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL,
		expires_at TEXT,
		PRIMARY KEY (namespace, flag_key)
	)
	"#,
	r#"
	CREATE INDEX IF NOT EXISTS idx_flag_recency
		ON flag_definitions (namespace, created_at DESC, flag_key DESC)
	"#,
	r#"
	CREATE INDEX IF NOT EXISTS idx_flag_owner
		ON flag_definitions (namespace, owner, flag_key)
	"#,
	r#"
	CREATE INDEX IF NOT EXISTS idx_flag_expiry
		ON flag_definitions (namespace, expires_at, flag_key)
		WHERE expires_at IS NOT NULL
	"#,
	r#"
	CREATE INDEX IF NOT EXISTS idx_flag_key_namespace
		ON flag_definitions (flag_key, namespace)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS tenant_overrides (
		namespace TEXT NOT NULL,
		tenant_id TEXT NOT NULL,
		flag_key TEXT NOT NULL,
		environment TEXT NOT NULL,
		enabled INTEGER NOT NULL,
		variant TEXT,
		updated_at TEXT NOT NULL,
		updated_by TEXT NOT NULL,
		PRIMARY KEY (namespace, tenant_id, flag_key)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS emergency_controls (
		namespace TEXT NOT NULL,
		scope TEXT NOT NULL,
		environment TEXT NOT NULL,
		enabled INTEGER NOT NULL,
		reason TEXT NOT NULL,
		activated_at TEXT NOT NULL,
		activated_by TEXT NOT NULL,
		PRIMARY KEY (namespace, scope)
	)
	"#,
];

/// Creates the flag tables and indexes. Safe to run repeatedly.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
	for statement in MIGRATIONS {
		sqlx::query(statement).execute(pool).await?;
	}
	debug!(statements = MIGRATIONS.len(), "flag store schema up to date");
	Ok(())
}
