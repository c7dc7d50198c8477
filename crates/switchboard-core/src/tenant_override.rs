// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Environment;

/// Per-tenant decision layered above a flag's default.
///
/// Keyed by (environment, tenant, flag). Setting one is an upsert and it
/// never expires on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantOverride {
	pub environment: Environment,
	pub tenant_id: String,
	pub flag_key: String,
	pub enabled: bool,
	/// Optional variant pinned for this tenant.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub variant: Option<String>,
	pub updated_at: DateTime<Utc>,
	pub updated_by: String,
}

impl TenantOverride {
	pub fn new(
		environment: Environment,
		tenant_id: impl Into<String>,
		flag_key: impl Into<String>,
		enabled: bool,
		updated_by: impl Into<String>,
	) -> Self {
		Self {
			environment,
			tenant_id: tenant_id.into(),
			flag_key: flag_key.into(),
			enabled,
			variant: None,
			updated_at: Utc::now(),
			updated_by: updated_by.into(),
		}
	}

	pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
		self.variant = Some(variant.into());
		self
	}
}
