// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ErrorKind;

/// Caller-supplied context for an evaluation. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
	pub tenant_id: String,
	/// Environment the caller believes it is talking to. Checked against the
	/// engine's environment before anything else happens.
	pub environment: String,
	/// Flag targeted by the upstream request, if the request was for one flag.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub flag_key: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_role: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub plan: Option<String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub metadata: BTreeMap<String, serde_json::Value>,
}

impl EvaluationContext {
	pub fn new(tenant_id: impl Into<String>, environment: impl Into<String>) -> Self {
		Self {
			tenant_id: tenant_id.into(),
			environment: environment.into(),
			..Default::default()
		}
	}

	pub fn with_flag_key(mut self, flag_key: impl Into<String>) -> Self {
		self.flag_key = Some(flag_key.into());
		self
	}

	pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
		self.user_id = Some(user_id.into());
		self
	}

	pub fn with_user_role(mut self, role: impl Into<String>) -> Self {
		self.user_role = Some(role.into());
		self
	}

	pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
		self.plan = Some(plan.into());
		self
	}

	pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
		self.metadata.insert(key.into(), value);
		self
	}
}

/// Which precedence rule produced a resolved value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionReason {
	GlobalKillSwitch,
	FlagKillSwitch,
	TenantOverride,
	FlagDefault,
	UnknownFlag,
	/// The store failed and the value was forced off.
	StoreError { kind: ErrorKind },
}

/// A resolved flag value together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
	pub flag_key: String,
	pub enabled: bool,
	pub variant: Option<String>,
	pub reason: ResolutionReason,
}

impl Resolution {
	pub fn disabled(flag_key: impl Into<String>, reason: ResolutionReason) -> Self {
		Self {
			flag_key: flag_key.into(),
			enabled: false,
			variant: None,
			reason,
		}
	}

	pub fn is_fail_closed(&self) -> bool {
		matches!(self.reason, ResolutionReason::StoreError { .. })
	}
}
