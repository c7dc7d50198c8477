// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Environment, ErrorKind, StoreError};

/// Machine-readable record of a failure, handed to an error handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredError {
	pub operation: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tenant_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub flag_key: Option<String>,
	pub environment: Environment,
	pub error_type: ErrorKind,
	pub is_retryable: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status_code: Option<u16>,
	pub timestamp: DateTime<Utc>,
	#[serde(default)]
	pub context: Map<String, Value>,
}

impl StructuredError {
	pub fn new(
		operation: impl Into<String>,
		environment: Environment,
		kind: ErrorKind,
		message: impl Into<String>,
	) -> Self {
		let mut context = Map::new();
		context.insert("message".to_string(), Value::String(message.into()));
		Self {
			operation: operation.into(),
			tenant_id: None,
			flag_key: None,
			environment,
			error_type: kind,
			is_retryable: kind.is_retryable(),
			status_code: None,
			timestamp: Utc::now(),
			context,
		}
	}

	/// Builds a record from a classified store failure.
	pub fn from_store_error(
		operation: impl Into<String>,
		environment: Environment,
		error: &StoreError,
	) -> Self {
		let mut structured = Self::new(operation, environment, error.kind, error.message.clone());
		structured.status_code = error.status_code;
		if let Some(source) = &error.source {
			structured
				.context
				.insert("cause".to_string(), Value::String(source.to_string()));
		}
		structured
	}

	pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
		self.tenant_id = Some(tenant_id.into());
		self
	}

	pub fn with_flag(mut self, flag_key: impl Into<String>) -> Self {
		self.flag_key = Some(flag_key.into());
		self
	}

	pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.context.insert(key.into(), value.into());
		self
	}

	pub fn message(&self) -> Option<&str> {
		self.context.get("message").and_then(Value::as_str)
	}
}
