// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sinks for structured failure events.

use std::sync::{Arc, Mutex};

use switchboard_core::StructuredError;
use tracing::{error, warn};

/// Receives every classified failure the engine observes.
///
/// Implementations must not panic; the engine isolates panics anyway so a
/// faulty sink cannot fail an evaluation.
pub trait ErrorHandler: Send + Sync {
	fn handle(&self, error: &StructuredError);
}

impl<F> ErrorHandler for F
where
	F: Fn(&StructuredError) + Send + Sync,
{
	fn handle(&self, error: &StructuredError) {
		self(error)
	}
}

/// Default handler: one tracing event per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorHandler;

impl ErrorHandler for TracingErrorHandler {
	fn handle(&self, e: &StructuredError) {
		let context = serde_json::Value::Object(e.context.clone());
		if e.is_retryable {
			warn!(
				operation = %e.operation,
				tenant_id = e.tenant_id.as_deref(),
				flag_key = e.flag_key.as_deref(),
				environment = %e.environment,
				error_type = %e.error_type,
				is_retryable = e.is_retryable,
				status_code = e.status_code,
				timestamp = %e.timestamp.to_rfc3339(),
				context = %context,
				"flag store operation failed"
			);
		} else {
			error!(
				operation = %e.operation,
				tenant_id = e.tenant_id.as_deref(),
				flag_key = e.flag_key.as_deref(),
				environment = %e.environment,
				error_type = %e.error_type,
				is_retryable = e.is_retryable,
				status_code = e.status_code,
				timestamp = %e.timestamp.to_rfc3339(),
				context = %context,
				"flag store operation failed"
			);
		}
	}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentErrorHandler;

impl ErrorHandler for SilentErrorHandler {
	fn handle(&self, _error: &StructuredError) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingErrorHandler {
	events: Arc<Mutex<Vec<StructuredError>>>,
}

impl CollectingErrorHandler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<StructuredError> {
		match self.events.lock() {
			Ok(events) => events.clone(),
			Err(poisoned) => poisoned.into_inner().clone(),
		}
	}

	pub fn len(&self) -> usize {
		self.events().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&self) {
		match self.events.lock() {
			Ok(mut events) => events.clear(),
			Err(poisoned) => poisoned.into_inner().clear(),
		}
	}
}

impl ErrorHandler for CollectingErrorHandler {
	fn handle(&self, error: &StructuredError) {
		match self.events.lock() {
			Ok(mut events) => events.push(error.clone()),
			Err(poisoned) => poisoned.into_inner().push(error.clone()),
		}
	}
}
