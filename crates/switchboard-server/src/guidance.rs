// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operator-facing guidance for failed administrative operations.

use switchboard_core::{Environment, ErrorKind};

/// What was being attempted when the failure happened.
#[derive(Debug, Clone, Copy)]
pub struct GuidanceContext<'a> {
	pub operation: &'a str,
	pub environment: Environment,
	pub namespace: &'a str,
	pub flag_key: Option<&'a str>,
	pub tenant_id: Option<&'a str>,
}

impl<'a> GuidanceContext<'a> {
	pub fn new(operation: &'a str, environment: Environment, namespace: &'a str) -> Self {
		Self {
			operation,
			environment,
			namespace,
			flag_key: None,
			tenant_id: None,
		}
	}

	pub fn with_flag(mut self, flag_key: &'a str) -> Self {
		self.flag_key = Some(flag_key);
		self
	}

	pub fn with_tenant(mut self, tenant_id: &'a str) -> Self {
		self.tenant_id = Some(tenant_id);
		self
	}

	fn target(&self) -> String {
		match (self.flag_key, self.tenant_id) {
			(Some(flag), Some(tenant)) => format!("flag '{flag}' for tenant '{tenant}'"),
			(Some(flag), None) => format!("flag '{flag}'"),
			(None, Some(tenant)) => format!("tenant '{tenant}'"),
			(None, None) => "the request".to_string(),
		}
	}
}

/// Renders an actionable message for a failure of the given kind.
pub fn operational_message(kind: ErrorKind, ctx: &GuidanceContext<'_>) -> String {
	let op = ctx.operation;
	let env = ctx.environment;
	let ns = ctx.namespace;
	let target = ctx.target();

	match kind {
		ErrorKind::NotFound => format!(
			"{op}: {target} does not exist in {env}. Verify namespace '{ns}' exists and the key is spelled correctly; create the flag first if it is new."
		),
		ErrorKind::Validation => format!(
			"{op}: {target} was rejected as invalid. Check identifiers (flag keys 3-100 chars of [a-z0-9_.-], no '#') and batch sizes before retrying."
		),
		ErrorKind::ConditionalCheckFailed => format!(
			"{op}: {target} changed or already exists in {env}. Read the current record and reapply the change instead of retrying blindly."
		),
		ErrorKind::AccessDenied => format!(
			"{op}: access to namespace '{ns}' was denied. Check the access policy and credentials used for {env}."
		),
		ErrorKind::Throttled => format!(
			"{op}: the flag store is throttling requests for namespace '{ns}'. Retry with exponential backoff or reduce request rate."
		),
		ErrorKind::ResourceOrTableInUse => format!(
			"{op}: the backing table for namespace '{ns}' is busy or being modified. Wait for the operation in progress to finish, then retry."
		),
		ErrorKind::LimitExceeded => format!(
			"{op}: a store limit was exceeded for namespace '{ns}'. Split the request or raise the limit for {env}."
		),
		ErrorKind::InternalServiceError => format!(
			"{op}: the flag store reported an internal error. Retry with backoff; escalate if it persists for {env}."
		),
		ErrorKind::ServiceUnavailable => format!(
			"{op}: the flag store for {env} is unavailable or timed out. Check store health and connectivity, then retry with backoff."
		),
		ErrorKind::Unknown => format!(
			"{op}: an unclassified failure occurred on {target} in {env}. Inspect the error handler output for the underlying cause."
		),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_every_kind_has_guidance_naming_the_operation() {
		let ctx = GuidanceContext::new("update_flag", Environment::Production, "switchboard-production")
			.with_flag("beta");
		for kind in ErrorKind::ALL {
			let message = operational_message(kind, &ctx);
			assert!(message.starts_with("update_flag:"), "{kind}: {message}");
		}
	}

	#[test]
	fn test_not_found_mentions_namespace() {
		let ctx = GuidanceContext::new("update_flag", Environment::Staging, "flags-staging")
			.with_flag("new_checkout");
		let message = operational_message(ErrorKind::NotFound, &ctx);
		assert!(message.contains("Verify namespace 'flags-staging' exists"));
		assert!(message.contains("flag 'new_checkout'"));
	}

	#[test]
	fn test_access_denied_points_at_policy() {
		let ctx = GuidanceContext::new("set_kill_switch", Environment::Production, "ns");
		assert!(operational_message(ErrorKind::AccessDenied, &ctx).contains("access policy"));
	}

	#[test]
	fn test_retryable_kinds_suggest_backoff() {
		let ctx = GuidanceContext::new("create_flag", Environment::Development, "ns")
			.with_tenant("acme");
		for kind in ErrorKind::ALL.into_iter().filter(ErrorKind::is_retryable) {
			assert!(
				operational_message(kind, &ctx).contains("backoff"),
				"{kind} should suggest backoff"
			);
		}
	}
}
