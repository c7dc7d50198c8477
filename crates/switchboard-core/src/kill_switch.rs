// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Environment;

/// What an emergency control shuts off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "flagKey", rename_all = "camelCase")]
pub enum KillSwitchScope {
	/// Every flag in the environment.
	Global,
	/// A single flag.
	Flag(String),
}

impl KillSwitchScope {
	pub fn flag(flag_key: impl Into<String>) -> Self {
		KillSwitchScope::Flag(flag_key.into())
	}

	pub fn flag_key(&self) -> Option<&str> {
		match self {
			KillSwitchScope::Global => None,
			KillSwitchScope::Flag(key) => Some(key),
		}
	}

	pub fn is_global(&self) -> bool {
		matches!(self, KillSwitchScope::Global)
	}
}

impl fmt::Display for KillSwitchScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			KillSwitchScope::Global => f.write_str("global"),
			KillSwitchScope::Flag(key) => write!(f, "flag:{key}"),
		}
	}
}

/// Emergency shutoff. Writes are last-writer-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyControl {
	pub environment: Environment,
	pub scope: KillSwitchScope,
	/// true = the kill switch is engaged and forces its flags off
	pub enabled: bool,
	pub reason: String,
	pub activated_at: DateTime<Utc>,
	pub activated_by: String,
}

impl EmergencyControl {
	/// An engaged kill switch.
	pub fn activate(
		environment: Environment,
		scope: KillSwitchScope,
		reason: impl Into<String>,
		activated_by: impl Into<String>,
	) -> Self {
		Self {
			environment,
			scope,
			enabled: true,
			reason: reason.into(),
			activated_at: Utc::now(),
			activated_by: activated_by.into(),
		}
	}

	/// A released kill switch. The record is kept so the last change stays auditable.
	pub fn deactivate(
		environment: Environment,
		scope: KillSwitchScope,
		reason: impl Into<String>,
		deactivated_by: impl Into<String>,
	) -> Self {
		Self {
			enabled: false,
			..Self::activate(environment, scope, reason, deactivated_by)
		}
	}

	pub fn is_active(&self) -> bool {
		self.enabled
	}

	/// Checks if this control forces the given flag off.
	pub fn affects_flag(&self, flag_key: &str) -> bool {
		self.enabled
			&& match &self.scope {
				KillSwitchScope::Global => true,
				KillSwitchScope::Flag(key) => key == flag_key,
			}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_global_affects_every_flag() {
		let ks = EmergencyControl::activate(
			Environment::Production,
			KillSwitchScope::Global,
			"incident 42",
			"oncall",
		);
		assert!(ks.is_active());
		assert!(ks.affects_flag("advanced_analytics"));
		assert!(ks.affects_flag("anything_else"));
	}

	#[test]
	fn test_flag_scope_affects_only_its_flag() {
		let ks = EmergencyControl::activate(
			Environment::Production,
			KillSwitchScope::flag("checkout.new_flow"),
			"payment errors",
			"oncall",
		);
		assert!(ks.affects_flag("checkout.new_flow"));
		assert!(!ks.affects_flag("billing.subscription"));
	}

	#[test]
	fn test_deactivated_affects_nothing() {
		let ks = EmergencyControl::deactivate(
			Environment::Production,
			KillSwitchScope::Global,
			"resolved",
			"oncall",
		);
		assert!(!ks.is_active());
		assert!(!ks.affects_flag("advanced_analytics"));
		assert_eq!(ks.reason, "resolved");
	}

	#[test]
	fn test_scope_display() {
		assert_eq!(KillSwitchScope::Global.to_string(), "global");
		assert_eq!(KillSwitchScope::flag("a.b").to_string(), "flag:a.b");
	}

	#[test]
	fn test_scope_serde() {
		let json = serde_json::to_string(&KillSwitchScope::flag("beta")).unwrap();
		assert_eq!(json, r#"{"type":"flag","flagKey":"beta"}"#);
		let global: KillSwitchScope = serde_json::from_str(r#"{"type":"global"}"#).unwrap();
		assert_eq!(global, KillSwitchScope::Global);
	}

	proptest! {
		#[test]
		fn inactive_control_never_affects_flags(key in "[a-z][a-z0-9_.]{2,30}", global: bool) {
			let scope = if global { KillSwitchScope::Global } else { KillSwitchScope::flag(key.clone()) };
			let ks = EmergencyControl::deactivate(Environment::Staging, scope, "r", "u");
			prop_assert!(!ks.affects_flag(&key));
		}

		#[test]
		fn flag_control_ignores_other_keys(a in "[a-z][a-z0-9_]{2,20}", b in "[a-z][a-z0-9_]{2,20}") {
			prop_assume!(a != b);
			let ks = EmergencyControl::activate(Environment::Staging, KillSwitchScope::flag(a.clone()), "r", "u");
			prop_assert!(ks.affects_flag(&a));
			prop_assert!(!ks.affects_flag(&b));
		}
	}
}
