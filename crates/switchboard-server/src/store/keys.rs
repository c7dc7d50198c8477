// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Composite keys for flags, overrides, kill switches and their index views.
//!
//! Every partition key except the cross-environment view starts with the
//! environment's namespace, so environments sharing one physical store can
//! never collide. Identifiers are rejected upstream if they contain the
//! delimiter.
//!
//! | Item | Partition | Sort |
//! |---|---|---|
//! | flag | `{ns}#FLAG#{key}` | `DEFINITION` |
//! | override | `{ns}#TENANT#{tenant}` | `FLAG#{key}` |
//! | kill switch | `{ns}#EMERGENCY` | `GLOBAL` or `FLAG#{key}` |
//! | recency view | `{ns}#FLAGS` | `{created_at}#{key}` |
//! | owner view | `{ns}#OWNER#{owner}` | `{key}` |
//! | expiry view | `{ns}#EXPIRY` | `{expires_at}#{key}` |
//! | cross-environment view | `FLAGKEY#{key}` | `{ns}` |

use chrono::{DateTime, SecondsFormat, Utc};
use switchboard_core::{KillSwitchScope, KEY_DELIMITER};

pub const DEFINITION: &str = "DEFINITION";
pub const GLOBAL: &str = "GLOBAL";

/// Partition and sort key of one stored item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
	pub pk: String,
	pub sk: String,
}

impl ItemKey {
	pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
		Self {
			pk: pk.into(),
			sk: sk.into(),
		}
	}

	/// Lowest key of a partition, for range scans.
	pub fn partition_start(pk: impl Into<String>) -> Self {
		Self::new(pk, String::new())
	}
}

fn join(parts: &[&str]) -> String {
	let mut out = String::new();
	for (i, part) in parts.iter().enumerate() {
		if i > 0 {
			out.push(KEY_DELIMITER);
		}
		out.push_str(part);
	}
	out
}

/// Fixed-width UTC timestamp; lexicographic order equals time order.
pub fn timestamp(at: DateTime<Utc>) -> String {
	at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn flag(namespace: &str, flag_key: &str) -> ItemKey {
	ItemKey::new(flag_partition(namespace, flag_key), DEFINITION)
}

pub fn flag_partition(namespace: &str, flag_key: &str) -> String {
	join(&[namespace, "FLAG", flag_key])
}

/// Prefix shared by every flag partition in a namespace.
pub fn flag_partition_prefix(namespace: &str) -> String {
	format!("{}{KEY_DELIMITER}", join(&[namespace, "FLAG"]))
}

pub fn tenant_override(namespace: &str, tenant_id: &str, flag_key: &str) -> ItemKey {
	ItemKey::new(
		tenant_partition(namespace, tenant_id),
		join(&["FLAG", flag_key]),
	)
}

pub fn tenant_partition(namespace: &str, tenant_id: &str) -> String {
	join(&[namespace, "TENANT", tenant_id])
}

pub fn kill_switch(namespace: &str, scope: &KillSwitchScope) -> ItemKey {
	ItemKey::new(emergency_partition(namespace), kill_switch_sort_key(scope))
}

pub fn emergency_partition(namespace: &str) -> String {
	join(&[namespace, "EMERGENCY"])
}

pub fn kill_switch_sort_key(scope: &KillSwitchScope) -> String {
	match scope {
		KillSwitchScope::Global => GLOBAL.to_string(),
		KillSwitchScope::Flag(key) => join(&["FLAG", key]),
	}
}

/// Inverse of [`kill_switch_sort_key`].
pub fn parse_kill_switch_sort_key(sk: &str) -> Option<KillSwitchScope> {
	if sk == GLOBAL {
		return Some(KillSwitchScope::Global);
	}
	sk.strip_prefix("FLAG")
		.and_then(|rest| rest.strip_prefix(KEY_DELIMITER))
		.filter(|key| !key.is_empty())
		.map(KillSwitchScope::flag)
}

pub fn recency_index(namespace: &str, created_at: DateTime<Utc>, flag_key: &str) -> ItemKey {
	ItemKey::new(
		recency_partition(namespace),
		join(&[&timestamp(created_at), flag_key]),
	)
}

pub fn recency_partition(namespace: &str) -> String {
	join(&[namespace, "FLAGS"])
}

pub fn owner_index(namespace: &str, owner: &str, flag_key: &str) -> ItemKey {
	ItemKey::new(owner_partition(namespace, owner), flag_key)
}

pub fn owner_partition(namespace: &str, owner: &str) -> String {
	join(&[namespace, "OWNER", owner])
}

pub fn expiry_index(namespace: &str, expires_at: DateTime<Utc>, flag_key: &str) -> ItemKey {
	ItemKey::new(
		expiry_partition(namespace),
		join(&[&timestamp(expires_at), flag_key]),
	)
}

pub fn expiry_partition(namespace: &str) -> String {
	join(&[namespace, "EXPIRY"])
}

pub fn flag_key_index(namespace: &str, flag_key: &str) -> ItemKey {
	ItemKey::new(flag_key_partition(flag_key), namespace)
}

pub fn flag_key_partition(flag_key: &str) -> String {
	join(&["FLAGKEY", flag_key])
}
