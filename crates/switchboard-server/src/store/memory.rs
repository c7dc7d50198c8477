// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use switchboard_config::EnvironmentsConfig;
use switchboard_core::{
	EmergencyControl, Environment, FlagDefinition, FlagUpdate, KillSwitchScope, StoreError,
	StoreResult, TenantOverride,
};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::keys::{self, ItemKey};
use super::{batch_keys, ensure_key_safe, FlagStore};

#[derive(Debug, Clone)]
enum Item {
	Flag(FlagDefinition),
	Override(TenantOverride),
	KillSwitch(EmergencyControl),
}

#[derive(Debug, Default)]
struct Tables {
	items: BTreeMap<ItemKey, Item>,
	/// Synthetic index items. Each points at the primary key of a flag.
	indexes: BTreeMap<ItemKey, ItemKey>,
}

impl Tables {
	/// Items whose partition key is exactly `pk`, in sort key order.
	fn partition<'a, V>(
		map: &'a BTreeMap<ItemKey, V>,
		pk: &str,
	) -> std::collections::btree_map::Range<'a, ItemKey, V> {
		// "{pk}\0" is the immediate successor of `pk`, so the range holds one partition.
		map.range(ItemKey::partition_start(pk)..ItemKey::partition_start(format!("{pk}\0")))
	}

	fn flag_at(&self, key: &ItemKey) -> Option<&FlagDefinition> {
		match self.items.get(key) {
			Some(Item::Flag(flag)) => Some(flag),
			_ => None,
		}
	}

	fn index_entries(namespace: &str, flag: &FlagDefinition) -> Vec<ItemKey> {
		let mut entries = vec![
			keys::recency_index(namespace, flag.created_at, &flag.flag_key),
			keys::owner_index(namespace, &flag.owner, &flag.flag_key),
			keys::flag_key_index(namespace, &flag.flag_key),
		];
		if let Some(expires_at) = flag.expires_at {
			entries.push(keys::expiry_index(namespace, expires_at, &flag.flag_key));
		}
		entries
	}

	fn write_indexes(&mut self, namespace: &str, flag: &FlagDefinition) {
		let target = keys::flag(namespace, &flag.flag_key);
		for entry in Self::index_entries(namespace, flag) {
			self.indexes.insert(entry, target.clone());
		}
	}

	fn remove_indexes(&mut self, namespace: &str, flag: &FlagDefinition) {
		for entry in Self::index_entries(namespace, flag) {
			self.indexes.remove(&entry);
		}
	}

	/// Resolves index items in a partition to the flags they point at.
	/// Dangling entries are skipped.
	fn flags_via_index(&self, pk: &str, newest_first: bool) -> Vec<FlagDefinition> {
		let mut flags: Vec<FlagDefinition> = Self::partition(&self.indexes, pk)
			.filter_map(|(_, target)| self.flag_at(target).cloned())
			.collect();
		if newest_first {
			flags.reverse();
		}
		flags
	}
}

/// Flag store held in process memory.
///
/// Items are laid out with the same composite keys a remote key-value store
/// would use, so index behaviour (including staleness) can be exercised
/// without one.
#[derive(Debug)]
pub struct InMemoryFlagStore {
	environments: EnvironmentsConfig,
	tables: RwLock<Tables>,
}

impl InMemoryFlagStore {
	pub fn new(environments: EnvironmentsConfig) -> Self {
		Self {
			environments,
			tables: RwLock::new(Tables::default()),
		}
	}

	fn namespace(&self, environment: Environment) -> &str {
		&self.environments.get(environment).namespace
	}

	/// Regenerates every index item from the primary flag records.
	pub async fn rebuild_indexes(&self) -> usize {
		let mut tables = self.tables.write().await;
		tables.indexes.clear();

		let flags: Vec<FlagDefinition> = tables
			.items
			.values()
			.filter_map(|item| match item {
				Item::Flag(flag) => Some(flag.clone()),
				_ => None,
			})
			.collect();

		for flag in &flags {
			let namespace = self.namespace(flag.environment).to_string();
			tables.write_indexes(&namespace, flag);
		}
		debug!(flags = flags.len(), "rebuilt flag indexes");
		flags.len()
	}

	/// Discards every index item, as if the derived views were lost.
	pub async fn drop_indexes(&self) {
		self.tables.write().await.indexes.clear();
	}
}

#[async_trait]
impl FlagStore for InMemoryFlagStore {
	#[instrument(skip(self), fields(environment = %environment))]
	async fn get_flag(
		&self,
		environment: Environment,
		flag_key: &str,
	) -> StoreResult<Option<FlagDefinition>> {
		ensure_key_safe("flag key", flag_key)?;
		let key = keys::flag(self.namespace(environment), flag_key);
		Ok(self.tables.read().await.flag_at(&key).cloned())
	}

	#[instrument(skip(self, flag), fields(environment = %flag.environment, flag_key = %flag.flag_key))]
	async fn put_flag(&self, flag: &FlagDefinition) -> StoreResult<()> {
		ensure_key_safe("flag key", &flag.flag_key)?;
		ensure_key_safe("owner", &flag.owner)?;

		let namespace = self.namespace(flag.environment);
		let key = keys::flag(namespace, &flag.flag_key);

		let mut tables = self.tables.write().await;
		if tables.items.contains_key(&key) {
			return Err(StoreError::conditional_check_failed(format!(
				"flag '{}' already exists in {}",
				flag.flag_key, flag.environment
			)));
		}
		tables.items.insert(key, Item::Flag(flag.clone()));
		tables.write_indexes(namespace, flag);
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

		let namespace = self.namespace(environment);
		let key = keys::flag(namespace, flag_key);

		let mut tables = self.tables.write().await;
		let Some(existing) = tables.flag_at(&key).cloned() else {
			return Err(StoreError::not_found(format!(
				"flag '{flag_key}' does not exist in {environment}"
			)));
		};

		let mut updated = existing.clone();
		updated.apply(update, Utc::now());

		tables.remove_indexes(namespace, &existing);
		tables.items.insert(key, Item::Flag(updated.clone()));
		tables.write_indexes(namespace, &updated);
		Ok(updated)
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn list_flags(&self, environment: Environment) -> StoreResult<Vec<FlagDefinition>> {
		let pk = keys::recency_partition(self.namespace(environment));
		Ok(self.tables.read().await.flags_via_index(&pk, true))
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn list_flags_by_owner(
		&self,
		environment: Environment,
		owner: &str,
	) -> StoreResult<Vec<FlagDefinition>> {
		ensure_key_safe("owner", owner)?;
		let pk = keys::owner_partition(self.namespace(environment), owner);
		Ok(self.tables.read().await.flags_via_index(&pk, false))
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn list_flags_by_expiry(
		&self,
		environment: Environment,
		expiring_before: Option<DateTime<Utc>>,
	) -> StoreResult<Vec<FlagDefinition>> {
		let pk = keys::expiry_partition(self.namespace(environment));
		let flags = self.tables.read().await.flags_via_index(&pk, false);
		Ok(match expiring_before {
			Some(cutoff) => flags
				.into_iter()
				.filter(|f| f.expires_at.is_some_and(|at| at < cutoff))
				.collect(),
			None => flags,
		})
	}

	#[instrument(skip(self))]
	async fn find_flag_environments(&self, flag_key: &str) -> StoreResult<Vec<Environment>> {
		ensure_key_safe("flag key", flag_key)?;
		let pk = keys::flag_key_partition(flag_key);
		let tables = self.tables.read().await;
		let mut found: Vec<Environment> = Tables::partition(&tables.indexes, &pk)
			.filter_map(|(entry, _)| self.environments.environment_for_namespace(&entry.sk))
			.collect();
		found.sort();
		Ok(found)
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn list_flags_with_full_scan(
		&self,
		environment: Environment,
	) -> StoreResult<Vec<FlagDefinition>> {
		let prefix = keys::flag_partition_prefix(self.namespace(environment));
		let tables = self.tables.read().await;
		let mut flags: Vec<FlagDefinition> = tables
			.items
			.iter()
			.filter(|(k, _)| k.pk.starts_with(&prefix) && k.sk == keys::DEFINITION)
			.filter_map(|(_, item)| match item {
				Item::Flag(flag) => Some(flag.clone()),
				_ => None,
			})
			.collect();
		flags.sort_by(|a, b| {
			b.created_at
				.cmp(&a.created_at)
				.then_with(|| b.flag_key.cmp(&a.flag_key))
		});
		debug!(count = flags.len(), "full scan of flag records");
		Ok(flags)
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
		let key = keys::tenant_override(self.namespace(environment), tenant_id, flag_key);
		Ok(match self.tables.read().await.items.get(&key) {
			Some(Item::Override(o)) => Some(o.clone()),
			_ => None,
		})
	}

	#[instrument(skip(self, tenant_override), fields(
		environment = %tenant_override.environment,
		tenant_id = %tenant_override.tenant_id,
		flag_key = %tenant_override.flag_key,
	))]
	async fn set_tenant_override(&self, tenant_override: &TenantOverride) -> StoreResult<()> {
		ensure_key_safe("tenant id", &tenant_override.tenant_id)?;
		ensure_key_safe("flag key", &tenant_override.flag_key)?;
		let key = keys::tenant_override(
			self.namespace(tenant_override.environment),
			&tenant_override.tenant_id,
			&tenant_override.flag_key,
		);
		self
			.tables
			.write()
			.await
			.items
			.insert(key, Item::Override(tenant_override.clone()));
		Ok(())
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn list_tenant_overrides(
		&self,
		environment: Environment,
		tenant_id: &str,
	) -> StoreResult<Vec<TenantOverride>> {
		ensure_key_safe("tenant id", tenant_id)?;
		let pk = keys::tenant_partition(self.namespace(environment), tenant_id);
		let tables = self.tables.read().await;
		Ok(Tables::partition(&tables.items, &pk)
			.filter_map(|(_, item)| match item {
				Item::Override(o) => Some(o.clone()),
				_ => None,
			})
			.collect())
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
		let key = keys::kill_switch(self.namespace(environment), scope);
		Ok(match self.tables.read().await.items.get(&key) {
			Some(Item::KillSwitch(control)) => Some(control.clone()),
			_ => None,
		})
	}

	#[instrument(skip(self, control), fields(environment = %control.environment, scope = %control.scope))]
	async fn set_kill_switch(&self, control: &EmergencyControl) -> StoreResult<()> {
		if let Some(flag_key) = control.scope.flag_key() {
			ensure_key_safe("flag key", flag_key)?;
		}
		let key = keys::kill_switch(self.namespace(control.environment), &control.scope);
		self
			.tables
			.write()
			.await
			.items
			.insert(key, Item::KillSwitch(control.clone()));
		Ok(())
	}

	#[instrument(skip(self), fields(environment = %environment))]
	async fn list_kill_switches(
		&self,
		environment: Environment,
	) -> StoreResult<Vec<EmergencyControl>> {
		let pk = keys::emergency_partition(self.namespace(environment));
		let tables = self.tables.read().await;
		Ok(Tables::partition(&tables.items, &pk)
			.filter_map(|(_, item)| match item {
				Item::KillSwitch(control) => Some(control.clone()),
				_ => None,
			})
			.collect())
	}

	#[instrument(skip(self, flag_keys), fields(environment = %environment, count = flag_keys.len()))]
	async fn batch_get_flags(
		&self,
		environment: Environment,
		flag_keys: &[String],
	) -> StoreResult<Vec<FlagDefinition>> {
		let wanted = batch_keys(flag_keys)?;
		let namespace = self.namespace(environment);
		let tables = self.tables.read().await;
		Ok(wanted
			.into_iter()
			.filter_map(|key| tables.flag_at(&keys::flag(namespace, key)).cloned())
			.collect())
	}

	async fn health_check(&self) -> StoreResult<()> {
		Ok(())
	}
}
