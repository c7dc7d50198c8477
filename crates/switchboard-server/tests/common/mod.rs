// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use switchboard_config::EnvironmentsConfig;
use switchboard_server::{
	CollectingErrorHandler, EmergencyControl, EngineConfig, Environment, ErrorKind,
	EvaluationContext, FlagDefinition, FlagEngine, FlagStore, FlagUpdate, InMemoryFlagStore,
	KillSwitchScope, StoreError, StoreResult, TenantOverride,
};

#[derive(Debug, Clone, Copy)]
pub enum Fault {
	Fail(ErrorKind),
	/// Never answers within any sensible timeout.
	Hang,
	/// Reads immediately but answers only after the delay, so the answer
	/// reflects the data as it was before the delay.
	Stall(Duration),
}

#[derive(Debug, Clone)]
struct Rule {
	operation: &'static str,
	flag_key: Option<String>,
	fault: Fault,
}

/// Wraps the in-memory store and injects failures per operation.
#[derive(Debug)]
pub struct FaultyStore {
	inner: InMemoryFlagStore,
	rules: Mutex<Vec<Rule>>,
	reads: AtomicUsize,
}

impl FaultyStore {
	pub fn new() -> Self {
		Self {
			inner: InMemoryFlagStore::new(EnvironmentsConfig::default()),
			rules: Mutex::new(Vec::new()),
			reads: AtomicUsize::new(0),
		}
	}

	pub fn inject(&self, operation: &'static str, fault: Fault) {
		self.rules.lock().unwrap().push(Rule {
			operation,
			flag_key: None,
			fault,
		});
	}

	pub fn inject_for_flag(&self, operation: &'static str, flag_key: &str, fault: Fault) {
		self.rules.lock().unwrap().push(Rule {
			operation,
			flag_key: Some(flag_key.to_string()),
			fault,
		});
	}

	pub fn heal(&self) {
		self.rules.lock().unwrap().clear();
	}

	/// Evaluation-path reads served so far.
	pub fn reads(&self) -> usize {
		self.reads.load(Ordering::SeqCst)
	}

	pub fn inner(&self) -> &InMemoryFlagStore {
		&self.inner
	}

	fn fault(&self, operation: &'static str, flag_key: Option<&str>) -> Option<Fault> {
		let rules = self.rules.lock().unwrap();
		rules
			.iter()
			.find(|r| {
				r.operation == operation
					&& (r.flag_key.is_none() || r.flag_key.as_deref() == flag_key)
			})
			.map(|r| r.fault)
	}

	/// Runs `call` against the inner store under whatever fault is injected.
	async fn guard<T>(
		&self,
		operation: &'static str,
		flag_key: Option<&str>,
		call: impl Future<Output = StoreResult<T>>,
	) -> StoreResult<T> {
		match self.fault(operation, flag_key) {
			None => call.await,
			Some(Fault::Fail(kind)) => Err(StoreError::new(kind, format!("injected {operation} failure"))),
			Some(Fault::Hang) => {
				tokio::time::sleep(Duration::from_secs(3600)).await;
				call.await
			}
			Some(Fault::Stall(delay)) => {
				let result = call.await;
				tokio::time::sleep(delay).await;
				result
			}
		}
	}

	fn count_read(&self) {
		self.reads.fetch_add(1, Ordering::SeqCst);
	}
}

#[async_trait]
impl FlagStore for FaultyStore {
	async fn get_flag(
		&self,
		environment: Environment,
		flag_key: &str,
	) -> StoreResult<Option<FlagDefinition>> {
		self.count_read();
		self
			.guard("get_flag", Some(flag_key), self.inner.get_flag(environment, flag_key))
			.await
	}

	async fn put_flag(&self, flag: &FlagDefinition) -> StoreResult<()> {
		self
			.guard("put_flag", Some(&flag.flag_key), self.inner.put_flag(flag))
			.await
	}

	async fn update_flag(
		&self,
		environment: Environment,
		flag_key: &str,
		update: &FlagUpdate,
	) -> StoreResult<FlagDefinition> {
		self
			.guard("update_flag", Some(flag_key), self.inner.update_flag(environment, flag_key, update))
			.await
	}

	async fn list_flags(&self, environment: Environment) -> StoreResult<Vec<FlagDefinition>> {
		self
			.guard("list_flags", None, self.inner.list_flags(environment))
			.await
	}

	async fn list_flags_by_owner(
		&self,
		environment: Environment,
		owner: &str,
	) -> StoreResult<Vec<FlagDefinition>> {
		self
			.guard("list_flags_by_owner", None, self.inner.list_flags_by_owner(environment, owner))
			.await
	}

	async fn list_flags_by_expiry(
		&self,
		environment: Environment,
		expiring_before: Option<DateTime<Utc>>,
	) -> StoreResult<Vec<FlagDefinition>> {
		self
			.guard("list_flags_by_expiry", None, self.inner.list_flags_by_expiry(environment, expiring_before))
			.await
	}

	async fn find_flag_environments(&self, flag_key: &str) -> StoreResult<Vec<Environment>> {
		self
			.guard("find_flag_environments", Some(flag_key), self.inner.find_flag_environments(flag_key))
			.await
	}

	async fn list_flags_with_full_scan(
		&self,
		environment: Environment,
	) -> StoreResult<Vec<FlagDefinition>> {
		self
			.guard("list_flags_with_full_scan", None, self.inner.list_flags_with_full_scan(environment))
			.await
	}

	async fn get_tenant_override(
		&self,
		environment: Environment,
		tenant_id: &str,
		flag_key: &str,
	) -> StoreResult<Option<TenantOverride>> {
		self.count_read();
		self
			.guard("get_tenant_override", Some(flag_key), self.inner.get_tenant_override(environment, tenant_id, flag_key))
			.await
	}

	async fn set_tenant_override(&self, tenant_override: &TenantOverride) -> StoreResult<()> {
		self
			.guard("set_tenant_override", Some(&tenant_override.flag_key), self.inner.set_tenant_override(tenant_override))
			.await
	}

	async fn list_tenant_overrides(
		&self,
		environment: Environment,
		tenant_id: &str,
	) -> StoreResult<Vec<TenantOverride>> {
		self
			.guard("list_tenant_overrides", None, self.inner.list_tenant_overrides(environment, tenant_id))
			.await
	}

	async fn get_kill_switch(
		&self,
		environment: Environment,
		scope: &KillSwitchScope,
	) -> StoreResult<Option<EmergencyControl>> {
		self.count_read();
		self
			.guard("get_kill_switch", scope.flag_key(), self.inner.get_kill_switch(environment, scope))
			.await
	}

	async fn set_kill_switch(&self, control: &EmergencyControl) -> StoreResult<()> {
		self
			.guard("set_kill_switch", control.scope.flag_key(), self.inner.set_kill_switch(control))
			.await
	}

	async fn list_kill_switches(
		&self,
		environment: Environment,
	) -> StoreResult<Vec<EmergencyControl>> {
		self
			.guard("list_kill_switches", None, self.inner.list_kill_switches(environment))
			.await
	}

	async fn batch_get_flags(
		&self,
		environment: Environment,
		flag_keys: &[String],
	) -> StoreResult<Vec<FlagDefinition>> {
		self
			.guard("batch_get_flags", None, self.inner.batch_get_flags(environment, flag_keys))
			.await
	}

	async fn health_check(&self) -> StoreResult<()> {
		self
			.guard("health_check", None, self.inner.health_check())
			.await
	}
}

pub struct Harness {
	pub engine: FlagEngine,
	pub store: Arc<FaultyStore>,
	pub errors: CollectingErrorHandler,
}

pub fn harness(environment: Environment) -> Harness {
	harness_with(EngineConfig::new(environment))
}

pub fn harness_with(config: EngineConfig) -> Harness {
	let store = Arc::new(FaultyStore::new());
	let errors = CollectingErrorHandler::new();
	let engine = FlagEngine::new(config, store.clone())
		.with_error_handler(Arc::new(errors.clone()));
	Harness {
		engine,
		store,
		errors,
	}
}

pub fn ctx(tenant_id: &str, environment: &str) -> EvaluationContext {
	EvaluationContext::new(tenant_id, environment)
}
