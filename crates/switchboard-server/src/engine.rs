// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flag evaluation and administration for one environment.
//!
//! Evaluation resolves in a fixed order:
//! 1. Global kill switch (forces `false`)
//! 2. Flag kill switch (forces `false`)
//! 3. Tenant override
//! 4. Flag default
//! 5. Unknown flag (`false`)
//!
//! Evaluation never fails because of the store. Store failures are reported
//! to the [`ErrorHandler`] and resolve to `false`. Administrative operations
//! propagate classified failures with operator guidance instead.

use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use switchboard_config::{
	AuditLevel, CacheConfig, EnvironmentConfig, FlagsConfig, OverridePolicy, StoreConfig,
};
use switchboard_core::{
	validate_owner, validate_tenant_id, EmergencyControl, Environment, EvaluationContext,
	FlagDefinition, FlagUpdate, KillSwitchScope, NewFlag, Resolution, ResolutionReason,
	StoreError, StoreResult, StructuredError, TenantOverride, KEY_DELIMITER,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheKey, EvaluationCache};
use crate::error::{FlagsServerError, Result};
use crate::guidance::{operational_message, GuidanceContext};
use crate::handler::{ErrorHandler, TracingErrorHandler};
use crate::store::{FlagStore, SqliteFlagStore};

/// Runtime settings for a [`FlagEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
	pub environment_config: EnvironmentConfig,
	/// Already capped at the environment's `max_cache_ttl`.
	pub cache_ttl: Duration,
	/// Zero disables the background sweep.
	pub cache_sweep_interval: Duration,
	pub store_timeout: Duration,
}

impl EngineConfig {
	/// Compiled defaults for `environment`.
	pub fn new(environment: Environment) -> Self {
		let environment_config = EnvironmentConfig::defaults_for(environment);
		let cache = CacheConfig::default();
		Self {
			cache_ttl: cache.ttl.min(environment_config.max_cache_ttl),
			cache_sweep_interval: cache.sweep_interval,
			store_timeout: StoreConfig::default().timeout,
			environment_config,
		}
	}

	pub fn from_config(config: &FlagsConfig) -> Self {
		Self {
			environment_config: config.active().clone(),
			cache_ttl: config.effective_cache_ttl(),
			cache_sweep_interval: config.cache.sweep_interval,
			store_timeout: config.store.timeout,
		}
	}

	/// Sets the cache TTL, capped at the environment's ceiling.
	pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
		self.cache_ttl = ttl.min(self.environment_config.max_cache_ttl);
		self
	}

	pub fn with_cache_sweep_interval(mut self, interval: Duration) -> Self {
		self.cache_sweep_interval = interval;
		self
	}

	pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
		self.store_timeout = timeout;
		self
	}

	pub fn environment(&self) -> Environment {
		self.environment_config.environment
	}
}

/// Evaluates and administers flags for the single environment it was built for.
pub struct FlagEngine {
	config: EngineConfig,
	store: Arc<dyn FlagStore>,
	cache: Arc<EvaluationCache>,
	error_handler: Arc<dyn ErrorHandler>,
}

impl FlagEngine {
	pub fn new(config: EngineConfig, store: Arc<dyn FlagStore>) -> Self {
		let cache = Arc::new(EvaluationCache::new(config.cache_ttl));
		Self {
			config,
			store,
			cache,
			error_handler: Arc::new(TracingErrorHandler),
		}
	}

	/// Builds an engine over a SQLite store described by `config`.
	pub async fn connect(config: &FlagsConfig) -> Result<Self> {
		let engine_config = EngineConfig::from_config(config);
		let store = SqliteFlagStore::connect(&config.store.database_url, config.environments.clone())
			.await
			.map_err(|e| {
				let ctx = GuidanceContext::new(
					"connect",
					engine_config.environment(),
					&engine_config.environment_config.namespace,
				);
				store_failure("connect", e, &ctx)
			})?;

		info!(
			environment = %engine_config.environment(),
			namespace = %engine_config.environment_config.namespace,
			cache_ttl_secs = engine_config.cache_ttl.as_secs(),
			"flag engine connected"
		);
		Ok(Self::new(engine_config, Arc::new(store)))
	}

	pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
		self.error_handler = handler;
		self
	}

	/// Shares a cache between engines or with the host.
	///
	/// Rejected when the cache's TTL exceeds the environment's `max_cache_ttl`.
	pub fn with_cache(mut self, cache: Arc<EvaluationCache>) -> Result<Self> {
		let ceiling = self.config.environment_config.max_cache_ttl;
		if cache.ttl() > ceiling {
			return Err(FlagsServerError::InvalidInput(format!(
				"cache ttl {}ms exceeds the {} ceiling of {}ms",
				cache.ttl().as_millis(),
				self.environment(),
				ceiling.as_millis()
			)));
		}
		self.cache = cache;
		Ok(self)
	}

	pub fn environment(&self) -> Environment {
		self.config.environment()
	}

	pub fn environment_config(&self) -> &EnvironmentConfig {
		&self.config.environment_config
	}

	/// Advisory. Enforcement belongs to the caller.
	pub fn override_policy(&self) -> &OverridePolicy {
		&self.config.environment_config.override_policy
	}

	pub fn cache(&self) -> &Arc<EvaluationCache> {
		&self.cache
	}

	fn namespace(&self) -> &str {
		&self.config.environment_config.namespace
	}

	/// Starts the background reclamation of expired cache entries.
	pub fn spawn_cache_sweeper(&self) -> Option<JoinHandle<()>> {
		if !self.cache.is_enabled() || self.config.cache_sweep_interval.is_zero() {
			return None;
		}
		Some(self.cache.spawn_sweeper(self.config.cache_sweep_interval))
	}

	// Evaluation

	#[instrument(skip(self, context), fields(tenant_id = %context.tenant_id, environment = %self.environment()))]
	pub async fn is_enabled(&self, context: &EvaluationContext, flag_key: &str) -> Result<bool> {
		self.check_environment(&context.environment)?;
		Ok(self.evaluate(&context.tenant_id, flag_key).await)
	}

	/// Every known flag for the context's tenant.
	///
	/// A failure on one flag disables that flag only.
	#[instrument(skip(self, context), fields(tenant_id = %context.tenant_id, environment = %self.environment()))]
	pub async fn get_all_flags(&self, context: &EvaluationContext) -> Result<BTreeMap<String, bool>> {
		self.check_environment(&context.environment)?;

		let keys = self.known_flag_keys(&context.tenant_id).await;
		let values = join_all(keys.iter().map(|key| self.evaluate(&context.tenant_id, key))).await;

		Ok(keys.into_iter().zip(values).collect())
	}

	/// Variant served to the tenant, or `None` when the flag resolves disabled.
	#[instrument(skip(self, context), fields(tenant_id = %context.tenant_id, environment = %self.environment()))]
	pub async fn get_variant(
		&self,
		context: &EvaluationContext,
		flag_key: &str,
	) -> Result<Option<String>> {
		self.check_environment(&context.environment)?;

		if let Err(e) = validate_identifiers(&context.tenant_id, flag_key) {
			self.report(self.evaluation_error("get_variant", &context.tenant_id, flag_key, &e));
			return Ok(None);
		}

		let resolution = self
			.resolve("get_variant", &context.tenant_id, flag_key, true)
			.await;
		Ok(resolution.variant.filter(|_| resolution.enabled))
	}

	/// Resolves without the cache and reports which rule decided.
	#[instrument(skip(self, context), fields(tenant_id = %context.tenant_id, environment = %self.environment()))]
	pub async fn explain(&self, context: &EvaluationContext, flag_key: &str) -> Result<Resolution> {
		self.check_environment(&context.environment)?;

		if let Err(e) = validate_identifiers(&context.tenant_id, flag_key) {
			self.report(self.evaluation_error("explain", &context.tenant_id, flag_key, &e));
			return Ok(Resolution::disabled(
				flag_key,
				ResolutionReason::StoreError { kind: e.kind },
			));
		}

		Ok(self.resolve("explain", &context.tenant_id, flag_key, true).await)
	}

	pub fn invalidate_cache(&self, tenant_id: &str, flag_key: &str) {
		self
			.cache
			.invalidate(&CacheKey::new(self.environment(), tenant_id, flag_key));
	}

	pub fn invalidate_all_cache(&self) {
		self.cache.clear();
		debug!(environment = %self.environment(), "evaluation cache cleared");
	}

	fn check_environment(&self, declared: &str) -> Result<()> {
		let expected = self.environment();
		if expected.matches(declared) {
			Ok(())
		} else {
			Err(FlagsServerError::EnvironmentMismatch {
				expected: expected.to_string(),
				actual: declared.to_string(),
			})
		}
	}

	async fn evaluate(&self, tenant_id: &str, flag_key: &str) -> bool {
		if let Err(e) = validate_identifiers(tenant_id, flag_key) {
			self.report(self.evaluation_error("is_enabled", tenant_id, flag_key, &e));
			return false;
		}

		let key = CacheKey::new(self.environment(), tenant_id, flag_key);
		if let Some(value) = self.cache.get(&key) {
			debug!(flag_key, value, "cache hit");
			return value;
		}

		// Taken before the store is read so a concurrent invalidation wins.
		let observed = self.cache.observe();
		let resolution = self.resolve("is_enabled", tenant_id, flag_key, false).await;
		debug!(flag_key, value = resolution.enabled, reason = ?resolution.reason, "cache miss resolved");

		if !self.cache.insert_if_current(key, resolution.enabled, observed) && self.cache.is_enabled() {
			debug!(flag_key, "discarded result invalidated during evaluation");
		}
		resolution.enabled
	}

	async fn resolve(
		&self,
		operation: &'static str,
		tenant_id: &str,
		flag_key: &str,
		with_variant: bool,
	) -> Resolution {
		match self.try_resolve(tenant_id, flag_key, with_variant).await {
			Ok(resolution) => resolution,
			Err(e) => {
				self.report(self.evaluation_error(operation, tenant_id, flag_key, &e));
				Resolution::disabled(flag_key, ResolutionReason::StoreError { kind: e.kind })
			}
		}
	}

	async fn try_resolve(
		&self,
		tenant_id: &str,
		flag_key: &str,
		with_variant: bool,
	) -> StoreResult<Resolution> {
		let env = self.environment();

		if self.kill_switch_active(&KillSwitchScope::Global).await? {
			return Ok(Resolution::disabled(
				flag_key,
				ResolutionReason::GlobalKillSwitch,
			));
		}
		if self
			.kill_switch_active(&KillSwitchScope::flag(flag_key))
			.await?
		{
			return Ok(Resolution::disabled(flag_key, ResolutionReason::FlagKillSwitch));
		}

		let tenant_override = self
			.call(
				"get_tenant_override",
				self.store.get_tenant_override(env, tenant_id, flag_key),
			)
			.await?;

		if let Some(o) = tenant_override {
			let variant = match (o.enabled && with_variant, o.variant) {
				(false, _) => None,
				(true, Some(variant)) => Some(variant),
				(true, None) => self
					.call("get_flag", self.store.get_flag(env, flag_key))
					.await?
					.and_then(|flag| flag.default_variant),
			};
			return Ok(Resolution {
				flag_key: flag_key.to_string(),
				enabled: o.enabled,
				variant,
				reason: ResolutionReason::TenantOverride,
			});
		}

		match self
			.call("get_flag", self.store.get_flag(env, flag_key))
			.await?
		{
			Some(flag) => Ok(Resolution {
				flag_key: flag_key.to_string(),
				enabled: flag.default_enabled,
				variant: flag.default_variant.filter(|_| flag.default_enabled),
				reason: ResolutionReason::FlagDefault,
			}),
			None => Ok(Resolution::disabled(flag_key, ResolutionReason::UnknownFlag)),
		}
	}

	async fn kill_switch_active(&self, scope: &KillSwitchScope) -> StoreResult<bool> {
		let control = self
			.call(
				"get_kill_switch",
				self.store.get_kill_switch(self.environment(), scope),
			)
			.await?;
		Ok(control.is_some_and(|c| c.is_active()))
	}

	/// Flag keys from the recency view, falling back to a full scan.
	async fn known_flag_keys(&self, tenant_id: &str) -> Vec<String> {
		let env = self.environment();

		let flags = match self.call("list_flags", self.store.list_flags(env)).await {
			Ok(flags) => flags,
			Err(e) => {
				self.report(
					StructuredError::from_store_error("get_all_flags", env, &e)
						.with_tenant(tenant_id)
						.with_context("namespace", self.namespace())
						.with_context("path", "recency_index"),
				);
				match self
					.call(
						"list_flags_with_full_scan",
						self.store.list_flags_with_full_scan(env),
					)
					.await
				{
					Ok(flags) => flags,
					Err(e) => {
						self.report(
							StructuredError::from_store_error("get_all_flags", env, &e)
								.with_tenant(tenant_id)
								.with_context("namespace", self.namespace())
								.with_context("path", "full_scan"),
						);
						return Vec::new();
					}
				}
			}
		};

		flags.into_iter().map(|f| f.flag_key).collect()
	}

	fn evaluation_error(
		&self,
		operation: &str,
		tenant_id: &str,
		flag_key: &str,
		error: &StoreError,
	) -> StructuredError {
		StructuredError::from_store_error(operation, self.environment(), error)
			.with_tenant(tenant_id)
			.with_flag(flag_key)
			.with_context("namespace", self.namespace())
	}

	/// Delivers an event to the handler. A panicking handler is logged and ignored.
	fn report(&self, error: StructuredError) {
		let handler = &self.error_handler;
		if std::panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&error))).is_err() {
			warn!(operation = %error.operation, "error handler panicked");
		}
	}

	async fn call<T>(
		&self,
		operation: &'static str,
		fut: impl Future<Output = StoreResult<T>>,
	) -> StoreResult<T> {
		match tokio::time::timeout(self.config.store_timeout, fut).await {
			Ok(result) => result,
			Err(_) => Err(StoreError::timeout(operation, self.config.store_timeout)),
		}
	}

	// Administration

	#[instrument(skip(self, new_flag), fields(flag_key = %new_flag.flag_key, environment = %self.environment()))]
	pub async fn create_flag(&self, new_flag: NewFlag) -> Result<FlagDefinition> {
		ensure_flag_key(&new_flag.flag_key)?;
		ensure_owner(&new_flag.owner)?;

		let env = self.environment();
		let flag = new_flag.into_definition(env, Utc::now());
		self
			.call("put_flag", self.store.put_flag(&flag))
			.await
			.map_err(|e| self.admin_error("create_flag", e, Some(flag.flag_key.as_str()), None))?;

		self.cache.invalidate_flag(env, &flag.flag_key);
		self.audit("create_flag", &flag.flag_key, Some(&flag.owner), "");
		Ok(flag)
	}

	#[instrument(skip(self, update), fields(environment = %self.environment()))]
	pub async fn update_flag(&self, flag_key: &str, update: FlagUpdate) -> Result<FlagDefinition> {
		ensure_flag_key(flag_key)?;
		if let Some(owner) = &update.owner {
			ensure_owner(owner)?;
		}

		let env = self.environment();
		let flag = self
			.call("update_flag", self.store.update_flag(env, flag_key, &update))
			.await
			.map_err(|e| self.admin_error("update_flag", e, Some(flag_key), None))?;

		self.cache.invalidate_flag(env, flag_key);
		self.audit(
			"update_flag",
			flag_key,
			None,
			&format!("default_enabled={}", flag.default_enabled),
		);
		Ok(flag)
	}

	pub async fn get_flag(&self, flag_key: &str) -> Result<Option<FlagDefinition>> {
		self
			.call("get_flag", self.store.get_flag(self.environment(), flag_key))
			.await
			.map_err(|e| self.admin_error("get_flag", e, Some(flag_key), None))
	}

	/// Newest first.
	pub async fn list_flags(&self) -> Result<Vec<FlagDefinition>> {
		self
			.call("list_flags", self.store.list_flags(self.environment()))
			.await
			.map_err(|e| self.admin_error("list_flags", e, None, None))
	}

	pub async fn list_flags_by_owner(&self, owner: &str) -> Result<Vec<FlagDefinition>> {
		ensure_owner(owner)?;
		self
			.call(
				"list_flags_by_owner",
				self.store.list_flags_by_owner(self.environment(), owner),
			)
			.await
			.map_err(|e| self.admin_error("list_flags_by_owner", e, None, None))
	}

	/// Flags with an expiry, soonest first. `before` narrows to flags
	/// expiring earlier than that instant.
	pub async fn list_expiring_flags(
		&self,
		before: Option<DateTime<Utc>>,
	) -> Result<Vec<FlagDefinition>> {
		self
			.call(
				"list_flags_by_expiry",
				self.store.list_flags_by_expiry(self.environment(), before),
			)
			.await
			.map_err(|e| self.admin_error("list_expiring_flags", e, None, None))
	}

	/// Every environment in which `flag_key` is defined.
	pub async fn flag_environments(&self, flag_key: &str) -> Result<Vec<Environment>> {
		self
			.call(
				"find_flag_environments",
				self.store.find_flag_environments(flag_key),
			)
			.await
			.map_err(|e| self.admin_error("flag_environments", e, Some(flag_key), None))
	}

	pub async fn batch_get_flags(&self, flag_keys: &[String]) -> Result<Vec<FlagDefinition>> {
		self
			.call(
				"batch_get_flags",
				self.store.batch_get_flags(self.environment(), flag_keys),
			)
			.await
			.map_err(|e| self.admin_error("batch_get_flags", e, None, None))
	}

	pub async fn set_tenant_override(
		&self,
		tenant_id: &str,
		flag_key: &str,
		enabled: bool,
		updated_by: &str,
	) -> Result<TenantOverride> {
		self
			.save_tenant_override(TenantOverride::new(
				self.environment(),
				tenant_id,
				flag_key,
				enabled,
				updated_by,
			))
			.await
	}

	/// Upserts a fully specified override, e.g. one carrying a variant.
	#[instrument(skip(self, tenant_override), fields(
		tenant_id = %tenant_override.tenant_id,
		flag_key = %tenant_override.flag_key,
		environment = %self.environment(),
	))]
	pub async fn save_tenant_override(
		&self,
		tenant_override: TenantOverride,
	) -> Result<TenantOverride> {
		let env = self.environment();
		if tenant_override.environment != env {
			return Err(FlagsServerError::EnvironmentMismatch {
				expected: env.to_string(),
				actual: tenant_override.environment.to_string(),
			});
		}
		ensure_tenant(&tenant_override.tenant_id)?;
		ensure_flag_key(&tenant_override.flag_key)?;

		self
			.call(
				"set_tenant_override",
				self.store.set_tenant_override(&tenant_override),
			)
			.await
			.map_err(|e| {
				self.admin_error(
					"set_tenant_override",
					e,
					Some(tenant_override.flag_key.as_str()),
					Some(tenant_override.tenant_id.as_str()),
				)
			})?;

		self.invalidate_cache(&tenant_override.tenant_id, &tenant_override.flag_key);
		self.audit(
			"set_tenant_override",
			&format!("{}/{}", tenant_override.tenant_id, tenant_override.flag_key),
			Some(&tenant_override.updated_by),
			&format!("enabled={}", tenant_override.enabled),
		);
		Ok(tenant_override)
	}

	pub async fn list_tenant_overrides(&self, tenant_id: &str) -> Result<Vec<TenantOverride>> {
		ensure_tenant(tenant_id)?;
		self
			.call(
				"list_tenant_overrides",
				self.store.list_tenant_overrides(self.environment(), tenant_id),
			)
			.await
			.map_err(|e| self.admin_error("list_tenant_overrides", e, None, Some(tenant_id)))
	}

	/// Activates or deactivates a kill switch. Always overwrites.
	#[instrument(skip(self, scope, reason, actor), fields(scope = %scope, environment = %self.environment()))]
	pub async fn set_kill_switch(
		&self,
		scope: KillSwitchScope,
		enabled: bool,
		reason: &str,
		actor: &str,
	) -> Result<EmergencyControl> {
		if let Some(flag_key) = scope.flag_key() {
			ensure_flag_key(flag_key)?;
		}

		let env = self.environment();
		let control = if enabled {
			EmergencyControl::activate(env, scope, reason, actor)
		} else {
			EmergencyControl::deactivate(env, scope, reason, actor)
		};

		self
			.call("set_kill_switch", self.store.set_kill_switch(&control))
			.await
			.map_err(|e| self.admin_error("set_kill_switch", e, control.scope.flag_key(), None))?;

		match &control.scope {
			KillSwitchScope::Global => self.cache.clear(),
			KillSwitchScope::Flag(flag_key) => self.cache.invalidate_flag(env, flag_key),
		}

		if control.is_active() {
			warn!(scope = %control.scope, reason, actor, "kill switch activated");
		}
		self.audit(
			"set_kill_switch",
			&control.scope.to_string(),
			Some(actor),
			&format!("enabled={enabled} reason={reason}"),
		);
		Ok(control)
	}

	pub async fn list_kill_switches(&self) -> Result<Vec<EmergencyControl>> {
		self
			.call(
				"list_kill_switches",
				self.store.list_kill_switches(self.environment()),
			)
			.await
			.map_err(|e| self.admin_error("list_kill_switches", e, None, None))
	}

	pub async fn health_check(&self) -> Result<()> {
		self
			.call("health_check", self.store.health_check())
			.await
			.map_err(|e| self.admin_error("health_check", e, None, None))
	}

	fn admin_error(
		&self,
		operation: &'static str,
		error: StoreError,
		flag_key: Option<&str>,
		tenant_id: Option<&str>,
	) -> FlagsServerError {
		let env = self.environment();
		let mut ctx = GuidanceContext::new(operation, env, self.namespace());
		let mut structured = StructuredError::from_store_error(operation, env, &error)
			.with_context("namespace", self.namespace());
		if let Some(flag_key) = flag_key {
			ctx = ctx.with_flag(flag_key);
			structured = structured.with_flag(flag_key);
		}
		if let Some(tenant_id) = tenant_id {
			ctx = ctx.with_tenant(tenant_id);
			structured = structured.with_tenant(tenant_id);
		}

		let failure = store_failure(operation, error, &ctx);
		if let FlagsServerError::Store { guidance, .. } = &failure {
			structured = structured.with_context("guidance", guidance.clone());
		}
		self.report(structured);
		failure
	}

	fn audit(&self, operation: &str, target: &str, actor: Option<&str>, detail: &str) {
		let environment = self.environment();
		match self.config.environment_config.audit_level {
			AuditLevel::Minimal => debug!(operation, target, %environment, "flag administration"),
			AuditLevel::Standard => info!(operation, target, %environment, "flag administration"),
			AuditLevel::Verbose => info!(
				operation,
				target,
				%environment,
				namespace = self.namespace(),
				actor,
				detail,
				"flag administration"
			),
		}
	}
}

fn store_failure(
	operation: &'static str,
	error: StoreError,
	ctx: &GuidanceContext<'_>,
) -> FlagsServerError {
	FlagsServerError::Store {
		operation,
		kind: error.kind,
		guidance: operational_message(error.kind, ctx),
		retryable: error.is_retryable(),
		source: error,
	}
}

/// Identifier checks on the evaluation path. Failures are reported, not raised.
fn validate_identifiers(tenant_id: &str, flag_key: &str) -> StoreResult<()> {
	if !validate_tenant_id(tenant_id) {
		return Err(StoreError::validation(format!(
			"invalid tenant id '{tenant_id}'"
		)));
	}
	if flag_key.is_empty() || flag_key.contains(KEY_DELIMITER) {
		return Err(StoreError::validation(format!(
			"invalid flag key '{flag_key}'"
		)));
	}
	Ok(())
}

fn ensure_flag_key(flag_key: &str) -> Result<()> {
	if FlagDefinition::validate_key(flag_key) {
		Ok(())
	} else {
		Err(FlagsServerError::InvalidInput(format!(
			"invalid flag key '{flag_key}': expected 3-100 chars of [a-z0-9_.-] starting with a letter"
		)))
	}
}

fn ensure_owner(owner: &str) -> Result<()> {
	if validate_owner(owner) {
		Ok(())
	} else {
		Err(FlagsServerError::InvalidInput(format!(
			"invalid owner '{owner}'"
		)))
	}
}

fn ensure_tenant(tenant_id: &str) -> Result<()> {
	if validate_tenant_id(tenant_id) {
		Ok(())
	} else {
		Err(FlagsServerError::InvalidInput(format!(
			"invalid tenant id '{tenant_id}'"
		)))
	}
}
