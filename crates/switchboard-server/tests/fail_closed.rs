// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ctx, harness, harness_with, Fault};
use switchboard_server::{
	CacheKey, EngineConfig, Environment, ErrorHandler, ErrorKind, FlagStore, FlagUpdate,
	FlagsServerError, NewFlag, ResolutionReason, StructuredError,
};

#[tokio::test]
async fn store_failure_disables_and_reports() {
	let h = harness(Environment::Production);
	h.engine
		.create_flag(NewFlag::new("beta", true, "growth"))
		.await
		.unwrap();
	h.store
		.inject("get_kill_switch", Fault::Fail(ErrorKind::ServiceUnavailable));

	let c = ctx("acme", "production");
	assert!(!h.engine.is_enabled(&c, "beta").await.unwrap());

	let events = h.errors.events();
	assert_eq!(events.len(), 1);
	let e = &events[0];
	assert_eq!(e.operation, "is_enabled");
	assert_eq!(e.tenant_id.as_deref(), Some("acme"));
	assert_eq!(e.flag_key.as_deref(), Some("beta"));
	assert_eq!(e.environment, Environment::Production);
	assert_eq!(e.error_type, ErrorKind::ServiceUnavailable);
	assert!(e.is_retryable);
	assert_eq!(e.context["namespace"], "switchboard-production");
	assert!(e.message().unwrap().contains("injected get_kill_switch failure"));
}

#[tokio::test]
async fn fail_closed_result_is_cached_until_invalidated() {
	let h = harness(Environment::Production);
	h.engine
		.create_flag(NewFlag::new("beta", true, "growth"))
		.await
		.unwrap();
	h.store
		.inject("get_tenant_override", Fault::Fail(ErrorKind::Throttled));

	let c = ctx("acme", "production");
	assert!(!h.engine.is_enabled(&c, "beta").await.unwrap());

	h.store.heal();
	assert!(!h.engine.is_enabled(&c, "beta").await.unwrap());
	assert_eq!(h.errors.len(), 1);

	h.engine.invalidate_cache("acme", "beta");
	assert!(h.engine.is_enabled(&c, "beta").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn slow_store_times_out_to_false() {
	let h = harness_with(
		EngineConfig::new(Environment::Production).with_store_timeout(Duration::from_millis(100)),
	);
	h.engine
		.create_flag(NewFlag::new("beta", true, "growth"))
		.await
		.unwrap();
	h.store.inject("get_flag", Fault::Hang);

	assert!(!h.engine.is_enabled(&ctx("acme", "production"), "beta").await.unwrap());

	let events = h.errors.events();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0].error_type, ErrorKind::ServiceUnavailable);
	assert!(events[0].is_retryable);
	assert!(events[0].message().unwrap().contains("get_flag timed out after 100ms"));
}

#[tokio::test(start_paused = true)]
async fn slow_admin_call_is_retryable_error() {
	let h = harness_with(
		EngineConfig::new(Environment::Staging).with_store_timeout(Duration::from_millis(100)),
	);
	h.store.inject("put_flag", Fault::Hang);

	let err = h
		.engine
		.create_flag(NewFlag::new("beta", true, "growth"))
		.await
		.unwrap_err();
	assert_eq!(err.kind(), Some(ErrorKind::ServiceUnavailable));
	assert!(err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn invalidation_during_slow_evaluation_is_not_undone() {
	let h = harness_with(
		EngineConfig::new(Environment::Production)
			.with_cache_ttl(Duration::from_secs(1))
			.with_store_timeout(Duration::from_secs(5)),
	);
	h.engine
		.create_flag(NewFlag::new("beta", true, "growth"))
		.await
		.unwrap();
	h.store
		.inject("get_flag", Fault::Stall(Duration::from_secs(2)));

	let c = ctx("acme", "production");
	let (in_flight, ()) = tokio::join!(h.engine.is_enabled(&c, "beta"), async {
		tokio::time::sleep(Duration::from_millis(500)).await;
		h.store
			.inner()
			.update_flag(
				Environment::Production,
				"beta",
				&FlagUpdate::default().default_enabled(false),
			)
			.await
			.unwrap();
		h.engine.invalidate_cache("acme", "beta");

		// Outlive the tombstone before the slow read completes.
		tokio::time::sleep(Duration::from_millis(1100)).await;
		h.engine.cache().purge_expired();
	});

	// Answered from the read taken before the change.
	assert!(in_flight.unwrap());
	let key = CacheKey::new(Environment::Production, "acme", "beta");
	assert_eq!(h.engine.cache().get(&key), None);

	h.store.heal();
	assert!(!h.engine.is_enabled(&c, "beta").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn flag_update_during_slow_evaluation_is_not_undone() {
	let h = harness_with(
		EngineConfig::new(Environment::Production).with_store_timeout(Duration::from_secs(5)),
	);
	h.engine
		.create_flag(NewFlag::new("beta", true, "growth"))
		.await
		.unwrap();
	h.store
		.inject("get_flag", Fault::Stall(Duration::from_secs(2)));

	let c = ctx("acme", "production");
	let (in_flight, updated) = tokio::join!(h.engine.is_enabled(&c, "beta"), async {
		tokio::time::sleep(Duration::from_millis(500)).await;
		h.engine
			.update_flag("beta", FlagUpdate::default().default_enabled(false))
			.await
	});

	assert!(in_flight.unwrap());
	assert!(!updated.unwrap().default_enabled);
	assert!(h.engine.cache().is_empty());

	h.store.heal();
	assert!(!h.engine.is_enabled(&c, "beta").await.unwrap());
}

#[tokio::test]
async fn get_all_flags_falls_back_to_full_scan() {
	let h = harness(Environment::Production);
	for key in ["alpha", "beta", "gamma"] {
		h.engine
			.create_flag(NewFlag::new(key, true, "growth"))
			.await
			.unwrap();
	}
	h.store
		.inject("list_flags", Fault::Fail(ErrorKind::ResourceOrTableInUse));

	let flags = h.engine.get_all_flags(&ctx("acme", "production")).await.unwrap();
	assert_eq!(flags.len(), 3);
	assert!(flags.values().all(|enabled| *enabled));

	let events = h.errors.events();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0].operation, "get_all_flags");
	assert_eq!(events[0].context["path"], "recency_index");
}

#[tokio::test]
async fn get_all_flags_with_no_listing_path_is_empty() {
	let h = harness(Environment::Production);
	h.engine
		.create_flag(NewFlag::new("beta", true, "growth"))
		.await
		.unwrap();
	h.store
		.inject("list_flags", Fault::Fail(ErrorKind::ServiceUnavailable));
	h.store.inject(
		"list_flags_with_full_scan",
		Fault::Fail(ErrorKind::ServiceUnavailable),
	);

	let flags = h.engine.get_all_flags(&ctx("acme", "production")).await.unwrap();
	assert!(flags.is_empty());
	assert_eq!(h.errors.len(), 2);
}

#[tokio::test]
async fn get_all_flags_isolates_per_flag_failures() {
	let h = harness(Environment::Production);
	for key in ["alpha", "beta", "gamma"] {
		h.engine
			.create_flag(NewFlag::new(key, true, "growth"))
			.await
			.unwrap();
	}
	h.store
		.inject_for_flag("get_flag", "beta", Fault::Fail(ErrorKind::InternalServiceError));

	let flags = h.engine.get_all_flags(&ctx("acme", "production")).await.unwrap();
	assert!(flags["alpha"]);
	assert!(!flags["beta"]);
	assert!(flags["gamma"]);

	let events = h.errors.events();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0].flag_key.as_deref(), Some("beta"));
}

#[tokio::test]
async fn explain_reports_store_error_reason() {
	let h = harness(Environment::Production);
	h.store
		.inject("get_kill_switch", Fault::Fail(ErrorKind::AccessDenied));

	let r = h
		.engine
		.explain(&ctx("acme", "production"), "beta")
		.await
		.unwrap();
	assert!(!r.enabled);
	assert!(r.is_fail_closed());
	assert_eq!(
		r.reason,
		ResolutionReason::StoreError {
			kind: ErrorKind::AccessDenied
		}
	);
	assert_eq!(h.errors.events()[0].operation, "explain");
}

#[tokio::test]
async fn admin_failures_propagate_with_guidance() {
	let h = harness(Environment::Production);
	h.store
		.inject("set_tenant_override", Fault::Fail(ErrorKind::Throttled));

	let err = h
		.engine
		.set_tenant_override("acme", "beta", true, "admin")
		.await
		.unwrap_err();

	match &err {
		FlagsServerError::Store {
			operation,
			kind,
			guidance,
			retryable,
			source,
		} => {
			assert_eq!(*operation, "set_tenant_override");
			assert_eq!(*kind, ErrorKind::Throttled);
			assert!(*retryable);
			assert!(guidance.contains("backoff"));
			assert_eq!(source.kind, ErrorKind::Throttled);
		}
		other => panic!("unexpected error: {other:?}"),
	}

	let events = h.errors.events();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0].tenant_id.as_deref(), Some("acme"));
	assert_eq!(events[0].flag_key.as_deref(), Some("beta"));
}

#[tokio::test]
async fn failed_kill_switch_write_leaves_cache_alone() {
	let h = harness(Environment::Production);
	h.engine
		.create_flag(NewFlag::new("beta", true, "growth"))
		.await
		.unwrap();
	let c = ctx("acme", "production");
	assert!(h.engine.is_enabled(&c, "beta").await.unwrap());

	h.store
		.inject("set_kill_switch", Fault::Fail(ErrorKind::AccessDenied));
	let err = h
		.engine
		.set_kill_switch(switchboard_server::KillSwitchScope::Global, true, "incident", "oncall")
		.await
		.unwrap_err();
	assert_eq!(err.kind(), Some(ErrorKind::AccessDenied));
	assert!(err.to_string().contains("access policy"));
	assert_eq!(h.engine.cache().len(), 1);
}

struct PanickingHandler;

impl ErrorHandler for PanickingHandler {
	fn handle(&self, _error: &StructuredError) {
		panic!("sink exploded");
	}
}

#[tokio::test]
async fn panicking_handler_does_not_break_evaluation() {
	let store = Arc::new(common::FaultyStore::new());
	store.inject("get_kill_switch", Fault::Fail(ErrorKind::Unknown));
	let engine = switchboard_server::FlagEngine::new(
		EngineConfig::new(Environment::Production),
		store,
	)
	.with_error_handler(Arc::new(PanickingHandler));

	assert!(!engine
		.is_enabled(&ctx("acme", "production"), "beta")
		.await
		.unwrap());
}
