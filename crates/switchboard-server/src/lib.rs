// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant feature flag evaluation for Switchboard.
//!
//! This crate provides the flag stores, the in-process evaluation cache and
//! the engine that ties them together with fail-closed evaluation semantics.
//!
//! # Architecture
//!
//! - `engine` - Evaluation and administration for one environment
//! - `cache` - Sharded TTL cache of resolved booleans
//! - `store` - Store contract, key design, in-memory and SQLite stores
//! - `handler` - Sinks for structured failure events
//! - `guidance` - Operator guidance for failed administrative calls
//! - `logging` - Tracing subscriber setup
//!
//! # Example
//!
//! ```ignore
//! use switchboard_server::{EvaluationContext, FlagEngine, NewFlag};
//!
//! let config = switchboard_config::load_config()?;
//! let engine = FlagEngine::connect(&config).await?;
//! engine.create_flag(NewFlag::new("advanced_analytics", true, "analytics")).await?;
//!
//! let ctx = EvaluationContext::new("enterprise-corp", "production");
//! let enabled = engine.is_enabled(&ctx, "advanced_analytics").await?;
//! ```

pub mod cache;
pub mod engine;
pub mod error;
pub mod guidance;
pub mod handler;
pub mod logging;
pub mod store;

pub use cache::{CacheKey, EvaluationCache, Observation};
pub use engine::{EngineConfig, FlagEngine};
pub use error::{FlagsServerError, Result};
pub use guidance::{operational_message, GuidanceContext};
pub use handler::{CollectingErrorHandler, ErrorHandler, SilentErrorHandler, TracingErrorHandler};
pub use logging::init_tracing;
pub use store::{
	classify_sqlx_error, run_migrations, FlagStore, InMemoryFlagStore, SqliteFlagStore,
	MAX_BATCH_GET_KEYS,
};

// Re-export core types for convenience
pub use switchboard_core::*;
