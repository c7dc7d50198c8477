// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Switchboard tenant feature flags system.
//!
//! This crate provides the shared vocabulary used by configuration loading
//! (`switchboard-config`) and the evaluation engine and stores
//! (`switchboard-server`).
//!
//! # Overview
//!
//! - Boolean flags defined per environment (development, staging, production)
//! - Tenant overrides layered above each flag's default
//! - Kill switches, global or per flag, that force flags off
//! - A storage-agnostic error taxonomy with retry classification
//!
//! # Example
//!
//! ```
//! use switchboard_core::{EvaluationContext, ErrorKind, KillSwitchScope, NewFlag};
//!
//! let ctx = EvaluationContext::new("enterprise-corp", "production")
//!     .with_plan("enterprise");
//!
//! let flag = NewFlag::new("advanced_analytics", true, "analytics-team");
//! let scope = KillSwitchScope::flag("advanced_analytics");
//!
//! assert!(ErrorKind::Throttled.is_retryable());
//! assert!(ErrorKind::ConditionalCheckFailed.is_client_error());
//! ```

pub mod environment;
pub mod error;
pub mod evaluation;
pub mod flag;
pub mod kill_switch;
pub mod structured;
pub mod tenant_override;

pub use environment::{Environment, UnknownEnvironment};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use evaluation::{EvaluationContext, Resolution, ResolutionReason};
pub use flag::{
	validate_owner, validate_tenant_id, FlagDefinition, FlagUpdate, NewFlag, KEY_DELIMITER,
};
pub use kill_switch::{EmergencyControl, KillSwitchScope};
pub use structured::StructuredError;
pub use tenant_override::TenantOverride;
