// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod cache;
mod environments;
mod logging;
mod store;

pub use cache::{CacheConfig, CacheConfigLayer};
pub use environments::{
	AuditLevel, EnvironmentConfig, EnvironmentConfigLayer, EnvironmentsConfig,
	EnvironmentsConfigLayer, OverridePolicy,
};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use store::{StoreConfig, StoreConfigLayer};
