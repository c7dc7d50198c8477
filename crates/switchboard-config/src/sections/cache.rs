// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Evaluation cache configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_TTL_SECS: u64 = 300;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CacheConfigLayer {
	pub ttl_secs: Option<u64>,
	pub sweep_interval_secs: Option<u64>,
}

impl CacheConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.ttl_secs.is_some() {
			self.ttl_secs = other.ttl_secs;
		}
		if other.sweep_interval_secs.is_some() {
			self.sweep_interval_secs = other.sweep_interval_secs;
		}
	}

	pub fn finalize(self) -> CacheConfig {
		CacheConfig {
			ttl: Duration::from_secs(self.ttl_secs.unwrap_or(DEFAULT_TTL_SECS)),
			sweep_interval: Duration::from_secs(
				self
					.sweep_interval_secs
					.unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
			),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
	/// Requested TTL. Clamped by the environment's ceiling, see
	/// `FlagsConfig::effective_cache_ttl`. Zero disables caching.
	pub ttl: Duration,
	/// Zero disables the background sweep; expired entries are then only
	/// dropped lazily on read.
	pub sweep_interval: Duration,
}

impl Default for CacheConfig {
	fn default() -> Self {
		CacheConfigLayer::default().finalize()
	}
}
