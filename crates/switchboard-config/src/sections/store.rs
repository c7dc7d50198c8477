// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flag store configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_MS: u64 = 1000;

fn default_database_url() -> String {
	"sqlite::memory:".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreConfigLayer {
	pub timeout_ms: Option<u64>,
	pub database_url: Option<String>,
}

impl StoreConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.timeout_ms.is_some() {
			self.timeout_ms = other.timeout_ms;
		}
		if other.database_url.is_some() {
			self.database_url = other.database_url;
		}
	}

	pub fn finalize(self) -> StoreConfig {
		StoreConfig {
			timeout: Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
			database_url: self.database_url.unwrap_or_else(default_database_url),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
	/// Deadline applied to every store call.
	pub timeout: Duration,
	pub database_url: String,
}

impl Default for StoreConfig {
	fn default() -> Self {
		StoreConfigLayer::default().finalize()
	}
}
