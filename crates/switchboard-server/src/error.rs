// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use switchboard_config::ConfigError;
use switchboard_core::{ErrorKind, StoreError};
use thiserror::Error;

/// Errors returned by the flag engine.
///
/// Evaluation never returns `Store`; store failures on that path are reported
/// to the error handler and resolve to `false`.
#[derive(Debug, Error)]
pub enum FlagsServerError {
	#[error("environment mismatch: expected {expected}, got {actual}")]
	EnvironmentMismatch { expected: String, actual: String },

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("{operation} failed ({kind}): {guidance}")]
	Store {
		operation: &'static str,
		kind: ErrorKind,
		guidance: String,
		retryable: bool,
		#[source]
		source: StoreError,
	},

	#[error(transparent)]
	Config(#[from] ConfigError),
}

impl FlagsServerError {
	/// Classification of the underlying failure, if it came from the store.
	pub fn kind(&self) -> Option<ErrorKind> {
		match self {
			FlagsServerError::Store { kind, .. } => Some(*kind),
			FlagsServerError::InvalidInput(_) => Some(ErrorKind::Validation),
			_ => None,
		}
	}

	pub fn is_retryable(&self) -> bool {
		matches!(self, FlagsServerError::Store { retryable: true, .. })
	}

	pub fn is_environment_mismatch(&self) -> bool {
		matches!(self, FlagsServerError::EnvironmentMismatch { .. })
	}
}

pub type Result<T> = std::result::Result<T, FlagsServerError>;
