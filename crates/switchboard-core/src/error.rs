// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage-agnostic failure taxonomy.
//!
//! Every failure surfaced by a flag store is reduced to one [`ErrorKind`].
//! Callers decide what to do from the kind alone (retry, fail closed, or
//! report to an operator) without knowing which storage engine produced it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
	NotFound,
	Validation,
	ConditionalCheckFailed,
	AccessDenied,
	Throttled,
	ResourceOrTableInUse,
	LimitExceeded,
	InternalServiceError,
	ServiceUnavailable,
	Unknown,
}

impl ErrorKind {
	pub const ALL: [ErrorKind; 10] = [
		ErrorKind::NotFound,
		ErrorKind::Validation,
		ErrorKind::ConditionalCheckFailed,
		ErrorKind::AccessDenied,
		ErrorKind::Throttled,
		ErrorKind::ResourceOrTableInUse,
		ErrorKind::LimitExceeded,
		ErrorKind::InternalServiceError,
		ErrorKind::ServiceUnavailable,
		ErrorKind::Unknown,
	];

	/// Transient failures worth retrying with backoff.
	pub fn is_retryable(&self) -> bool {
		matches!(
			self,
			ErrorKind::Throttled | ErrorKind::InternalServiceError | ErrorKind::ServiceUnavailable
		)
	}

	/// Failures caused by the request itself. Retrying will not help.
	pub fn is_client_error(&self) -> bool {
		!self.is_retryable()
	}

	/// Maps an HTTP-style status code reported by a remote store.
	pub fn from_status_code(status: u16) -> Self {
		match status {
			400 => ErrorKind::Validation,
			401 | 403 => ErrorKind::AccessDenied,
			404 => ErrorKind::NotFound,
			409 | 412 => ErrorKind::ConditionalCheckFailed,
			413 => ErrorKind::LimitExceeded,
			423 => ErrorKind::ResourceOrTableInUse,
			429 => ErrorKind::Throttled,
			500 => ErrorKind::InternalServiceError,
			502..=504 => ErrorKind::ServiceUnavailable,
			_ => ErrorKind::Unknown,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::NotFound => "NotFound",
			ErrorKind::Validation => "Validation",
			ErrorKind::ConditionalCheckFailed => "ConditionalCheckFailed",
			ErrorKind::AccessDenied => "AccessDenied",
			ErrorKind::Throttled => "Throttled",
			ErrorKind::ResourceOrTableInUse => "ResourceOrTableInUse",
			ErrorKind::LimitExceeded => "LimitExceeded",
			ErrorKind::InternalServiceError => "InternalServiceError",
			ErrorKind::ServiceUnavailable => "ServiceUnavailable",
			ErrorKind::Unknown => "Unknown",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A classified failure returned by a flag store.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct StoreError {
	pub kind: ErrorKind,
	pub message: String,
	pub status_code: Option<u16>,
	#[source]
	pub source: Option<BoxError>,
}

impl StoreError {
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
			status_code: None,
			source: None,
		}
	}

	pub fn with_status_code(mut self, status: u16) -> Self {
		self.status_code = Some(status);
		self
	}

	pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
		self.source = Some(Box::new(source));
		self
	}

	/// Classifies a failure from its status code.
	pub fn from_status(status: u16, message: impl Into<String>) -> Self {
		Self::new(ErrorKind::from_status_code(status), message).with_status_code(status)
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::NotFound, message)
	}

	pub fn validation(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::Validation, message)
	}

	pub fn conditional_check_failed(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::ConditionalCheckFailed, message)
	}

	pub fn service_unavailable(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::ServiceUnavailable, message)
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::InternalServiceError, message)
	}

	/// A store call that exceeded its deadline.
	pub fn timeout(operation: &str, after: std::time::Duration) -> Self {
		Self::new(
			ErrorKind::ServiceUnavailable,
			format!("{operation} timed out after {}ms", after.as_millis()),
		)
	}

	pub fn is_retryable(&self) -> bool {
		self.kind.is_retryable()
	}

	pub fn is_client_error(&self) -> bool {
		self.kind.is_client_error()
	}
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
