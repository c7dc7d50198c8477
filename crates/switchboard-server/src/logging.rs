// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use switchboard_config::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(
	logging: &LoggingConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

	match logging.format {
		LogFormat::Json => tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().json())
			.try_init(),
		LogFormat::Compact => tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().compact())
			.try_init(),
		LogFormat::Pretty => tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().pretty())
			.try_init(),
	}
}
