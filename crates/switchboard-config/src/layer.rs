// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	CacheConfigLayer, EnvironmentsConfigLayer, LoggingConfigLayer, StoreConfigLayer,
};

/// Flags configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlagsConfigLayer {
	/// Active environment name as written in the source. Parsed at finalize.
	#[serde(default)]
	pub environment: Option<String>,
	#[serde(default)]
	pub environments: Option<EnvironmentsConfigLayer>,
	#[serde(default)]
	pub cache: Option<CacheConfigLayer>,
	#[serde(default)]
	pub store: Option<StoreConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl FlagsConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: FlagsConfigLayer) {
		if other.environment.is_some() {
			self.environment = other.environment;
		}
		merge_option(
			&mut self.environments,
			other.environments,
			EnvironmentsConfigLayer::merge,
		);
		merge_option(&mut self.cache, other.cache, CacheConfigLayer::merge);
		merge_option(&mut self.store, other.store, StoreConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = FlagsConfigLayer::default();
		base.merge(FlagsConfigLayer::default());
		assert!(base.environment.is_none());
		assert!(base.cache.is_none());
	}

	#[test]
	fn test_merge_takes_other_environment() {
		let mut base = FlagsConfigLayer {
			environment: Some("staging".to_string()),
			..Default::default()
		};
		base.merge(FlagsConfigLayer {
			environment: Some("production".to_string()),
			..Default::default()
		});
		assert_eq!(base.environment.as_deref(), Some("production"));
	}

	#[test]
	fn test_merge_keeps_fields_absent_in_other() {
		let mut base = FlagsConfigLayer {
			cache: Some(CacheConfigLayer {
				ttl_secs: Some(60),
				sweep_interval_secs: None,
			}),
			..Default::default()
		};
		base.merge(FlagsConfigLayer {
			cache: Some(CacheConfigLayer {
				ttl_secs: None,
				sweep_interval_secs: Some(5),
			}),
			..Default::default()
		});
		let cache = base.cache.unwrap();
		assert_eq!(cache.ttl_secs, Some(60));
		assert_eq!(cache.sweep_interval_secs, Some(5));
	}

	#[test]
	fn test_deserialize_full_document() {
		let toml_str = r#"
environment = "production"

[environments.production]
namespace = "prod-flags"

[cache]
ttl_secs = 120

[store]
timeout_ms = 500

[logging]
level = "debug"
format = "json"
"#;
		let layer: FlagsConfigLayer = toml::from_str(toml_str).unwrap();
		assert_eq!(layer.environment.as_deref(), Some("production"));
		assert_eq!(layer.cache.unwrap().ttl_secs, Some(120));
		assert_eq!(layer.store.unwrap().timeout_ms, Some(500));
		assert!(layer.environments.unwrap().0.contains_key("production"));
	}

	mod proptests {
		use super::*;
		use proptest::prelude::*;

		fn cache_layer(ttl: Option<u64>, sweep: Option<u64>) -> Option<CacheConfigLayer> {
			Some(CacheConfigLayer {
				ttl_secs: ttl,
				sweep_interval_secs: sweep,
			})
		}

		proptest! {
			#[test]
			fn later_present_values_win(
				base_ttl in proptest::option::of(1u64..10_000),
				other_ttl in proptest::option::of(1u64..10_000),
				base_sweep in proptest::option::of(1u64..600),
				other_sweep in proptest::option::of(1u64..600),
			) {
				let mut base = FlagsConfigLayer {
					cache: cache_layer(base_ttl, base_sweep),
					..Default::default()
				};
				base.merge(FlagsConfigLayer {
					cache: cache_layer(other_ttl, other_sweep),
					..Default::default()
				});

				let cache = base.cache.unwrap();
				prop_assert_eq!(cache.ttl_secs, other_ttl.or(base_ttl));
				prop_assert_eq!(cache.sweep_interval_secs, other_sweep.or(base_sweep));
			}

			#[test]
			fn merging_empty_layer_is_identity(env in "[a-z]{1,12}", ttl in 1u64..10_000) {
				let mut base = FlagsConfigLayer {
					environment: Some(env.clone()),
					cache: cache_layer(Some(ttl), None),
					..Default::default()
				};
				base.merge(FlagsConfigLayer::default());
				prop_assert_eq!(base.environment, Some(env));
				prop_assert_eq!(base.cache.unwrap().ttl_secs, Some(ttl));
			}
		}
	}
}
