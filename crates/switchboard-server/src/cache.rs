// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process TTL cache of resolved flag values.
//!
//! Entries are keyed by (environment, tenant, flag) and hold only the
//! resolved boolean. The map is sharded so unrelated keys never contend on
//! one lock.
//!
//! Invalidation is generation based. Every invalidation bumps a counter and
//! leaves a marker: a tombstone for one key, a per-flag watermark for a flag,
//! or a global watermark for `clear`. An evaluation takes an [`Observation`]
//! before it reads the store and writes through [`EvaluationCache::insert_if_current`],
//! so a result resolved before an invalidation can never become visible
//! after it.
//!
//! A tombstone lives one TTL from the invalidation. The value it blocks
//! expires one TTL from the observation, which is earlier, so the value is
//! already dead by the time the tombstone is reclaimed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use switchboard_core::Environment;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
	pub environment: Environment,
	pub tenant_id: String,
	pub flag_key: String,
}

impl CacheKey {
	pub fn new(
		environment: Environment,
		tenant_id: impl Into<String>,
		flag_key: impl Into<String>,
	) -> Self {
		Self {
			environment,
			tenant_id: tenant_id.into(),
			flag_key: flag_key.into(),
		}
	}
}

/// Cache state recorded before an evaluation reads the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
	generation: u64,
	at: Instant,
}

impl Observation {
	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn at(&self) -> Instant {
		self.at
	}
}

#[derive(Debug, Clone, Copy)]
enum Slot {
	Value {
		value: bool,
		expires_at: Instant,
		generation: u64,
	},
	Invalidated {
		generation: u64,
		expires_at: Instant,
	},
}

impl Slot {
	fn expires_at(&self) -> Instant {
		match self {
			Slot::Value { expires_at, .. } | Slot::Invalidated { expires_at, .. } => *expires_at,
		}
	}

	fn generation(&self) -> u64 {
		match self {
			Slot::Value { generation, .. } | Slot::Invalidated { generation, .. } => *generation,
		}
	}
}

#[derive(Debug)]
pub struct EvaluationCache {
	entries: DashMap<CacheKey, Slot>,
	flag_watermarks: DashMap<(Environment, String), u64>,
	ttl: Duration,
	generation: AtomicU64,
	cleared_at: AtomicU64,
}

impl EvaluationCache {
	/// A zero TTL disables caching entirely.
	pub fn new(ttl: Duration) -> Self {
		Self {
			entries: DashMap::new(),
			flag_watermarks: DashMap::new(),
			ttl,
			generation: AtomicU64::new(0),
			cleared_at: AtomicU64::new(0),
		}
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	pub fn is_enabled(&self) -> bool {
		!self.ttl.is_zero()
	}

	/// Current invalidation generation.
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Take this before reading the store and hand it to `insert_if_current`.
	pub fn observe(&self) -> Observation {
		Observation {
			generation: self.generation(),
			at: Instant::now(),
		}
	}

	/// Returns the cached value, or `None` when absent, expired or invalidated.
	pub fn get(&self, key: &CacheKey) -> Option<bool> {
		let now = Instant::now();
		let slot = *self.entries.get(key)?;

		if slot.expires_at() <= now {
			self
				.entries
				.remove_if(key, |_, s| s.expires_at() <= now);
			return None;
		}

		match slot {
			Slot::Value {
				value, generation, ..
			} if self.is_visible(key, generation) => Some(value),
			_ => None,
		}
	}

	/// Inserts or overwrites unconditionally.
	pub fn set(&self, key: CacheKey, value: bool) {
		if !self.is_enabled() {
			return;
		}
		let generation = self.generation();
		self.entries.insert(
			key,
			Slot::Value {
				value,
				expires_at: Instant::now() + self.ttl,
				generation,
			},
		);
	}

	/// Inserts a value resolved after `observed` was taken.
	///
	/// The entry expires one TTL after the observation, not after the insert.
	/// Discarded when any invalidation covering the key happened after
	/// `observed` or when the value would already be expired. Returns whether
	/// the value was stored.
	pub fn insert_if_current(&self, key: CacheKey, value: bool, observed: Observation) -> bool {
		let expires_at = observed.at + self.ttl;
		if !self.is_enabled() || expires_at <= Instant::now() {
			return false;
		}
		let observed = observed.generation;
		if !self.is_visible(&key, observed) {
			return false;
		}

		let slot = Slot::Value {
			value,
			expires_at,
			generation: observed,
		};

		match self.entries.entry(key) {
			Entry::Occupied(mut entry) => {
				if entry.get().generation() > observed {
					return false;
				}
				entry.insert(slot);
			}
			Entry::Vacant(entry) => {
				entry.insert(slot);
			}
		}
		true
	}

	/// Removes one entry and blocks older in-flight writes for it.
	pub fn invalidate(&self, key: &CacheKey) {
		let generation = self.bump();
		if !self.is_enabled() {
			return;
		}
		self.entries.insert(
			key.clone(),
			Slot::Invalidated {
				generation,
				expires_at: Instant::now() + self.ttl,
			},
		);
	}

	/// Removes every tenant's entry for one flag.
	pub fn invalidate_flag(&self, environment: Environment, flag_key: &str) {
		let generation = self.bump();
		self
			.flag_watermarks
			.insert((environment, flag_key.to_string()), generation);
		self
			.entries
			.retain(|k, _| !(k.environment == environment && k.flag_key == flag_key));
	}

	/// Removes everything.
	pub fn clear(&self) {
		let generation = self.bump();
		self.cleared_at.fetch_max(generation, Ordering::AcqRel);
		self.entries.clear();
		self.flag_watermarks.clear();
	}

	/// Drops expired entries and tombstones. Returns how many were removed.
	pub fn purge_expired(&self) -> usize {
		let now = Instant::now();
		let before = self.entries.len();
		self.entries.retain(|_, slot| slot.expires_at() > now);
		before.saturating_sub(self.entries.len())
	}

	/// Number of live cached values.
	pub fn len(&self) -> usize {
		let now = Instant::now();
		self
			.entries
			.iter()
			.filter(|e| matches!(*e.value(), Slot::Value { expires_at, .. } if expires_at > now))
			.count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Periodically reclaims expired entries. The task ends once the cache
	/// is dropped.
	pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
		let cache: Weak<Self> = Arc::downgrade(self);
		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			ticker.tick().await;

			loop {
				ticker.tick().await;
				let Some(cache) = cache.upgrade() else {
					break;
				};
				let removed = cache.purge_expired();
				if removed > 0 {
					debug!(removed, "swept expired cache entries");
				}
			}
		})
	}

	fn bump(&self) -> u64 {
		self.generation.fetch_add(1, Ordering::AcqRel) + 1
	}

	fn is_visible(&self, key: &CacheKey, generation: u64) -> bool {
		if generation < self.cleared_at.load(Ordering::Acquire) {
			return false;
		}
		if self.flag_watermarks.is_empty() {
			return true;
		}
		match self
			.flag_watermarks
			.get(&(key.environment, key.flag_key.clone()))
		{
			Some(mark) => generation >= *mark,
			None => true,
		}
	}
}
