// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Content-addressed geometry cache bounded by total weight

use super::cache_key::CacheKey;
use crate::geometry::ExactSolid;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Default total weight (vertex count) of a cache
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Immutable cached result of an operator subtree
#[derive(Debug)]
pub struct CacheEntry {
    pub solid: Arc<ExactSolid>,
    /// Diagnostics emitted while computing the subtree
    pub messages: Vec<String>,
    pub weight: usize,
    /// Insertion order, used to evict the oldest of equally light entries
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_weight: usize,
    pub capacity: usize,
}

/// Insert-only cache of exact solids keyed by subtree content
pub struct GeometryCache {
    entries: DashMap<CacheKey, Arc<CacheEntry>>,
    capacity: usize,
    total_weight: AtomicUsize,
    seq: AtomicU64,
    write_lock: Mutex<()>,
}

impl Default for GeometryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl GeometryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            total_weight: AtomicUsize::new(0),
            seq: AtomicU64::new(0),
            write_lock: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Store a result under `key`.
    ///
    /// Returns false when the key is already present or the solid alone
    /// outweighs the whole cache. Other entries may be evicted to make room.
    pub fn insert(&self, key: CacheKey, solid: Arc<ExactSolid>, messages: Vec<String>) -> bool {
        let weight = solid.weight();
        if weight > self.capacity {
            debug!(?key, weight, capacity = self.capacity, "Result too heavy to cache");
            return false;
        }

        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.entries.contains_key(&key) {
            return false;
        }

        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            key,
            Arc::new(CacheEntry {
                solid,
                messages,
                weight,
                seq,
            }),
        );
        let total = self.total_weight.fetch_add(weight, Ordering::Relaxed) + weight;
        debug!(?key, weight, total, "Cached geometry");

        if total > self.capacity {
            self.evict(&key);
        }
        true
    }

    /// Drop lightest entries, oldest first, until the weight fits again
    fn evict(&self, keep: &CacheKey) {
        let mut candidates: Vec<(usize, u64, CacheKey)> = self
            .entries
            .iter()
            .filter(|entry| entry.key() != keep)
            .map(|entry| (entry.weight, entry.seq, *entry.key()))
            .collect();
        candidates.sort_unstable();

        for (weight, _, key) in candidates {
            if self.total_weight.load(Ordering::Relaxed) <= self.capacity {
                break;
            }
            if self.entries.remove(&key).is_some() {
                self.total_weight.fetch_sub(weight, Ordering::Relaxed);
                debug!(?key, weight, "Evicted cached geometry");
            }
        }
    }

    pub fn clear(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.entries.clear();
        self.total_weight.store(0, Ordering::Relaxed);
        debug!("Cleared geometry cache");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> usize {
        self.total_weight.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            total_weight: self.total_weight(),
            capacity: self.capacity,
        }
    }
}
