// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent memoization of compiled layouts.
//!
//! The cache is owned by the caller and shared through `Arc`. Two threads
//! may race to build the same key; both compute an identical layout and
//! the last insert wins, so no lock is held while building.

use super::{Layout, Params};
use crate::error::Result;
use crate::types::TypeDescriptor;
use crate::vector::LayoutMode;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies a layout: type identity, layout mode and sorted parameters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayoutKey {
    type_name: Arc<str>,
    fingerprint: u32,
    mode: LayoutMode,
    params: Vec<(String, i64)>,
}

impl LayoutKey {
    /// `params` must already be reduced to the parameters `ty` requires.
    pub fn new(ty: &TypeDescriptor, mode: LayoutMode, params: &Params) -> Self {
        Self {
            type_name: Arc::from(ty.name()),
            fingerprint: ty.fingerprint(),
            mode,
            params: params.iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LookupStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// DashMap-backed layout cache.
#[derive(Debug, Default)]
pub struct LayoutCache {
    entries: DashMap<LayoutKey, Arc<Layout>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached layout for `key`, if any.
    pub fn get(&self, key: &LayoutKey) -> Option<Arc<Layout>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Return the cached layout or build and insert it.
    pub fn get_or_try_build<F>(&self, key: LayoutKey, build: F) -> Result<Arc<Layout>>
    where
        F: FnOnce() -> Result<Layout>,
    {
        let cached = self.get(&key);
        if let Some(layout) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::trace!("[layout] cache hit for {}", key.type_name());
            return Ok(layout);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let layout = Arc::new(build()?);
        log::debug!(
            "[layout] compiled {} ({} bytes, params: {})",
            key.type_name(),
            layout.size(),
            layout.params()
        );
        self.entries.insert(key, Arc::clone(&layout));
        Ok(layout)
    }

    pub fn stats(&self) -> LookupStats {
        LookupStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Only needed when the schema itself changes.
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
