// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Name-indexed registry of type descriptors.

use super::{ScalarKind, TypeDescriptor};
use crate::error::{BlobError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Simple [`HashMap`]-backed registry that remembers registration order.
///
/// Scalar kinds resolve by their schema names without registration.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<TypeDescriptor>>,
    order: Vec<String>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its own name.
    pub fn register(&mut self, desc: TypeDescriptor) -> Result<Arc<TypeDescriptor>> {
        let name = desc.name().to_string();
        if ScalarKind::from_schema_name(&name).is_some() || self.types.contains_key(&name) {
            return Err(BlobError::InvalidSchema(format!(
                "type '{name}' is already defined"
            )));
        }
        let desc = Arc::new(desc);
        self.types.insert(name.clone(), Arc::clone(&desc));
        self.order.push(name);
        Ok(desc)
    }

    /// Look up a registered type or a scalar kind by name.
    pub fn get(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        if let Some(kind) = ScalarKind::from_schema_name(name) {
            return Some(Arc::new(TypeDescriptor::scalar(kind)));
        }
        self.types.get(name).cloned()
    }

    /// Like [`get`](Self::get) but fails with `UnsupportedType`.
    pub fn resolve(&self, name: &str) -> Result<Arc<TypeDescriptor>> {
        self.get(name)
            .ok_or_else(|| BlobError::UnsupportedType(name.to_string()))
    }

    /// Registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.order.iter().filter_map(|name| self.types.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
