// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for record descriptors.

use super::{FieldDescriptor, ScalarKind, TypeDescriptor, INDEX_FIELD, NEXT_FIELD};
use crate::error::Result;
use crate::naming::join;
use crate::vector::VECTOR_COMPONENTS;
use std::sync::Arc;

/// Builder for record [`TypeDescriptor`]s.
#[derive(Debug)]
pub struct RecordBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl RecordBuilder {
    /// Create a new builder for a record type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a scalar field.
    pub fn scalar(mut self, name: impl Into<String>, kind: ScalarKind) -> Self {
        let type_desc = Arc::new(TypeDescriptor::scalar(kind));
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    /// Add a field with a type descriptor (enum, record or array).
    pub fn field(mut self, name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    /// Add the int32 sentinel index field required by array elements.
    pub fn index_field(self) -> Self {
        self.scalar(INDEX_FIELD, ScalarKind::Int32)
    }

    /// Add the int32 link field used by linked-list elements.
    pub fn next_field(self) -> Self {
        self.scalar(NEXT_FIELD, ScalarKind::Int32)
    }

    /// Add `components` scalar fields named `<stem>_x`, `<stem>_y`, ...
    pub fn vector(mut self, stem: &str, kind: ScalarKind, components: usize) -> Self {
        for component in VECTOR_COMPONENTS[0].iter().take(components) {
            self = self.scalar(join(stem, component), kind);
        }
        self
    }

    /// Build the record descriptor.
    pub fn build(self) -> Result<TypeDescriptor> {
        TypeDescriptor::record(self.name, self.fields)
    }
}
