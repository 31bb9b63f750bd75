// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enumerations stored as int32 ordinals.

use crate::error::{BlobError, Result};
use std::collections::BTreeMap;

/// Label reserved for ordinal 0 and for unmapped ordinals.
pub const UNDEFINED_LABEL: &str = "undefined";

/// Ordinal reserved for [`UNDEFINED_LABEL`].
pub const UNDEFINED_ORDINAL: i32 = 0;

/// Enum descriptor with a bidirectional ordinal/label mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    name: String,
    labels: BTreeMap<i32, String>,
}

impl EnumDescriptor {
    /// Create an enum from `(ordinal, label)` pairs.
    ///
    /// Ordinal 0 and the `undefined` label are reserved; labels and ordinals
    /// must be unique.
    pub fn new<I, S>(name: impl Into<String>, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i32, S)>,
        S: Into<String>,
    {
        let name = name.into();
        let mut map = BTreeMap::new();
        for (ordinal, label) in labels {
            let label = label.into();
            if ordinal == UNDEFINED_ORDINAL || label == UNDEFINED_LABEL || label.is_empty() {
                return Err(BlobError::InvalidSchema(format!(
                    "enum '{name}': ordinal 0 and the '{UNDEFINED_LABEL}' label are reserved"
                )));
            }
            if map.values().any(|l| *l == label) {
                return Err(BlobError::InvalidSchema(format!(
                    "enum '{name}': duplicate label '{label}'"
                )));
            }
            if map.insert(ordinal, label).is_some() {
                return Err(BlobError::InvalidSchema(format!(
                    "enum '{name}': duplicate ordinal {ordinal}"
                )));
            }
        }
        Ok(Self { name, labels: map })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared `(ordinal, label)` pairs in ordinal order.
    pub fn labels(&self) -> impl Iterator<Item = (i32, &str)> {
        self.labels.iter().map(|(o, l)| (*o, l.as_str()))
    }

    /// Resolve an ordinal to its label.
    ///
    /// With `suppress` set, ordinal 0 and unmapped ordinals resolve to
    /// `undefined` instead of failing.
    pub fn ordinal_to_label(&self, ordinal: i64, suppress: bool) -> Result<&str> {
        let found = i32::try_from(ordinal)
            .ok()
            .and_then(|o| self.labels.get(&o))
            .map(String::as_str);
        match found {
            Some(label) => Ok(label),
            None if suppress => Ok(UNDEFINED_LABEL),
            None => Err(BlobError::UnknownEnumOrdinal {
                enum_name: self.name.clone(),
                ordinal,
            }),
        }
    }

    /// Resolve a label to its ordinal. `undefined` maps to 0.
    pub fn label_to_ordinal(&self, label: &str) -> Result<i32> {
        if label == UNDEFINED_LABEL {
            return Ok(UNDEFINED_ORDINAL);
        }
        self.labels
            .iter()
            .find(|(_, l)| l.as_str() == label)
            .map(|(o, _)| *o)
            .ok_or_else(|| BlobError::UnknownEnumLabel {
                enum_name: self.name.clone(),
                label: label.to_string(),
            })
    }
}

/// Fluent builder for [`EnumDescriptor`]. Ordinals auto-increment from 1.
#[derive(Debug)]
pub struct EnumBuilder {
    name: String,
    labels: Vec<(i32, String)>,
    next: i32,
}

impl EnumBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Vec::new(),
            next: 1,
        }
    }

    /// Add a label with the next free ordinal.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push((self.next, label.into()));
        self.next += 1;
        self
    }

    /// Add a label with an explicit ordinal; subsequent labels continue from it.
    pub fn label_with_ordinal(mut self, label: impl Into<String>, ordinal: i32) -> Self {
        self.labels.push((ordinal, label.into()));
        self.next = ordinal.saturating_add(1);
        self
    }

    pub fn build(self) -> Result<EnumDescriptor> {
        EnumDescriptor::new(self.name, self.labels)
    }
}
