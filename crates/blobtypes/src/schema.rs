// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON schema documents.
//!
//! ```json
//! { "types": [
//!   { "kind": "enum", "name": "State", "labels": { "1": "idle", "2": "moving" } },
//!   { "kind": "record", "name": "Particle", "fields": [
//!     { "name": "index", "type": "int32" },
//!     { "name": "position", "type": "float32", "components": 3 },
//!     { "name": "state", "type": "State" } ] },
//!   { "kind": "array", "name": "Particles", "element": "Particle" }
//! ] }
//! ```
//!
//! Types resolve in declaration order: a field may only name a scalar kind
//! or a type declared above it.

use crate::error::{BlobError, Result};
use crate::naming::join;
use crate::types::{EnumDescriptor, FieldDescriptor, TypeDescriptor, TypeRegistry};
use crate::vector::VECTOR_COMPONENTS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Parsed schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub types: Vec<TypeSpec>,
}

/// One declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeSpec {
    Enum {
        name: String,
        /// Ordinal (as a decimal string key) to label.
        labels: BTreeMap<String, String>,
    },
    Record {
        name: String,
        fields: Vec<FieldSpec>,
    },
    Array {
        name: String,
        element: String,
    },
}

impl TypeSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Enum { name, .. } | Self::Record { name, .. } | Self::Array { name, .. } => name,
        }
    }
}

/// A record field. With `components` set, the field expands into a vector
/// group `<name>_x`, `<name>_y`, ... of the given scalar type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<usize>,
}

impl Schema {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BlobError::InvalidSchema(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolve every declaration into a registry.
    pub fn into_registry(self) -> Result<TypeRegistry> {
        let mut registry = TypeRegistry::new();
        for spec in self.types {
            let desc = match spec {
                TypeSpec::Enum { name, labels } => {
                    let labels = parse_ordinals(&name, labels)?;
                    TypeDescriptor::enumeration(EnumDescriptor::new(name, labels)?)
                }
                TypeSpec::Record { name, fields } => {
                    let mut resolved = Vec::with_capacity(fields.len());
                    for field in fields {
                        expand_field(&registry, &name, field, &mut resolved)?;
                    }
                    TypeDescriptor::record(name, resolved)?
                }
                TypeSpec::Array { name, element } => {
                    TypeDescriptor::array(name, lookup(&registry, &element)?)?
                }
            };
            log::debug!("[schema] registered {}", desc.name());
            registry.register(desc)?;
        }
        Ok(registry)
    }
}

/// Load and resolve a schema file.
pub fn load_registry(path: &Path) -> Result<TypeRegistry> {
    Schema::from_file(path)?.into_registry()
}

fn parse_ordinals(name: &str, labels: BTreeMap<String, String>) -> Result<Vec<(i32, String)>> {
    labels
        .into_iter()
        .map(|(ordinal, label)| {
            let ordinal = ordinal.trim().parse::<i32>().map_err(|_| {
                BlobError::InvalidSchema(format!("enum '{name}': bad ordinal '{ordinal}'"))
            })?;
            Ok((ordinal, label))
        })
        .collect()
}

fn expand_field(
    registry: &TypeRegistry,
    record: &str,
    field: FieldSpec,
    out: &mut Vec<FieldDescriptor>,
) -> Result<()> {
    let type_desc = lookup(registry, &field.type_name)?;
    let Some(components) = field.components else {
        out.push(FieldDescriptor::new(field.name, type_desc));
        return Ok(());
    };

    if type_desc.enum_descriptor().is_some() || type_desc.fields().is_some() {
        return Err(BlobError::InvalidSchema(format!(
            "'{record}.{}': vector components must be scalar",
            field.name
        )));
    }
    if !(2..=VECTOR_COMPONENTS[0].len()).contains(&components) {
        return Err(BlobError::InvalidSchema(format!(
            "'{record}.{}': {components} vector components (2..=4)",
            field.name
        )));
    }
    for component in &VECTOR_COMPONENTS[0][..components] {
        out.push(FieldDescriptor::new(
            join(&field.name, component),
            Arc::clone(&type_desc),
        ));
    }
    Ok(())
}

fn lookup(registry: &TypeRegistry, name: &str) -> Result<Arc<TypeDescriptor>> {
    registry.get(name).ok_or_else(|| {
        BlobError::InvalidSchema(format!("type '{name}' is referenced before it is declared"))
    })
}
