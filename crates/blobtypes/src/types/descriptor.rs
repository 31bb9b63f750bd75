// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for blob layouts.

use super::{EnumDescriptor, ScalarKind};
use crate::error::{BlobError, Result};
use crate::naming::join;
use std::collections::HashSet;
use std::sync::Arc;

/// Sentinel index field every array element must start with.
pub const INDEX_FIELD: &str = "index";

/// Link field of linked-list elements.
pub const NEXT_FIELD: &str = "next";

/// Parameter naming an array's own capacity.
pub const CAPACITY_PARAM: &str = "capacity";

/// Prefix scoping an array element's parameters.
pub const ITEM_PREFIX: &str = "item";

/// Index value marking an empty array slot.
pub const EMPTY_SLOT: i32 = -1;

/// Type kind enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Fixed-width numeric leaf.
    Scalar(ScalarKind),
    /// Enumeration stored as int32.
    Enum(Arc<EnumDescriptor>),
    /// Record with ordered named fields.
    Record(Vec<FieldDescriptor>),
    /// Dynamic array with a runtime capacity.
    Array(ArrayDescriptor),
}

/// A named record field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_desc: Arc<TypeDescriptor>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            type_desc,
        }
    }

    /// Scalar kind of the field, if it is a scalar.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.type_desc.kind() {
            TypeKind::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Array element description.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDescriptor {
    pub element: Arc<TypeDescriptor>,
}

/// A complete, immutable type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    fingerprint: u32,
    plain: bool,
}

impl TypeDescriptor {
    /// Scalar leaf named after its kind.
    pub fn scalar(kind: ScalarKind) -> Self {
        let name = kind.schema_name().to_string();
        Self {
            fingerprint: compute_fingerprint(&format!("scalar {name}")),
            name,
            kind: TypeKind::Scalar(kind),
            plain: true,
        }
    }

    /// Enumeration named after its descriptor.
    pub fn enumeration(desc: EnumDescriptor) -> Self {
        let mut signature = format!("enum {}{{", desc.name());
        for (ordinal, label) in desc.labels() {
            signature.push_str(&format!("{ordinal}={label},"));
        }
        signature.push('}');
        Self {
            name: desc.name().to_string(),
            fingerprint: compute_fingerprint(&signature),
            kind: TypeKind::Enum(Arc::new(desc)),
            plain: true,
        }
    }

    /// Record with the given ordered fields.
    pub fn record(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(BlobError::InvalidSchema("record without a name".into()));
        }
        if fields.is_empty() {
            return Err(BlobError::InvalidSchema(format!(
                "record '{name}' has no fields"
            )));
        }
        let mut seen = HashSet::new();
        let mut signature = format!("record {name}{{");
        for field in &fields {
            if field.name.is_empty() || !seen.insert(field.name.as_str()) {
                return Err(BlobError::InvalidSchema(format!(
                    "record '{name}' has an empty or duplicate field name '{}'",
                    field.name
                )));
            }
            signature.push_str(&format!(
                "{}:{:08x},",
                field.name,
                field.type_desc.fingerprint()
            ));
        }
        signature.push('}');
        let plain = fields.iter().all(|f| f.type_desc.is_plain());
        let desc = Self {
            fingerprint: compute_fingerprint(&signature),
            name,
            kind: TypeKind::Record(fields),
            plain,
        };

        let mut params = HashSet::new();
        if let Some(collision) = desc
            .parameter_names()
            .into_iter()
            .find(|p| !params.insert(p.clone()))
        {
            return Err(BlobError::InvalidSchema(format!(
                "record '{}' has two arrays sharing the parameter '{collision}'",
                desc.name
            )));
        }
        Ok(desc)
    }

    /// Array of `element` records. The element must start with an int32
    /// `index` field.
    pub fn array(name: impl Into<String>, element: Arc<TypeDescriptor>) -> Result<Self> {
        let name = name.into();
        check_index_field(&name, &element)?;
        let signature = format!("array {name}[{:08x}]", element.fingerprint());
        Ok(Self {
            fingerprint: compute_fingerprint(&signature),
            name,
            kind: TypeKind::Array(ArrayDescriptor { element }),
            plain: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Structural FNV-1a fingerprint.
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    /// True when the layout does not depend on any parameter.
    pub fn is_plain(&self) -> bool {
        self.plain
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array(_))
    }

    /// Get fields if this is a record.
    pub fn fields(&self) -> Option<&[FieldDescriptor]> {
        match &self.kind {
            TypeKind::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Get field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields()?.iter().find(|f| f.name == name)
    }

    /// Element type if this is an array.
    pub fn element(&self) -> Option<&Arc<TypeDescriptor>> {
        match &self.kind {
            TypeKind::Array(array) => Some(&array.element),
            _ => None,
        }
    }

    pub fn enum_descriptor(&self) -> Option<&Arc<EnumDescriptor>> {
        match &self.kind {
            TypeKind::Enum(desc) => Some(desc),
            _ => None,
        }
    }

    /// Canonical names of every capacity parameter reachable from this type.
    pub fn parameter_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_parameters("", &mut names);
        names
    }

    fn collect_parameters(&self, prefix: &str, out: &mut Vec<String>) {
        match &self.kind {
            TypeKind::Scalar(_) | TypeKind::Enum(_) => {}
            TypeKind::Record(fields) => {
                for field in fields {
                    field
                        .type_desc
                        .collect_parameters(&join(prefix, &field.name), out);
                }
            }
            TypeKind::Array(array) => {
                out.push(join(prefix, CAPACITY_PARAM));
                array
                    .element
                    .collect_parameters(&join(prefix, ITEM_PREFIX), out);
            }
        }
    }

    /// True when this record can back a linked list: it carries an int32
    /// `next` field besides its index field.
    pub fn is_list_element(&self) -> bool {
        self.field(NEXT_FIELD)
            .and_then(FieldDescriptor::scalar_kind)
            .is_some_and(|k| k == ScalarKind::Int32)
    }
}

/// Verify that `element` can be used as the element type of array `array`.
pub fn check_index_field(array: &str, element: &TypeDescriptor) -> Result<()> {
    let valid = element
        .fields()
        .and_then(|fields| fields.first())
        .is_some_and(|f| f.name == INDEX_FIELD && f.scalar_kind() == Some(ScalarKind::Int32));
    if valid {
        Ok(())
    } else {
        Err(BlobError::MissingElementIndexField {
            array: array.to_string(),
            element: element.name().to_string(),
            field: INDEX_FIELD.to_string(),
        })
    }
}

/// Compute a 32-bit FNV-1a hash over a canonical type signature.
pub fn compute_fingerprint(signature: &str) -> u32 {
    const FNV_PRIME: u32 = 16_777_619;
    const FNV_OFFSET: u32 = 2_166_136_261;

    let mut hash = FNV_OFFSET;
    for byte in signature.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
