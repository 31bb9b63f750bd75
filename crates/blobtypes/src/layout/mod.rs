// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout compiler.
//!
//! Turns a [`TypeDescriptor`](crate::types::TypeDescriptor) and a set of
//! capacity [`Params`] into a [`Layout`]: byte offsets for every field and
//! the total size. Layouts are memoized in a caller-owned [`LayoutCache`].
//!
//! Fields are packed in declaration order with no alignment, except for the
//! implicit padding that follows 3-component vector groups in
//! [`LayoutMode::Aligned`]. An array is an 8-byte header (`capacity`,
//! `count`, both int32) followed by `capacity` elements of equal size.

mod cache;
mod compiler;
mod params;

pub use cache::{LayoutCache, LayoutKey, LookupStats};
pub use compiler::LayoutCompiler;
pub use params::{validate_parameter, Params};

use crate::error::{BlobError, Result};
use crate::naming::join;
use crate::types::{EnumDescriptor, ScalarKind};
use crate::vector::LayoutMode;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Default upper bound for every capacity parameter.
pub const DEFAULT_MAX_PARAMETER: usize = 5000;

/// Size of the array metadata header.
pub const ARRAY_HEADER_SIZE: usize = 8;

/// Header field holding an array's capacity.
pub const CAPACITY_FIELD: &str = "capacity";

/// Header field holding an array's occupied-slot count.
pub const COUNT_FIELD: &str = "count";

/// Field name of root scalar and enum layouts.
pub const VALUE_FIELD: &str = "value";

/// Storage kind of enum values.
pub const ENUM_STORAGE: ScalarKind = ScalarKind::Int32;

/// Layout compiler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    pub max_parameter: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Aligned,
            max_parameter: DEFAULT_MAX_PARAMETER,
        }
    }
}

impl LayoutConfig {
    pub fn with_mode(mut self, mode: LayoutMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_parameter(mut self, max: usize) -> Self {
        self.max_parameter = max;
        self
    }

    /// Packed configuration without vector padding.
    pub fn unaligned() -> Self {
        Self::default().with_mode(LayoutMode::Unaligned)
    }
}

/// Storage of one declared field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Enum(Arc<EnumDescriptor>),
    /// Implicit vector padding; occupies bytes but carries no value.
    Padding(ScalarKind),
    Record(Arc<Layout>),
    Array(Arc<Layout>),
}

/// A declared field with its offset inside the enclosing layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutField {
    pub name: String,
    pub offset: usize,
    pub size: usize,
    pub kind: FieldKind,
}

impl LayoutField {
    pub fn is_padding(&self) -> bool {
        matches!(self.kind, FieldKind::Padding(_))
    }
}

/// Codec of a flattened accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessorKind {
    Scalar(ScalarKind),
    Enum(Arc<EnumDescriptor>),
    Padding(ScalarKind),
    /// Arrays stay composite; elements are reached through the array view.
    Array(Arc<Layout>),
}

impl AccessorKind {
    /// Scalar storage of the accessor (`None` for arrays).
    pub fn storage(&self) -> Option<ScalarKind> {
        match self {
            Self::Scalar(kind) | Self::Padding(kind) => Some(*kind),
            Self::Enum(_) => Some(ENUM_STORAGE),
            Self::Array(_) => None,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Self::Array(layout) => layout.size(),
            other => other.storage().map_or(0, ScalarKind::width),
        }
    }
}

/// Flattened field access entry: nested records are expanded with `_`
/// joined names, so `position.y` becomes `position_y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    pub name: String,
    pub offset: usize,
    pub kind: AccessorKind,
}

impl Accessor {
    pub fn is_padding(&self) -> bool {
        matches!(self.kind, AccessorKind::Padding(_))
    }
}

/// Element geometry of an array layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayShape {
    pub capacity: usize,
    pub element: Arc<Layout>,
}

impl ArrayShape {
    /// Byte offset of slot `index` from the start of the array.
    pub fn element_offset(&self, index: usize) -> usize {
        ARRAY_HEADER_SIZE + index * self.element.size()
    }
}

/// Compiled byte layout of a type under concrete parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    type_name: String,
    mode: LayoutMode,
    params: Params,
    size: usize,
    fields: Vec<LayoutField>,
    accessors: Vec<Accessor>,
    lookup: HashMap<String, usize>,
    array: Option<ArrayShape>,
}

impl Layout {
    pub(crate) fn new(
        type_name: &str,
        mode: LayoutMode,
        params: Params,
        fields: Vec<LayoutField>,
        array: Option<ArrayShape>,
    ) -> Result<Self> {
        let mut accessors = Vec::new();
        for field in &fields {
            match &field.kind {
                FieldKind::Scalar(kind) => accessors.push(Accessor {
                    name: field.name.clone(),
                    offset: field.offset,
                    kind: AccessorKind::Scalar(*kind),
                }),
                FieldKind::Enum(desc) => accessors.push(Accessor {
                    name: field.name.clone(),
                    offset: field.offset,
                    kind: AccessorKind::Enum(Arc::clone(desc)),
                }),
                FieldKind::Padding(kind) => accessors.push(Accessor {
                    name: field.name.clone(),
                    offset: field.offset,
                    kind: AccessorKind::Padding(*kind),
                }),
                FieldKind::Record(sub) => {
                    for inner in &sub.accessors {
                        accessors.push(Accessor {
                            name: join(&field.name, &inner.name),
                            offset: field.offset + inner.offset,
                            kind: inner.kind.clone(),
                        });
                    }
                }
                FieldKind::Array(sub) => accessors.push(Accessor {
                    name: field.name.clone(),
                    offset: field.offset,
                    kind: AccessorKind::Array(Arc::clone(sub)),
                }),
            }
        }

        let mut lookup = HashMap::with_capacity(accessors.len());
        for (i, accessor) in accessors.iter().enumerate() {
            if lookup.insert(accessor.name.clone(), i).is_some() {
                return Err(BlobError::InvalidSchema(format!(
                    "'{type_name}' flattens two fields to '{}'",
                    accessor.name
                )));
            }
        }

        let size = match &array {
            Some(shape) => shape.element_offset(shape.capacity),
            None => fields.iter().map(|f| f.size).sum(),
        };

        Ok(Self {
            type_name: type_name.to_string(),
            mode,
            params,
            size,
            fields,
            accessors,
            lookup,
            array,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    /// Parameters this layout was compiled with.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Total size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Declared fields, including padding.
    pub fn fields(&self) -> &[LayoutField] {
        &self.fields
    }

    /// Get a declared field by name.
    pub fn field(&self, name: &str) -> Option<&LayoutField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Flattened accessor table in byte order.
    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    /// Get a flattened accessor by name.
    pub fn accessor(&self, name: &str) -> Option<&Accessor> {
        self.lookup.get(name).map(|&i| &self.accessors[i])
    }

    /// Element geometry if this is an array layout.
    pub fn array(&self) -> Option<&ArrayShape> {
        self.array.as_ref()
    }

    pub fn is_array(&self) -> bool {
        self.array.is_some()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} bytes, {})", self.type_name, self.size, self.mode)?;
        for accessor in &self.accessors {
            let kind = match &accessor.kind {
                AccessorKind::Scalar(kind) => kind.to_string(),
                AccessorKind::Enum(desc) => format!("enum {}", desc.name()),
                AccessorKind::Padding(kind) => format!("padding {kind}"),
                AccessorKind::Array(sub) => format!("array {}", sub.type_name()),
            };
            writeln!(
                f,
                "  {:>6}  {:>6}  {:<20} {}",
                accessor.offset,
                accessor.kind.width(),
                kind,
                accessor.name
            )?;
        }
        if let Some(shape) = &self.array {
            writeln!(
                f,
                "  {} x {} ({} bytes each) from offset {}",
                shape.capacity,
                shape.element.type_name(),
                shape.element.size(),
                ARRAY_HEADER_SIZE
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
