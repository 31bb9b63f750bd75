// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Zero-copy views over blob buffers.
//!
//! A [`BlobView`] binds a compiled [`Layout`] to a byte region and reads or
//! writes fields in place through the layout's accessor table. The view is
//! generic over the region: `&[u8]` for read-only access, `&mut [u8]` for
//! in-place writes into caller-owned memory, and `Vec<u8>` for buffers
//! produced by [`BlobView::from_value_tree`].
//!
//! # Example
//!
//! ```rust
//! use blobtypes::layout::{LayoutCompiler, LayoutConfig, Params};
//! use blobtypes::types::{RecordBuilder, ScalarKind};
//! use blobtypes::value::Value;
//! use blobtypes::view::BlobView;
//!
//! let body = RecordBuilder::new("Body")
//!     .vector("position", ScalarKind::Float32, 3)
//!     .scalar("health", ScalarKind::Int32)
//!     .build()
//!     .unwrap();
//! let compiler = LayoutCompiler::new(LayoutConfig::default());
//! let tree = Value::map()
//!     .with("position", Value::map().with("x", 1.0).with("y", 2.0).with("z", 3.0))
//!     .with("health", 100);
//!
//! let mut blob = BlobView::from_value_tree(&compiler, &body, &tree, &Params::new()).unwrap();
//! assert_eq!(blob.bytes().len(), 20);
//! blob.set("health", 75).unwrap();
//! assert_eq!(blob.get_i32("health").unwrap(), 75);
//! ```

mod codec;
mod diff;
mod infer;
mod tree;

pub use diff::FieldDiff;

pub(crate) use codec::{read_i32, write_i32};
pub(crate) use infer::verify_shape;
pub(crate) use tree::{read_flat, read_nested, write_count, write_values};

use crate::array::{init_region, ArrayView};
use crate::error::{BlobError, Result};
use crate::layout::{Accessor, AccessorKind, FieldKind, Layout, LayoutCompiler, Params};
use crate::types::TypeDescriptor;
use crate::value::Value;
use codec::{read_accessor, write_enum, write_scalar};
use std::sync::Arc;

/// Typed view of a blob region.
#[derive(Debug, Clone)]
pub struct BlobView<B> {
    layout: Arc<Layout>,
    bytes: B,
}

impl<B: AsRef<[u8]>> BlobView<B> {
    /// Bind `layout` to `bytes`. The region may be longer than the layout.
    pub fn new(layout: Arc<Layout>, bytes: B) -> Result<Self> {
        let len = bytes.as_ref().len();
        if len < layout.size() {
            return Err(BlobError::LayoutMismatch {
                type_name: layout.type_name().to_string(),
                reason: format!("needs {} bytes, buffer has {len}", layout.size()),
            });
        }
        Ok(Self { layout, bytes })
    }

    /// View an existing buffer.
    ///
    /// Without `params`, array capacities are read from the buffer itself.
    /// Every array header must agree with the resulting layout.
    pub fn from_buffer(
        compiler: &LayoutCompiler,
        ty: &TypeDescriptor,
        bytes: B,
        params: Option<&Params>,
    ) -> Result<Self> {
        let params = match params {
            Some(params) => params.clone(),
            None => infer::params_from_buffer(compiler, ty, bytes.as_ref())?,
        };
        let layout = compiler.compute_layout(ty, &params)?;
        verify_shape(&layout, bytes.as_ref(), 0)?;
        Self::new(layout, bytes)
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn type_name(&self) -> &str {
        self.layout.type_name()
    }

    /// The bytes covered by the layout.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes.as_ref()[..self.layout.size()]
    }

    pub(crate) fn into_parts(self) -> (Arc<Layout>, B) {
        (self.layout, self.bytes)
    }

    /// Borrow as a read-only view.
    pub fn as_view(&self) -> BlobView<&[u8]> {
        BlobView {
            layout: Arc::clone(&self.layout),
            bytes: self.bytes(),
        }
    }

    fn accessor(&self, name: &str) -> Result<&Accessor> {
        self.layout
            .accessor(name)
            .ok_or_else(|| BlobError::UnknownField {
                type_name: self.layout.type_name().to_string(),
                field: name.to_string(),
            })
    }

    /// Read a scalar or enum field by its flat name.
    pub fn get(&self, name: &str) -> Result<Value> {
        let accessor = self.accessor(name)?;
        read_accessor(self.bytes(), accessor.offset, &accessor.kind).ok_or_else(|| {
            BlobError::TypeMismatch {
                field: name.to_string(),
                expected: "scalar or enum".into(),
                found: "array".into(),
            }
        })
    }

    pub fn get_f32(&self, name: &str) -> Result<f32> {
        let value = self.get(name)?;
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| typed_mismatch(name, "float", &value))
    }

    pub fn get_i32(&self, name: &str) -> Result<i32> {
        let value = self.get(name)?;
        value
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| typed_mismatch(name, "int32", &value))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        let value = self.get(name)?;
        value
            .as_bool()
            .ok_or_else(|| typed_mismatch(name, "bool", &value))
    }

    /// Enum field label (`undefined` for unmapped ordinals).
    pub fn get_label(&self, name: &str) -> Result<String> {
        match self.get(name)? {
            Value::Label(label) => Ok(label),
            other => Err(typed_mismatch(name, "enum", &other)),
        }
    }

    /// Read-only view of a nested array field.
    pub fn array(&self, name: &str) -> Result<ArrayView<&[u8]>> {
        let (offset, layout) = self.array_region(name)?;
        let end = offset + layout.size();
        ArrayView::new(layout, &self.bytes()[offset..end])
    }

    /// Read-only view of a nested record field (`position`, `a_b` for a
    /// record nested in a record).
    pub fn record(&self, name: &str) -> Result<BlobView<&[u8]>> {
        let (offset, layout) = self.record_region(name)?;
        let end = offset + layout.size();
        BlobView::new(layout, &self.bytes()[offset..end])
    }

    fn array_region(&self, name: &str) -> Result<(usize, Arc<Layout>)> {
        let accessor = self.accessor(name)?;
        match &accessor.kind {
            AccessorKind::Array(layout) => Ok((accessor.offset, Arc::clone(layout))),
            other => Err(BlobError::TypeMismatch {
                field: name.to_string(),
                expected: "array".into(),
                found: other
                    .storage()
                    .map_or_else(|| "array".to_string(), |k| k.to_string()),
            }),
        }
    }

    fn record_region(&self, name: &str) -> Result<(usize, Arc<Layout>)> {
        find_record(&self.layout, name).ok_or_else(|| BlobError::UnknownField {
            type_name: self.layout.type_name().to_string(),
            field: name.to_string(),
        })
    }

    /// Flat value tree: one entry per non-padding field, arrays as lists
    /// of their present elements.
    pub fn to_value_tree(&self) -> Value {
        read_flat(&self.layout, self.bytes())
    }

    /// Value tree re-nested along the record boundaries of the layout.
    pub fn to_nested_value_tree(&self) -> Value {
        read_nested(&self.layout, self.bytes())
    }

    /// Field-by-field differences against `other`.
    pub fn diff<C: AsRef<[u8]>>(&self, other: &BlobView<C>) -> Vec<FieldDiff> {
        diff::diff_regions(
            (&self.layout, self.bytes()),
            (&other.layout, other.bytes()),
        )
    }

    /// Compare the string form of every non-padding field.
    pub fn structural_eq<C: AsRef<[u8]>>(&self, other: &BlobView<C>) -> bool {
        self.layout.type_name() == other.layout.type_name() && self.diff(other).is_empty()
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BlobView<B> {
    /// Mutable bytes covered by the layout.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let size = self.layout.size();
        &mut self.bytes.as_mut()[..size]
    }

    /// Write a scalar or enum field. Writes to padding are ignored.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let accessor = self.accessor(name)?.clone();
        let bytes = self.bytes_mut();
        match &accessor.kind {
            AccessorKind::Padding(_) => Ok(()),
            AccessorKind::Scalar(kind) => write_scalar(bytes, accessor.offset, *kind, &value, name),
            AccessorKind::Enum(desc) => write_enum(bytes, accessor.offset, desc, &value, name),
            AccessorKind::Array(_) => Err(BlobError::TypeMismatch {
                field: name.to_string(),
                expected: "array elements".into(),
                found: value.kind_name().to_string(),
            }),
        }
    }

    /// Write every field of a nested value tree.
    ///
    /// The tree is written into a copy first; on error the view's bytes are
    /// unchanged.
    pub fn set_value_tree(&mut self, tree: &Value) -> Result<()> {
        let layout = Arc::clone(&self.layout);
        let mut staged = self.bytes().to_vec();
        write_values(&layout, &mut staged, &tree.flatten())?;
        self.bytes_mut().copy_from_slice(&staged);
        Ok(())
    }

    /// Mutable view of a nested array field.
    pub fn array_mut(&mut self, name: &str) -> Result<ArrayView<&mut [u8]>> {
        let (offset, layout) = self.array_region(name)?;
        let end = offset + layout.size();
        ArrayView::new(layout, &mut self.bytes_mut()[offset..end])
    }

    /// Mutable view of a nested record field.
    pub fn record_mut(&mut self, name: &str) -> Result<BlobView<&mut [u8]>> {
        let (offset, layout) = self.record_region(name)?;
        let end = offset + layout.size();
        BlobView::new(layout, &mut self.bytes_mut()[offset..end])
    }

    /// Borrow as a mutable view.
    pub fn as_view_mut(&mut self) -> BlobView<&mut [u8]> {
        let layout = Arc::clone(&self.layout);
        BlobView {
            layout,
            bytes: self.bytes_mut(),
        }
    }
}

impl BlobView<Vec<u8>> {
    /// Allocate a zeroed buffer with initialized array headers and empty
    /// slots.
    pub fn allocate(layout: Arc<Layout>) -> Self {
        let mut bytes = vec![0u8; layout.size()];
        init_region(&layout, &mut bytes);
        Self { layout, bytes }
    }

    /// Build a blob from a nested value tree.
    ///
    /// Capacities missing from `params` are taken from the list lengths in
    /// the tree. Every non-padding field must be supplied; array slots not
    /// supplied stay empty, and an element's `index` defaults to its slot.
    pub fn from_value_tree(
        compiler: &LayoutCompiler,
        ty: &TypeDescriptor,
        tree: &Value,
        params: &Params,
    ) -> Result<Self> {
        let flat = tree.flatten();
        let mut params = params.clone();
        infer::params_from_tree(ty, &flat, &mut params);
        let layout = compiler.compute_layout(ty, &params)?;

        let mut blob = Self::allocate(layout);
        let layout = Arc::clone(&blob.layout);
        write_values(&layout, &mut blob.bytes, &flat)?;
        Ok(blob)
    }

    /// Hand the raw bytes over, e.g. to a device allocator.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl<B: AsRef<[u8]>, C: AsRef<[u8]>> PartialEq<BlobView<C>> for BlobView<B> {
    fn eq(&self, other: &BlobView<C>) -> bool {
        self.structural_eq(other)
    }
}

/// Offset and layout of a (possibly nested) record field.
fn find_record(layout: &Layout, name: &str) -> Option<(usize, Arc<Layout>)> {
    for field in layout.fields() {
        let FieldKind::Record(sub) = &field.kind else {
            continue;
        };
        if field.name == name {
            return Some((field.offset, Arc::clone(sub)));
        }
        let rest = name
            .strip_prefix(field.name.as_str())
            .and_then(|r| r.strip_prefix('_'));
        if let Some((offset, inner)) = rest.and_then(|rest| find_record(sub, rest)) {
            return Some((field.offset + offset, inner));
        }
    }
    None
}

fn typed_mismatch(field: &str, expected: &str, found: &Value) -> BlobError {
    BlobError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

#[cfg(test)]
mod tests;
