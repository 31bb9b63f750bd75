// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Vector component grouping and GPU alignment padding.
//!
//! Consecutive scalar fields named `<stem>_x`, `<stem>_y`, `<stem>_z` (or
//! `_0`, `_1`, `_2`) form a vector group. OpenCL stores a 3-component vector
//! in the span of a 4-component one, so in aligned mode a 3-group is
//! followed by one padding field of the same kind.

use crate::naming::join;
use crate::types::{FieldDescriptor, ScalarKind};
use std::fmt;

/// Recognized component suffix sequences.
pub const VECTOR_COMPONENTS: [[&str; 4]; 2] = [["x", "y", "z", "w"], ["0", "1", "2", "3"]];

/// Name suffix of implicit padding fields.
pub const PADDING_SUFFIX: &str = "padding";

/// Layout mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutMode {
    /// GPU-aligned: 3-component vector groups are padded to 4 components.
    #[default]
    Aligned,
    /// Packed: no implicit padding.
    Unaligned,
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aligned => f.write_str("aligned"),
            Self::Unaligned => f.write_str("unaligned"),
        }
    }
}

/// A run of consecutive scalar fields forming one vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorGroup {
    /// Shared name stem (empty for bare `x`, `y`, `z` fields).
    pub stem: String,
    pub kind: ScalarKind,
    /// Index of the first component in the record's field list.
    pub start: usize,
    /// Number of components (2 to 4).
    pub len: usize,
}

impl VectorGroup {
    /// Index of the last component.
    pub fn end(&self) -> usize {
        self.start + self.len - 1
    }

    /// Whether the group takes a trailing padding field in aligned mode.
    pub fn needs_padding(&self) -> bool {
        self.len == 3
    }

    /// Name of the implicit padding field.
    pub fn padding_name(&self) -> String {
        join(&self.stem, PADDING_SUFFIX)
    }

    /// Target vector type, e.g. `float3`.
    pub fn c_type(&self) -> String {
        vector_c_type(self.kind, self.len)
    }

    /// Identifier naming the whole vector.
    pub fn member_name(&self) -> String {
        if self.stem.is_empty() {
            "xyzw"[..self.len].to_string()
        } else {
            self.stem.clone()
        }
    }
}

/// Vector type name for `len` components of `kind`.
pub fn vector_c_type(kind: ScalarKind, len: usize) -> String {
    format!("{}{len}", kind.c_type())
}

/// Split a field name into `(stem, component set, position)`.
pub fn split_component(name: &str) -> Option<(&str, usize, usize)> {
    for (set, components) in VECTOR_COMPONENTS.iter().enumerate() {
        for (position, component) in components.iter().enumerate() {
            if name == *component {
                return Some(("", set, position));
            }
            if let Some(stem) = name
                .strip_suffix(component)
                .and_then(|s| s.strip_suffix('_'))
            {
                if !stem.is_empty() {
                    return Some((stem, set, position));
                }
            }
        }
    }
    None
}

/// Detect the vector groups of a record's field list.
///
/// A group starts at a first component (`x` or `0`) and extends over
/// following fields of the same scalar kind, stem and component set whose
/// positions continue the sequence.
pub fn vector_groups(fields: &[FieldDescriptor]) -> Vec<VectorGroup> {
    let mut groups = Vec::new();
    let mut i = 0;
    while i < fields.len() {
        let Some((kind, (stem, set, 0))) = fields[i]
            .scalar_kind()
            .zip(split_component(&fields[i].name))
        else {
            i += 1;
            continue;
        };

        let mut len = 1;
        while i + len < fields.len() && len < VECTOR_COMPONENTS[set].len() {
            let next = &fields[i + len];
            let continues = next.scalar_kind() == Some(kind)
                && split_component(&next.name) == Some((stem, set, len));
            if !continues {
                break;
            }
            len += 1;
        }

        if len >= 2 {
            groups.push(VectorGroup {
                stem: stem.to_string(),
                kind,
                start: i,
                len,
            });
        }
        i += len;
    }
    groups
}

/// Groups that receive a padding field under `mode`.
pub fn padded_groups(fields: &[FieldDescriptor], mode: LayoutMode) -> Vec<VectorGroup> {
    match mode {
        LayoutMode::Unaligned => Vec::new(),
        LayoutMode::Aligned => vector_groups(fields)
            .into_iter()
            .filter(VectorGroup::needs_padding)
            .collect(),
    }
}
