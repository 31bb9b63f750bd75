// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural comparison of blob regions.

use super::codec::read_accessor;
use crate::array::present_slots;
use crate::layout::{AccessorKind, Layout, CAPACITY_FIELD};
use crate::naming::join;
use std::collections::BTreeMap;
use std::fmt;

/// One differing field. `None` marks a field present on one side only
/// (an empty array slot or a different schema).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    pub field: String,
    pub left: Option<String>,
    pub right: Option<String>,
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |v: &Option<String>| v.clone().unwrap_or_else(|| "<absent>".to_string());
        write!(f, "{}: {} != {}", self.field, side(&self.left), side(&self.right))
    }
}

/// String form of every non-padding field; array elements are keyed
/// `<array>_<slot>_<field>`.
pub(crate) fn field_strings(layout: &Layout, bytes: &[u8]) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    collect(layout, bytes, "", &mut out);
    out
}

fn collect(layout: &Layout, bytes: &[u8], prefix: &str, out: &mut BTreeMap<String, String>) {
    if let Some(shape) = layout.array() {
        out.insert(join(prefix, CAPACITY_FIELD), shape.capacity.to_string());
        for slot in present_slots(layout, bytes) {
            let offset = shape.element_offset(slot);
            collect(
                &shape.element,
                &bytes[offset..offset + shape.element.size()],
                &join(prefix, &slot.to_string()),
                out,
            );
        }
        return;
    }

    for accessor in layout.accessors() {
        let name = join(prefix, &accessor.name);
        match &accessor.kind {
            AccessorKind::Padding(_) => {}
            AccessorKind::Array(sub) => collect(
                sub,
                &bytes[accessor.offset..accessor.offset + sub.size()],
                &name,
                out,
            ),
            kind => {
                if let Some(value) = read_accessor(bytes, accessor.offset, kind) {
                    out.insert(name, value.to_string());
                }
            }
        }
    }
}

/// Differences between two regions, in field-name order.
pub(crate) fn diff_regions(
    left: (&Layout, &[u8]),
    right: (&Layout, &[u8]),
) -> Vec<FieldDiff> {
    let left = field_strings(left.0, left.1);
    let mut right = field_strings(right.0, right.1);

    let mut diffs = Vec::new();
    for (field, value) in left {
        match right.remove(&field) {
            Some(other) if other == value => {}
            other => diffs.push(FieldDiff {
                field,
                left: Some(value),
                right: other,
            }),
        }
    }
    for (field, value) in right {
        diffs.push(FieldDiff {
            field,
            left: None,
            right: Some(value),
        });
    }
    diffs.sort_by(|a, b| a.field.cmp(&b.field));
    diffs
}
