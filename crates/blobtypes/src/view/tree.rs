// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value tree encoding and decoding over raw layout regions.

use super::codec::{read_accessor, read_enum, read_scalar, write_enum, write_i32, write_scalar};
use crate::array::{present_count, present_slots};
use crate::error::{BlobError, Result};
use crate::layout::{AccessorKind, FieldKind, Layout, COUNT_FIELD};
use crate::types::INDEX_FIELD;
use crate::value::{FlatValues, Value};
use std::collections::{BTreeMap, HashSet};

/// Write a flat value map into the region of `layout`.
///
/// The region must already be initialized (array headers and sentinels).
/// Every non-padding field must be supplied, and every key must name a
/// field.
pub(crate) fn write_values(layout: &Layout, bytes: &mut [u8], flat: &FlatValues) -> Result<()> {
    let mut consumed: HashSet<&str> = HashSet::new();

    if layout.is_array() {
        let keys = write_array(layout, bytes, flat, "", &consumed)?;
        consumed.extend(keys);
    } else {
        for accessor in layout.accessors() {
            let supplied = flat.get(&accessor.name);
            match &accessor.kind {
                AccessorKind::Padding(_) => {}
                AccessorKind::Array(_) => continue,
                AccessorKind::Scalar(kind) => {
                    let value = supplied.ok_or_else(|| uninitialized(layout, &accessor.name))?;
                    write_scalar(bytes, accessor.offset, *kind, value, &accessor.name)?;
                }
                AccessorKind::Enum(desc) => {
                    let value = supplied.ok_or_else(|| uninitialized(layout, &accessor.name))?;
                    write_enum(bytes, accessor.offset, desc, value, &accessor.name)?;
                }
            }
            if supplied.is_some() {
                consumed.insert(accessor.name.as_str());
            }
        }

        for accessor in layout.accessors() {
            if let AccessorKind::Array(sub) = &accessor.kind {
                let region = &mut bytes[accessor.offset..accessor.offset + sub.size()];
                let keys = write_array(sub, region, flat, &accessor.name, &consumed)?;
                consumed.extend(keys);
            }
        }
    }

    match flat.keys().find(|key| !consumed.contains(key.as_str())) {
        Some(unknown) => Err(BlobError::UnknownField {
            type_name: layout.type_name().to_string(),
            field: unknown.clone(),
        }),
        None => Ok(()),
    }
}

/// Write the `<name>_<slot>_<field>` entries of `flat` into array slots and
/// refresh the occupied count. Returns the consumed keys.
fn write_array<'f>(
    layout: &Layout,
    bytes: &mut [u8],
    flat: &'f FlatValues,
    name: &str,
    skip: &HashSet<&str>,
) -> Result<Vec<&'f str>> {
    let shape = layout.array().ok_or_else(|| BlobError::LayoutMismatch {
        type_name: layout.type_name().to_string(),
        reason: "expected an array layout".into(),
    })?;

    let mut slots: BTreeMap<usize, FlatValues> = BTreeMap::new();
    let mut consumed = Vec::new();
    for (key, value) in flat {
        if skip.contains(key.as_str()) {
            continue;
        }
        if let Some((slot, field)) = split_slot_key(key, name) {
            slots
                .entry(slot)
                .or_default()
                .insert(field.to_string(), value.clone());
            consumed.push(key.as_str());
        }
    }

    for (slot, mut element) in slots {
        if slot >= shape.capacity {
            return Err(BlobError::SlotOutOfRange {
                index: slot,
                capacity: shape.capacity,
            });
        }
        element
            .entry(INDEX_FIELD.to_string())
            .or_insert(Value::Int(slot as i64));
        let offset = shape.element_offset(slot);
        let region = &mut bytes[offset..offset + shape.element.size()];
        write_values(&shape.element, region, &element)?;
    }

    let count = present_count(layout, bytes);
    write_count(layout, bytes, count);
    Ok(consumed)
}

/// Split `<name>_<slot>_<rest>` (or `<slot>_<rest>` for an empty name).
fn split_slot_key<'k>(key: &'k str, name: &str) -> Option<(usize, &'k str)> {
    let rest = if name.is_empty() {
        key
    } else {
        key.strip_prefix(name)?.strip_prefix('_')?
    };
    let (slot, field) = rest.split_once('_')?;
    if slot.is_empty() || !slot.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((slot.parse().ok()?, field))
}

pub(crate) fn write_count(layout: &Layout, bytes: &mut [u8], count: usize) {
    if let Some(accessor) = layout.accessor(COUNT_FIELD) {
        write_i32(bytes, accessor.offset, count as i32);
    }
}

/// Flat value tree of a region; arrays become lists of present elements.
pub(crate) fn read_flat(layout: &Layout, bytes: &[u8]) -> Value {
    if let Some(shape) = layout.array() {
        return Value::List(
            present_slots(layout, bytes)
                .into_iter()
                .map(|slot| {
                    let offset = shape.element_offset(slot);
                    read_flat(&shape.element, &bytes[offset..offset + shape.element.size()])
                })
                .collect(),
        );
    }

    let mut out = BTreeMap::new();
    for accessor in layout.accessors() {
        let value = match &accessor.kind {
            AccessorKind::Padding(_) => continue,
            AccessorKind::Array(sub) => {
                read_flat(sub, &bytes[accessor.offset..accessor.offset + sub.size()])
            }
            kind => match read_accessor(bytes, accessor.offset, kind) {
                Some(value) => value,
                None => continue,
            },
        };
        out.insert(accessor.name.clone(), value);
    }
    Value::Map(out)
}

/// Nested value tree following the record boundaries of the layout.
pub(crate) fn read_nested(layout: &Layout, bytes: &[u8]) -> Value {
    if let Some(shape) = layout.array() {
        return Value::List(
            present_slots(layout, bytes)
                .into_iter()
                .map(|slot| {
                    let offset = shape.element_offset(slot);
                    read_nested(&shape.element, &bytes[offset..offset + shape.element.size()])
                })
                .collect(),
        );
    }

    let mut out = BTreeMap::new();
    for field in layout.fields() {
        let value = match &field.kind {
            FieldKind::Padding(_) => continue,
            FieldKind::Scalar(kind) => read_scalar(bytes, field.offset, *kind),
            FieldKind::Enum(desc) => read_enum(bytes, field.offset, desc),
            FieldKind::Record(sub) | FieldKind::Array(sub) => {
                read_nested(sub, &bytes[field.offset..field.offset + field.size])
            }
        };
        out.insert(field.name.clone(), value);
    }
    Value::Map(out)
}

fn uninitialized(layout: &Layout, field: &str) -> BlobError {
    BlobError::UninitializedField {
        type_name: layout.type_name().to_string(),
        field: field.to_string(),
    }
}
