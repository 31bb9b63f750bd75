// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Capacity inference from buffers and value trees.

use super::codec::read_i32;
use crate::error::{BlobError, Result};
use crate::layout::{
    validate_parameter, AccessorKind, Layout, LayoutCompiler, Params, ARRAY_HEADER_SIZE,
    CAPACITY_FIELD,
};
use crate::naming::join;
use crate::types::{TypeDescriptor, TypeKind, CAPACITY_PARAM, ITEM_PREFIX};
use crate::value::FlatValues;
use crate::vector::padded_groups;
use std::collections::BTreeSet;

/// Read every reachable array capacity out of `bytes`.
///
/// Nested element parameters are taken from slot 0, since all slots of an
/// array share one element layout.
pub(crate) fn params_from_buffer(
    compiler: &LayoutCompiler,
    ty: &TypeDescriptor,
    bytes: &[u8],
) -> Result<Params> {
    let mut params = Params::new();
    scan(compiler, ty, bytes, 0, "", &mut params)?;
    Ok(params)
}

/// Returns the byte size of `ty` at `offset`.
fn scan(
    compiler: &LayoutCompiler,
    ty: &TypeDescriptor,
    bytes: &[u8],
    offset: usize,
    prefix: &str,
    params: &mut Params,
) -> Result<usize> {
    if ty.is_plain() {
        return Ok(compiler.plain_layout(ty)?.size());
    }
    match ty.kind() {
        TypeKind::Record(fields) => {
            let padded = padded_groups(fields, compiler.config().mode);
            let mut size = 0;
            for (i, field) in fields.iter().enumerate() {
                size += scan(
                    compiler,
                    &field.type_desc,
                    bytes,
                    offset + size,
                    &join(prefix, &field.name),
                    params,
                )?;
                if let Some(group) = padded.iter().find(|g| g.end() == i) {
                    size += group.kind.width();
                }
            }
            Ok(size)
        }
        TypeKind::Array(array) => {
            if offset + ARRAY_HEADER_SIZE > bytes.len() {
                return Err(truncated(ty, offset));
            }
            let raw = i64::from(read_i32(bytes, offset));
            let max = compiler.config().max_parameter;
            let capacity = validate_parameter(CAPACITY_PARAM, raw, max).map_err(|_| {
                BlobError::InvalidCapacity {
                    offset,
                    value: raw,
                    max,
                }
            })?;
            params.insert(join(prefix, CAPACITY_PARAM), raw);

            let element_size = scan(
                compiler,
                &array.element,
                bytes,
                offset + ARRAY_HEADER_SIZE,
                &join(prefix, ITEM_PREFIX),
                params,
            )?;
            Ok(ARRAY_HEADER_SIZE + capacity * element_size)
        }
        TypeKind::Scalar(_) | TypeKind::Enum(_) => Err(BlobError::UnsupportedType(ty.name().into())),
    }
}

/// Check that every array header in `bytes` matches `layout`.
pub(crate) fn verify_shape(layout: &Layout, bytes: &[u8], offset: usize) -> Result<()> {
    if bytes.len() < offset + layout.size() {
        return Err(BlobError::LayoutMismatch {
            type_name: layout.type_name().to_string(),
            reason: format!(
                "needs {} bytes at offset {offset}, buffer has {}",
                layout.size(),
                bytes.len()
            ),
        });
    }

    if let Some(shape) = layout.array() {
        let stored = layout
            .accessor(CAPACITY_FIELD)
            .map(|a| read_i32(bytes, offset + a.offset))
            .unwrap_or_default();
        if i64::from(stored) != shape.capacity as i64 {
            return Err(BlobError::LayoutMismatch {
                type_name: layout.type_name().to_string(),
                reason: format!(
                    "capacity at offset {offset} is {stored}, layout expects {}",
                    shape.capacity
                ),
            });
        }
        if !shape.element.params().is_empty() {
            for slot in 0..shape.capacity {
                verify_shape(&shape.element, bytes, offset + shape.element_offset(slot))?;
            }
        }
        return Ok(());
    }

    for accessor in layout.accessors() {
        if let AccessorKind::Array(sub) = &accessor.kind {
            verify_shape(sub, bytes, offset + accessor.offset)?;
        }
    }
    Ok(())
}

/// Fill in capacities missing from `params` using list lengths of a
/// flattened value tree.
pub(crate) fn params_from_tree(ty: &TypeDescriptor, flat: &FlatValues, params: &mut Params) {
    let mut inferred = Params::new();
    let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
    tree_scan(ty, &keys, "", "", &mut inferred);
    for (name, value) in inferred.iter() {
        if params.get(name).is_none() {
            params.insert(name, value);
        }
    }
}

fn tree_scan(ty: &TypeDescriptor, keys: &[&str], path: &str, prefix: &str, out: &mut Params) {
    match ty.kind() {
        TypeKind::Record(fields) => {
            for field in fields {
                if !field.type_desc.is_plain() {
                    tree_scan(
                        &field.type_desc,
                        keys,
                        &join(path, &field.name),
                        &join(prefix, &field.name),
                        out,
                    );
                }
            }
        }
        TypeKind::Array(array) => {
            let slots = slot_numbers(keys, path);
            let name = join(prefix, CAPACITY_PARAM);
            let len = slots.last().map_or(0, |last| last + 1) as i64;
            if len > 0 && out.get(&name).map_or(true, |seen| len > seen) {
                out.insert(name, len);
            }
            for slot in slots {
                tree_scan(
                    &array.element,
                    keys,
                    &join(path, &slot.to_string()),
                    &join(prefix, ITEM_PREFIX),
                    out,
                );
            }
        }
        TypeKind::Scalar(_) | TypeKind::Enum(_) => {}
    }
}

/// Distinct slot numbers of keys shaped `<path>_<slot>_<field>`.
fn slot_numbers(keys: &[&str], path: &str) -> Vec<usize> {
    let head = if path.is_empty() {
        String::new()
    } else {
        format!("{path}_")
    };
    let slots: BTreeSet<usize> = keys
        .iter()
        .filter_map(|key| key.strip_prefix(head.as_str()))
        .filter_map(|rest| rest.split_once('_'))
        .filter(|(slot, _)| !slot.is_empty() && slot.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|(slot, _)| slot.parse().ok())
        .collect();
    slots.into_iter().collect()
}

fn truncated(ty: &TypeDescriptor, offset: usize) -> BlobError {
    BlobError::LayoutMismatch {
        type_name: ty.name().to_string(),
        reason: format!("buffer ends inside the array header at offset {offset}"),
    }
}
