// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Little-endian scalar codecs.
//!
//! Width to value mapping: floats read as [`Value::Float`], integers as
//! [`Value::Int`], booleans as `byte > 0`, enums as their label.

use crate::error::{BlobError, Result};
use crate::layout::{AccessorKind, ENUM_STORAGE};
use crate::types::{EnumDescriptor, ScalarKind};
use crate::value::Value;
use byteorder::{ByteOrder, LittleEndian};

/// Read a scalar at `offset`.
pub(crate) fn read_scalar(bytes: &[u8], offset: usize, kind: ScalarKind) -> Value {
    let b = &bytes[offset..offset + kind.width()];
    match kind {
        ScalarKind::Bool => Value::Bool((b[0] as i8) > 0),
        ScalarKind::Int8 => Value::Int(i64::from(b[0] as i8)),
        ScalarKind::UInt8 => Value::Int(i64::from(b[0])),
        ScalarKind::Int16 => Value::Int(i64::from(LittleEndian::read_i16(b))),
        ScalarKind::UInt16 => Value::Int(i64::from(LittleEndian::read_u16(b))),
        ScalarKind::Int32 => Value::Int(i64::from(LittleEndian::read_i32(b))),
        ScalarKind::UInt32 => Value::Int(i64::from(LittleEndian::read_u32(b))),
        ScalarKind::Int64 => Value::Int(LittleEndian::read_i64(b)),
        // Wraps above i64::MAX; value trees carry signed integers only.
        ScalarKind::UInt64 => Value::Int(LittleEndian::read_u64(b) as i64),
        ScalarKind::Float32 => Value::Float(f64::from(LittleEndian::read_f32(b))),
        ScalarKind::Float64 => Value::Float(LittleEndian::read_f64(b)),
    }
}

/// Write `value` as a scalar at `offset`.
pub(crate) fn write_scalar(
    bytes: &mut [u8],
    offset: usize,
    kind: ScalarKind,
    value: &Value,
    field: &str,
) -> Result<()> {
    let b = &mut bytes[offset..offset + kind.width()];
    if kind.is_float() {
        let v = value.as_f64().ok_or_else(|| mismatch(field, kind, value))?;
        if kind == ScalarKind::Float32 {
            LittleEndian::write_f32(b, v as f32);
        } else {
            LittleEndian::write_f64(b, v);
        }
        return Ok(());
    }

    if kind == ScalarKind::Bool {
        let v = value.as_bool().ok_or_else(|| mismatch(field, kind, value))?;
        b[0] = u8::from(v);
        return Ok(());
    }

    let v = value.as_i64().ok_or_else(|| mismatch(field, kind, value))?;
    if let Some((min, max)) = kind.int_range() {
        if i128::from(v) < min || i128::from(v) > max {
            return Err(BlobError::TypeMismatch {
                field: field.to_string(),
                expected: kind.to_string(),
                found: format!("out of range value {v}"),
            });
        }
    }
    match kind {
        ScalarKind::Int8 | ScalarKind::UInt8 => b[0] = v as u8,
        ScalarKind::Int16 | ScalarKind::UInt16 => LittleEndian::write_u16(b, v as u16),
        ScalarKind::Int32 | ScalarKind::UInt32 => LittleEndian::write_u32(b, v as u32),
        _ => LittleEndian::write_u64(b, v as u64),
    }
    Ok(())
}

/// Read an enum ordinal and resolve it, falling back to `undefined`.
pub(crate) fn read_enum(bytes: &[u8], offset: usize, desc: &EnumDescriptor) -> Value {
    let ordinal = LittleEndian::read_i32(&bytes[offset..offset + ENUM_STORAGE.width()]);
    let label = desc
        .ordinal_to_label(i64::from(ordinal), true)
        .unwrap_or(crate::types::UNDEFINED_LABEL);
    Value::Label(label.to_string())
}

/// Write an enum given as a label or a declared ordinal.
pub(crate) fn write_enum(
    bytes: &mut [u8],
    offset: usize,
    desc: &EnumDescriptor,
    value: &Value,
    field: &str,
) -> Result<()> {
    let ordinal = match value {
        Value::Label(label) => desc.label_to_ordinal(label)?,
        Value::Int(v) => {
            if *v != 0 {
                desc.ordinal_to_label(*v, false)?;
            }
            *v as i32
        }
        other => {
            return Err(BlobError::TypeMismatch {
                field: field.to_string(),
                expected: format!("enum {}", desc.name()),
                found: other.kind_name().to_string(),
            })
        }
    };
    write_i32(bytes, offset, ordinal);
    Ok(())
}

/// Read any non-array accessor.
pub(crate) fn read_accessor(bytes: &[u8], offset: usize, kind: &AccessorKind) -> Option<Value> {
    match kind {
        AccessorKind::Scalar(k) | AccessorKind::Padding(k) => Some(read_scalar(bytes, offset, *k)),
        AccessorKind::Enum(desc) => Some(read_enum(bytes, offset, desc)),
        AccessorKind::Array(_) => None,
    }
}

pub(crate) fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    LittleEndian::read_i32(&bytes[offset..offset + 4])
}

pub(crate) fn write_i32(bytes: &mut [u8], offset: usize, value: i32) {
    LittleEndian::write_i32(&mut bytes[offset..offset + 4], value);
}

fn mismatch(field: &str, kind: ScalarKind, value: &Value) -> BlobError {
    BlobError::TypeMismatch {
        field: field.to_string(),
        expected: kind.to_string(),
        found: value.kind_name().to_string(),
    }
}
