// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by the layout compiler, view runtime and code generator.

use thiserror::Error;

/// Errors raised by blob layout, view and generation operations.
///
/// Every variant is a schema or data contract violation; none of them are
/// transient, so callers should abort the surrounding operation instead of
/// retrying.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("type '{type_name}' requires parameter '{parameter}'")]
    MissingParameter {
        type_name: String,
        parameter: String,
    },

    #[error("parameter '{parameter}' = {value} is out of range (1..={max})")]
    InvalidParameter {
        parameter: String,
        value: i64,
        max: usize,
    },

    #[error("unsupported type '{0}'")]
    UnsupportedType(String),

    #[error("buffer does not match layout of '{type_name}': {reason}")]
    LayoutMismatch { type_name: String, reason: String },

    #[error("field '{field}' of '{type_name}' was not initialized")]
    UninitializedField { type_name: String, field: String },

    #[error("'{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    #[error("invalid capacity {value} at offset {offset} (1..={max})")]
    InvalidCapacity { offset: usize, value: i64, max: usize },

    #[error("out of order append: item index {found}, expected {expected}")]
    OutOfOrderAppend { expected: i64, found: i64 },

    #[error("linked list walk exceeded {limit} links")]
    CycleDetected { limit: usize },

    #[error("'{type_name}' is not plain and cannot be used in {context}")]
    UnsupportedNesting { type_name: String, context: String },

    #[error("element type '{element}' of array '{array}' must start with an int32 '{field}' field")]
    MissingElementIndexField {
        array: String,
        element: String,
        field: String,
    },

    #[error("enum '{enum_name}' has no ordinal {ordinal}")]
    UnknownEnumOrdinal { enum_name: String, ordinal: i64 },

    #[error("enum '{enum_name}' has no label '{label}'")]
    UnknownEnumLabel { enum_name: String, label: String },

    #[error("field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("array '{array}' is full (capacity {capacity})")]
    CapacityExceeded { array: String, capacity: usize },

    #[error("slot {index} is out of range (capacity {capacity})")]
    SlotOutOfRange { index: usize, capacity: usize },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BlobError>;
