// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Identifier case conversion shared by value-tree flattening and codegen.

/// Separator joining nested field names into flat accessor names.
pub const FIELD_SEPARATOR: char = '_';

/// Convert a `CamelCase` identifier into `snake_case`.
///
/// Already-lowercase names pass through unchanged, so the conversion is
/// idempotent on underscore names.
pub fn camel_case_to_underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_uppercase() && !out.is_empty() && !out.ends_with(FIELD_SEPARATOR) {
            out.push(FIELD_SEPARATOR);
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// Join a prefix and a field name with the field separator.
pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}{FIELD_SEPARATOR}{name}")
    }
}
