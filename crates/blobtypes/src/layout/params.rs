// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Capacity parameters.

use crate::error::{BlobError, Result};
use crate::naming::{join, FIELD_SEPARATOR};
use crate::types::TypeDescriptor;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sorted map of canonical parameter names to capacities.
///
/// Values are kept signed so that non-positive input can be reported as
/// `InvalidParameter` instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Params(BTreeMap<String, i64>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, builder style.
    pub fn with(mut self, name: impl Into<String>, value: i64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: i64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Parameters under `<prefix>_`, with the prefix stripped.
    pub fn scoped(&self, prefix: &str) -> Params {
        let head = format!("{prefix}{FIELD_SEPARATOR}");
        self.0
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(&head).map(|rest| (rest.to_string(), *v)))
            .collect()
    }

    /// The same parameters renamed to `<prefix>_<name>`.
    pub fn prefixed(&self, prefix: &str) -> Params {
        self.0.iter().map(|(k, v)| (join(prefix, k), *v)).collect()
    }

    /// Merge `other` into `self`, overwriting duplicates.
    pub fn extend(&mut self, other: Params) {
        self.0.extend(other.0);
    }

    /// Validate and extract exactly the parameters `ty` requires.
    pub fn required_by(&self, ty: &TypeDescriptor, max: usize) -> Result<Params> {
        let mut required = Params::new();
        for name in ty.parameter_names() {
            let value = self.get(&name).ok_or_else(|| BlobError::MissingParameter {
                type_name: ty.name().to_string(),
                parameter: name.clone(),
            })?;
            validate_parameter(&name, value, max)?;
            required.insert(name, value);
        }
        Ok(required)
    }
}

impl FromIterator<(String, i64)> for Params {
    fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&parts.join(","))
    }
}

/// Parses comma separated `name=value` pairs (CLI `--param` syntax).
impl FromStr for Params {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self> {
        let mut params = Params::new();
        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                BlobError::InvalidSchema(format!("expected name=value, got '{pair}'"))
            })?;
            let value = value.trim().parse::<i64>().map_err(|_| {
                BlobError::InvalidSchema(format!("parameter '{name}' is not an integer"))
            })?;
            params.insert(name.trim(), value);
        }
        Ok(params)
    }
}

/// Check a capacity against `1..=max`.
pub fn validate_parameter(name: &str, value: i64, max: usize) -> Result<usize> {
    match usize::try_from(value) {
        Ok(v) if v >= 1 && v <= max => Ok(v),
        _ => Err(BlobError::InvalidParameter {
            parameter: name.to_string(),
            value,
            max,
        }),
    }
}
