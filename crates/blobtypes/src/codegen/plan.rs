// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Size plans: the geometry pass behind generated `sizeof` functions.
//!
//! A plan mirrors what the emitted C computes at run time, so it can be
//! evaluated on the host for a parameter set and compared with the layout
//! compiler.

use crate::error::{BlobError, Result};
use crate::layout::{validate_parameter, Params, ARRAY_HEADER_SIZE, ENUM_STORAGE};
use crate::types::{TypeDescriptor, TypeKind, CAPACITY_PARAM, ITEM_PREFIX};
use crate::vector::{padded_groups, LayoutMode};
use std::sync::Arc;

/// One summand of a record size.
#[derive(Debug, Clone, PartialEq)]
pub enum SizeTerm {
    /// Constant width: scalars, enums, plain records and padding.
    Fixed { field: String, bytes: usize },
    /// Parametric field sized by calling its own `sizeof` function.
    Nested {
        field: String,
        ty: Arc<TypeDescriptor>,
        plan: SizePlan,
    },
}

impl SizeTerm {
    pub fn field(&self) -> &str {
        match self {
            Self::Fixed { field, .. } | Self::Nested { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SizePlan {
    /// Parameter independent size.
    Fixed(usize),
    /// Header plus `capacity` elements of the item size.
    Array {
        name: String,
        element: Arc<TypeDescriptor>,
        item: Box<SizePlan>,
    },
    /// Sum of per-field terms in declaration order.
    Record(Vec<SizeTerm>),
}

impl SizePlan {
    /// Plan of `ty` under `mode`.
    pub fn of(ty: &TypeDescriptor, mode: LayoutMode) -> Self {
        match ty.kind() {
            TypeKind::Scalar(kind) => Self::Fixed(kind.width()),
            TypeKind::Enum(_) => Self::Fixed(ENUM_STORAGE.width()),
            TypeKind::Array(array) => Self::Array {
                name: ty.name().to_string(),
                element: Arc::clone(&array.element),
                item: Box::new(Self::of(&array.element, mode)),
            },
            TypeKind::Record(fields) => {
                let padded = padded_groups(fields, mode);
                let mut terms = Vec::with_capacity(fields.len() + padded.len());
                for (i, field) in fields.iter().enumerate() {
                    let plan = Self::of(&field.type_desc, mode);
                    terms.push(match plan {
                        Self::Fixed(bytes) => SizeTerm::Fixed {
                            field: field.name.clone(),
                            bytes,
                        },
                        plan => SizeTerm::Nested {
                            field: field.name.clone(),
                            ty: Arc::clone(&field.type_desc),
                            plan,
                        },
                    });
                    if let Some(group) = padded.iter().find(|g| g.end() == i) {
                        terms.push(SizeTerm::Fixed {
                            field: group.padding_name(),
                            bytes: group.kind.width(),
                        });
                    }
                }
                if ty.is_plain() {
                    Self::Fixed(
                        terms
                            .iter()
                            .map(|t| match t {
                                SizeTerm::Fixed { bytes, .. } => *bytes,
                                SizeTerm::Nested { .. } => 0,
                            })
                            .sum(),
                    )
                } else {
                    Self::Record(terms)
                }
            }
        }
    }

    /// Size when it does not depend on any parameter.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::Fixed(bytes) => Some(*bytes),
            _ => None,
        }
    }

    /// Evaluate the plan for concrete capacities, using the same canonical
    /// parameter names as the layout compiler.
    pub fn evaluate(&self, params: &Params) -> Result<usize> {
        match self {
            Self::Fixed(bytes) => Ok(*bytes),
            Self::Array { name, item, .. } => {
                let raw = params
                    .get(CAPACITY_PARAM)
                    .ok_or_else(|| BlobError::MissingParameter {
                        type_name: name.clone(),
                        parameter: CAPACITY_PARAM.into(),
                    })?;
                let capacity = validate_parameter(CAPACITY_PARAM, raw, usize::MAX)?;
                let item = item.evaluate(&params.scoped(ITEM_PREFIX))?;
                Ok(ARRAY_HEADER_SIZE + capacity * item)
            }
            Self::Record(terms) => {
                let mut size = 0;
                for term in terms {
                    size += match term {
                        SizeTerm::Fixed { bytes, .. } => *bytes,
                        SizeTerm::Nested { field, plan, .. } => {
                            plan.evaluate(&params.scoped(field))?
                        }
                    };
                }
                Ok(size)
            }
        }
    }
}
