// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recursive layout derivation.

use super::{
    ArrayShape, FieldKind, Layout, LayoutCache, LayoutConfig, LayoutField, LayoutKey, Params,
    CAPACITY_FIELD, COUNT_FIELD, ENUM_STORAGE, VALUE_FIELD,
};
use crate::error::{BlobError, Result};
use crate::types::{ScalarKind, TypeDescriptor, TypeKind, CAPACITY_PARAM, ITEM_PREFIX};
use crate::vector::padded_groups;
use std::collections::HashMap;
use std::sync::Arc;

/// Computes and memoizes [`Layout`]s.
///
/// Cloning is cheap and shares the cache.
#[derive(Debug, Clone)]
pub struct LayoutCompiler {
    config: LayoutConfig,
    cache: Arc<LayoutCache>,
}

impl LayoutCompiler {
    /// Compiler with a private cache.
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_cache(config, Arc::new(LayoutCache::new()))
    }

    /// Compiler sharing an externally owned cache.
    pub fn with_cache(config: LayoutConfig, cache: Arc<LayoutCache>) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<LayoutCache> {
        &self.cache
    }

    /// Compute the layout of `ty` under `params`.
    ///
    /// Only the parameters `ty` requires are validated and keyed on;
    /// extra entries are ignored.
    pub fn compute_layout(&self, ty: &TypeDescriptor, params: &Params) -> Result<Arc<Layout>> {
        let required = params.required_by(ty, self.config.max_parameter)?;
        let key = LayoutKey::new(ty, self.config.mode, &required);
        self.cache
            .get_or_try_build(key, || self.build(ty, required.clone()))
    }

    /// Layout of a plain type, which takes no parameters.
    pub fn plain_layout(&self, ty: &TypeDescriptor) -> Result<Arc<Layout>> {
        if !ty.is_plain() {
            return Err(BlobError::UnsupportedNesting {
                type_name: ty.name().to_string(),
                context: "a plain layout".into(),
            });
        }
        self.compute_layout(ty, &Params::new())
    }

    fn build(&self, ty: &TypeDescriptor, params: Params) -> Result<Layout> {
        let mode = self.config.mode;
        match ty.kind() {
            TypeKind::Scalar(kind) => {
                let field = LayoutField {
                    name: VALUE_FIELD.into(),
                    offset: 0,
                    size: kind.width(),
                    kind: FieldKind::Scalar(*kind),
                };
                Layout::new(ty.name(), mode, params, vec![field], None)
            }
            TypeKind::Enum(desc) => {
                let field = LayoutField {
                    name: VALUE_FIELD.into(),
                    offset: 0,
                    size: ENUM_STORAGE.width(),
                    kind: FieldKind::Enum(Arc::clone(desc)),
                };
                Layout::new(ty.name(), mode, params, vec![field], None)
            }
            TypeKind::Record(fields) => {
                let padding: HashMap<usize, _> = padded_groups(fields, mode)
                    .into_iter()
                    .map(|group| (group.end(), group))
                    .collect();

                let mut out = Vec::with_capacity(fields.len() + padding.len());
                let mut offset = 0;
                for (i, field) in fields.iter().enumerate() {
                    let (kind, size) = match field.type_desc.kind() {
                        TypeKind::Scalar(kind) => (FieldKind::Scalar(*kind), kind.width()),
                        TypeKind::Enum(desc) => {
                            (FieldKind::Enum(Arc::clone(desc)), ENUM_STORAGE.width())
                        }
                        TypeKind::Record(_) => {
                            let sub = self
                                .compute_layout(&field.type_desc, &params.scoped(&field.name))?;
                            let size = sub.size();
                            (FieldKind::Record(sub), size)
                        }
                        TypeKind::Array(_) => {
                            let sub = self
                                .compute_layout(&field.type_desc, &params.scoped(&field.name))?;
                            let size = sub.size();
                            (FieldKind::Array(sub), size)
                        }
                    };
                    out.push(LayoutField {
                        name: field.name.clone(),
                        offset,
                        size,
                        kind,
                    });
                    offset += size;

                    if let Some(group) = padding.get(&i) {
                        let width = group.kind.width();
                        out.push(LayoutField {
                            name: group.padding_name(),
                            offset,
                            size: width,
                            kind: FieldKind::Padding(group.kind),
                        });
                        offset += width;
                    }
                }
                Layout::new(ty.name(), mode, params, out, None)
            }
            TypeKind::Array(array) => {
                let capacity = params
                    .get(CAPACITY_PARAM)
                    .and_then(|v| usize::try_from(v).ok())
                    .ok_or_else(|| BlobError::MissingParameter {
                        type_name: ty.name().to_string(),
                        parameter: CAPACITY_PARAM.into(),
                    })?;
                let element = self.compute_layout(&array.element, &params.scoped(ITEM_PREFIX))?;
                let header = vec![
                    LayoutField {
                        name: CAPACITY_FIELD.into(),
                        offset: 0,
                        size: ScalarKind::Int32.width(),
                        kind: FieldKind::Scalar(ScalarKind::Int32),
                    },
                    LayoutField {
                        name: COUNT_FIELD.into(),
                        offset: ScalarKind::Int32.width(),
                        size: ScalarKind::Int32.width(),
                        kind: FieldKind::Scalar(ScalarKind::Int32),
                    },
                ];
                let shape = ArrayShape { capacity, element };
                Layout::new(ty.name(), mode, params, header, Some(shape))
            }
        }
    }
}
