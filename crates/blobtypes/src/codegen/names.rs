// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Deterministic C identifiers.

use super::{AddressSpace, NamingMode};
use crate::naming::camel_case_to_underscore;
use crate::types::{TypeDescriptor, TypeKind};

/// Identifier scheme for one address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Names {
    space: AddressSpace,
    naming: NamingMode,
}

impl Names {
    pub fn new(space: AddressSpace, naming: NamingMode) -> Self {
        Self { space, naming }
    }

    pub fn space(&self) -> AddressSpace {
        self.space
    }

    /// `snake_case` form of the type name.
    pub fn snake(ty: &TypeDescriptor) -> String {
        camel_case_to_underscore(ty.name())
    }

    /// Space-qualified stem used by every function name and by the type
    /// name of parametric types: `scene_gt` or `global_scene_t`.
    pub fn stem(&self, ty: &TypeDescriptor) -> String {
        let snake = Self::snake(ty);
        match self.naming {
            NamingMode::Short => format!("{snake}_{}t", self.space.letter()),
            NamingMode::Full => format!("{}_{snake}_t", self.space.word()),
        }
    }

    /// C type name. Plain records and enums share one declaration across
    /// address spaces (`vec3_t`); parametric types are space-qualified.
    pub fn type_name(&self, ty: &TypeDescriptor) -> String {
        let shared = ty.is_plain() && matches!(ty.kind(), TypeKind::Record(_) | TypeKind::Enum(_));
        if shared {
            format!("{}_t", Self::snake(ty))
        } else {
            self.stem(ty)
        }
    }

    /// Type name with the address-space qualifier, e.g. `__global vec3_t`.
    pub fn spaced(&self, ty: &TypeDescriptor) -> String {
        format!("{} {}", self.space.qualifier(), self.type_name(ty))
    }

    pub fn sizeof_fn(&self, ty: &TypeDescriptor) -> String {
        format!("sizeof_{}", self.stem(ty))
    }

    pub fn deserialize_fn(&self, ty: &TypeDescriptor) -> String {
        format!("deserialize_{}", self.stem(ty))
    }

    pub fn copy_fn(&self, ty: &TypeDescriptor) -> String {
        format!("copy_{}", self.stem(ty))
    }

    pub fn item_fn(&self, ty: &TypeDescriptor) -> String {
        format!("get_{}_item", self.stem(ty))
    }

    pub fn init_fn(&self, ty: &TypeDescriptor) -> String {
        format!("init_{}", self.stem(ty))
    }

    /// Vector accessor of a plain record, e.g. `get_unit_gt_position`.
    pub fn vector_fn(&self, ty: &TypeDescriptor, member: &str) -> String {
        format!("get_{}_{member}", self.stem(ty))
    }

    /// `VEC3_SIZE`.
    pub fn size_define(ty: &TypeDescriptor) -> String {
        format!("{}_SIZE", Self::snake(ty).to_uppercase())
    }

    /// `STATE_IDLE`.
    pub fn enum_constant(ty: &TypeDescriptor, label: &str) -> String {
        format!(
            "{}_{}",
            Self::snake(ty).to_uppercase(),
            camel_case_to_underscore(label).to_uppercase()
        )
    }

    /// `state_idle`.
    pub fn enum_member(ty: &TypeDescriptor, label: &str) -> String {
        format!("{}_{}", Self::snake(ty), camel_case_to_underscore(label))
    }
}
