// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptor graph.
//!
//! A type is a scalar, an enum, a record of named fields, or a dynamic
//! array of records. Descriptors are immutable and shared through `Arc`.
//!
//! # Example
//!
//! ```rust
//! use blobtypes::types::{RecordBuilder, ScalarKind, TypeDescriptor};
//! use std::sync::Arc;
//!
//! let particle = Arc::new(
//!     RecordBuilder::new("Particle")
//!         .index_field()
//!         .vector("position", ScalarKind::Float32, 3)
//!         .scalar("mass", ScalarKind::Float32)
//!         .build()
//!         .unwrap(),
//! );
//! let particles = TypeDescriptor::array("Particles", particle).unwrap();
//! assert_eq!(particles.parameter_names(), vec!["capacity".to_string()]);
//! ```

mod builder;
mod descriptor;
mod enums;
mod registry;
mod scalar;

pub use builder::RecordBuilder;
pub use descriptor::{
    check_index_field, compute_fingerprint, ArrayDescriptor, FieldDescriptor, TypeDescriptor,
    TypeKind, CAPACITY_PARAM, EMPTY_SLOT, INDEX_FIELD, ITEM_PREFIX, NEXT_FIELD,
};
pub use enums::{EnumBuilder, EnumDescriptor, UNDEFINED_LABEL, UNDEFINED_ORDINAL};
pub use registry::TypeRegistry;
pub use scalar::ScalarKind;
