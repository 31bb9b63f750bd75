// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # blobtypes
//!
//! Schema-driven binary layouts shared between host code and OpenCL kernels.
//!
//! A type is described once as a [`TypeDescriptor`] graph. From it the
//! crate derives a byte [`Layout`] for concrete array capacities, reads and
//! writes values in place through zero-copy views, and emits the matching
//! OpenCL C declarations and accessor functions.
//!
//! ## Quick Start
//!
//! ```rust
//! use blobtypes::{BlobView, LayoutCompiler, LayoutConfig, Params, RecordBuilder, ScalarKind, Value};
//!
//! let body = RecordBuilder::new("Body")
//!     .vector("position", ScalarKind::Float32, 3)
//!     .scalar("health", ScalarKind::Int32)
//!     .build()
//!     .unwrap();
//! let compiler = LayoutCompiler::new(LayoutConfig::default());
//!
//! let tree = Value::map()
//!     .with("position", Value::map().with("x", 1.0).with("y", 2.0).with("z", 3.0))
//!     .with("health", 100);
//! let view = BlobView::from_value_tree(&compiler, &body, &tree, &Params::new()).unwrap();
//!
//! assert_eq!(view.bytes().len(), 20);
//! assert_eq!(view.get_i32("health").unwrap(), 100);
//! ```
//!
//! ## Layout Rules
//!
//! ```text
//! record   fields packed in declaration order, no alignment
//!          3-component vector groups take a trailing padding field (aligned mode)
//! array    +----------+---------+--------+--------+-----+
//!          | capacity | count   | slot 0 | slot 1 | ... |
//!          | int32    | int32   |        |        |     |
//!          +----------+---------+--------+--------+-----+
//!          each slot starts with its int32 index, -1 when empty
//! ```
//!
//! ## Modules Overview
//!
//! - [`types`] - type descriptor graph and builders
//! - [`vector`] - vector grouping and alignment padding
//! - [`layout`] - layout compiler and cache
//! - [`view`] - zero-copy field access and value trees
//! - [`array`] - slot arrays and linked lists
//! - [`codegen`] - OpenCL C generation
//! - [`schema`] - JSON schema documents

pub mod array;
pub mod codegen;
pub mod error;
pub mod layout;
pub mod naming;
pub mod schema;
pub mod types;
pub mod value;
pub mod vector;
pub mod view;

pub use array::{ArrayView, CountReconciliation, LinkedList, ListHead, SlotCursor};
pub use codegen::{generate, AddressSpace, GeneratedUnit, Generator, GeneratorConfig, NamingMode};
pub use error::{BlobError, Result};
pub use layout::{Layout, LayoutCache, LayoutCompiler, LayoutConfig, Params};
pub use schema::{load_registry, Schema};
pub use types::{EnumBuilder, RecordBuilder, ScalarKind, TypeDescriptor, TypeRegistry};
pub use value::Value;
pub use vector::LayoutMode;
pub use view::{BlobView, FieldDiff};
