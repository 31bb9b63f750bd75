// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OpenCL C code generator.
//!
//! Emits, for each requested type and address space, a C declaration plus
//! the functions kernels need to walk a blob: `sizeof_`, `deserialize_`,
//! `copy_`, array item lookup, array initialization and vector accessors.
//! Dependencies are emitted before the types that use them, and a type
//! requested several times (from several roots or address spaces) appears
//! once per distinct text.
//!
//! # Example
//!
//! ```rust
//! use blobtypes::codegen::{generate, AddressSpace, GeneratorConfig};
//! use blobtypes::layout::{LayoutCompiler, LayoutConfig};
//! use blobtypes::types::{RecordBuilder, ScalarKind};
//!
//! let vec3 = RecordBuilder::new("Vec3")
//!     .vector("", ScalarKind::Float32, 3)
//!     .build()
//!     .unwrap();
//! let compiler = LayoutCompiler::new(LayoutConfig::default());
//! let unit = generate(&compiler, GeneratorConfig::default(), &[&vec3], AddressSpace::Global)
//!     .unwrap();
//! assert!(unit.header().contains("#define VEC3_SIZE 16"));
//! assert!(unit.source().contains("sizeof_vec3_gt"));
//! ```

mod array;
mod complex;
mod enums;
mod names;
mod plain;
mod plan;
mod unit;

pub use names::Names;
pub use plan::{SizePlan, SizeTerm};
pub use unit::{GeneratedUnit, RegisteredType};

use crate::array::head_type;
use crate::error::{BlobError, Result};
use crate::layout::LayoutCompiler;
use crate::types::{check_index_field, TypeDescriptor, TypeKind, NEXT_FIELD};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// OpenCL address space a generated type lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AddressSpace {
    Private,
    Local,
    Constant,
    Global,
}

impl AddressSpace {
    pub const ALL: [AddressSpace; 4] = [Self::Private, Self::Local, Self::Constant, Self::Global];

    /// Qualifier keyword, e.g. `__global`.
    pub fn qualifier(self) -> &'static str {
        match self {
            Self::Private => "__private",
            Self::Local => "__local",
            Self::Constant => "__constant",
            Self::Global => "__global",
        }
    }

    /// Single-letter tag used by [`NamingMode::Short`].
    pub fn letter(self) -> char {
        match self {
            Self::Private => 'p',
            Self::Local => 'l',
            Self::Constant => 'c',
            Self::Global => 'g',
        }
    }

    pub fn word(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Local => "local",
            Self::Constant => "constant",
            Self::Global => "global",
        }
    }

    /// `__constant` memory is read-only for kernels.
    pub fn is_writable(self) -> bool {
        self != Self::Constant
    }
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualifier())
    }
}

impl FromStr for AddressSpace {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|space| s == space.word() || s == space.qualifier())
            .ok_or_else(|| BlobError::InvalidSchema(format!("unknown address space '{s}'")))
    }
}

/// How address spaces are spelled in identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingMode {
    /// `scene_gt`
    #[default]
    Short,
    /// `global_scene_t`
    Full,
}

impl FromStr for NamingMode {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "short" => Ok(Self::Short),
            "full" => Ok(Self::Full),
            other => Err(BlobError::InvalidSchema(format!(
                "unknown naming mode '{other}'"
            ))),
        }
    }
}

/// Generator options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub naming: NamingMode,
    /// Text placed at the top of the header.
    pub prologue: String,
    /// Text placed at the bottom of the header.
    pub epilogue: String,
    /// Emit `vloadN` accessors for vector groups of plain records.
    pub vector_accessors: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            naming: NamingMode::Short,
            prologue: String::new(),
            epilogue: String::new(),
            vector_accessors: true,
        }
    }
}

impl GeneratorConfig {
    pub fn with_naming(mut self, naming: NamingMode) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_prologue(mut self, prologue: impl Into<String>) -> Self {
        self.prologue = prologue.into();
        self
    }

    pub fn with_epilogue(mut self, epilogue: impl Into<String>) -> Self {
        self.epilogue = epilogue.into();
        self
    }

    pub fn with_vector_accessors(mut self, enabled: bool) -> Self {
        self.vector_accessors = enabled;
        self
    }
}

/// One generated C function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CFunction {
    /// Signature without the trailing semicolon.
    pub prototype: String,
    /// Complete definition, signature included.
    pub body: String,
}

impl CFunction {
    pub(crate) fn new(prototype: String, body: String) -> Self {
        Self { prototype, body }
    }
}

/// Output of one emitter for one type and address space.
#[derive(Debug, Clone)]
pub(crate) struct Emitted {
    pub declaration: String,
    pub functions: Vec<CFunction>,
}

/// Incremental generator; feed it roots for any number of address spaces
/// and take the unit with [`Generator::finish`].
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    compiler: LayoutCompiler,
    unit: GeneratedUnit,
    visited: HashSet<(String, u32, AddressSpace)>,
}

impl Generator {
    pub fn new(config: GeneratorConfig, compiler: LayoutCompiler) -> Self {
        let unit = GeneratedUnit::new(config.prologue.clone(), config.epilogue.clone());
        Self {
            config,
            compiler,
            unit,
            visited: HashSet::new(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Emit `ty` and its dependencies for `space`.
    ///
    /// Root scalars have no C counterpart and are rejected.
    pub fn add(&mut self, ty: &TypeDescriptor, space: AddressSpace) -> Result<()> {
        if let TypeKind::Scalar(_) = ty.kind() {
            return Err(BlobError::UnsupportedType(ty.name().to_string()));
        }
        self.visit(ty, space)
    }

    /// Emit a linked-list element array together with the list head struct.
    pub fn add_list(&mut self, array_ty: &TypeDescriptor, space: AddressSpace) -> Result<()> {
        let element = array_ty
            .element()
            .ok_or_else(|| BlobError::UnsupportedType(array_ty.name().to_string()))?;
        if !element.is_list_element() {
            return Err(BlobError::MissingElementIndexField {
                array: array_ty.name().to_string(),
                element: element.name().to_string(),
                field: NEXT_FIELD.to_string(),
            });
        }
        self.visit(&head_type()?, space)?;
        self.add(array_ty, space)
    }

    /// Size plan of `ty` under the compiler's layout mode.
    pub fn size_plan(&self, ty: &TypeDescriptor) -> SizePlan {
        SizePlan::of(ty, self.compiler.config().mode)
    }

    pub fn unit(&self) -> &GeneratedUnit {
        &self.unit
    }

    pub fn finish(self) -> GeneratedUnit {
        self.unit
    }

    fn visit(&mut self, ty: &TypeDescriptor, space: AddressSpace) -> Result<()> {
        let key = (ty.name().to_string(), ty.fingerprint(), space);
        if self.visited.contains(&key) {
            return Ok(());
        }

        let names = Names::new(space, self.config.naming);
        let emitted = match ty.kind() {
            TypeKind::Scalar(_) => return Ok(()),
            TypeKind::Enum(desc) => enums::emit(ty, desc, &names),
            TypeKind::Record(fields) => {
                for field in fields {
                    self.visit(&field.type_desc, space)?;
                }
                if ty.is_plain() {
                    let layout = self.compiler.plain_layout(ty)?;
                    let emitted = plain::emit(ty, &layout, &names, &self.config)?;
                    self.unit.register(names.type_name(ty), layout);
                    emitted
                } else {
                    complex::emit(ty, &self.size_plan(ty), &names)?
                }
            }
            TypeKind::Array(array) => {
                check_index_field(ty.name(), &array.element)?;
                self.visit(&array.element, space)?;
                array::emit(ty, &array.element, &names)
            }
        };

        log::debug!(
            "[codegen] emitted {} as {} ({} functions)",
            ty.name(),
            names.type_name(ty),
            emitted.functions.len()
        );
        self.unit.push(emitted);
        self.visited.insert(key);
        Ok(())
    }
}

/// Generate one unit for `roots` in a single address space.
pub fn generate(
    compiler: &LayoutCompiler,
    config: GeneratorConfig,
    roots: &[&TypeDescriptor],
    space: AddressSpace,
) -> Result<GeneratedUnit> {
    let mut generator = Generator::new(config, compiler.clone());
    for root in roots {
        generator.add(root, space)?;
    }
    Ok(generator.finish())
}
