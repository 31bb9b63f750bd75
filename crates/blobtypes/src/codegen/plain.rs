// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packed structs for plain records.

use super::{CFunction, Emitted, GeneratorConfig, Names};
use crate::error::{BlobError, Result};
use crate::layout::{AccessorKind, Layout};
use crate::naming::join;
use crate::types::{FieldDescriptor, TypeDescriptor, TypeKind};
use crate::vector::{vector_groups, VectorGroup};

pub(crate) fn emit(
    ty: &TypeDescriptor,
    layout: &Layout,
    names: &Names,
    config: &GeneratorConfig,
) -> Result<Emitted> {
    let fields = ty.fields().ok_or_else(|| not_plain(ty, "a plain struct"))?;
    if !ty.is_plain() || layout.is_array() {
        return Err(not_plain(ty, "a plain struct"));
    }

    let mut functions = vec![sizeof_fn(ty, names)];
    if names.space().is_writable() {
        functions.push(copy_fn(ty, layout, names));
    }
    if config.vector_accessors {
        let mut vectors = Vec::new();
        collect_vectors(fields, "", &mut vectors);
        for (member, first, group) in vectors {
            functions.push(vector_fn(ty, &member, &first, &group, names));
        }
    }

    Ok(Emitted {
        declaration: declaration(ty, layout, names)?,
        functions,
    })
}

fn declaration(ty: &TypeDescriptor, layout: &Layout, names: &Names) -> Result<String> {
    let cname = names.type_name(ty);
    let mut fields = String::new();
    for accessor in layout.accessors() {
        match &accessor.kind {
            AccessorKind::Scalar(kind) | AccessorKind::Padding(kind) => {
                fields.push_str(&format!("\t{} {};\n", kind.c_type(), accessor.name));
            }
            AccessorKind::Enum(desc) => {
                fields.push_str(&format!("\tint {}; /* {} */\n", accessor.name, desc.name()));
            }
            AccessorKind::Array(_) => return Err(not_plain(ty, "a plain struct")),
        }
    }
    Ok(format!(
        "/* plain type {cname} */\n\ntypedef struct __attribute__((__packed__)) _{cname}\n{{\n{fields}}} {cname};\n\n#define {} {}",
        Names::size_define(ty),
        layout.size()
    ))
}

fn sizeof_fn(ty: &TypeDescriptor, names: &Names) -> CFunction {
    let prototype = format!(
        "unsigned long {}({} char* blob)",
        names.sizeof_fn(ty),
        names.space().qualifier()
    );
    let body = format!("{prototype}\n{{\n\treturn sizeof({});\n}}", names.type_name(ty));
    CFunction::new(prototype, body)
}

fn copy_fn(ty: &TypeDescriptor, layout: &Layout, names: &Names) -> CFunction {
    let spaced = names.spaced(ty);
    let prototype = format!(
        "void {}({spaced}* source, {spaced}* destination)",
        names.copy_fn(ty)
    );
    let mut body = format!("{prototype}\n{{\n\tif(destination == 0 || source == 0) return;\n");
    for accessor in layout.accessors() {
        body.push_str(&format!(
            "\tdestination->{0} = source->{0};\n",
            accessor.name
        ));
    }
    body.push('}');
    CFunction::new(prototype, body)
}

fn vector_fn(
    ty: &TypeDescriptor,
    member: &str,
    first: &str,
    group: &VectorGroup,
    names: &Names,
) -> CFunction {
    let prototype = format!(
        "{} {}({}* self)",
        group.c_type(),
        names.vector_fn(ty, member),
        names.spaced(ty)
    );
    let body = format!(
        "{prototype}\n{{\n\treturn vload{}(0, &self->{first});\n}}",
        group.len
    );
    CFunction::new(prototype, body)
}

/// Three- and four-component groups reachable through nested plain
/// records, as `(member, first component, group)`.
fn collect_vectors(
    fields: &[FieldDescriptor],
    prefix: &str,
    out: &mut Vec<(String, String, VectorGroup)>,
) {
    for group in vector_groups(fields) {
        if group.len >= 3 {
            out.push((
                join(prefix, &group.member_name()),
                join(prefix, &fields[group.start].name),
                group,
            ));
        }
    }
    for field in fields {
        if let TypeKind::Record(inner) = field.type_desc.kind() {
            collect_vectors(inner, &join(prefix, &field.name), out);
        }
    }
}

fn not_plain(ty: &TypeDescriptor, context: &str) -> BlobError {
    BlobError::UnsupportedNesting {
        type_name: ty.name().to_string(),
        context: context.to_string(),
    }
}
