// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parametric records: a struct of pointers into the blob, a running-sum
//! `sizeof` and an offset-walking `deserialize`.

use super::{CFunction, Emitted, Names, SizePlan, SizeTerm};
use crate::error::{BlobError, Result};
use crate::layout::ENUM_STORAGE;
use crate::types::{TypeDescriptor, TypeKind};

pub(crate) fn emit(ty: &TypeDescriptor, plan: &SizePlan, names: &Names) -> Result<Emitted> {
    let SizePlan::Record(terms) = plan else {
        return Err(BlobError::UnsupportedType(ty.name().to_string()));
    };

    Ok(Emitted {
        declaration: declaration(ty, terms, names),
        functions: vec![sizeof_fn(ty, terms, names), deserialize_fn(ty, terms, names)],
    })
}

/// How a field appears inside the pointer struct.
enum Member<'a> {
    /// Pointer straight into the blob.
    Pointer { c_type: String, comment: Option<&'a str> },
    /// Nested struct filled by its own deserializer.
    Nested(&'a TypeDescriptor),
    Padding,
}

fn member<'a>(ty: &'a TypeDescriptor, term: &'a SizeTerm, names: &Names) -> Member<'a> {
    let Some(field) = ty.field(term.field()) else {
        return Member::Padding;
    };
    let qualifier = names.space().qualifier();
    let desc = field.type_desc.as_ref();
    match desc.kind() {
        TypeKind::Scalar(kind) => Member::Pointer {
            c_type: format!("{qualifier} {}", kind.c_type()),
            comment: None,
        },
        TypeKind::Enum(e) => Member::Pointer {
            c_type: format!("{qualifier} {}", ENUM_STORAGE.c_type()),
            comment: Some(e.name()),
        },
        TypeKind::Record(_) if desc.is_plain() => Member::Pointer {
            c_type: names.spaced(desc),
            comment: None,
        },
        TypeKind::Record(_) | TypeKind::Array(_) => Member::Nested(desc),
    }
}

fn declaration(ty: &TypeDescriptor, terms: &[SizeTerm], names: &Names) -> String {
    let cname = names.type_name(ty);
    let mut fields = String::new();
    for term in terms {
        match member(ty, term, names) {
            Member::Pointer { c_type, comment } => {
                fields.push_str(&format!("\t{c_type}* {};", term.field()));
                if let Some(comment) = comment {
                    fields.push_str(&format!(" /* {comment} */"));
                }
                fields.push('\n');
            }
            Member::Nested(desc) => {
                fields.push_str(&format!("\t{} {};\n", names.type_name(desc), term.field()));
            }
            Member::Padding => {}
        }
    }
    format!("/* complex type {cname} */\n\ntypedef struct _{cname}\n{{\n{fields}}} {cname};")
}

/// C expression for the width of `term`, reading nested sizes from
/// `blob + <offset>`.
fn width(term: &SizeTerm, offset: &str, names: &Names) -> String {
    match term {
        SizeTerm::Fixed { bytes, .. } => bytes.to_string(),
        SizeTerm::Nested { ty, .. } => format!("{}(blob + {offset})", names.sizeof_fn(ty)),
    }
}

fn sizeof_fn(ty: &TypeDescriptor, terms: &[SizeTerm], names: &Names) -> CFunction {
    let prototype = format!(
        "unsigned long {}({} char* blob)",
        names.sizeof_fn(ty),
        names.space().qualifier()
    );
    let mut body = format!("{prototype}\n{{\n\tunsigned long size = 0;\n");
    for term in terms {
        body.push_str(&format!(
            "\tsize += {}; /* {} */\n",
            width(term, "size", names),
            term.field()
        ));
    }
    body.push_str("\treturn size;\n}");
    CFunction::new(prototype, body)
}

fn deserialize_fn(ty: &TypeDescriptor, terms: &[SizeTerm], names: &Names) -> CFunction {
    let qualifier = names.space().qualifier();
    let prototype = format!(
        "void {}({qualifier} char* blob, {}* self)",
        names.deserialize_fn(ty),
        names.type_name(ty)
    );
    let mut body = format!("{prototype}\n{{\n\tunsigned long offset = 0;\n");
    for (i, term) in terms.iter().enumerate() {
        let field = term.field();
        match member(ty, term, names) {
            Member::Pointer { c_type, .. } => {
                body.push_str(&format!(
                    "\tself->{field} = ({c_type}*)(blob + offset);\n"
                ));
            }
            Member::Nested(desc) => {
                body.push_str(&format!(
                    "\t{}(blob + offset, &self->{field});\n",
                    names.deserialize_fn(desc)
                ));
            }
            Member::Padding => {}
        }
        if i + 1 < terms.len() {
            body.push_str(&format!(
                "\toffset += {}; /* {field} */\n",
                width(term, "offset", names)
            ));
        }
    }
    body.push('}');
    CFunction::new(prototype, body)
}
