// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Array accessors: header pointers, item lookup and slot initialization.

use super::{CFunction, Emitted, Names};
use crate::layout::{ARRAY_HEADER_SIZE, CAPACITY_FIELD, COUNT_FIELD, ENUM_STORAGE};
use crate::types::{TypeDescriptor, EMPTY_SLOT};

/// Pointer to the first element slot.
pub(crate) const FIRST_FIELD: &str = "first";

pub(crate) fn emit(ty: &TypeDescriptor, element: &TypeDescriptor, names: &Names) -> Emitted {
    let mut functions = vec![
        sizeof_fn(ty, element, names),
        deserialize_fn(ty, names),
        item_fn(ty, element, names),
    ];
    if names.space().is_writable() {
        functions.push(init_fn(ty, element, names));
    }
    Emitted {
        declaration: declaration(ty, names),
        functions,
    }
}

fn declaration(ty: &TypeDescriptor, names: &Names) -> String {
    let cname = names.type_name(ty);
    let qualifier = names.space().qualifier();
    let int = ENUM_STORAGE.c_type();
    format!(
        "/* array type {cname} */\n\ntypedef struct __attribute__((__packed__)) _{cname}\n{{\n\
         \t{qualifier} {int}* {CAPACITY_FIELD};\n\
         \t{qualifier} {int}* {COUNT_FIELD};\n\
         \t{qualifier} char* {FIRST_FIELD};\n\
         }} {cname};"
    )
}

fn sizeof_fn(ty: &TypeDescriptor, element: &TypeDescriptor, names: &Names) -> CFunction {
    let qualifier = names.space().qualifier();
    let prototype = format!("unsigned long {}({qualifier} char* blob)", names.sizeof_fn(ty));
    let body = format!(
        "{prototype}\n{{\n\
         \tint capacity = *(({qualifier} int*)blob);\n\
         \tunsigned long item_size = {}(blob + {ARRAY_HEADER_SIZE});\n\
         \treturn {ARRAY_HEADER_SIZE} + capacity * item_size;\n}}",
        names.sizeof_fn(element)
    );
    CFunction::new(prototype, body)
}

fn deserialize_fn(ty: &TypeDescriptor, names: &Names) -> CFunction {
    let qualifier = names.space().qualifier();
    let prototype = format!(
        "void {}({qualifier} char* blob, {}* self)",
        names.deserialize_fn(ty),
        names.type_name(ty)
    );
    let body = format!(
        "{prototype}\n{{\n\
         \tself->{CAPACITY_FIELD} = ({qualifier} int*)(blob);\n\
         \tself->{COUNT_FIELD} = ({qualifier} int*)(blob + {});\n\
         \tself->{FIRST_FIELD} = blob + {ARRAY_HEADER_SIZE};\n}}",
        ARRAY_HEADER_SIZE / 2
    );
    CFunction::new(prototype, body)
}

fn item_fn(ty: &TypeDescriptor, element: &TypeDescriptor, names: &Names) -> CFunction {
    let cname = names.type_name(ty);
    let function = names.item_fn(ty);
    let guard = format!("\tif(index < 0 || index >= *array.{CAPACITY_FIELD})\n");
    let offset = format!(
        "\tunsigned long offset = index * {}(array.{FIRST_FIELD});\n",
        names.sizeof_fn(element)
    );

    if element.is_plain() {
        let spaced = names.spaced(element);
        let prototype = format!("{spaced}* {function}({cname} array, int index)");
        let body = format!(
            "{prototype}\n{{\n{guard}\t\treturn 0;\n{offset}\
             \treturn ({spaced}*)(array.{FIRST_FIELD} + offset);\n}}"
        );
        CFunction::new(prototype, body)
    } else {
        let prototype = format!(
            "void {function}({cname} array, int index, {}* item)",
            names.type_name(element)
        );
        let body = format!(
            "{prototype}\n{{\n{guard}\t\treturn;\n{offset}\
             \t{}(array.{FIRST_FIELD} + offset, item);\n}}",
            names.deserialize_fn(element)
        );
        CFunction::new(prototype, body)
    }
}

/// Writes the header and an empty sentinel into every slot. Parametric
/// elements take their byte width as an argument since no element exists
/// yet to measure.
fn init_fn(ty: &TypeDescriptor, element: &TypeDescriptor, names: &Names) -> CFunction {
    let qualifier = names.space().qualifier();
    let (extra, item_size) = if element.is_plain() {
        (String::new(), format!("sizeof({})", names.type_name(element)))
    } else {
        (", unsigned long item_size".to_string(), "item_size".to_string())
    };
    let prototype = format!(
        "void {}({qualifier} char* blob, int capacity{extra})",
        names.init_fn(ty)
    );
    let body = format!(
        "{prototype}\n{{\n\
         \t*(({qualifier} int*)blob) = capacity;\n\
         \t*(({qualifier} int*)(blob + {})) = 0;\n\
         \tfor(int i = 0; i < capacity; i++)\n\
         \t\t*(({qualifier} int*)(blob + {ARRAY_HEADER_SIZE} + i * {item_size})) = {EMPTY_SLOT};\n}}",
        ARRAY_HEADER_SIZE / 2
    );
    CFunction::new(prototype, body)
}
