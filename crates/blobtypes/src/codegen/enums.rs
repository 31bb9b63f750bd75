// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{Emitted, Names};
use crate::types::{EnumDescriptor, TypeDescriptor, UNDEFINED_LABEL, UNDEFINED_ORDINAL};

/// Integer constants plus a typedef'd enum. Enums carry no functions.
pub(crate) fn emit(ty: &TypeDescriptor, desc: &EnumDescriptor, names: &Names) -> Emitted {
    let cname = names.type_name(ty);
    let labels: Vec<(i32, &str)> = std::iter::once((UNDEFINED_ORDINAL, UNDEFINED_LABEL))
        .chain(desc.labels())
        .collect();

    let mut constants = String::new();
    let mut members = Vec::with_capacity(labels.len());
    for (ordinal, label) in &labels {
        let constant = Names::enum_constant(ty, label);
        constants.push_str(&format!("#define {constant} {ordinal}\n"));
        members.push(format!("\t{} = {constant}", Names::enum_member(ty, label)));
    }

    let declaration = format!(
        "/* enum type {cname} */\n\n{constants}\ntypedef enum _{cname}\n{{\n{}\n}} {cname};",
        members.join(",\n")
    );
    Emitted {
        declaration,
        functions: Vec::new(),
    }
}
