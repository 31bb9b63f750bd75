// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::Emitted;
use crate::layout::Layout;
use std::collections::HashSet;
use std::sync::Arc;

/// A plain type made known to the host side: its C name and byte layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredType {
    pub c_name: String,
    pub layout: Arc<Layout>,
}

/// Accumulated output of one generator run.
///
/// Every text fragment is kept once, no matter how many roots or address
/// spaces produced it.
#[derive(Debug, Clone, Default)]
pub struct GeneratedUnit {
    prologue: String,
    epilogue: String,
    declarations: Vec<String>,
    prototypes: Vec<String>,
    bodies: Vec<String>,
    registry: Vec<RegisteredType>,
    seen: HashSet<String>,
}

impl GeneratedUnit {
    pub fn new(prologue: impl Into<String>, epilogue: impl Into<String>) -> Self {
        Self {
            prologue: prologue.into(),
            epilogue: epilogue.into(),
            ..Self::default()
        }
    }

    pub(crate) fn push(&mut self, emitted: Emitted) {
        if self.seen.insert(emitted.declaration.clone()) {
            self.declarations.push(emitted.declaration);
        }
        for function in emitted.functions {
            let prototype = format!("{};", function.prototype);
            if self.seen.insert(prototype.clone()) {
                self.prototypes.push(prototype);
            }
            if self.seen.insert(function.body.clone()) {
                self.bodies.push(function.body);
            }
        }
    }

    /// Record a plain type; a later registration of the same C name
    /// replaces the earlier one.
    pub(crate) fn register(&mut self, c_name: String, layout: Arc<Layout>) {
        self.registry.retain(|entry| entry.c_name != c_name);
        self.registry.push(RegisteredType { c_name, layout });
    }

    pub fn declarations(&self) -> &[String] {
        &self.declarations
    }

    pub fn prototypes(&self) -> &[String] {
        &self.prototypes
    }

    pub fn bodies(&self) -> &[String] {
        &self.bodies
    }

    pub fn registry(&self) -> &[RegisteredType] {
        &self.registry
    }

    /// Layout registered under a C type name.
    pub fn lookup(&self, c_name: &str) -> Option<&Arc<Layout>> {
        self.registry
            .iter()
            .find(|entry| entry.c_name == c_name)
            .map(|entry| &entry.layout)
    }

    /// Header text: prologue, type declarations, prototypes, epilogue.
    pub fn header(&self) -> String {
        let declarations = self.declarations.join("\n\n");
        let prototypes = self.prototypes.join("\n");
        render(&[
            &banner("header"),
            &self.prologue,
            &declarations,
            &prototypes,
            &self.epilogue,
        ])
    }

    /// Source text: every function body.
    pub fn source(&self) -> String {
        let bodies = self.bodies.join("\n\n");
        render(&[&banner("source"), &bodies])
    }
}

fn banner(part: &str) -> String {
    format!(
        "/* {part} generated by blobtypes {} */",
        env!("CARGO_PKG_VERSION")
    )
}

fn render(parts: &[&str]) -> String {
    let mut out = parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}
