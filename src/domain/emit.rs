//! Trait emission.
//!
//! Assembles the generated file: a provenance header followed by one
//! `pub trait` block. Methods are materialized as a name-sorted sequence
//! before rendering; the record map is never iterated directly, so repeated
//! runs over unchanged input reproduce the output byte for byte.

use std::collections::BTreeMap;

use crate::domain::extract::MethodRecord;
use crate::domain::package::{ResolvedPackage, TargetSpec, TypeUniverse};
use crate::domain::render;

/// The generated file, split the way it is written: header, trait name, body
/// lines (doc lines and method lines, unindented).
#[derive(Debug)]
pub struct RenderedTrait {
    pub header: String,
    pub name: String,
    pub body: Vec<String>,
}

impl RenderedTrait {
    /// Final file text. Body lines are indented here, so tests can assert on
    /// them without caring about indentation.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.header);
        out.push_str(&format!("pub trait {} {{\n", self.name));
        for line in &self.body {
            if line.is_empty() {
                out.push('\n');
            } else {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str("}\n");
        out
    }
}

/// Build the rendered trait from the extracted method set.
pub fn emit(
    methods: &BTreeMap<String, MethodRecord>,
    spec: &TargetSpec,
    source: &ResolvedPackage,
    universe: &TypeUniverse,
) -> RenderedTrait {
    // Sorted sequence first, rendering second. The map is ordered too, but
    // emission must not depend on that detail.
    let mut ordered: Vec<&MethodRecord> = methods.values().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));

    let dest_ident = universe.dest_ident.clone();

    let mut body = Vec::new();
    for (i, record) in ordered.iter().enumerate() {
        if i > 0 {
            body.push(String::new());
        }
        for line in &record.doc {
            body.push(line.clone());
        }
        body.push(render::render(&record.signature, universe, &dest_ident));
    }

    RenderedTrait {
        header: header(spec, source),
        name: spec.trait_name.clone(),
        body,
    }
}

fn header(spec: &TargetSpec, source: &ResolvedPackage) -> String {
    format!(
        "// Code generated by traitface. DO NOT EDIT.\n\
         //\n\
         // Exported methods of `{pkg}::{ty}` (from {loc}).\n\
         // A mock for this trait can be generated with mockall:\n\
         //\n\
         //     #[cfg_attr(test, mockall::automock)]\n\
         \n",
        pkg = source.ident,
        ty = spec.type_name,
        loc = spec.source_location,
    )
}
