//! Method extraction for trait generation.
//!
//! Walks every item of a resolved package, recursing into inline modules, and
//! collects the public methods of inherent impl blocks whose self type matches
//! the target name. Receiver indirection is stripped once, before matching, so
//! `impl Widget`, `impl &Widget` and friends all bind to the same logical type.

use std::collections::{BTreeMap, HashSet};

use syn::visit_mut::{self, VisitMut};
use syn::{Attribute, ImplItem, Item, Type, Visibility};

use crate::domain::error::GenerateError;
use crate::domain::package::{ResolvedPackage, SourceFile};

/// One exported method of the target type.
#[derive(Debug, Clone)]
pub struct MethodRecord {
    pub name: String,
    /// Captured signature, import-expanded and body-free. May reference
    /// generic or otherwise unresolvable types; the renderer passes those
    /// through verbatim.
    pub signature: syn::Signature,
    /// Raw `///` lines attached to the method, in order. Possibly empty.
    pub doc: Vec<String>,
    /// `file:line` of the method identifier.
    pub location: String,
}

/// Collect the exported method set of `type_name` across the whole package.
///
/// An empty result is fatal: an empty trait is never useful output and almost
/// always means a typo in the type name or an unexported type.
pub fn extract(
    pkg: &ResolvedPackage,
    type_name: &str,
) -> Result<BTreeMap<String, MethodRecord>, GenerateError> {
    let mut methods = BTreeMap::new();

    for file in &pkg.files {
        extract_from_items(&file.ast.items, file, pkg, type_name, &mut methods)?;
    }

    if methods.is_empty() {
        return Err(GenerateError::NoMethodsFound {
            type_name: type_name.to_string(),
            package: format!("{} ({})", pkg.name, pkg.manifest_dir.display()),
        });
    }

    Ok(methods)
}

fn extract_from_items(
    items: &[Item],
    file: &SourceFile,
    pkg: &ResolvedPackage,
    type_name: &str,
    methods: &mut BTreeMap<String, MethodRecord>,
) -> Result<(), GenerateError> {
    for item in items {
        match item {
            Item::Impl(imp) => {
                // Trait impls are not part of the inherent method set; their
                // methods already have a substitution trait.
                if imp.trait_.is_some() {
                    continue;
                }

                let impl_line = imp.impl_token.span.start().line;
                let resolved = receiver_type_ident(&imp.self_ty).map_err(|context| {
                    GenerateError::TypeResolutionFailure {
                        context,
                        location: format!("{}:{}", file.path, impl_line),
                    }
                })?;

                let Some(name) = resolved else { continue };
                if name != type_name {
                    continue;
                }

                let impl_generics: HashSet<String> = generic_param_names(&imp.generics);

                for impl_item in &imp.items {
                    let ImplItem::Fn(method) = impl_item else { continue };
                    // Only `pub` counts as exported; restricted visibilities
                    // like pub(crate) stay inside the package.
                    if !matches!(method.vis, Visibility::Public(_)) {
                        continue;
                    }
                    // A function without a receiver is an associated function,
                    // not a method of the type.
                    if method.sig.receiver().is_none() {
                        continue;
                    }

                    let mut signature = method.sig.clone();
                    let mut skip = impl_generics.clone();
                    skip.extend(generic_param_names(&signature.generics));

                    let mut expander = ImportExpander {
                        file,
                        pkg,
                        generic_params: &skip,
                    };
                    expander.visit_signature_mut(&mut signature);

                    let line = method.sig.ident.span().start().line;
                    let record = MethodRecord {
                        name: signature.ident.to_string(),
                        signature,
                        doc: doc_lines(&method.attrs),
                        location: format!("{}:{}", file.path, line),
                    };

                    if let Some(previous) = methods.insert(record.name.clone(), record) {
                        let current = &methods[&previous.name];
                        log::warn!(
                            "method name {} recurs: keeping {} over {}",
                            previous.name,
                            current.location,
                            previous.location
                        );
                    }
                }
            }
            Item::Mod(module) => {
                if let Some((_, content)) = &module.content {
                    extract_from_items(content, file, pkg, type_name, methods)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Strip indirection from an impl self type and return its simple name.
///
/// `Ok(None)` means the impl is for something that can never match a named
/// type (tuples, slices); `Err` means the type cannot be resolved at all, and
/// the run must not emit a possibly-wrong trait.
fn receiver_type_ident(mut ty: &Type) -> Result<Option<String>, String> {
    loop {
        match ty {
            Type::Reference(r) => ty = &r.elem,
            Type::Ptr(p) => ty = &p.elem,
            Type::Paren(p) => ty = &p.elem,
            Type::Group(g) => ty = &g.elem,
            Type::Path(tp) => {
                if tp.qself.is_some() {
                    return Ok(None);
                }
                return Ok(tp.path.segments.last().map(|seg| seg.ident.to_string()));
            }
            Type::Macro(_) => return Err("macro self type".to_string()),
            Type::Infer(_) => return Err("inferred self type".to_string()),
            _ => return Ok(None),
        }
    }
}

fn generic_param_names(generics: &syn::Generics) -> HashSet<String> {
    generics
        .params
        .iter()
        .filter_map(|param| match param {
            syn::GenericParam::Type(t) => Some(t.ident.to_string()),
            syn::GenericParam::Const(c) => Some(c.ident.to_string()),
            syn::GenericParam::Lifetime(_) => None,
        })
        .collect()
}

/// Doc attribute lines, rebuilt as the `///` text the author wrote.
fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter_map(|attr| {
            if !attr.path().is_ident("doc") {
                return None;
            }
            if let syn::Meta::NameValue(nv) = &attr.meta {
                if let syn::Expr::Lit(lit) = &nv.value {
                    if let syn::Lit::Str(s) = &lit.lit {
                        return Some(format!("///{}", s.value()));
                    }
                }
            }
            None
        })
        .collect()
}

/// Rewrites single-segment type names to the full paths their file imported,
/// the analogue of resolving a name to its fully-qualified type. Locally
/// declared types and generic parameters are left for the renderer to place.
struct ImportExpander<'a> {
    file: &'a SourceFile,
    pkg: &'a ResolvedPackage,
    generic_params: &'a HashSet<String>,
}

impl VisitMut for ImportExpander<'_> {
    fn visit_path_mut(&mut self, path: &mut syn::Path) {
        if path.leading_colon.is_none() && path.segments.len() == 1 {
            let name = path.segments[0].ident.to_string();
            if name != "Self"
                && !self.generic_params.contains(&name)
                && !self.pkg.declared_types.contains(&name)
            {
                if let Some(full) = self.file.imports.get(&name) {
                    let arguments = path.segments[0].arguments.clone();
                    *path = path_from_segments(full);
                    if let Some(last) = path.segments.last_mut() {
                        last.arguments = arguments;
                    }
                }
            }
        }
        visit_mut::visit_path_mut(self, path);
    }
}

fn path_from_segments(segments: &[String]) -> syn::Path {
    let mut path = syn::Path {
        leading_colon: None,
        segments: syn::punctuated::Punctuated::new(),
    };
    for segment in segments {
        let ident = syn::Ident::new(segment, proc_macro2::Span::call_site());
        path.segments.push(syn::PathSegment::from(ident));
    }
    path
}
