//! Signature rendering.
//!
//! Turns a captured `syn::Signature` into one canonical trait-method line.
//! Types render through their token stream with whitespace normalized; every
//! type path is first rewritten by the qualification rule: destination-local
//! names stay bare, names owned by any other loaded package get that
//! package's crate identifier, `crate::` paths are re-rooted to the source
//! crate, and names the universe cannot place pass through verbatim.

use std::collections::HashSet;

use quote::ToTokens;
use syn::visit_mut::{self, VisitMut};
use syn::{FnArg, Pat, ReturnType};

use crate::domain::package::TypeUniverse;

/// Render `signature` as a bodiless trait-method line, qualified for code
/// that lives in the `dest_ident` crate.
pub fn render(signature: &syn::Signature, universe: &TypeUniverse, dest_ident: &str) -> String {
    let mut sig = signature.clone();

    let mut qualifier = Qualifier {
        universe,
        dest_ident,
        generic_params: generic_param_names(&sig.generics),
    };
    qualifier.visit_signature_mut(&mut sig);

    let mut line = String::new();
    if sig.constness.is_some() {
        line.push_str("const ");
    }
    if sig.asyncness.is_some() {
        line.push_str("async ");
    }
    if sig.unsafety.is_some() {
        line.push_str("unsafe ");
    }
    if let Some(abi) = &sig.abi {
        line.push_str(&tokens_to_string(abi));
        line.push(' ');
    }
    line.push_str("fn ");
    line.push_str(&sig.ident.to_string());
    if !sig.generics.params.is_empty() {
        line.push_str(&tokens_to_string(&sig.generics));
    }

    let mut params = Vec::new();
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(receiver) => params.push(receiver_text(receiver)),
            FnArg::Typed(pat_type) => {
                params.push(format!(
                    "{}: {}",
                    param_name(&pat_type.pat),
                    tokens_to_string(&pat_type.ty)
                ));
            }
        }
    }
    if sig.variadic.is_some() {
        params.push("...".to_string());
    }
    line.push('(');
    line.push_str(&params.join(", "));
    line.push(')');

    if let ReturnType::Type(_, ty) = &sig.output {
        line.push_str(" -> ");
        line.push_str(&tokens_to_string(ty));
    }
    if let Some(where_clause) = &sig.generics.where_clause {
        line.push(' ');
        line.push_str(&tokens_to_string(where_clause));
    }
    line.push(';');
    line
}

/// Receiver rendered by hand: a `mut self` receiver must lose its `mut` to
/// stay legal in a bodiless declaration, and the token stream would keep it.
fn receiver_text(receiver: &syn::Receiver) -> String {
    if receiver.colon_token.is_some() {
        return format!("self: {}", tokens_to_string(&receiver.ty));
    }
    let mut text = String::new();
    if let Some((_, lifetime)) = &receiver.reference {
        text.push('&');
        if let Some(lt) = lifetime {
            text.push_str(&lt.to_string());
            text.push(' ');
        }
        if receiver.mutability.is_some() {
            text.push_str("mut ");
        }
    }
    text.push_str("self");
    text
}

/// Parameter names survive where legal; non-identifier patterns collapse to
/// `_` because bodiless declarations cannot carry them.
fn param_name(pat: &Pat) -> String {
    match pat {
        Pat::Ident(ident) => ident.ident.to_string(),
        Pat::Wild(_) => "_".to_string(),
        _ => "_".to_string(),
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

fn tokens_to_string<T: ToTokens>(tokens: &T) -> String {
    normalize_tokens(&tokens.to_token_stream().to_string())
}

/// Repair the even spacing of `TokenStream::to_string` into conventional
/// source form (`Vec < String >` becomes `Vec<String>`). Replacement order
/// matters; each rule assumes the ones before it already ran.
fn normalize_tokens(raw: &str) -> String {
    let mut text = raw.to_string();
    for (from, to) in [
        (" :: ", "::"),
        (":: ", "::"),
        (" < ", "<"),
        ("< ", "<"),
        (" >", ">"),
        (" ,", ","),
        (" ;", ";"),
        (" : ", ": "),
        ("( ", "("),
        (" )", ")"),
        ("[ ", "["),
        (" ]", "]"),
        ("& ", "&"),
        ("? ", "?"),
        ("Fn (", "Fn("),
        ("FnMut (", "FnMut("),
        ("FnOnce (", "FnOnce("),
    ] {
        text = text.replace(from, to);
    }
    text
}

/// Applies the qualification rule to every path in a signature.
struct Qualifier<'a> {
    universe: &'a TypeUniverse,
    dest_ident: &'a str,
    generic_params: HashSet<String>,
}

impl Qualifier<'_> {
    fn qualify(&self, path: &mut syn::Path) {
        if path.leading_colon.is_some() {
            return;
        }
        if path.segments.len() == 1 {
            let name = path.segments[0].ident.to_string();
            if name == "Self" || self.generic_params.contains(&name) {
                return;
            }
            match self.universe.owner(&name) {
                Some(owner) if owner == self.dest_ident => {}
                Some(owner) => {
                    let ident = syn::Ident::new(owner, proc_macro2::Span::call_site());
                    path.segments.insert(0, syn::PathSegment::from(ident));
                }
                None => {}
            }
            return;
        }

        let first = path.segments[0].ident.to_string();
        if first == "crate" && self.universe.source_ident != self.dest_ident {
            // A `crate::` path written in the source package means the source
            // crate, which is not what `crate` resolves to at the destination.
            path.segments[0].ident =
                syn::Ident::new(&self.universe.source_ident, proc_macro2::Span::call_site());
        } else if first == self.dest_ident {
            let trailing: Vec<syn::PathSegment> = path.segments.iter().skip(1).cloned().collect();
            path.segments.clear();
            for segment in trailing {
                path.segments.push(segment);
            }
        }
    }
}

impl VisitMut for Qualifier<'_> {
    fn visit_path_mut(&mut self, path: &mut syn::Path) {
        self.qualify(path);
        visit_mut::visit_path_mut(self, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::package::{LoadedProgram, LoaderConfig, ResolvedPackage};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn signature(code: &str) -> syn::Signature {
        let item: syn::ItemFn = syn::parse_str(code).unwrap();
        item.sig
    }

    fn universe() -> TypeUniverse {
        let source = ResolvedPackage::from_sources(
            "widgets",
            PathBuf::from("/tmp/widgets"),
            vec![(
                "src/lib.rs".to_string(),
                "pub struct Widget; pub struct Color;".to_string(),
            )],
            BTreeSet::new(),
            &LoaderConfig::default(),
        )
        .unwrap();
        let dest = ResolvedPackage::from_sources(
            "consumer",
            PathBuf::from("/tmp/consumer"),
            vec![("src/lib.rs".to_string(), "pub struct Theme;".to_string())],
            BTreeSet::new(),
            &LoaderConfig::default(),
        )
        .unwrap();
        TypeUniverse::build(&LoadedProgram {
            source,
            dest: Some(dest),
        })
    }

    #[test]
    fn test_render_simple_method() {
        let u = universe();
        let line = render(&signature("fn name(&self) -> String {}"), &u, "consumer");
        assert_eq!(line, "fn name(&self) -> String;");
    }

    #[test]
    fn test_render_keeps_parameter_names_and_order() {
        let u = universe();
        let line = render(
            &signature("fn resize(&mut self, w: u32, h: u32) {}"),
            &u,
            "consumer",
        );
        assert_eq!(line, "fn resize(&mut self, w: u32, h: u32);");
    }

    #[test]
    fn test_render_wildcard_parameter() {
        let u = universe();
        let line = render(&signature("fn set(&self, _: u8) {}"), &u, "consumer");
        assert_eq!(line, "fn set(&self, _: u8);");
    }

    #[test]
    fn test_render_tuple_return() {
        let u = universe();
        let line = render(&signature("fn bounds(&self) -> (u32, u32) {}"), &u, "consumer");
        assert_eq!(line, "fn bounds(&self) -> (u32, u32);");
    }

    #[test]
    fn test_render_value_and_boxed_receivers() {
        let u = universe();
        assert_eq!(
            render(&signature("fn into_inner(mut self) -> String {}"), &u, "consumer"),
            "fn into_inner(self) -> String;"
        );
        assert_eq!(
            render(&signature("fn consume(self: Box<Self>) -> u8 {}"), &u, "consumer"),
            "fn consume(self: Box<Self>) -> u8;"
        );
    }

    #[test]
    fn test_render_async_method() {
        let u = universe();
        let line = render(&signature("async fn fetch(&self) -> String {}"), &u, "consumer");
        assert_eq!(line, "async fn fetch(&self) -> String;");
    }

    #[test]
    fn test_render_generics_and_where_clause() {
        let u = universe();
        let line = render(
            &signature("fn find<T: Clone>(&self, key: T) -> Option<T> where T: Send {}"),
            &u,
            "consumer",
        );
        assert_eq!(
            line,
            "fn find<T: Clone>(&self, key: T) -> Option<T> where T: Send;"
        );
    }

    #[test]
    fn test_source_type_is_crate_qualified() {
        let u = universe();
        let line = render(&signature("fn color(&self) -> Color {}"), &u, "consumer");
        assert_eq!(line, "fn color(&self) -> widgets::Color;");
    }

    #[test]
    fn test_dest_type_renders_bare() {
        let u = universe();
        let line = render(&signature("fn theme(&self) -> Theme {}"), &u, "consumer");
        assert_eq!(line, "fn theme(&self) -> Theme;");
    }

    #[test]
    fn test_dest_rooted_path_is_stripped() {
        let u = universe();
        let line = render(&signature("fn theme(&self) -> consumer::Theme {}"), &u, "consumer");
        assert_eq!(line, "fn theme(&self) -> Theme;");
    }

    #[test]
    fn test_crate_path_rerooted_to_source() {
        let u = universe();
        let line = render(
            &signature("fn shape(&self) -> crate::model::Shape {}"),
            &u,
            "consumer",
        );
        assert_eq!(line, "fn shape(&self) -> widgets::model::Shape;");
    }

    #[test]
    fn test_nested_generic_arguments_are_qualified() {
        let u = universe();
        let line = render(
            &signature("fn palette(&self) -> std::collections::HashMap<String, Color> {}"),
            &u,
            "consumer",
        );
        assert_eq!(
            line,
            "fn palette(&self) -> std::collections::HashMap<String, widgets::Color>;"
        );
    }

    #[test]
    fn test_generic_params_never_qualified() {
        let u = universe();
        // `Color` as a generic parameter shadows the source type of the same
        // name and must stay bare.
        let line = render(
            &signature("fn pick<Color>(&self, c: Color) -> Color {}"),
            &u,
            "consumer",
        );
        assert_eq!(line, "fn pick<Color>(&self, c: Color) -> Color;");
    }

    #[test]
    fn test_normalize_reference_and_lifetime_spacing() {
        let u = universe();
        let line = render(
            &signature("fn view<'a>(&'a self, data: &'a mut Vec<Vec<u8>>) -> &'a str {}"),
            &u,
            "consumer",
        );
        assert_eq!(
            line,
            "fn view<'a>(&'a self, data: &'a mut Vec<Vec<u8>>) -> &'a str;"
        );
    }

    #[test]
    fn test_normalize_fn_trait_sugar() {
        let u = universe();
        let line = render(
            &signature("fn each(&self, visit: impl Fn(u32) -> bool) {}"),
            &u,
            "consumer",
        );
        assert_eq!(line, "fn each(&self, visit: impl Fn(u32) -> bool);");
    }

    #[test]
    fn test_render_same_package_leaves_everything_bare() {
        let source = ResolvedPackage::from_sources(
            "widgets",
            PathBuf::from("/tmp/widgets"),
            vec![(
                "src/lib.rs".to_string(),
                "pub struct Widget; pub struct Color;".to_string(),
            )],
            BTreeSet::new(),
            &LoaderConfig::default(),
        )
        .unwrap();
        let u = TypeUniverse::build(&LoadedProgram {
            source,
            dest: None,
        });
        let line = render(&signature("fn color(&self) -> Color {}"), &u, "widgets");
        assert_eq!(line, "fn color(&self) -> Color;");
    }
}
