//! Parsed-package model for trait generation.
//!
//! A `ResolvedPackage` is the snapshot every later stage works from: the syn
//! AST of each source file, a per-file import table, and the set of type names
//! the package declares. Parsing is tolerant by contract (`LoaderConfig`), so
//! a package with broken files still yields a usable snapshot.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use syn::{Item, UseTree};

use crate::domain::error::GenerateError;

/// Root idents a `use` path may start with without naming a dependency.
const BUILTIN_ROOTS: &[&str] = &["std", "core", "alloc", "proc_macro", "crate", "self", "super"];

/// Immutable run input, produced once by the CLI.
#[derive(Debug, Clone)]
pub struct TargetSpec {
    /// File path or package name that contains the type declaration.
    pub source_location: String,
    /// Simple name of the source struct type.
    pub type_name: String,
    /// Name of the trait to generate.
    pub trait_name: String,
    /// Destination package name (used in the header and for qualification).
    pub dest_package: String,
}

/// Tolerance policy for loading a possibly-broken program.
///
/// These are an explicit contract, not a side effect: tests flip them off to
/// observe the strict behavior.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Discard function and method bodies right after parse; only
    /// declaration-level shapes survive into the snapshot.
    pub skip_fn_bodies: bool,
    /// Skip files that fail to parse instead of aborting the load.
    pub suppress_diagnostics: bool,
    /// Tolerate `use` paths rooted at crates unknown to the dependency set.
    pub allow_unresolved_imports: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            skip_fn_bodies: true,
            suppress_diagnostics: true,
            allow_unresolved_imports: true,
        }
    }
}

/// One parsed source file plus its import table.
#[derive(Debug)]
pub struct SourceFile {
    pub path: String,
    pub ast: syn::File,
    /// Imported simple name -> full path segments, e.g.
    /// "HashMap" -> ["std", "collections", "HashMap"]. Only entries whose
    /// root can be pinned to a crate (or `crate` itself) are kept; `self`/
    /// `super` imports resolve through the declared-type set instead.
    pub imports: HashMap<String, Vec<String>>,
}

/// A fully parsed package: the read-only handle shared by extractor and
/// renderer.
#[derive(Debug)]
pub struct ResolvedPackage {
    /// Package name as spelled in the manifest.
    pub name: String,
    /// Crate identifier (`-` mapped to `_`).
    pub ident: String,
    pub manifest_dir: PathBuf,
    pub files: Vec<SourceFile>,
    /// Simple names of every struct/enum/union/type-alias/trait the package
    /// declares, across all files and inline modules.
    pub declared_types: BTreeSet<String>,
    /// Crate idents this package may legitimately import from.
    pub known_crates: BTreeSet<String>,
}

impl ResolvedPackage {
    /// Build a snapshot from in-memory `(path, code)` sources.
    ///
    /// This is the single construction path for both the cargo loader and
    /// tests; only file collection differs between them.
    pub fn from_sources(
        name: &str,
        manifest_dir: PathBuf,
        sources: Vec<(String, String)>,
        known_crates: BTreeSet<String>,
        config: &LoaderConfig,
    ) -> Result<Self, GenerateError> {
        if sources.is_empty() {
            return Err(GenerateError::package_not_found(name, "no source files"));
        }

        let mut files = Vec::new();
        for (path, code) in sources {
            match syn::parse_file(&code) {
                Ok(mut ast) => {
                    if config.skip_fn_bodies {
                        strip_bodies(&mut ast.items);
                    }
                    let imports = collect_imports(&ast.items);
                    files.push(SourceFile { path, ast, imports });
                }
                Err(e) if config.suppress_diagnostics => {
                    log::warn!("skipping unparseable file {}: {}", path, e);
                }
                Err(e) => {
                    return Err(GenerateError::package_not_found(
                        name,
                        format!("parse error in {}: {}", path, e),
                    ));
                }
            }
        }

        if files.is_empty() {
            return Err(GenerateError::package_not_found(
                name,
                "no parseable source files",
            ));
        }

        let mut declared_types = BTreeSet::new();
        for file in &files {
            collect_declared_types(&file.ast.items, &mut declared_types);
        }

        Ok(Self {
            name: name.to_string(),
            ident: name.replace('-', "_"),
            manifest_dir,
            files,
            declared_types,
            known_crates,
        })
    }

    /// Import roots that name neither a builtin path root nor a known crate.
    pub fn unresolved_import_roots(&self) -> Vec<String> {
        let mut roots = BTreeSet::new();
        for file in &self.files {
            collect_import_roots(&file.ast.items, &mut roots);
        }
        roots
            .into_iter()
            .filter(|root| {
                !BUILTIN_ROOTS.contains(&root.as_str())
                    && root != &self.ident
                    && !self.known_crates.contains(root)
            })
            .collect()
    }
}

/// Source and (when different) destination packages loaded into one universe.
#[derive(Debug)]
pub struct LoadedProgram {
    pub source: ResolvedPackage,
    pub dest: Option<ResolvedPackage>,
}

impl LoadedProgram {
    pub fn dest_or_source(&self) -> &ResolvedPackage {
        self.dest.as_ref().unwrap_or(&self.source)
    }
}

/// Merged name -> owning-crate map used for qualification decisions.
///
/// On a name declared by both packages the destination wins: its types render
/// bare by rule, and that is exactly what a bare name means over there.
#[derive(Debug)]
pub struct TypeUniverse {
    owners: HashMap<String, String>,
    pub source_ident: String,
    pub dest_ident: String,
}

impl TypeUniverse {
    pub fn build(program: &LoadedProgram) -> Self {
        let source = &program.source;
        let dest = program.dest_or_source();

        let mut owners = HashMap::new();
        for name in &source.declared_types {
            owners.insert(name.clone(), source.ident.clone());
        }
        for name in &dest.declared_types {
            owners.insert(name.clone(), dest.ident.clone());
        }

        Self {
            owners,
            source_ident: source.ident.clone(),
            dest_ident: dest.ident.clone(),
        }
    }

    /// Crate ident that declares `name`, if any loaded package does.
    pub fn owner(&self, name: &str) -> Option<&str> {
        self.owners.get(name).map(String::as_str)
    }
}

/// Erase function and method bodies in place, recursing into inline modules.
fn strip_bodies(items: &mut [Item]) {
    for item in items {
        match item {
            Item::Fn(func) => func.block.stmts.clear(),
            Item::Impl(imp) => {
                for impl_item in &mut imp.items {
                    if let syn::ImplItem::Fn(method) = impl_item {
                        method.block.stmts.clear();
                    }
                }
            }
            Item::Mod(module) => {
                if let Some((_, content)) = &mut module.content {
                    strip_bodies(content);
                }
            }
            _ => {}
        }
    }
}

fn collect_declared_types(items: &[Item], out: &mut BTreeSet<String>) {
    for item in items {
        match item {
            Item::Struct(s) => {
                out.insert(s.ident.to_string());
            }
            Item::Enum(e) => {
                out.insert(e.ident.to_string());
            }
            Item::Union(u) => {
                out.insert(u.ident.to_string());
            }
            Item::Type(t) => {
                out.insert(t.ident.to_string());
            }
            Item::Trait(t) => {
                out.insert(t.ident.to_string());
            }
            Item::Mod(module) => {
                if let Some((_, content)) = &module.content {
                    collect_declared_types(content, out);
                }
            }
            _ => {}
        }
    }
}

fn collect_imports(items: &[Item]) -> HashMap<String, Vec<String>> {
    let mut imports = HashMap::new();
    walk_use_items(items, &mut imports);
    imports
}

fn walk_use_items(items: &[Item], imports: &mut HashMap<String, Vec<String>>) {
    for item in items {
        match item {
            Item::Use(use_item) => walk_use_tree(&use_item.tree, &[], imports),
            Item::Mod(module) => {
                if let Some((_, content)) = &module.content {
                    walk_use_items(content, imports);
                }
            }
            _ => {}
        }
    }
}

fn walk_use_tree(tree: &UseTree, prefix: &[String], imports: &mut HashMap<String, Vec<String>>) {
    match tree {
        UseTree::Path(path) => {
            let mut prefix = prefix.to_vec();
            prefix.push(path.ident.to_string());
            walk_use_tree(&path.tree, &prefix, imports);
        }
        UseTree::Name(name) => {
            record_import(name.ident.to_string(), prefix, name.ident.to_string(), imports);
        }
        UseTree::Rename(rename) => {
            record_import(rename.rename.to_string(), prefix, rename.ident.to_string(), imports);
        }
        UseTree::Group(group) => {
            for tree in &group.items {
                walk_use_tree(tree, prefix, imports);
            }
        }
        UseTree::Glob(_) => {
            // Glob targets cannot be pinned to a single name without
            // resolving the other crate; tolerated and left alone.
            log::debug!("glob import under {:?} not expanded", prefix.join("::"));
        }
    }
}

fn record_import(
    alias: String,
    prefix: &[String],
    last: String,
    imports: &mut HashMap<String, Vec<String>>,
) {
    // `self`/`super`-rooted imports point back into the package itself; those
    // names resolve through the declared-type set, not the import table.
    match prefix.first().map(String::as_str) {
        None | Some("self") | Some("super") => return,
        _ => {}
    }
    let mut full = prefix.to_vec();
    full.push(last);
    imports.insert(alias, full);
}

fn collect_import_roots(items: &[Item], out: &mut BTreeSet<String>) {
    for item in items {
        match item {
            Item::Use(use_item) => {
                if let UseTree::Path(path) = &use_item.tree {
                    out.insert(path.ident.to_string());
                } else if let UseTree::Name(name) = &use_item.tree {
                    out.insert(name.ident.to_string());
                }
            }
            Item::Mod(module) => {
                if let Some((_, content)) = &module.content {
                    collect_import_roots(content, out);
                }
            }
            _ => {}
        }
    }
}
