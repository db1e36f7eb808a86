//! Cargo-backed package loading.
//!
//! Translates a source location (file, directory, or package name) into a
//! resolved package by walking up to the owning `Cargo.toml` and confirming
//! it through `cargo metadata`. The destination package is resolved the same
//! way, starting from the output file's directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use cargo_metadata::MetadataCommand;

use crate::domain::error::GenerateError;
use crate::domain::package::{LoadedProgram, LoaderConfig, ResolvedPackage, TargetSpec};
use crate::ports::PackageLoader;

pub struct CargoPackageLoader {
    config: LoaderConfig,
}

impl CargoPackageLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load the package owning `manifest`. `label` is the user-facing name of
    /// whatever led us here, used in error messages.
    fn load_package(&self, manifest: &Path, label: &str) -> Result<ResolvedPackage, GenerateError> {
        let name = manifest_package_name(manifest)?.ok_or_else(|| {
            GenerateError::package_not_found(
                label,
                "manifest declares no [package]; point at a member package, not a workspace root",
            )
        })?;

        let metadata = MetadataCommand::new()
            .manifest_path(manifest)
            .no_deps()
            .exec()
            .map_err(|e| GenerateError::package_not_found(label, e.to_string()))?;

        let package = metadata
            .packages
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| {
                GenerateError::package_not_found(
                    label,
                    format!("package {} missing from cargo metadata", name),
                )
            })?;

        let mut sources = Vec::new();
        for target in &package.targets {
            if !target
                .kind
                .iter()
                .any(|k| k == "lib" || k == "bin" || k == "proc-macro")
            {
                continue;
            }
            let src_path = target.src_path.as_std_path();
            let src_dir = src_path.parent().unwrap_or(src_path);
            collect_rs_recursive(src_dir, &mut sources)
                .map_err(|e| GenerateError::package_not_found(label, e))?;
        }
        // Multiple targets may share files; keep one copy in a stable order.
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        sources.dedup_by(|a, b| a.0 == b.0);

        let known_crates: BTreeSet<String> = package
            .dependencies
            .iter()
            .map(|d| d.name.replace('-', "_"))
            .collect();

        let manifest_dir = manifest.parent().unwrap_or(Path::new(".")).to_path_buf();
        let pkg = ResolvedPackage::from_sources(
            &package.name,
            manifest_dir,
            sources,
            known_crates,
            &self.config,
        )?;

        let unresolved = pkg.unresolved_import_roots();
        if self.config.allow_unresolved_imports {
            for root in &unresolved {
                log::debug!("tolerating unresolved import root {} in {}", root, pkg.name);
            }
        } else if let Some(root) = unresolved.first() {
            return Err(GenerateError::package_not_found(
                format!("crate {} (imported by {})", root, pkg.name),
                "not among the package dependencies",
            ));
        }

        Ok(pkg)
    }
}

impl PackageLoader for CargoPackageLoader {
    fn load(&self, spec: &TargetSpec, dest_dir: &Path) -> Result<LoadedProgram, GenerateError> {
        let source_manifest = resolve_source_manifest(&spec.source_location)?;
        let source = self.load_package(&source_manifest, &spec.source_location)?;

        let dest_manifest = manifest_above(dest_dir).ok_or_else(|| {
            GenerateError::package_not_found(
                dest_dir.display().to_string(),
                "no Cargo.toml above the output path",
            )
        })?;

        let dest = if same_file(&source_manifest, &dest_manifest) {
            None
        } else {
            Some(self.load_package(&dest_manifest, &dest_manifest.display().to_string())?)
        };

        Ok(LoadedProgram { source, dest })
    }
}

/// A filesystem path resolves through its nearest manifest; anything else is
/// taken as a package name and looked up in the ambient workspace.
fn resolve_source_manifest(location: &str) -> Result<PathBuf, GenerateError> {
    let path = Path::new(location);
    if path.exists() {
        let start = if path.is_file() {
            path.parent().unwrap_or(Path::new("."))
        } else {
            path
        };
        return manifest_above(start).ok_or_else(|| {
            GenerateError::package_not_found(location, "no Cargo.toml above the input path")
        });
    }

    let metadata = MetadataCommand::new()
        .no_deps()
        .exec()
        .map_err(|e| GenerateError::package_not_found(location, e.to_string()))?;
    let package = metadata
        .packages
        .iter()
        .find(|p| p.name == location)
        .ok_or_else(|| {
            GenerateError::package_not_found(location, "not a member of the current workspace")
        })?;
    Ok(package.manifest_path.clone().into_std_path_buf())
}

/// Nearest `Cargo.toml` at or above `start`.
fn manifest_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join("Cargo.toml"))
        .find(|candidate| candidate.is_file())
}

/// Package name declared by a manifest, `None` for virtual workspace roots.
fn manifest_package_name(manifest: &Path) -> Result<Option<String>, GenerateError> {
    let text = fs::read_to_string(manifest).map_err(|e| {
        GenerateError::package_not_found(manifest.display().to_string(), e.to_string())
    })?;
    let doc: toml::Value = toml::from_str(&text).map_err(|e| {
        GenerateError::package_not_found(manifest.display().to_string(), e.to_string())
    })?;
    Ok(doc
        .get("package")
        .and_then(|pkg| pkg.get("name"))
        .and_then(|name| name.as_str())
        .map(String::from))
}

fn collect_rs_recursive(dir: &Path, out: &mut Vec<(String, String)>) -> Result<(), String> {
    if dir.ends_with("target") || dir.ends_with(".git") {
        return Ok(());
    }
    if !dir.exists() {
        return Ok(());
    }

    if dir.is_file() {
        // Single-file targets such as a bare main.rs.
        if dir.extension().is_some_and(|ext| ext == "rs") {
            let content = fs::read_to_string(dir)
                .map_err(|e| format!("failed to read {}: {}", dir.display(), e))?;
            out.push((dir.display().to_string(), content));
        }
        return Ok(());
    }

    let entries =
        fs::read_dir(dir).map_err(|e| format!("failed to read {}: {}", dir.display(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| format!("failed to read {}: {}", dir.display(), e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_rs_recursive(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            let content = fs::read_to_string(&path)
                .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
            out.push((path.display().to_string(), content));
        }
    }
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    let canonical_a = fs::canonicalize(a).unwrap_or_else(|_| a.to_path_buf());
    let canonical_b = fs::canonicalize(b).unwrap_or_else(|_| b.to_path_buf());
    canonical_a == canonical_b
}
