// Ports: the seams between the driver and the outside world.

use std::path::Path;

use crate::domain::emit::RenderedTrait;
use crate::domain::error::GenerateError;
use crate::domain::package::{LoadedProgram, TargetSpec};

/// Resolves the source and destination packages for a run.
pub trait PackageLoader {
    /// `dest_dir` is the directory the generated file will live in; the
    /// destination package is resolved from it.
    fn load(&self, spec: &TargetSpec, dest_dir: &Path) -> Result<LoadedProgram, GenerateError>;
}

/// Owns the output file lifecycle.
pub trait TraitSink {
    /// Remove a pre-existing file at `path`; absence is not an error.
    fn prepare(&self, path: &Path) -> Result<(), GenerateError>;

    /// Write the rendered trait to `path`.
    fn write(&self, path: &Path, rendered: &RenderedTrait) -> Result<(), GenerateError>;
}
