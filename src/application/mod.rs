// Use case wiring: load -> extract -> render/emit -> write, one pass.

use std::path::Path;

use crate::domain::error::GenerateError;
use crate::domain::package::{TargetSpec, TypeUniverse};
use crate::domain::{emit, extract};
use crate::ports::{PackageLoader, TraitSink};

pub struct GenerateUsecase<'a> {
    pub loader: &'a dyn PackageLoader,
    pub sink: &'a dyn TraitSink,
}

impl GenerateUsecase<'_> {
    pub fn run(&self, spec: &TargetSpec, output: &Path) -> Result<(), GenerateError> {
        // Stale output goes first, so a failing run never leaves a file
        // pretending to match the current sources.
        self.sink.prepare(output)?;

        let dest_dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let program = self.loader.load(spec, dest_dir)?;

        let dest = program.dest_or_source();
        if dest.name != spec.dest_package {
            log::warn!(
                "destination package resolved as {}, not {} as requested",
                dest.name,
                spec.dest_package
            );
        }

        let universe = TypeUniverse::build(&program);
        let methods = extract::extract(&program.source, &spec.type_name)?;
        let rendered = emit::emit(&methods, spec, &program.source, &universe);
        self.sink.write(output, &rendered)
    }
}
