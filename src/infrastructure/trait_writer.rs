//! Output file lifecycle.
//!
//! Replace-on-regenerate: the stale file is removed before the pipeline runs,
//! so a failing run leaves nothing behind, and the fresh file is written in
//! one shot at the end.

use std::fs;
use std::io;
use std::path::Path;

use crate::domain::emit::RenderedTrait;
use crate::domain::error::GenerateError;
use crate::ports::TraitSink;

pub struct FileTraitSink;

impl TraitSink for FileTraitSink {
    fn prepare(&self, path: &Path) -> Result<(), GenerateError> {
        match fs::remove_file(path) {
            Ok(()) => {
                log::debug!("removed stale output {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GenerateError::write_failure(path, e)),
        }
    }

    fn write(&self, path: &Path, rendered: &RenderedTrait) -> Result<(), GenerateError> {
        fs::write(path, rendered.to_source()).map_err(|e| GenerateError::write_failure(path, e))
    }
}
