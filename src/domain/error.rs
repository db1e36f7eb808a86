//! Fatal error taxonomy for the generation pipeline.
//!
//! Every variant terminates the run: nothing here is retried or recovered.
//! Diagnostics that are merely tolerated (unparseable sibling files, unknown
//! import roots, name-collision anomalies) go through `log` instead and never
//! reach this enum.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// The source or destination package could not be located or parsed at all.
    #[error("unable to load package {location}: {reason}")]
    PackageNotFound { location: String, reason: String },

    /// An impl block's self type could not be resolved to a named type.
    #[error("failed to resolve receiver type for {context} at {location}")]
    TypeResolutionFailure { context: String, location: String },

    /// Wording mirrors the tool's predecessor so existing scripts can grep it.
    #[error("type {type_name} was not found in {package} or doesn't have any exported methods")]
    NoMethodsFound { type_name: String, package: String },

    #[error("unable to write {path}: {source}")]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenerateError {
    pub fn package_not_found(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PackageNotFound {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn write_failure(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::OutputWriteFailure {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_methods_message_names_type_and_package() {
        let err = GenerateError::NoMethodsFound {
            type_name: "Widget".to_string(),
            package: "widgets".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Widget"), "message was: {}", msg);
        assert!(msg.contains("widgets"), "message was: {}", msg);
    }

    #[test]
    fn test_write_failure_keeps_io_source() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = GenerateError::write_failure("/tmp/out.rs", io_err);
        assert!(err.to_string().contains("/tmp/out.rs"));
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
    }
}
