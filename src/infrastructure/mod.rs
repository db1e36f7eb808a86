// Infrastructure implementations for traitface.

pub mod package_loader;
pub mod trait_writer;

pub use package_loader::CargoPackageLoader;
pub use trait_writer::FileTraitSink;
