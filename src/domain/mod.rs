// Domain model for traitface: the pure pipeline stages.

pub mod emit;
pub mod error;
pub mod extract;
pub mod package;
pub mod render;
