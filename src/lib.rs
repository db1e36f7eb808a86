// Main library entry point for traitface.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;
