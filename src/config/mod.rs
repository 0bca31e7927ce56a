//! Configuration module for the generator
//!
//! Classification tables (what the generator knows about the API surface) and
//! environment overrides (where the inputs live).

pub mod environment;
mod tables;

pub use environment::{EnvVars, EnvironmentOverrides};
pub use tables::{ClassificationTables, CompoundWord, ModuleRoute};
