//! pfSense tool generator
//!
//! Reads the pfSense REST API OpenAPI document and produces one tool descriptor per
//! operation: a stable snake_case name, typed parameters, and the safety metadata
//! (mutation, danger, apply follow-up, auth restriction) a tool server needs.

pub mod config;
pub mod error;
pub mod generator;
pub mod utils;

pub use config::{ClassificationTables, EnvironmentOverrides};
pub use error::{GeneratorError, Result};
pub use generator::{build_tool_descriptors, ContextBuilder, SpecDocument, ToolDescriptor};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default OpenAPI document path
pub const DEFAULT_SPEC_FILE: &str = "openapi-spec.json";

/// Default descriptor output path
pub const DEFAULT_OUTPUT_FILE: &str = "generated/tool-descriptors.json";
