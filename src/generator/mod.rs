//! OpenAPI document to tool descriptor pipeline
//!
//! [`SpecDocument`] loads the document, [`ToolNamer`] derives names,
//! [`ParameterExtractor`] builds parameter lists and [`ContextBuilder`] combines them
//! with the [`ClassificationTables`](crate::config::ClassificationTables) into
//! [`ToolDescriptor`]s.

pub mod context_builder;
pub mod loader;
pub mod naming;
pub mod output;
pub mod schema_parser;
pub mod types;

pub use context_builder::{build_tool_descriptors, ApplyInfo, ContextBuilder};
pub use loader::SpecDocument;
pub use naming::{CaseConverter, NameDerivation, ToolNamer};
pub use output::{
    compare_name_maps, tool_name_map, DescriptorDocument, GenerationSummary, ModuleBreakdown,
    NameMismatch, OutputFormat,
};
pub use schema_parser::{map_schema_type, ParameterExtractor};
pub use types::{
    HttpMethod, Operation, ParamType, ParameterLocation, SpecParameter, ToolAction,
    ToolDescriptor, ToolParameter,
};
