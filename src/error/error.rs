//! Error types and handling for the tool descriptor generator

use thiserror::Error;

/// Result type alias for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Main error type for the generator
///
/// Every variant is fatal for a generation run. Recoverable conditions (an
/// operation identifier that does not follow the verb+resource shape, a list
/// endpoint without a response schema) are logged and never surface here.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The document could not be parsed or lacks a structural field
    #[error("Specification error: {message}")]
    Spec { message: String },

    /// A `$ref` pointer names a segment that does not exist
    #[error("Unresolvable reference '{pointer}': segment '{segment}' not found")]
    Reference { pointer: String, segment: String },

    /// A `$ref`/`allOf` chain refers back to itself
    #[error("Cyclic schema: {chain}")]
    CyclicSchema { chain: String },

    /// A path has no owning module in the module table
    #[error("No module owns path '{path}' (operation {operation_id})")]
    UnassignedModule { operation_id: String, path: String },

    /// Two operations produced the same tool name
    #[error("Duplicate tool name '{tool_name}' produced by {first} and {second}")]
    DuplicateToolName {
        tool_name: String,
        first: String,
        second: String,
    },

    /// Classification tables or CLI configuration are invalid
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Golden-file comparison found differences
    #[error("Golden file mismatch: {count} tool name(s) differ")]
    GoldenMismatch { count: usize },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GeneratorError {
    /// Create an error for an unreadable or invalid OpenAPI document
    pub fn spec<S: Into<String>>(message: S) -> Self {
        Self::Spec {
            message: message.into(),
        }
    }

    /// Create a reference error
    pub fn reference<P: Into<String>, S: Into<String>>(pointer: P, segment: S) -> Self {
        Self::Reference {
            pointer: pointer.into(),
            segment: segment.into(),
        }
    }

    /// Create a cyclic schema error from the chain of active references
    pub fn cyclic_schema(chain: &[String]) -> Self {
        Self::CyclicSchema {
            chain: chain.join(" -> "),
        }
    }

    /// Create an unassigned module error
    pub fn unassigned_module<S: Into<String>>(operation_id: S, path: S) -> Self {
        Self::UnassignedModule {
            operation_id: operation_id.into(),
            path: path.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            GeneratorError::Spec { .. } => "spec",
            GeneratorError::Reference { .. } => "reference",
            GeneratorError::CyclicSchema { .. } => "cyclic_schema",
            GeneratorError::UnassignedModule { .. } => "module",
            GeneratorError::DuplicateToolName { .. } => "duplicate_name",
            GeneratorError::Config { .. } => "config",
            GeneratorError::GoldenMismatch { .. } => "golden",
            GeneratorError::Io(_) => "io",
            GeneratorError::Serde(_) => "serialization",
            GeneratorError::Yaml(_) => "yaml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_error_names_pointer_and_segment() {
        let err = GeneratorError::reference("#/components/schemas/Missing", "Missing");
        let text = err.to_string();
        assert!(text.contains("#/components/schemas/Missing"));
        assert!(text.contains("'Missing'"));
        assert_eq!(err.category(), "reference");
    }

    #[test]
    fn test_cyclic_schema_chain() {
        let chain = vec!["#/components/schemas/A".to_string(), "#/components/schemas/B".to_string()];
        let err = GeneratorError::cyclic_schema(&chain);
        assert_eq!(
            err.to_string(),
            "Cyclic schema: #/components/schemas/A -> #/components/schemas/B"
        );
    }

    #[test]
    fn test_unassigned_module_message() {
        let err = GeneratorError::unassigned_module("getFooEndpoint", "/api/v2/foo");
        assert!(err.to_string().contains("/api/v2/foo"));
        assert!(err.to_string().contains("getFooEndpoint"));
        assert_eq!(err.category(), "module");
    }
}
