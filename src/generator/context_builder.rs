//! Context builder: one [`ToolDescriptor`] per operation
//!
//! Combines the naming engine, the parameter extractor and the classification tables.
//! A run is fail-fast: the first structural error aborts it, and two operations that
//! produce the same tool name are an error, never silently renamed.

use crate::config::ClassificationTables;
use crate::error::{GeneratorError, Result};
use crate::generator::loader::SpecDocument;
use crate::generator::naming::ToolNamer;
use crate::generator::schema_parser::ParameterExtractor;
use crate::generator::types::{
    HttpMethod, Operation, ParameterLocation, ToolAction, ToolDescriptor, ToolParameter,
};
use crate::utils::clean_description;
use ahash::AHashMap;
use serde_json::Value;
use tracing::{debug, info, warn};

const BASIC_AUTH_WARNING: &str = "WARNING: This endpoint requires HTTP BasicAuth \
(username:password). It does not accept API key or JWT authentication.";

const BULK_DELETE_HINT: &str = "Note: Bulk deletion requires at least one filter in \
`query` (e.g. {\"name\": \"value\"}). Its keys become URL query parameters that select \
the items to delete.";

/// Apply follow-up for a mutation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplyInfo {
    pub needs_apply: bool,
    pub apply_endpoint: Option<String>,
    pub apply_tool_name: Option<String>,
}

/// Builds tool descriptors from operations
pub struct ContextBuilder {
    namespace: String,
    tables: ClassificationTables,
    namer: ToolNamer,
    extractor: ParameterExtractor,
    /// (normalized prefix, module)
    module_routes: Vec<(String, String)>,
    apply_subsystems: Vec<String>,
    dangerous: AHashMap<String, String>,
}

impl ContextBuilder {
    /// Validates the tables and precomputes the lookups
    pub fn new(tables: &ClassificationTables) -> Result<Self> {
        tables.validate()?;
        Ok(Self {
            namespace: tables.namespace.clone(),
            tables: tables.clone(),
            namer: ToolNamer::new(tables),
            extractor: ParameterExtractor::new(tables),
            module_routes: tables
                .module_routes
                .iter()
                .map(|route| (route.prefix.trim_matches('/').to_string(), route.module.clone()))
                .collect(),
            apply_subsystems: tables
                .apply_subsystems
                .iter()
                .map(|subsystem| subsystem.trim_matches('/').to_string())
                .collect(),
            dangerous: tables
                .dangerous_operations
                .iter()
                .map(|(id, warning)| (id.clone(), warning.clone()))
                .collect(),
        })
    }

    pub fn namer(&self) -> &ToolNamer {
        &self.namer
    }

    /// Module owning a path: longest route prefix matching on a segment boundary
    pub fn assign_module(&self, path: &str) -> Option<&str> {
        let relative = self.tables.relative_path(path)?;
        self.module_routes
            .iter()
            .filter(|(prefix, _)| is_under(relative, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, module)| module.as_str())
    }

    /// Apply follow-up for a method on a path
    pub fn find_apply_info(&self, path: &str, method: HttpMethod) -> ApplyInfo {
        if !method.is_mutation() {
            return ApplyInfo::default();
        }
        let Some(relative) = self.tables.relative_path(path) else {
            return ApplyInfo::default();
        };
        let Some(subsystem) = self
            .apply_subsystems
            .iter()
            .filter(|subsystem| is_under(relative, subsystem))
            .max_by_key(|subsystem| subsystem.len())
        else {
            return ApplyInfo::default();
        };

        let apply_relative = format!("{}/apply", subsystem);
        if relative == apply_relative {
            return ApplyInfo::default();
        }

        ApplyInfo {
            needs_apply: true,
            apply_endpoint: Some(self.tables.full_path(&apply_relative)),
            apply_tool_name: Some(format!(
                "{}_{}_apply",
                self.namespace,
                subsystem.replace('/', "_")
            )),
        }
    }

    pub fn danger_warning(&self, operation_id: &str) -> Option<&str> {
        self.dangerous.get(operation_id).map(String::as_str)
    }

    /// Sorted property names of the items a list endpoint returns
    ///
    /// An unknown or unresolvable schema, including a dangling or cyclic item `$ref`,
    /// yields an empty list with a warning rather than an error.
    pub fn response_fields(&self, document: &SpecDocument, operation: &Operation) -> Vec<String> {
        let Some(schema) = &operation.response_schema else {
            warn!(
                "List tool {} has no response schema; field list is empty",
                operation.operation_id
            );
            return Vec::new();
        };

        let item_schema = match schema.get("items") {
            Some(items) if schema.get("type").and_then(Value::as_str) == Some("array") => {
                match document.resolve_schema(items) {
                    Ok(resolved) => resolved,
                    Err(e) => {
                        warn!(
                            "List tool {}: cannot resolve item schema: {}",
                            operation.operation_id, e
                        );
                        return Vec::new();
                    }
                }
            }
            _ => {
                warn!(
                    "List tool {} does not return an array; field list is empty",
                    operation.operation_id
                );
                return Vec::new();
            }
        };

        let mut fields: Vec<String> = item_schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default();
        fields.sort();
        fields
    }

    /// Descriptor for one operation
    pub fn build(&self, document: &SpecDocument, operation: &Operation) -> Result<ToolDescriptor> {
        let derivation = self.namer.derive(
            &operation.operation_id,
            operation.method,
            &operation.path,
            &operation.parameter_names(),
        );

        let module = self
            .assign_module(&operation.path)
            .ok_or_else(|| {
                GeneratorError::unassigned_module(
                    operation.operation_id.as_str(),
                    operation.path.as_str(),
                )
            })?
            .to_string();

        let parameters = self.extractor.extract(document, operation)?;
        let body_params: Vec<ToolParameter> = parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Body)
            .cloned()
            .collect();
        let query_params: Vec<ToolParameter> = parameters
            .iter()
            .filter(|p| matches!(p.location, ParameterLocation::Query | ParameterLocation::Path))
            .cloned()
            .collect();
        let accepts_filters = parameters.iter().any(|p| p.filter_map);

        let is_mutation = operation.method.is_mutation();
        let apply = self.find_apply_info(&operation.path, operation.method);
        let danger_warning = self.danger_warning(&operation.operation_id).map(str::to_string);
        let is_list_tool = derivation.action == ToolAction::List;
        let response_fields = is_list_tool.then(|| self.response_fields(document, operation));

        let summary = clean_description(if operation.summary.is_empty() {
            &operation.description
        } else {
            &operation.summary
        });

        let mut descriptor = ToolDescriptor {
            tool_name: derivation.tool_name,
            operation_id: operation.operation_id.clone(),
            method: operation.method,
            path: operation.path.clone(),
            module,
            action: derivation.action,
            resource: derivation.resource,
            tags: operation.tags.clone(),
            summary,
            description: String::new(),
            has_request_body: !body_params.is_empty(),
            parameters,
            body_params,
            query_params,
            accepts_filters,
            is_mutation,
            needs_confirmation: is_mutation,
            needs_apply: apply.needs_apply,
            apply_endpoint: apply.apply_endpoint,
            apply_tool_name: apply.apply_tool_name,
            is_dangerous: danger_warning.is_some(),
            danger_warning,
            requires_basic_auth: operation.requires_basic_auth,
            is_list_tool,
            response_fields,
        };
        descriptor.description = describe(&descriptor);

        debug!(
            "{} -> {} ({})",
            descriptor.operation_id, descriptor.tool_name, descriptor.module
        );
        Ok(descriptor)
    }

    /// Descriptors for every operation in the document, in document order
    pub fn build_all(&self, document: &SpecDocument) -> Result<Vec<ToolDescriptor>> {
        let operations = document.parse_operations()?;
        let mut descriptors = Vec::with_capacity(operations.len());
        let mut owners: AHashMap<String, String> = AHashMap::new();

        for operation in &operations {
            let descriptor = self.build(document, operation)?;
            if let Some(first) = owners.get(&descriptor.tool_name) {
                return Err(GeneratorError::DuplicateToolName {
                    tool_name: descriptor.tool_name.clone(),
                    first: first.clone(),
                    second: descriptor.operation_id.clone(),
                });
            }
            owners.insert(
                descriptor.tool_name.clone(),
                descriptor.operation_id.clone(),
            );
            descriptors.push(descriptor);
        }

        info!(
            "Built {} tool descriptors from '{}'",
            descriptors.len(),
            document.title()
        );
        Ok(descriptors)
    }
}

/// `relative` equals `prefix` or lies below it
fn is_under(relative: &str, prefix: &str) -> bool {
    relative == prefix
        || relative
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Tool documentation text
///
/// Summary first, then warnings and notes separated by blank lines, then the
/// `API: METHOD path` reference.
fn describe(descriptor: &ToolDescriptor) -> String {
    let mut parts = Vec::new();

    if descriptor.summary.is_empty() {
        parts.push(format!("{} {}", descriptor.method, descriptor.path));
    } else {
        parts.push(descriptor.summary.clone());
    }
    if descriptor.requires_basic_auth {
        parts.push(BASIC_AUTH_WARNING.to_string());
    }
    if let Some(warning) = &descriptor.danger_warning {
        parts.push(format!("WARNING: {}", warning));
    }
    if descriptor.method == HttpMethod::Delete && descriptor.accepts_filters {
        parts.push(BULK_DELETE_HINT.to_string());
    }
    if let Some(apply_tool) = &descriptor.apply_tool_name {
        parts.push(format!(
            "Note: After this operation, call `{}` to apply pending changes.",
            apply_tool
        ));
    }
    parts.push(format!("API: {} {}", descriptor.method, descriptor.path));

    parts.join("\n\n")
}

/// Build every descriptor of a document with the given tables
pub fn build_tool_descriptors(
    document: &SpecDocument,
    tables: &ClassificationTables,
) -> Result<Vec<ToolDescriptor>> {
    ContextBuilder::new(tables)?.build_all(document)
}
