//! Parameter extraction
//!
//! Turns declared query/path/header parameters and JSON request body properties into a
//! single [`ToolParameter`] list with semantic types.

use crate::config::ClassificationTables;
use crate::error::{GeneratorError, Result};
use crate::generator::loader::SpecDocument;
use crate::generator::types::{HttpMethod, Operation, ParamType, ParameterLocation, ToolParameter};
use crate::utils::clean_description;
use ahash::AHashSet;
use serde_json::Value;
use tracing::debug;

/// Integers at or beyond 2^53 lose precision in JSON consumers; such defaults are
/// "no limit" sentinels
pub const MAX_SAFE_INTEGER: u64 = 1 << 53;

/// Marks a property whose default only applies under some other field's value
pub const CONDITIONAL_DEFAULT_MARKER: &str = "only available when";

/// Name of the single parameter carrying an array request body
pub const ARRAY_BODY_PARAMETER: &str = "items";

const MAX_TYPE_DEPTH: usize = 32;

/// Semantic type of a resolved schema
///
/// `oneOf`/`anyOf` become unions (branch references are resolved first), a missing
/// `type` means string, an unrecognized one means any.
pub fn map_schema_type(document: &SpecDocument, schema: &Value) -> Result<ParamType> {
    map_schema_type_inner(document, schema, 0)
}

fn map_schema_type_inner(
    document: &SpecDocument,
    schema: &Value,
    depth: usize,
) -> Result<ParamType> {
    if depth > MAX_TYPE_DEPTH {
        return Err(GeneratorError::spec(format!(
            "Array item types nest deeper than {} levels",
            MAX_TYPE_DEPTH
        )));
    }

    for combinator in ["oneOf", "anyOf"] {
        if let Some(branches) = schema.get(combinator).and_then(Value::as_array) {
            let mut types = Vec::with_capacity(branches.len());
            for branch in branches {
                let resolved = document.resolve_schema(branch)?;
                types.push(map_schema_type_inner(document, &resolved, depth + 1)?);
            }
            return Ok(ParamType::union_of(types));
        }
    }

    let param_type = match schema.get("type").and_then(Value::as_str).unwrap_or("string") {
        "string" => ParamType::String,
        "integer" => ParamType::Integer,
        "number" => ParamType::Float,
        "boolean" => ParamType::Boolean,
        "object" => ParamType::Object,
        "array" => {
            let items = match schema.get("items") {
                Some(items) => document.resolve_schema(items)?,
                None => Value::Object(Default::default()),
            };
            ParamType::Array(Box::new(map_schema_type_inner(document, &items, depth + 1)?))
        }
        _ => ParamType::Any,
    };
    Ok(param_type)
}

/// Drop defaults that are integer sentinels or that only apply conditionally
pub fn sanitize_default(default: Option<&Value>, description: &str) -> Option<Value> {
    let default = default?;
    if default.is_null() || is_unsafe_integer(default) {
        return None;
    }
    if description.contains(CONDITIONAL_DEFAULT_MARKER) {
        return None;
    }
    Some(default.clone())
}

fn is_unsafe_integer(value: &Value) -> bool {
    if let Some(i) = value.as_i64() {
        return i.unsigned_abs() >= MAX_SAFE_INTEGER;
    }
    if let Some(u) = value.as_u64() {
        return u >= MAX_SAFE_INTEGER;
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 => f.abs() >= MAX_SAFE_INTEGER as f64,
        _ => false,
    }
}

fn enum_values(schema: &Value) -> Option<Vec<Value>> {
    schema
        .get("enum")
        .and_then(Value::as_array)
        .filter(|values| !values.is_empty())
        .cloned()
}

fn is_read_only(schema: &Value) -> bool {
    schema
        .get("readOnly")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Builds tool parameter lists for operations
pub struct ParameterExtractor {
    reserved_words: AHashSet<String>,
    reserved_suffix: String,
}

impl ParameterExtractor {
    pub fn new(tables: &ClassificationTables) -> Self {
        Self {
            reserved_words: tables.reserved_words.iter().cloned().collect(),
            reserved_suffix: tables.reserved_suffix.clone(),
        }
    }

    /// Public name for a wire name; reserved words get the suffix
    pub fn safe_name(&self, name: &str) -> String {
        if self.reserved_words.contains(name) {
            format!("{}{}", name, self.reserved_suffix)
        } else {
            name.to_string()
        }
    }

    /// All parameters of an operation, required first, then by name
    ///
    /// Body properties are only read for POST, PATCH and PUT. A declared parameter
    /// shadows a body property of the same wire name.
    pub fn extract(&self, document: &SpecDocument, operation: &Operation) -> Result<Vec<ToolParameter>> {
        let mut params = Vec::new();
        let mut seen = AHashSet::new();

        for declared in &operation.parameters {
            seen.insert(declared.name.clone());

            if declared.catch_all {
                params.push(ToolParameter {
                    name: declared.name.clone(),
                    api_name: declared.name.clone(),
                    param_type: ParamType::Object,
                    location: declared.location,
                    required: false,
                    default: None,
                    description: clean_description(&declared.description),
                    enum_values: None,
                    filter_map: true,
                });
                continue;
            }

            let schema_description = declared
                .schema
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let raw_description = if declared.description.is_empty() {
                schema_description
            } else {
                declared.description.as_str()
            };

            params.push(ToolParameter {
                name: self.safe_name(&declared.name),
                api_name: declared.name.clone(),
                param_type: map_schema_type(document, &declared.schema)?,
                location: declared.location,
                required: declared.required,
                default: sanitize_default(declared.schema.get("default"), raw_description),
                description: clean_description(raw_description),
                enum_values: enum_values(&declared.schema),
                filter_map: false,
            });
        }

        let reads_body = matches!(
            operation.method,
            HttpMethod::Post | HttpMethod::Patch | HttpMethod::Put
        );
        if reads_body {
            if let Some(body) = &operation.request_body_schema {
                self.extract_body(document, operation, body, &mut seen, &mut params)?;
            }
        }

        params.sort_by(|a, b| (!a.required, &a.name).cmp(&(!b.required, &b.name)));
        Ok(params)
    }

    fn extract_body(
        &self,
        document: &SpecDocument,
        operation: &Operation,
        body: &Value,
        seen: &mut AHashSet<String>,
        params: &mut Vec<ToolParameter>,
    ) -> Result<()> {
        if body.get("type").and_then(Value::as_str) == Some("array") {
            let item_type = match body.get("items") {
                Some(items) => map_schema_type(document, &document.resolve_schema(items)?)?,
                None => ParamType::Object,
            };
            params.push(ToolParameter {
                name: ARRAY_BODY_PARAMETER.to_string(),
                api_name: ARRAY_BODY_PARAMETER.to_string(),
                param_type: ParamType::Array(Box::new(item_type)),
                location: ParameterLocation::Body,
                required: true,
                default: None,
                description: "List of objects for bulk replacement.".to_string(),
                enum_values: None,
                filter_map: false,
            });
            return Ok(());
        }

        let Some(properties) = body.get("properties").and_then(Value::as_object) else {
            debug!(
                "Request body of {} has no properties",
                operation.operation_id
            );
            return Ok(());
        };

        for (prop_name, prop_schema) in properties {
            if seen.contains(prop_name) {
                debug!(
                    "{}: body property '{}' shadowed by a declared parameter",
                    operation.operation_id, prop_name
                );
                continue;
            }
            let resolved = document.resolve_schema(prop_schema)?;
            if is_read_only(prop_schema) || is_read_only(&resolved) {
                continue;
            }

            let raw_description = resolved
                .get("description")
                .or_else(|| prop_schema.get("description"))
                .and_then(Value::as_str)
                .unwrap_or_default();

            params.push(ToolParameter {
                name: self.safe_name(prop_name),
                api_name: prop_name.clone(),
                param_type: map_schema_type(document, &resolved)?,
                location: ParameterLocation::Body,
                required: operation.request_body_required.contains(prop_name),
                default: sanitize_default(resolved.get("default"), raw_description),
                description: clean_description(raw_description),
                enum_values: enum_values(&resolved),
                filter_map: false,
            });
            seen.insert(prop_name.clone());
        }
        Ok(())
    }
}
