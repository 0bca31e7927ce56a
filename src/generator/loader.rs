//! OpenAPI document loading and `$ref` resolution
//!
//! The document is held twice: as a typed [`openapiv3::OpenAPI`] that drives the
//! operation walk (path order is preserved), and as a raw JSON value that JSON
//! pointers are resolved against.

use crate::error::{GeneratorError, Result};
use crate::generator::types::{HttpMethod, Operation, ParameterLocation, SpecParameter};
use openapiv3::{
    OpenAPI, Parameter, ParameterSchemaOrContent, PathItem, QueryStyle, ReferenceOr, RequestBody,
    Response, StatusCode,
};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Security scheme name that marks an operation as Basic-Auth only
pub const BASIC_AUTH_SCHEME: &str = "BasicAuth";

/// Nesting bound for `$ref`/`allOf` resolution
pub const MAX_SCHEMA_DEPTH: usize = 64;

const JSON_MEDIA_TYPE: &str = "application/json";

/// A parsed OpenAPI 3.x document
#[derive(Debug, Clone)]
pub struct SpecDocument {
    api: OpenAPI,
    raw: Value,
}

impl SpecDocument {
    /// Parse a document from JSON or YAML text
    pub fn parse(content: &str) -> Result<Self> {
        let (api, raw) = match serde_json::from_str::<OpenAPI>(content) {
            Ok(api) => (api, serde_json::from_str::<Value>(content)?),
            Err(json_err) => {
                debug!("Document is not JSON ({}), trying YAML", json_err);
                let api = serde_yaml::from_str::<OpenAPI>(content).map_err(|yaml_err| {
                    GeneratorError::spec(format!(
                        "Failed to parse OpenAPI document as JSON ({}) or YAML ({})",
                        json_err, yaml_err
                    ))
                })?;
                (api, serde_yaml::from_str::<Value>(content)?)
            }
        };

        if !api.openapi.starts_with("3.") {
            return Err(GeneratorError::spec(format!(
                "Unsupported OpenAPI version '{}', expected 3.x",
                api.openapi
            )));
        }

        Ok(Self { api, raw })
    }

    /// Load a document from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GeneratorError::spec(format!(
                "Failed to read OpenAPI document '{}': {}",
                path.display(),
                e
            ))
        })?;
        let document = Self::parse(&content)?;
        info!(
            "Loaded OpenAPI document '{}' ({} paths) from {}",
            document.api.info.title,
            document.api.paths.paths.len(),
            path.display()
        );
        Ok(document)
    }

    pub fn title(&self) -> &str {
        &self.api.info.title
    }

    /// Raw document tree
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Follow a local JSON pointer (`#/components/schemas/Foo`)
    pub fn resolve_reference(&self, pointer: &str) -> Result<&Value> {
        let path = pointer.strip_prefix("#/").ok_or_else(|| {
            GeneratorError::spec(format!(
                "Only local references are supported, got '{}'",
                pointer
            ))
        })?;

        let mut node = &self.raw;
        for raw_segment in path.split('/') {
            let segment = raw_segment.replace("~1", "/").replace("~0", "~");
            let next = match node {
                Value::Object(map) => map.get(&segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            node = next.ok_or_else(|| GeneratorError::reference(pointer, segment.clone()))?;
        }
        Ok(node)
    }

    /// Resolve a schema: follow `$ref` and flatten `allOf`
    ///
    /// `allOf` members merge into one object schema: properties are combined with later
    /// members winning, required lists are concatenated. Anything else is returned as is.
    pub fn resolve_schema(&self, schema: &Value) -> Result<Value> {
        let mut active = Vec::new();
        self.resolve_schema_inner(schema, &mut active, 0)
    }

    fn resolve_schema_inner(
        &self,
        schema: &Value,
        active: &mut Vec<String>,
        depth: usize,
    ) -> Result<Value> {
        if depth > MAX_SCHEMA_DEPTH {
            return Err(GeneratorError::spec(format!(
                "Schema nesting exceeds {} levels",
                MAX_SCHEMA_DEPTH
            )));
        }

        if let Some(pointer) = schema.get("$ref").and_then(Value::as_str) {
            if active.iter().any(|p| p == pointer) {
                let mut chain = active.clone();
                chain.push(pointer.to_string());
                return Err(GeneratorError::cyclic_schema(&chain));
            }
            let target = self.resolve_reference(pointer)?;
            active.push(pointer.to_string());
            let resolved = self.resolve_schema_inner(target, active, depth + 1);
            active.pop();
            return resolved;
        }

        if let Some(members) = schema.get("allOf").and_then(Value::as_array) {
            let mut properties = Map::new();
            let mut required = Vec::new();
            for member in members {
                let resolved = self.resolve_schema_inner(member, active, depth + 1)?;
                if let Some(props) = resolved.get("properties").and_then(Value::as_object) {
                    for (name, prop) in props {
                        properties.insert(name.clone(), prop.clone());
                    }
                }
                if let Some(names) = resolved.get("required").and_then(Value::as_array) {
                    required.extend(names.iter().cloned());
                }
            }
            return Ok(json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }));
        }

        Ok(schema.clone())
    }

    /// Walk every path and method and collect the operations that carry an identifier
    ///
    /// Methods of one path are visited in GET, POST, PUT, PATCH, DELETE order. Operations
    /// without an identifier are skipped.
    pub fn parse_operations(&self) -> Result<Vec<Operation>> {
        let mut operations = Vec::new();
        let mut seen_ids = HashSet::new();

        for (path, item_ref) in &self.api.paths.paths {
            let item = match item_ref {
                ReferenceOr::Item(item) => item,
                ReferenceOr::Reference { reference } => {
                    return Err(GeneratorError::spec(format!(
                        "Path item references are not supported ('{}' -> '{}')",
                        path, reference
                    )));
                }
            };

            for method in HttpMethod::ORDERED {
                let Some(op) = operation_for(item, method) else {
                    continue;
                };
                let Some(operation_id) = op
                    .operation_id
                    .clone()
                    .filter(|id| !id.trim().is_empty())
                else {
                    debug!("Skipping {} {}: no operationId", method, path);
                    continue;
                };
                if !seen_ids.insert(operation_id.clone()) {
                    return Err(GeneratorError::spec(format!(
                        "Duplicate operationId '{}' at {} {}",
                        operation_id, method, path
                    )));
                }

                let parameters = self.collect_parameters(&item.parameters, &op.parameters)?;
                let (request_body_schema, request_body_required) =
                    match &op.request_body {
                        Some(body) => self.request_body_schema(body)?,
                        None => (None, Vec::new()),
                    };

                operations.push(Operation {
                    operation_id,
                    method,
                    path: path.clone(),
                    tags: op.tags.clone(),
                    summary: op.summary.clone().unwrap_or_default(),
                    description: op.description.clone().unwrap_or_default(),
                    parameters,
                    request_body_schema,
                    request_body_required,
                    response_schema: self.response_data_schema(op)?,
                    requires_basic_auth: requires_basic_auth_only(op),
                });
            }
        }

        debug!("Parsed {} operations", operations.len());
        Ok(operations)
    }

    /// Path-level parameters first, overridden by operation-level ones of the same name
    /// and location
    fn collect_parameters(
        &self,
        path_level: &[ReferenceOr<Parameter>],
        operation_level: &[ReferenceOr<Parameter>],
    ) -> Result<Vec<SpecParameter>> {
        let mut parameters: Vec<SpecParameter> = Vec::new();
        for param_ref in path_level.iter().chain(operation_level) {
            let parameter = match param_ref {
                ReferenceOr::Item(parameter) => parameter.clone(),
                ReferenceOr::Reference { reference } => {
                    serde_json::from_value(self.resolve_reference(reference)?.clone())?
                }
            };
            let Some(converted) = self.convert_parameter(&parameter)? else {
                continue;
            };
            match parameters
                .iter_mut()
                .find(|p| p.name == converted.name && p.location == converted.location)
            {
                Some(existing) => *existing = converted,
                None => parameters.push(converted),
            }
        }
        Ok(parameters)
    }

    fn convert_parameter(&self, parameter: &Parameter) -> Result<Option<SpecParameter>> {
        let (data, location, form_style) = match parameter {
            Parameter::Query {
                parameter_data,
                style,
                ..
            } => (
                parameter_data,
                ParameterLocation::Query,
                matches!(style, QueryStyle::Form),
            ),
            Parameter::Path { parameter_data, .. } => {
                (parameter_data, ParameterLocation::Path, false)
            }
            Parameter::Header { parameter_data, .. } => {
                (parameter_data, ParameterLocation::Header, false)
            }
            Parameter::Cookie { parameter_data, .. } => {
                debug!("Ignoring cookie parameter '{}'", parameter_data.name);
                return Ok(None);
            }
        };

        let schema = match &data.format {
            ParameterSchemaOrContent::Schema(schema_ref) => serde_json::to_value(schema_ref)?,
            ParameterSchemaOrContent::Content(content) => match content
                .get(JSON_MEDIA_TYPE)
                .and_then(|media| media.schema.as_ref())
            {
                Some(schema_ref) => serde_json::to_value(schema_ref)?,
                None => json!({ "type": "string" }),
            },
        };

        let catch_all = data.name == "query"
            && location == ParameterLocation::Query
            && form_style
            && data.explode.unwrap_or(true);

        Ok(Some(SpecParameter {
            name: data.name.clone(),
            location,
            required: location == ParameterLocation::Path || data.required,
            schema: self.resolve_schema(&schema)?,
            description: data.description.clone().unwrap_or_default(),
            catch_all,
        }))
    }

    /// Resolved JSON request body schema and its required property names
    fn request_body_schema(
        &self,
        body_ref: &ReferenceOr<RequestBody>,
    ) -> Result<(Option<Value>, Vec<String>)> {
        let body: RequestBody = match body_ref {
            ReferenceOr::Item(body) => body.clone(),
            ReferenceOr::Reference { reference } => {
                serde_json::from_value(self.resolve_reference(reference)?.clone())?
            }
        };

        let Some(schema_ref) = body
            .content
            .get(JSON_MEDIA_TYPE)
            .and_then(|media| media.schema.as_ref())
        else {
            return Ok((None, Vec::new()));
        };

        let resolved = self.resolve_schema(&serde_json::to_value(schema_ref)?)?;
        let required = required_names(&resolved);
        Ok((Some(resolved), required))
    }

    /// The `data` member of the 200 JSON response envelope, or the whole schema when
    /// there is no envelope
    fn response_data_schema(&self, op: &openapiv3::Operation) -> Result<Option<Value>> {
        let Some(response_ref) = op.responses.responses.get(&StatusCode::Code(200)) else {
            return Ok(None);
        };
        let response: Response = match response_ref {
            ReferenceOr::Item(response) => response.clone(),
            ReferenceOr::Reference { reference } => {
                serde_json::from_value(self.resolve_reference(reference)?.clone())?
            }
        };

        let Some(schema_ref) = response
            .content
            .get(JSON_MEDIA_TYPE)
            .and_then(|media| media.schema.as_ref())
        else {
            return Ok(None);
        };

        let envelope = self.resolve_schema(&serde_json::to_value(schema_ref)?)?;
        match envelope.get("properties").and_then(|props| props.get("data")) {
            Some(data) => Ok(Some(self.resolve_schema(data)?)),
            None => Ok(Some(envelope)),
        }
    }
}

fn operation_for(item: &PathItem, method: HttpMethod) -> Option<&openapiv3::Operation> {
    match method {
        HttpMethod::Get => item.get.as_ref(),
        HttpMethod::Post => item.post.as_ref(),
        HttpMethod::Put => item.put.as_ref(),
        HttpMethod::Patch => item.patch.as_ref(),
        HttpMethod::Delete => item.delete.as_ref(),
    }
}

/// Operation-level security that is exactly one requirement naming only Basic Auth
fn requires_basic_auth_only(op: &openapiv3::Operation) -> bool {
    match op.security.as_deref() {
        Some([requirement]) => {
            requirement.len() == 1 && requirement.contains_key(BASIC_AUTH_SCHEME)
        }
        _ => false,
    }
}

pub(crate) fn required_names(schema: &Value) -> Vec<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
