//! Data structures shared by the loader, the naming engine and the context builder.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// HTTP methods the generator turns into tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Order in which methods of one path are visited
    pub const ORDERED: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    /// Lowercase verb, as it prefixes operation identifiers
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
        }
    }

    pub fn parse(verb: &str) -> Option<Self> {
        match verb.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "patch" => Some(HttpMethod::Patch),
            "delete" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    /// POST, PUT, PATCH and DELETE change state
    pub fn is_mutation(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Where a parameter travels in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Path,
    Header,
    Body,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Body => write!(f, "body"),
        }
    }
}

/// A parameter as declared by the operation (query, path or header)
#[derive(Debug, Clone, PartialEq)]
pub struct SpecParameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    /// Resolved schema (`$ref`/`allOf` already followed)
    pub schema: Value,
    pub description: String,
    /// `query` declared with form style and explode: its keys are spread into
    /// individual query parameters at call time
    pub catch_all: bool,
}

/// One HTTP method on one path
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operation_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub tags: Vec<String>,
    pub summary: String,
    pub description: String,
    pub parameters: Vec<SpecParameter>,
    /// Resolved `application/json` request body schema
    pub request_body_schema: Option<Value>,
    pub request_body_required: Vec<String>,
    /// Resolved `data` schema of the 200 response envelope
    pub response_schema: Option<Value>,
    /// Security override consisting of HTTP Basic only
    pub requires_basic_auth: bool,
}

impl Operation {
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Semantic type of a tool parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
    Object,
    Any,
    /// `oneOf`/`anyOf` of exactly integer and string; callers may pass either
    StringOrInteger,
    Array(Box<ParamType>),
    Union(Vec<ParamType>),
}

impl ParamType {
    /// Builds the type of a `oneOf`/`anyOf` combinator from its branch types
    pub fn union_of(branches: Vec<ParamType>) -> ParamType {
        let mut distinct: Vec<ParamType> = Vec::new();
        for branch in branches {
            if !distinct.contains(&branch) {
                distinct.push(branch);
            }
        }

        match distinct.len() {
            0 => ParamType::Any,
            1 => distinct.remove(0),
            2 if distinct.contains(&ParamType::Integer) && distinct.contains(&ParamType::String) => {
                ParamType::StringOrInteger
            }
            _ => ParamType::Union(distinct),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::String => write!(f, "string"),
            ParamType::Integer => write!(f, "integer"),
            ParamType::Float => write!(f, "float"),
            ParamType::Boolean => write!(f, "boolean"),
            ParamType::Object => write!(f, "object"),
            ParamType::Any => write!(f, "any"),
            ParamType::StringOrInteger => write!(f, "string|integer"),
            ParamType::Array(item) => write!(f, "array<{}>", item),
            ParamType::Union(branches) => {
                let parts: Vec<String> = branches.iter().map(|b| b.to_string()).collect();
                write!(f, "{}", parts.join("|"))
            }
        }
    }
}

impl Serialize for ParamType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A parameter of a generated tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolParameter {
    /// Public name; reserved words carry a suffix
    pub name: String,
    /// Name on the wire
    pub api_name: String,
    pub param_type: ParamType,
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Catch-all filter map, expanded into arbitrary query parameters
    pub filter_map: bool,
}

impl ToolParameter {
    pub fn is_renamed(&self) -> bool {
        self.name != self.api_name
    }
}

/// Public action word of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolAction {
    List,
    Get,
    Create,
    Update,
    Replace,
    Delete,
    /// POST on an action endpoint (reboot, ping, ...), named `post`
    Action,
    /// POST on an apply endpoint; the resource name is the action
    Apply,
    /// GET on an apply endpoint
    ApplyStatus,
    /// Other methods on an apply endpoint keep their raw verb
    Verbatim(HttpMethod),
    /// Identifier without a recognizable verb prefix
    Unclassified,
}

impl ToolAction {
    /// Word placed between the namespace and the resource, if any
    pub fn prefix_word(&self) -> Option<&'static str> {
        match self {
            ToolAction::List => Some("list"),
            ToolAction::Get | ToolAction::ApplyStatus => Some("get"),
            ToolAction::Create => Some("create"),
            ToolAction::Update => Some("update"),
            ToolAction::Replace => Some("replace"),
            ToolAction::Delete => Some("delete"),
            ToolAction::Action => Some("post"),
            ToolAction::Verbatim(method) => Some(method.as_str()),
            ToolAction::Apply | ToolAction::Unclassified => None,
        }
    }
}

impl fmt::Display for ToolAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolAction::Apply => write!(f, "apply"),
            ToolAction::ApplyStatus => write!(f, "apply_status"),
            ToolAction::Unclassified => write!(f, "unclassified"),
            other => write!(f, "{}", other.prefix_word().unwrap_or_default()),
        }
    }
}

impl Serialize for ToolAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Fully resolved metadata for one tool, ready for emission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub tool_name: String,
    pub operation_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub module: String,
    pub action: ToolAction,
    pub resource: String,
    pub tags: Vec<String>,
    /// Cleaned one-line summary
    pub summary: String,
    /// Full tool documentation text (summary, warnings, notes, API reference)
    pub description: String,
    pub parameters: Vec<ToolParameter>,
    pub body_params: Vec<ToolParameter>,
    pub query_params: Vec<ToolParameter>,
    pub has_request_body: bool,
    pub accepts_filters: bool,
    pub is_mutation: bool,
    pub needs_confirmation: bool,
    pub needs_apply: bool,
    pub apply_endpoint: Option<String>,
    pub apply_tool_name: Option<String>,
    pub is_dangerous: bool,
    pub danger_warning: Option<String>,
    pub requires_basic_auth: bool,
    pub is_list_tool: bool,
    /// Field names of list items; `Some(vec![])` when the response schema is unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_fields: Option<Vec<String>>,
}
