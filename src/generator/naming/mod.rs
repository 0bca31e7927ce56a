//! Naming engine: operation identifier to tool name
//!
//! `getInterfaceVLANsEndpoint` + `GET /api/v2/interface/vlans` + `[limit, offset]`
//! becomes `pfsense_list_interface_vlans`.
//!
//! 1. strip the trailing `Endpoint`
//! 2. split the leading verb from the resource
//! 3. snake_case the resource with [`CaseConverter`]
//! 4. classify the path (apply, action, settings, plural)
//! 5. map the verb to an action word and join with the namespace

mod rules;

pub use rules::{
    CaseBoundaryRule, CaseConverter, CaseRule, CompoundWordRule, LowercaseRule,
    PluralAcronymRule, SeparatorCleanupRule,
};

use crate::config::ClassificationTables;
use crate::generator::types::{HttpMethod, ToolAction};
use ahash::AHashSet;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static VERB_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(get|post|patch|put|delete)(.+)$").expect("Invalid regex pattern")
});

const IDENTIFIER_SUFFIX: &str = "Endpoint";

/// Everything the naming engine decided about one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameDerivation {
    pub tool_name: String,
    pub action: ToolAction,
    /// snake_case resource taken from the identifier
    pub resource: String,
    /// Plural heuristic result, independent of the method
    pub is_plural: bool,
}

/// Derives tool names from operation identifiers
pub struct ToolNamer {
    namespace: String,
    converter: CaseConverter,
    apply_paths: AHashSet<String>,
    action_paths: AHashSet<String>,
    settings_suffixes: Vec<String>,
    singular_nouns: AHashSet<String>,
}

impl ToolNamer {
    pub fn new(tables: &ClassificationTables) -> Self {
        Self {
            namespace: tables.namespace.clone(),
            converter: CaseConverter::new(&tables.compound_words),
            apply_paths: tables
                .apply_paths
                .iter()
                .map(|p| tables.full_path(p))
                .collect(),
            action_paths: tables
                .action_paths
                .iter()
                .map(|p| tables.full_path(p))
                .collect(),
            settings_suffixes: tables.settings_suffixes.clone(),
            singular_nouns: tables.singular_nouns.iter().cloned().collect(),
        }
    }

    /// Tool name for an operation
    pub fn tool_name<S: AsRef<str>>(
        &self,
        operation_id: &str,
        method: HttpMethod,
        path: &str,
        param_names: &[S],
    ) -> String {
        self.derive(operation_id, method, path, param_names).tool_name
    }

    /// Full naming decision for an operation
    ///
    /// The action word comes from the verb embedded in the identifier. Identifiers
    /// without a verb prefix fall back to `namespace_<snake identifier>` and are logged.
    pub fn derive<S: AsRef<str>>(
        &self,
        operation_id: &str,
        method: HttpMethod,
        path: &str,
        param_names: &[S],
    ) -> NameDerivation {
        let name = operation_id
            .strip_suffix(IDENTIFIER_SUFFIX)
            .unwrap_or(operation_id);
        let is_plural = self.is_plural_endpoint(path, param_names);

        let Some(captures) = VERB_PREFIX_REGEX.captures(name) else {
            let resource = self.converter.convert(name);
            warn!(
                "Operation '{}' has no verb prefix; using fallback name",
                operation_id
            );
            return NameDerivation {
                tool_name: self.join(None, &resource),
                action: ToolAction::Unclassified,
                resource,
                is_plural,
            };
        };

        // the regex only admits the five verbs
        let verb = HttpMethod::parse(&captures[1]).unwrap_or(method);
        if verb != method {
            debug!(
                "Operation '{}' is declared under {} but its identifier says {}",
                operation_id, method, verb
            );
        }
        let resource = self.converter.convert(&captures[2]);
        let action = self.classify_action(verb, path, is_plural);

        let tool_name = match action {
            ToolAction::ApplyStatus => {
                self.join(action.prefix_word(), &format!("{}_status", resource))
            }
            _ => self.join(action.prefix_word(), &resource),
        };

        NameDerivation {
            tool_name,
            action,
            resource,
            is_plural,
        }
    }

    fn classify_action(&self, verb: HttpMethod, path: &str, is_plural: bool) -> ToolAction {
        if self.is_apply_path(path) {
            return match verb {
                HttpMethod::Get => ToolAction::ApplyStatus,
                HttpMethod::Post => ToolAction::Apply,
                other => ToolAction::Verbatim(other),
            };
        }

        match verb {
            HttpMethod::Get if self.is_settings_path(path) => ToolAction::Get,
            HttpMethod::Get if is_plural => ToolAction::List,
            HttpMethod::Get => ToolAction::Get,
            HttpMethod::Post if self.is_action_path(path) => ToolAction::Action,
            HttpMethod::Post => ToolAction::Create,
            HttpMethod::Patch => ToolAction::Update,
            HttpMethod::Put => ToolAction::Replace,
            HttpMethod::Delete => ToolAction::Delete,
        }
    }

    fn join(&self, word: Option<&str>, resource: &str) -> String {
        let mut parts = vec![self.namespace.as_str()];
        parts.extend(word);
        if !resource.is_empty() {
            parts.push(resource);
        }
        parts.join("_")
    }

    /// CamelCase to snake_case with this namer's compound words
    pub fn camel_to_snake(&self, input: &str) -> String {
        self.converter.convert(input)
    }

    /// Heuristic: does the endpoint return a collection?
    ///
    /// `limit` without `id` means plural, `id` without `limit` means singular. Otherwise
    /// the last path segment decides.
    pub fn is_plural_endpoint<S: AsRef<str>>(&self, path: &str, param_names: &[S]) -> bool {
        let has_limit = param_names.iter().any(|p| p.as_ref() == "limit");
        let has_id = param_names.iter().any(|p| p.as_ref() == "id");
        if has_limit && !has_id {
            return true;
        }
        if has_id && !has_limit {
            return false;
        }

        let last_segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
        if self.singular_nouns.contains(last_segment) {
            return false;
        }
        if last_segment.ends_with("ies") || last_segment.ends_with("es") {
            return true;
        }
        last_segment.ends_with('s') && !last_segment.ends_with("ss")
    }

    pub fn is_apply_path(&self, path: &str) -> bool {
        self.apply_paths.contains(path)
    }

    pub fn is_action_path(&self, path: &str) -> bool {
        self.action_paths.contains(path)
    }

    pub fn is_settings_path(&self, path: &str) -> bool {
        self.settings_suffixes
            .iter()
            .any(|suffix| path.ends_with(suffix.as_str()))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}
