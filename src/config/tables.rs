//! Static classification tables
//!
//! The naming engine and the context builder never hard-code pfSense paths. Everything
//! they know about the API surface (which paths are apply triggers, which POSTs are
//! actions, which subsystems batch changes, which module owns a path prefix, which
//! operations are destructive) lives in [`ClassificationTables`].
//!
//! Tables are plain data. [`ClassificationTables::default`] returns the built-in pfSense
//! REST API v2 tables; a YAML file can replace any subset of them:
//!
//! ```yaml
//! api_root: /api/v2
//! apply_subsystems:
//!   - firewall
//!   - vpn/ipsec
//! module_routes:
//!   - prefix: firewall
//!     module: firewall
//! ```
//!
//! All path entries are relative to `api_root`, so the same tables apply to a
//! document mounted under a different root (tests use `/resource`).

use crate::error::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

/// One entry of the module routing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRoute {
    /// Path prefix relative to the API root (e.g. `services/dhcp_server`)
    pub prefix: String,
    /// Module that owns every path under the prefix
    pub module: String,
}

impl ModuleRoute {
    pub fn new<P: Into<String>, M: Into<String>>(prefix: P, module: M) -> Self {
        Self {
            prefix: prefix.into(),
            module: module.into(),
        }
    }
}

/// Irregular CamelCase term and the lowercase token it becomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundWord {
    pub word: String,
    pub token: String,
}

impl CompoundWord {
    pub fn new<W: Into<String>, T: Into<String>>(word: W, token: T) -> Self {
        Self {
            word: word.into(),
            token: token.into(),
        }
    }
}

/// Classification tables consumed by the naming engine and the context builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationTables {
    /// Tool name namespace (`pfsense` produces `pfsense_get_...`)
    pub namespace: String,
    /// Root every relative path entry is joined to
    pub api_root: String,
    /// Idempotent trigger-and-status endpoints
    pub apply_paths: Vec<String>,
    /// POST endpoints that are verbs, not resource creation
    pub action_paths: Vec<String>,
    /// Path suffixes of singleton settings resources
    pub settings_suffixes: Vec<String>,
    /// Plural-shaped last segments that name a single resource
    pub singular_nouns: Vec<String>,
    /// Subsystems whose mutations need an explicit apply call
    pub apply_subsystems: Vec<String>,
    /// Path prefix to module assignment
    pub module_routes: Vec<ModuleRoute>,
    /// Operation identifier to danger warning
    pub dangerous_operations: BTreeMap<String, String>,
    /// Irregular compound words, substituted before any other case rule
    pub compound_words: Vec<CompoundWord>,
    /// Parameter names that cannot be used verbatim by the emitted server
    pub reserved_words: Vec<String>,
    /// Suffix appended to reserved parameter names
    pub reserved_suffix: String,
}

const DEFAULT_RESERVED_WORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield", "type",
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ClassificationTables {
    fn default() -> Self {
        let module_routes = [
            ("auth", "auth"),
            ("diagnostics", "diagnostics"),
            ("firewall", "firewall"),
            ("graphql", "graphql"),
            ("interface", "interface"),
            ("interfaces", "interface"),
            ("routing", "routing"),
            ("services", "services"),
            ("services/dhcp_server", "dhcp"),
            ("services/dhcp_relay", "dhcp"),
            ("services/dns_forwarder", "dns"),
            ("services/dns_resolver", "dns"),
            ("services/haproxy", "haproxy"),
            ("status", "status"),
            ("system", "system"),
            ("user", "user"),
            ("users", "user"),
            ("vpn", "vpn"),
        ]
        .iter()
        .map(|(prefix, module)| ModuleRoute::new(*prefix, *module))
        .collect();

        let dangerous_operations = [
            ("postDiagnosticsHaltSystemEndpoint", "DANGEROUS: Halts the pfSense system."),
            ("postDiagnosticsRebootEndpoint", "DANGEROUS: Reboots the pfSense system."),
            ("postDiagnosticsCommandPromptEndpoint", "DANGEROUS: Executes arbitrary shell commands."),
            ("deleteDiagnosticsARPTableEndpoint", "DANGEROUS: Clears the entire ARP table."),
            ("deleteDiagnosticsConfigHistoryRevisionsEndpoint", "DANGEROUS: Deletes all config history."),
            ("deleteFirewallStatesEndpoint", "DANGEROUS: Clears all firewall states."),
            ("postGraphQLEndpoint", "DANGEROUS: Executes raw GraphQL queries."),
        ]
        .iter()
        .map(|(id, warning)| (id.to_string(), warning.to_string()))
        .collect();

        Self {
            namespace: "pfsense".to_string(),
            api_root: "/api/v2".to_string(),
            apply_paths: strings(&[
                "firewall/apply",
                "firewall/virtual_ip/apply",
                "interface/apply",
                "routing/apply",
                "services/dhcp_server/apply",
                "services/dns_forwarder/apply",
                "services/dns_resolver/apply",
                "services/haproxy/apply",
                "vpn/ipsec/apply",
                "vpn/wireguard/apply",
            ]),
            action_paths: strings(&[
                "diagnostics/halt_system",
                "diagnostics/reboot",
                "diagnostics/command_prompt",
                "diagnostics/ping",
                "auth/jwt",
            ]),
            settings_suffixes: strings(&["/settings", "/advanced_settings"]),
            singular_nouns: strings(&["status", "address", "access", "dns", "radius", "alias"]),
            apply_subsystems: strings(&[
                "firewall/virtual_ip",
                "firewall",
                "interface",
                "routing",
                "services/dhcp_server",
                "services/dns_forwarder",
                "services/dns_resolver",
                "services/haproxy",
                "vpn/ipsec",
                "vpn/wireguard",
            ]),
            module_routes,
            dangerous_operations,
            compound_words: vec![
                CompoundWord::new("WireGuard", "wireguard"),
                CompoundWord::new("OpenVPN", "openvpn"),
                CompoundWord::new("IPsec", "ipsec"),
                CompoundWord::new("HAProxy", "haproxy"),
                CompoundWord::new("GraphQL", "graphql"),
            ],
            reserved_words: strings(DEFAULT_RESERVED_WORDS),
            reserved_suffix: "_".to_string(),
        }
    }
}

impl ClassificationTables {
    /// Load tables from a YAML (or JSON) file; missing keys keep their built-in value
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GeneratorError::config(format!(
                "Failed to read classification tables '{}': {}",
                path.display(),
                e
            ))
        })?;
        debug!("Loading classification tables from {}", path.display());
        Self::from_yaml(&content)
    }

    /// Parse tables from YAML content and validate them
    pub fn from_yaml(content: &str) -> Result<Self> {
        let tables: ClassificationTables = serde_yaml::from_str(content)?;
        tables.validate()?;
        Ok(tables)
    }

    /// Same tables mounted under a different API root
    pub fn with_api_root<S: Into<String>>(mut self, api_root: S) -> Self {
        self.api_root = api_root.into();
        self
    }

    /// Join a table entry to the API root
    pub fn full_path(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.api_root.trim_end_matches('/'),
            relative.trim_matches('/')
        )
    }

    /// Strip the API root from an absolute path, if it is mounted there
    pub fn relative_path<'p>(&self, path: &'p str) -> Option<&'p str> {
        let root = self.api_root.trim_end_matches('/');
        let rest = path.strip_prefix(root)?;
        if root.is_empty() || rest.starts_with('/') {
            Some(rest.trim_start_matches('/'))
        } else {
            None
        }
    }

    /// Distinct module names in first-appearance order of the route table
    pub fn module_order(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.module_routes
            .iter()
            .filter(|route| seen.insert(route.module.as_str()))
            .map(|route| route.module.clone())
            .collect()
    }

    /// Check internal consistency
    ///
    /// Module prefixes must be unique: with duplicates the longest-prefix match would
    /// depend on table order.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty()
            || !self
                .namespace
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(GeneratorError::config(format!(
                "namespace '{}' must be non-empty lowercase snake_case",
                self.namespace
            )));
        }

        if !self.api_root.is_empty() && !self.api_root.starts_with('/') {
            return Err(GeneratorError::config(format!(
                "api_root '{}' must start with '/'",
                self.api_root
            )));
        }

        let mut prefixes = HashSet::new();
        for route in &self.module_routes {
            let prefix = route.prefix.trim_matches('/');
            if prefix.is_empty() || route.module.is_empty() {
                return Err(GeneratorError::config(
                    "module routes need a non-empty prefix and module",
                ));
            }
            if !prefixes.insert(prefix) {
                return Err(GeneratorError::config(format!(
                    "duplicate module route prefix '{}'",
                    prefix
                )));
            }
        }

        let mut subsystems = HashSet::new();
        for subsystem in &self.apply_subsystems {
            if !subsystems.insert(subsystem.trim_matches('/')) {
                return Err(GeneratorError::config(format!(
                    "duplicate apply subsystem '{}'",
                    subsystem
                )));
            }
        }

        for compound in &self.compound_words {
            if compound.word.is_empty() || compound.token != compound.token.to_lowercase() {
                return Err(GeneratorError::config(format!(
                    "compound word '{}' needs a non-empty word and a lowercase token",
                    compound.word
                )));
            }
        }

        if self.reserved_suffix.is_empty() {
            return Err(GeneratorError::config("reserved_suffix must not be empty"));
        }

        Ok(())
    }
}
