//! Run summary, name maps and serialized output

use crate::error::{GeneratorError, Result};
use crate::generator::types::ToolDescriptor;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Serialization format of the descriptor document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    /// Format implied by a file extension, if any
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }
}

/// Read/write tool counts of one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleBreakdown {
    pub module: String,
    pub reads: usize,
    pub writes: usize,
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub total: usize,
    pub reads: usize,
    pub mutations: usize,
    pub dangerous: usize,
    pub needs_apply: usize,
    pub list_tools: usize,
    pub basic_auth_only: usize,
    /// Modules with at least one tool, in route table order
    pub modules: Vec<ModuleBreakdown>,
}

impl GenerationSummary {
    pub fn from_descriptors(descriptors: &[ToolDescriptor], module_order: &[String]) -> Self {
        let modules = module_order
            .iter()
            .map(|module| ModuleBreakdown {
                module: module.clone(),
                reads: count(descriptors, |d| d.module == *module && !d.is_mutation),
                writes: count(descriptors, |d| d.module == *module && d.is_mutation),
            })
            .filter(|breakdown| breakdown.reads + breakdown.writes > 0)
            .collect();

        let mutations = count(descriptors, |d| d.is_mutation);
        Self {
            total: descriptors.len(),
            reads: descriptors.len() - mutations,
            mutations,
            dangerous: count(descriptors, |d| d.is_dangerous),
            needs_apply: count(descriptors, |d| d.needs_apply),
            list_tools: count(descriptors, |d| d.is_list_tool),
            basic_auth_only: count(descriptors, |d| d.requires_basic_auth),
            modules,
        }
    }

    /// Emit the summary through tracing
    pub fn log(&self) {
        info!("{} tools", self.total);
        info!("  {} read-only, {} mutations", self.reads, self.mutations);
        info!(
            "  {} dangerous, {} need apply, {} list tools, {} BasicAuth-only",
            self.dangerous, self.needs_apply, self.list_tools, self.basic_auth_only
        );
        info!("  Module breakdown:");
        for breakdown in &self.modules {
            info!(
                "    {}: {} tools ({} read, {} write)",
                breakdown.module,
                breakdown.reads + breakdown.writes,
                breakdown.reads,
                breakdown.writes
            );
        }
    }
}

fn count(descriptors: &[ToolDescriptor], pred: impl Fn(&ToolDescriptor) -> bool) -> usize {
    descriptors.iter().filter(|d| pred(d)).count()
}

/// Serialized descriptor document
#[derive(Debug, Serialize)]
pub struct DescriptorDocument<'a> {
    pub generator_version: &'static str,
    pub source: &'a str,
    pub summary: &'a GenerationSummary,
    /// Grouped by module in route table order, document order within a module
    pub tools: Vec<&'a ToolDescriptor>,
}

impl<'a> DescriptorDocument<'a> {
    pub fn new(
        source: &'a str,
        summary: &'a GenerationSummary,
        descriptors: &'a [ToolDescriptor],
        module_order: &[String],
    ) -> Self {
        let mut tools: Vec<&ToolDescriptor> = descriptors.iter().collect();
        // stable sort keeps document order inside a module
        tools.sort_by_key(|d| {
            module_order
                .iter()
                .position(|m| *m == d.module)
                .unwrap_or(module_order.len())
        });
        Self {
            generator_version: crate::VERSION,
            source,
            summary,
            tools,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)? + "\n"),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(self)?),
        }
    }
}

/// Operation identifier to tool name, sorted by identifier
pub fn tool_name_map(descriptors: &[ToolDescriptor]) -> BTreeMap<String, String> {
    descriptors
        .iter()
        .map(|d| (d.operation_id.clone(), d.tool_name.clone()))
        .collect()
}

pub fn render_name_map(names: &BTreeMap<String, String>) -> Result<String> {
    Ok(serde_json::to_string_pretty(names)? + "\n")
}

pub fn load_name_map<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        GeneratorError::config(format!(
            "Failed to read name map '{}': {}",
            path.display(),
            e
        ))
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// One difference between a golden name map and the current one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMismatch {
    Missing { operation_id: String, expected: String },
    Unexpected { operation_id: String, actual: String },
    Changed {
        operation_id: String,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for NameMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameMismatch::Missing {
                operation_id,
                expected,
            } => write!(f, "MISSING: {} (expected {})", operation_id, expected),
            NameMismatch::Unexpected {
                operation_id,
                actual,
            } => write!(f, "UNEXPECTED: {} -> {}", operation_id, actual),
            NameMismatch::Changed {
                operation_id,
                expected,
                actual,
            } => write!(f, "{}: got {}, expected {}", operation_id, actual, expected),
        }
    }
}

/// Differences between two name maps, ordered by identifier
pub fn compare_name_maps(
    expected: &BTreeMap<String, String>,
    actual: &BTreeMap<String, String>,
) -> Vec<NameMismatch> {
    let mut mismatches = Vec::new();
    for (operation_id, expected_name) in expected {
        match actual.get(operation_id) {
            None => mismatches.push(NameMismatch::Missing {
                operation_id: operation_id.clone(),
                expected: expected_name.clone(),
            }),
            Some(actual_name) if actual_name != expected_name => {
                mismatches.push(NameMismatch::Changed {
                    operation_id: operation_id.clone(),
                    expected: expected_name.clone(),
                    actual: actual_name.clone(),
                })
            }
            Some(_) => {}
        }
    }
    for (operation_id, actual_name) in actual {
        if !expected.contains_key(operation_id) {
            mismatches.push(NameMismatch::Unexpected {
                operation_id: operation_id.clone(),
                actual: actual_name.clone(),
            });
        }
    }
    mismatches.sort_by(|a, b| mismatch_id(a).cmp(mismatch_id(b)));
    mismatches
}

fn mismatch_id(mismatch: &NameMismatch) -> &str {
    match mismatch {
        NameMismatch::Missing { operation_id, .. }
        | NameMismatch::Unexpected { operation_id, .. }
        | NameMismatch::Changed { operation_id, .. } => operation_id,
    }
}

/// Log every mismatch and fail if there is any
pub fn check_name_maps(
    expected: &BTreeMap<String, String>,
    actual: &BTreeMap<String, String>,
) -> Result<()> {
    let mismatches = compare_name_maps(expected, actual);
    if mismatches.is_empty() {
        info!("All {} tool names match", expected.len());
        return Ok(());
    }
    for mismatch in &mismatches {
        warn!("  {}", mismatch);
    }
    Err(GeneratorError::GoldenMismatch {
        count: mismatches.len(),
    })
}

/// Write content to a file, creating parent directories
pub fn write_output<P: AsRef<Path>>(content: &str, path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    info!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(path.to_path_buf())
}
