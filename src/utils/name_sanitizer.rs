use once_cell::sync::Lazy;
use regex::Regex;

/// Runs of underscores
static SEPARATOR_RUN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_{2,}").expect("Invalid regex pattern"));

/// A single lowercase letter or digit standing alone between separators
static ISOLATED_CHAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_[a-z0-9]_").expect("Invalid regex pattern"));

/// Something wrong with a generated tool name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameDefect {
    /// `__` somewhere in the name
    DoubleSeparator,
    /// `_x_` somewhere in the name; carries the offending segment
    IsolatedCharacter(String),
    /// Leading or trailing separator
    DanglingSeparator,
    /// Empty name
    Empty,
}

/// Collapses runs of underscores into a single one
pub fn collapse_separators(input: &str) -> String {
    SEPARATOR_RUN_REGEX.replace_all(input, "_").into_owned()
}

/// Collapses separator runs and strips leading/trailing separators
pub fn clean_snake_identifier(input: &str) -> String {
    collapse_separators(input).trim_matches('_').to_string()
}

/// Lists the splitting defects visible in a generated name
///
/// A double separator or an isolated one-character segment almost always means a case
/// rule split an acronym in the wrong place (`vlan_s`, `i_psec`).
pub fn name_defects(name: &str) -> Vec<NameDefect> {
    let mut defects = Vec::new();
    if name.is_empty() {
        defects.push(NameDefect::Empty);
        return defects;
    }
    if name.contains("__") {
        defects.push(NameDefect::DoubleSeparator);
    }
    if let Some(found) = ISOLATED_CHAR_REGEX.find(name) {
        defects.push(NameDefect::IsolatedCharacter(
            found.as_str().trim_matches('_').to_string(),
        ));
    }
    if name.starts_with('_') || name.ends_with('_') {
        defects.push(NameDefect::DanglingSeparator);
    }
    defects
}

/// True when [`name_defects`] finds nothing
pub fn is_well_formed_tool_name(name: &str) -> bool {
    name_defects(name).is_empty()
}
