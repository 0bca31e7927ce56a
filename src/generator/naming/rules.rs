//! CamelCase to snake_case conversion as an ordered list of rewrite rules
//!
//! Each rule takes the output of the previous one. Order matters: compound words must be
//! tokenized before acronym splitting sees them, and plural acronyms must be marked
//! before the generic case-boundary rule splits `VLANs` into `vla_ns`.

use crate::config::CompoundWord;
use crate::utils::clean_snake_identifier;
use once_cell::sync::Lazy;
use regex::Regex;

/// lower/digit followed by upper: `aliasName` -> `alias_Name`
static LOWER_UPPER_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("Invalid regex pattern"));

/// acronym followed by a capitalized word: `ARPTable` -> `ARP_Table`
static ACRONYM_WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("Invalid regex pattern"));

/// One step of the case conversion pipeline
pub trait CaseRule: Send + Sync {
    /// Short identifier used in logs and tests
    fn name(&self) -> &'static str;

    fn apply(&self, input: &str) -> String;
}

/// Replaces irregular compound words with `_token_`
pub struct CompoundWordRule {
    words: Vec<CompoundWord>,
}

impl CompoundWordRule {
    /// Longer words are substituted first so that a word containing another wins
    pub fn new(words: &[CompoundWord]) -> Self {
        let mut words = words.to_vec();
        words.sort_by(|a, b| b.word.len().cmp(&a.word.len()).then(a.word.cmp(&b.word)));
        Self { words }
    }
}

impl CaseRule for CompoundWordRule {
    fn name(&self) -> &'static str {
        "compound_words"
    }

    fn apply(&self, input: &str) -> String {
        self.words.iter().fold(input.to_string(), |acc, compound| {
            acc.replace(&compound.word, &format!("_{}_", compound.token))
        })
    }
}

/// Uppercases the `s` of a pluralized acronym: `VLANs` -> `VLANS`, `CSOsFoo` -> `CSOSFoo`
///
/// Matches two or more uppercase letters, a lowercase `s`, then end of input, `_` or an
/// uppercase letter.
pub struct PluralAcronymRule;

impl CaseRule for PluralAcronymRule {
    fn name(&self) -> &'static str {
        "plural_acronyms"
    }

    fn apply(&self, input: &str) -> String {
        let chars: Vec<char> = input.chars().collect();
        let mut out = String::with_capacity(input.len());
        let mut uppercase_run = 0usize;

        for (i, &c) in chars.iter().enumerate() {
            if c == 's' && uppercase_run >= 2 {
                let at_boundary = match chars.get(i + 1) {
                    None => true,
                    Some(next) => *next == '_' || next.is_ascii_uppercase(),
                };
                if at_boundary {
                    out.push('S');
                    uppercase_run = 0;
                    continue;
                }
            }
            out.push(c);
            uppercase_run = if c.is_ascii_uppercase() {
                uppercase_run + 1
            } else {
                0
            };
        }
        out
    }
}

/// Inserts `_` at lower-to-upper and acronym-to-word boundaries
pub struct CaseBoundaryRule;

impl CaseRule for CaseBoundaryRule {
    fn name(&self) -> &'static str {
        "case_boundaries"
    }

    fn apply(&self, input: &str) -> String {
        let split = LOWER_UPPER_BOUNDARY.replace_all(input, "${1}_${2}");
        ACRONYM_WORD_BOUNDARY
            .replace_all(&split, "${1}_${2}")
            .into_owned()
    }
}

pub struct LowercaseRule;

impl CaseRule for LowercaseRule {
    fn name(&self) -> &'static str {
        "lowercase"
    }

    fn apply(&self, input: &str) -> String {
        input.to_lowercase()
    }
}

/// Collapses `__` runs and trims separators at both ends
pub struct SeparatorCleanupRule;

impl CaseRule for SeparatorCleanupRule {
    fn name(&self) -> &'static str {
        "separator_cleanup"
    }

    fn apply(&self, input: &str) -> String {
        clean_snake_identifier(input)
    }
}

/// The full conversion pipeline
pub struct CaseConverter {
    rules: Vec<Box<dyn CaseRule>>,
}

impl CaseConverter {
    pub fn new(compound_words: &[CompoundWord]) -> Self {
        Self {
            rules: vec![
                Box::new(CompoundWordRule::new(compound_words)),
                Box::new(PluralAcronymRule),
                Box::new(CaseBoundaryRule),
                Box::new(LowercaseRule),
                Box::new(SeparatorCleanupRule),
            ],
        }
    }

    pub fn convert(&self, input: &str) -> String {
        self.rules
            .iter()
            .fold(input.to_string(), |acc, rule| rule.apply(&acc))
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }
}
