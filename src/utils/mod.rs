//! Shared utilities
//!
//! Identifier cleanup and name validation used by the naming engine and its tests,
//! plus description cleanup used by the parameter extractor.

pub mod name_sanitizer;
pub mod text_cleanup;

pub use name_sanitizer::{
    clean_snake_identifier, collapse_separators, is_well_formed_tool_name, name_defects,
    NameDefect,
};
pub use text_cleanup::clean_description;
