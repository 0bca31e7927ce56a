//! Error handling module for the generator
//!
//! This module provides the error type shared by the loader, the naming engine and the
//! context builder.

mod error;

// Re-export the main error types
pub use error::{GeneratorError, Result};
