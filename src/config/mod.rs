//! Configuration parsing and validation
//!
//! This module handles discovery and parsing of remake.yml files and
//! construction of the runtime task model.

pub mod format;
pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
