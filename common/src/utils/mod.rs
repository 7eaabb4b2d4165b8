//! Utility functions and helpers.

pub mod sql_scanner;
pub mod sql_validator;

pub use sql_scanner::{code_only, split_segments, SqlSegment};
pub use sql_validator::SqlValidator;
