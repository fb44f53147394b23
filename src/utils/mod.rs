//! Utility modules for common functionality
//!
//! Diagnostics, progress reporting, byte and bit swapping, string helpers
//! and human-readable names for field codes.

pub mod logger;
pub(crate) mod progress;
pub mod swab;
pub(crate) mod string_utils;
pub mod tiff_code_translators;
