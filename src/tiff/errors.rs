//! Error types for TIFF processing
//!
//! Every fallible operation in the crate returns [`TiffResult`]. The error
//! variants are grouped into a small taxonomy ([`ErrorKind`]) so callers can
//! decide whether a failure is recoverable without matching every variant.

use std::io;
use thiserror::Error;

/// Broad classification of a [`TiffError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Short read, short write or failed seek on the underlying stream
    Io,
    /// Structurally invalid file: bad header, bad directory, missing required field
    Format,
    /// A single field could not be decoded or applied
    Field,
    /// Image geometry is unusable or overflows
    Geometry,
    /// A codec failed or is not available
    Codec,
    /// The caller asked for something the session cannot do
    Usage,
}

/// TIFF-specific error types
#[derive(Debug, Error)]
pub enum TiffError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Invalid byte order marker
    #[error("Not a TIFF file, bad magic number {0:#06x}")]
    InvalidByteOrder(u16),

    /// Invalid TIFF or BigTIFF header
    #[error("Invalid TIFF header: {0}")]
    InvalidHeader(String),

    /// Unsupported TIFF version
    #[error("Not a TIFF file, bad version number {0}")]
    UnsupportedVersion(u16),

    /// Structural problem in a directory
    #[error("{0}")]
    FormatError(String),

    /// A field the image cannot be interpreted without is absent
    #[error("TIFF directory is missing required \"{0}\" field")]
    MissingRequired(String),

    /// Directory chain points back into itself
    #[error("TIFF directory {index} has IFD looping to offset {offset:#x}")]
    DirectoryLoop { offset: u64, index: u32 },

    /// A field could not be decoded or applied
    #[error("{name} (tag {tag}): {message}")]
    FieldError { tag: u16, name: String, message: String },

    /// Tag has no catalog entry
    #[error("Unknown tag {0}")]
    UnknownTag(u16),

    /// Size computation exceeded the integer range
    #[error("Integer overflow in {0}")]
    Overflow(&'static str),

    /// Image geometry is unusable
    #[error("{0}")]
    GeometryError(String),

    /// Compression scheme has no codec
    #[error("{name} compression support is not configured (scheme {scheme})")]
    CodecNotConfigured { scheme: u16, name: String },

    /// Codec failure
    #[error("{0}")]
    CodecError(String),

    /// Invalid request for the current session state
    #[error("{0}")]
    UsageError(String),
}

impl TiffError {
    /// Classifies this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TiffError::IoError(_) => ErrorKind::Io,
            TiffError::InvalidByteOrder(_)
            | TiffError::InvalidHeader(_)
            | TiffError::UnsupportedVersion(_)
            | TiffError::FormatError(_)
            | TiffError::MissingRequired(_)
            | TiffError::DirectoryLoop { .. } => ErrorKind::Format,
            TiffError::FieldError { .. } | TiffError::UnknownTag(_) => ErrorKind::Field,
            TiffError::Overflow(_) | TiffError::GeometryError(_) => ErrorKind::Geometry,
            TiffError::CodecNotConfigured { .. } | TiffError::CodecError(_) => ErrorKind::Codec,
            TiffError::UsageError(_) => ErrorKind::Usage,
        }
    }

    /// Builds a field error
    pub fn field(tag: u16, name: &str, message: impl Into<String>) -> Self {
        TiffError::FieldError {
            tag,
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for TIFF operations
pub type TiffResult<T> = Result<T, TiffError>;
