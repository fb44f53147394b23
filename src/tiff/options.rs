//! Session options
//!
//! [`TiffOptions`] collects everything a session needs beyond its stream:
//! the codec registry, where diagnostics go, extra field definitions and
//! the handful of behaviour switches.

use std::fmt;
use std::sync::Arc;

use crate::compression::CodecRegistry;
use crate::io::byte_order::ByteOrder;
use crate::tiff::catalog::FieldInfo;
use crate::utils::logger::{DiagnosticSink, LogSink};

/// What to do when a directory names a compression scheme with no codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecPolicy {
    /// Fail the directory read
    Strict,
    /// Warn and read the directory; pixel access then fails
    Lenient,
}

/// Options for opening or creating a session
#[derive(Clone)]
pub struct TiffOptions {
    pub(crate) name: String,
    pub(crate) byte_order: ByteOrder,
    pub(crate) big_tiff: bool,
    pub(crate) strip_chop: bool,
    pub(crate) codec_policy: CodecPolicy,
    pub(crate) registry: Arc<CodecRegistry>,
    pub(crate) sink: Arc<dyn DiagnosticSink>,
    pub(crate) extra_fields: Vec<FieldInfo>,
}

impl Default for TiffOptions {
    fn default() -> Self {
        TiffOptions {
            name: "<stream>".to_string(),
            byte_order: ByteOrder::host(),
            big_tiff: false,
            strip_chop: true,
            codec_policy: CodecPolicy::Strict,
            registry: Arc::new(CodecRegistry::new()),
            sink: Arc::new(LogSink),
            extra_fields: Vec::new(),
        }
    }
}

impl TiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name used in diagnostics
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Byte order for newly created files
    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Create BigTIFF rather than classic TIFF
    pub fn big_tiff(mut self, big_tiff: bool) -> Self {
        self.big_tiff = big_tiff;
        self
    }

    /// Split single-strip uncompressed images into smaller strips on read
    pub fn strip_chop(mut self, strip_chop: bool) -> Self {
        self.strip_chop = strip_chop;
        self
    }

    pub fn codec_policy(mut self, policy: CodecPolicy) -> Self {
        self.codec_policy = policy;
        self
    }

    /// Shares a codec registry between sessions
    pub fn registry(mut self, registry: Arc<CodecRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Routes warnings and errors to `sink`
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Adds field definitions to every catalog the session builds
    pub fn extra_fields<I: IntoIterator<Item = FieldInfo>>(mut self, fields: I) -> Self {
        self.extra_fields.extend(fields);
        self
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_registry(&self) -> &Arc<CodecRegistry> {
        &self.registry
    }
}

impl fmt::Debug for TiffOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiffOptions")
            .field("name", &self.name)
            .field("byte_order", &self.byte_order)
            .field("big_tiff", &self.big_tiff)
            .field("strip_chop", &self.strip_chop)
            .field("codec_policy", &self.codec_policy)
            .field("extra_fields", &self.extra_fields.len())
            .finish()
    }
}
