//! CLI command implementations
//!
//! This module contains implementations of various commands
//! supported by the CLI application using the Command pattern.

pub mod command_traits;
pub mod analyze_command;
pub mod convert_command;
pub mod codecs_command;

pub use command_traits::{Command, CommandFactory};
pub use analyze_command::AnalyzeCommand;
pub use convert_command::ConvertCommand;
pub use codecs_command::CodecsCommand;

use std::sync::Arc;

use clap::ArgMatches;
use log::debug;

use crate::tiff::catalog::TagCatalog;
use crate::tiff::errors::TiffResult;
use crate::tiff::options::{CodecPolicy, TiffOptions};
use crate::utils::logger::DiagnosticSink;

/// Builds session options from the CLI arguments
///
/// # Arguments
/// * `args` - CLI argument matches from clap
/// * `sink` - Where session diagnostics go
pub fn options_from_args(args: &ArgMatches, sink: Arc<dyn DiagnosticSink>) -> TiffResult<TiffOptions> {
    let mut options = TiffOptions::new()
        .sink(sink)
        .strip_chop(!args.get_flag("no-chop"));

    if args.get_flag("lenient") {
        options = options.codec_policy(CodecPolicy::Lenient);
    }
    if args.get_flag("geotiff") {
        options = options.extra_fields(TagCatalog::geotiff_fields());
    }
    if let Some(path) = args.get_one::<String>("tags") {
        let fields = TagCatalog::load_toml_file(path)?;
        debug!("Loaded {} field definitions from {}", fields.len(), path);
        options = options.extra_fields(fields);
    }
    Ok(options)
}

/// Factory for creating command instances based on CLI arguments
///
/// This factory examines the command-line arguments and creates
/// the appropriate command instance for execution.
pub struct TiffkitCommandFactory;

impl TiffkitCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        TiffkitCommandFactory
    }
}

impl Default for TiffkitCommandFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandFactory for TiffkitCommandFactory {
    fn create_command(&self, args: &ArgMatches, options: TiffOptions) -> TiffResult<Box<dyn Command>> {
        if args.get_flag("codecs") {
            Ok(Box::new(CodecsCommand::new(options, args.get_flag("verbose"))))
        } else if args.get_one::<String>("convert").is_some() {
            Ok(Box::new(ConvertCommand::new(args, options)?))
        } else {
            // Default to analyze command
            Ok(Box::new(AnalyzeCommand::new(args, options)?))
        }
    }
}
