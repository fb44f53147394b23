//! Compression conversion command
//!
//! This module implements the command for re-encoding TIFF files
//! with a different compression scheme.

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::compression::CompressionConverter;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::options::TiffOptions;
use crate::utils::tiff_code_translators::compression_code_to_name;

/// Command for converting TIFF compression format
pub struct ConvertCommand {
    /// Path to the input file
    input_file: String,
    /// Path to the output file
    output_file: String,
    /// Target compression scheme
    target_compression: u16,
    options: TiffOptions,
}

impl ConvertCommand {
    /// Create a new convert command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `options` - Options for both the input and the output session
    ///
    /// # Returns
    /// A new ConvertCommand instance or an error
    pub fn new(args: &ArgMatches, options: TiffOptions) -> TiffResult<Self> {
        let input_file = args
            .get_one::<String>("input")
            .ok_or_else(|| TiffError::UsageError("Missing input file".to_string()))?
            .clone();

        let output_file = args
            .get_one::<String>("convert")
            .ok_or_else(|| TiffError::UsageError("Missing output file path for conversion".to_string()))?
            .clone();

        // Codes and names are both accepted, e.g. "8" or "deflate"
        let spec = args.get_one::<String>("compression").ok_or_else(|| {
            TiffError::UsageError("Missing compression specification. Use --compression".to_string())
        })?;
        let target_compression = options
            .get_registry()
            .scheme_by_name(spec)
            .ok_or_else(|| TiffError::UsageError(format!("Unknown compression: {}", spec)))?;

        if !options.get_registry().is_configured(target_compression) {
            return Err(TiffError::CodecNotConfigured {
                scheme: target_compression,
                name: compression_code_to_name(target_compression).to_string(),
            });
        }
        info!("Using compression: {}", compression_code_to_name(target_compression));

        Ok(ConvertCommand {
            input_file,
            output_file,
            target_compression,
            options,
        })
    }
}

impl Command for ConvertCommand {
    fn name(&self) -> &'static str {
        "convert"
    }

    fn execute(&self) -> TiffResult<()> {
        info!(
            "Converting file {} to {} with compression code {}",
            self.input_file, self.output_file, self.target_compression
        );

        let converter = CompressionConverter::new(self.options.clone().name(self.output_file.clone()))
            .with_progress(true);
        let input_options = self.options.clone().name(self.input_file.clone());
        let count = converter.convert_file(
            &self.input_file,
            input_options,
            &self.output_file,
            self.target_compression,
        )?;

        info!("Compression conversion successful ({} directories)", count);
        Ok(())
    }
}
