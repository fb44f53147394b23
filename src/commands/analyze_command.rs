//! TIFF structure analysis command
//!
//! Walks the directory chain of a file and prints every directory reached:
//! its location, geometry, codec and fields. An EXIF directory referenced
//! from an image directory is listed underneath it.

use clap::ArgMatches;
use log::{info, warn};

use crate::commands::command_traits::Command;
use crate::io::seekable::TiffStream;
use crate::tiff::constants::tags;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::file::TiffFile;
use crate::tiff::options::TiffOptions;
use crate::tiff::types::Field;
use crate::utils::tiff_code_translators::{compression_code_to_name, photometric_code_to_name};

/// Command for analyzing TIFF file structure
pub struct AnalyzeCommand {
    /// Path to the input file
    input_file: String,
    /// Whether to list EXIF directories too
    verbose: bool,
    options: TiffOptions,
}

impl AnalyzeCommand {
    /// Create a new analyze command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `options` - Options for opening the input file
    ///
    /// # Returns
    /// A new AnalyzeCommand instance or an error
    pub fn new(args: &ArgMatches, options: TiffOptions) -> TiffResult<Self> {
        let input_file = args
            .get_one::<String>("input")
            .ok_or_else(|| TiffError::UsageError("Missing input file".to_string()))?
            .clone();

        Ok(AnalyzeCommand {
            input_file,
            verbose: args.get_flag("verbose"),
            options,
        })
    }

    fn display_summary<S: TiffStream>(&self, file: &TiffFile<S>) {
        info!("TIFF Analysis Results:");
        info!("  File: {}", self.input_file);
        info!("  Format: {}", if file.is_big_tiff() { "BigTIFF" } else { "TIFF" });
        info!("  Byte order: {}", file.byte_order().name());
    }

    fn display_directory<S: TiffStream>(&self, file: &TiffFile<S>) {
        let dir = file.directory();
        info!(
            "\nDirectory #{} (offset: {:#x})",
            file.current_directory().unwrap_or(0),
            file.current_dir_offset()
        );
        info!(
            "  Photometric: {}",
            if dir.is_set(Field::Photometric) {
                photometric_code_to_name(dir.photometric)
            } else {
                "Not set"
            }
        );

        let configured = file.registry().is_configured(dir.compression);
        info!(
            "  Codec: {} ({})",
            compression_code_to_name(dir.compression),
            if configured { "configured" } else { "not configured" }
        );
        for line in dir.to_string().lines() {
            info!("  {}", line);
        }
    }

    fn display_exif<S: TiffStream>(&self, file: &mut TiffFile<S>) -> TiffResult<()> {
        let Some(offset) = file.get_field(tags::EXIF_IFD).and_then(|v| v.as_u64()) else {
            return Ok(());
        };
        let exif = file.read_exif_directory(offset)?;
        info!("  EXIF directory (offset: {:#x}):", offset);
        for tag in exif.set_tags() {
            if let (Some(custom), Some(value)) = (exif.custom_value(tag), exif.get_field(tag)) {
                info!("    {} ({}): {}", custom.info.name, tag, value);
            }
        }
        Ok(())
    }
}

impl Command for AnalyzeCommand {
    fn name(&self) -> &'static str {
        "analyze"
    }

    fn execute(&self) -> TiffResult<()> {
        let stream = std::fs::File::open(&self.input_file)?;
        let options = self.options.clone().name(self.input_file.clone());
        let mut file = TiffFile::open(stream, options)?;

        self.display_summary(&file);
        let mut count = 0;
        loop {
            self.display_directory(&file);
            if self.verbose {
                if let Err(e) = self.display_exif(&mut file) {
                    warn!("Cannot read EXIF directory: {}", e);
                }
            }
            count += 1;

            match file.read_directory() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e @ TiffError::DirectoryLoop { .. }) => {
                    warn!("{}", e);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        info!("\n{} director{} found", count, if count == 1 { "y" } else { "ies" });
        Ok(())
    }
}
