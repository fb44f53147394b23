//! Codec listing command

use log::info;

use crate::commands::command_traits::Command;
use crate::tiff::errors::TiffResult;
use crate::tiff::options::TiffOptions;

/// Lists the compression schemes the registry knows about
pub struct CodecsCommand {
    options: TiffOptions,
    /// Include schemes without an implementation
    all: bool,
}

impl CodecsCommand {
    pub fn new(options: TiffOptions, all: bool) -> Self {
        CodecsCommand { options, all }
    }
}

impl Command for CodecsCommand {
    fn name(&self) -> &'static str {
        "codecs"
    }

    fn execute(&self) -> TiffResult<()> {
        let registry = self.options.get_registry();
        let codecs = if self.all { registry.known() } else { registry.configured() };

        info!("{:>6}  {:<28} {}", "Scheme", "Name", "Status");
        for codec in codecs {
            info!(
                "{:>6}  {:<28} {}",
                codec.scheme,
                codec.name,
                if codec.is_configured() { "configured" } else { "not configured" }
            );
        }
        Ok(())
    }
}
