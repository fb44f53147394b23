//! Command and factory traits for the `tiffkit` binary

use clap::ArgMatches;

use crate::tiff::errors::TiffResult;
use crate::tiff::options::TiffOptions;

/// One action the binary can run against a file
pub trait Command {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Runs the action to completion
    fn execute(&self) -> TiffResult<()>;
}

/// Chooses and builds the command selected by the CLI arguments
pub trait CommandFactory {
    /// Builds the command; `options` were derived from the same `args`
    fn create_command(&self, args: &ArgMatches, options: TiffOptions) -> TiffResult<Box<dyn Command>>;
}
