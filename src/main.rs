use clap::{Arg, ArgAction, Command as ClapCommand};
use log::error;
use std::process;
use std::sync::Arc;

use tiffkit::commands::{options_from_args, CommandFactory, TiffkitCommandFactory};
use tiffkit::utils::logger::{DiagnosticSink, LogSink, Logger};

fn main() {
    let matches = ClapCommand::new("tiffkit")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Maurice Schilpp")
        .about("Inspect and re-encode TIFF/BigTIFF files")
        .arg(
            Arg::new("input")
                .help("Input TIFF file")
                .required_unless_present("codecs")
                .index(1),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("codecs")
                .long("codecs")
                .help("List configured codecs (with --verbose, every known scheme)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tags")
                .long("tags")
                .help("Merge field definitions from a TOML file")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("geotiff")
                .long("geotiff")
                .help("Know the GeoTIFF tags by name")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-chop")
                .long("no-chop")
                .help("Do not split large uncompressed strips when reading")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("lenient")
                .long("lenient")
                .help("Read directories whose compression scheme has no codec")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("convert")
                .short('c')
                .long("convert")
                .help("Re-encode the input into this file")
                .value_name("OUTPUT")
                .required(false),
        )
        .arg(
            Arg::new("compression")
                .long("compression")
                .help("Target compression, by code or name (none, lzw, deflate, packbits, zstd)")
                .value_name("CODE")
                .requires("convert")
                .required(false),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Append file diagnostics to this file")
                .value_name("FILE")
                .required(false),
        )
        .get_matches();

    let default_filter = if matches.get_flag("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let sink: Arc<dyn DiagnosticSink> = match matches.get_one::<String>("log-file") {
        Some(path) => match Logger::new(path) {
            Ok(logger) => Arc::new(logger),
            Err(e) => {
                eprintln!("Error opening log file {}: {}", path, e);
                process::exit(1);
            }
        },
        None => Arc::new(LogSink),
    };

    let options = match options_from_args(&matches, sink) {
        Ok(options) => options,
        Err(e) => {
            error!("Invalid options: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let factory = TiffkitCommandFactory::new();
    match factory.create_command(&matches, options) {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("{} failed: {}", command.name(), e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
