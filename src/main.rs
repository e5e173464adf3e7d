use std::process::ExitCode;

use clap::Parser;

use dictconv::dict::{self, CodecShell, Config, DefaultParser};
use dictconv::{InputFormat, OutputFormat};

/// Convert dictionaries between StarDict, Bookeen Odyssey, Kobo, XML and
/// EPUB formats.
#[derive(Parser, Debug)]
#[command(name = "dictconv", version, about)]
struct Args {
    /// Name of the dictionary to convert, without extension
    #[arg(short, long)]
    prefix: String,

    /// ISO 639 code of the source language
    #[arg(short = 'f', long = "from", default_value = "")]
    language_from: String,

    /// ISO 639 code of the target language
    #[arg(short = 't', long = "to", default_value = "")]
    language_to: String,

    /// Input dictionary format
    #[arg(long, value_enum, default_value_t = InputFormat::Stardict)]
    input_format: InputFormat,

    /// Output dictionary format
    #[arg(long, value_enum, default_value_t = OutputFormat::Odyssey)]
    output_format: OutputFormat,

    /// Ignore word case while building the index
    #[arg(short, long)]
    ignore_case: bool,

    /// Keep temporary files and uncompressed intermediates
    #[arg(short, long)]
    debug: bool,

    /// Create the .install zip containing the dictionary and the index
    /// (Odyssey output only)
    #[arg(short = 'z', long)]
    install_zip: bool,

    /// Title string shown on the reader screen
    #[arg(long)]
    title: Option<String>,

    /// License string
    #[arg(long)]
    license: Option<String>,

    /// Copyright string
    #[arg(long)]
    copyright: Option<String>,

    /// Description string
    #[arg(long)]
    description: Option<String>,

    /// Year string
    #[arg(long)]
    year: Option<String>,
}

fn config_from_args(args: Args) -> Result<Config, String> {
    // Language codes drive output naming and embedded metadata for the
    // e-reader targets.
    let needs_from = matches!(
        args.output_format,
        OutputFormat::Odyssey | OutputFormat::Kobo | OutputFormat::Epub
    );
    let needs_to = matches!(
        args.output_format,
        OutputFormat::Odyssey | OutputFormat::Kobo
    );
    if needs_from && args.language_from.is_empty() {
        return Err("no source language was supplied (-f)".to_string());
    }
    if needs_to && args.language_to.is_empty() {
        return Err("no target language was supplied (-t)".to_string());
    }

    let mut config = Config::new(args.prefix, args.input_format, args.output_format);
    config.ignore_case = args.ignore_case;
    config.debug = args.debug;
    config.install_zip = args.install_zip;

    config.metadata.language_from = args.language_from;
    config.metadata.language_to = args.language_to;
    if let Some(license) = args.license {
        config.metadata.license = license;
    }
    if let Some(copyright) = args.copyright {
        config.metadata.copyright = copyright;
    }
    let default_title = format!(
        "Dictionary {} -> {}",
        config.metadata.language_from, config.metadata.language_to
    );
    config.metadata.title = args.title.unwrap_or(default_title);
    let default_description = config.metadata.title.clone();
    config.metadata.description = args.description.unwrap_or(default_description);
    if let Some(year) = args.year {
        config.metadata.year = year;
    }
    Ok(config)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = match config_from_args(args) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("ERROR: {}. Aborting.", message);
            return ExitCode::FAILURE;
        }
    };

    if config.debug {
        println!("Debug mode is on.");
    }
    if config.ignore_case {
        println!("Ignoring word case while building the index.");
    }
    println!(
        "Converting '{}' ({:?} -> {:?})...",
        config.prefix, config.input_format, config.output_format
    );

    match dict::convert(&config, &DefaultParser, &CodecShell::default()) {
        Ok(artifacts) => {
            println!("\nConversion completed successfully. Produced:");
            for artifact in artifacts {
                println!("  {}", artifact.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\nERROR: conversion failed");
            eprintln!("  {}", e);
            ExitCode::FAILURE
        }
    }
}
