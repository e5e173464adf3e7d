//! Core dictionary conversion module.

pub mod archive;
pub mod builder;
pub mod codec;
pub mod collate;
pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod parser;

use std::path::PathBuf;

use log::info;

pub use codec::CodecShell;
pub use config::Config;
pub use error::{ConvertError, Result};
pub use parser::{DefaultParser, EntryParser};

/// Run one full conversion: read the input dictionary, parse it into
/// canonical entries, build the content store and index, and write the
/// target format's artifacts.
///
/// The pipeline is strictly sequential; each stage fully consumes its
/// predecessor's output. Returns the paths of the produced artifacts.
///
/// # Errors
/// Fails fast on a missing or malformed source, an unusable entry
/// parser, or a required external tool going wrong; only dictionary
/// compression degrades instead of failing.
pub fn convert(
    config: &Config,
    parser: &dyn EntryParser,
    shell: &CodecShell,
) -> Result<Vec<PathBuf>> {
    // An unusable hook must fail the run here, never silently fall back.
    parser::validate(parser)?;

    info!(
        "converting '{}': {:?} -> {:?}",
        config.prefix, config.input_format, config.output_format
    );

    let (raw, hint) = formats::read_input(config, shell)?;
    info!("parsing {} raw entries (hint '{}')", raw.len(), hint);
    let entries = parser.parse(raw, &hint, config.ignore_case)?;

    let output = builder::build(entries, &formats::build_options(config));

    let artifacts = formats::write_output(config, &output, shell)?;
    info!(
        "conversion finished: {} artifact(s) produced",
        artifacts.len()
    );
    Ok(artifacts)
}
