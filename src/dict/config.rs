//! Conversion job configuration and output file naming.

use std::path::{Path, PathBuf};

use log::info;

use super::models::{InputFormat, Metadata, OutputFormat};

/// Everything one conversion run needs to know.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the dictionary to convert, without extension. Input file
    /// names are derived from it per input format.
    pub prefix: String,
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
    pub metadata: Metadata,
    /// Lower-case keys at read time.
    pub ignore_case: bool,
    /// Keep temporary files and uncompressed intermediates.
    pub debug: bool,
    /// Bundle the Odyssey dictionary and index into a `.install` zip.
    pub install_zip: bool,
    /// Directory the output artifacts are written into.
    pub output_dir: PathBuf,
}

impl Config {
    pub fn new(prefix: impl Into<String>, input: InputFormat, output: OutputFormat) -> Self {
        Self {
            prefix: prefix.into(),
            input_format: input,
            output_format: output,
            metadata: Metadata::default(),
            ignore_case: false,
            debug: false,
            install_zip: false,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Prefix `new.` onto the file name portion of `path`.
fn with_new_prefix(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("new.{}", name))
}

/// Rename every candidate with a `new.` prefix if any of them already
/// exists on disk, so an earlier conversion's artifacts are never
/// overwritten.
pub fn avoid_collisions(candidates: &mut [&mut PathBuf]) {
    let colliding = candidates.iter().any(|path| path.is_file());
    if colliding {
        for path in candidates {
            **path = with_new_prefix(path);
            info!("output exists; writing {} instead", path.display());
        }
    }
}

/// The Odyssey dictionary name is language-pair based: `<lang>.<prefix>.dict`
/// when source and target languages match, `<from>-<to>.dict` otherwise.
pub fn odyssey_dict_name(prefix: &str, metadata: &Metadata) -> String {
    if metadata.language_from == metadata.language_to {
        format!("{}.{}.dict", metadata.language_from, prefix)
    } else {
        format!("{}-{}.dict", metadata.language_from, metadata.language_to)
    }
}

/// The Kobo archive name encodes the language pair: `dicthtml` for en→en,
/// `dicthtml-<lang>` for other same-language pairs, `dicthtml-<from>-<to>`
/// otherwise.
pub fn kobo_dict_name(metadata: &Metadata) -> String {
    let base = if metadata.language_from == metadata.language_to {
        if metadata.language_from == "en" {
            "dicthtml".to_string()
        } else {
            format!("dicthtml-{}", metadata.language_from)
        }
    } else {
        format!(
            "dicthtml-{}-{}",
            metadata.language_from, metadata.language_to
        )
    };
    format!("{}.zip", base)
}
