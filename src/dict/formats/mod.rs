//! Format readers and writers, plus the dispatch that maps a job
//! configuration onto concrete input/output file names.

pub mod epub;
pub mod kobo;
pub mod odyssey;
pub mod stardict;
pub mod xml;

use std::path::PathBuf;

use log::info;

use super::archive;
use super::builder::{BuildOptions, BuildOutput};
use super::codec::CodecShell;
use super::config::{self, Config};
use super::error::{ConvertError, Result};
use super::models::{InputFormat, OutputFormat, RawEntry};

/// Return `path` if it exists, otherwise decompress `path.<ext>` into
/// place. Absent both ways is fatal.
pub(crate) fn materialize(path: PathBuf, ext: &str) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path);
    }
    let mut compressed = path.as_os_str().to_os_string();
    compressed.push(".");
    compressed.push(ext);
    let compressed = PathBuf::from(compressed);
    if compressed.is_file() {
        info!("decompressing {} on the fly", compressed.display());
        archive::gunzip_to(&compressed, &path)?;
        return Ok(path);
    }
    Err(ConvertError::SourceNotFound(path))
}

/// Read the configured input dictionary into raw (key, definition) pairs,
/// returning them with the format hint for the entry parser.
pub fn read_input(config: &Config, shell: &CodecShell) -> Result<(Vec<RawEntry>, String)> {
    match config.input_format {
        InputFormat::Stardict => {
            let source = stardict::resolve_source(&config.prefix)?;
            let entries = stardict::read(&source, config.ignore_case)?;
            Ok((entries, source.type_sequence))
        }
        InputFormat::Xml => {
            let source = PathBuf::from(format!("{}.xml", config.prefix));
            let entries = xml::read(&source, config.ignore_case)?;
            Ok((entries, "unknown".to_string()))
        }
        InputFormat::Odyssey => {
            let idx = materialize(PathBuf::from(format!("{}.dict.idx", config.prefix)), "gz")?;
            let dict = materialize(PathBuf::from(format!("{}.dict", config.prefix)), "dz")?;
            let entries = odyssey::read(&idx, &dict, config.ignore_case, config.debug)?;
            Ok((entries, "unknown".to_string()))
        }
        InputFormat::Kobo => {
            let source = PathBuf::from(format!("{}.zip", config.prefix));
            if !source.is_file() {
                return Err(ConvertError::SourceNotFound(source));
            }
            let entries = kobo::read(&source, shell, config.ignore_case)?;
            Ok((entries, "unknown".to_string()))
        }
    }
}

/// Builder layout for the configured output format.
pub fn build_options(config: &Config) -> BuildOptions {
    match config.output_format {
        OutputFormat::Odyssey => BuildOptions::chunked(),
        OutputFormat::Stardict
        | OutputFormat::Xml
        | OutputFormat::Kobo
        | OutputFormat::Epub => BuildOptions::single_stream(),
    }
}

/// Write the builder output in the configured format, returning the
/// produced artifact paths.
pub fn write_output(
    config: &Config,
    output: &BuildOutput,
    shell: &CodecShell,
) -> Result<Vec<PathBuf>> {
    match config.output_format {
        OutputFormat::Odyssey => {
            let mut dict = config
                .output_dir
                .join(config::odyssey_dict_name(&config.prefix, &config.metadata));
            let mut idx = PathBuf::from(format!("{}.idx", dict.display()));
            config::avoid_collisions(&mut [&mut dict, &mut idx]);

            let target = odyssey::OdysseyTarget { dict, idx };
            let mut artifacts = odyssey::write(&target, &config.metadata, output, config.debug)?;
            if config.install_zip {
                let install = PathBuf::from(format!("{}.install", target.dict.display()));
                archive::zip_files(&install, &[target.dict.clone(), target.idx.clone()])?;
                artifacts.push(install);
            }
            Ok(artifacts)
        }
        OutputFormat::Stardict => {
            let mut dict = config.output_dir.join(format!("{}.dict", config.prefix));
            let mut idx = config.output_dir.join(format!("{}.idx", config.prefix));
            let mut ifo = config.output_dir.join(format!("{}.ifo", config.prefix));
            let mut dz = config.output_dir.join(format!("{}.dict.dz", config.prefix));
            config::avoid_collisions(&mut [&mut dict, &mut idx, &mut ifo, &mut dz]);

            let target = stardict::StardictTarget { dict, idx, ifo };
            stardict::write(&target, &config.metadata, output, shell, config.debug)
        }
        OutputFormat::Xml => {
            let mut document = config.output_dir.join(format!("{}.xml", config.prefix));
            config::avoid_collisions(&mut [&mut document]);
            xml::write(&document, output)
        }
        OutputFormat::Kobo => {
            let mut archive_path = config
                .output_dir
                .join(config::kobo_dict_name(&config.metadata));
            config::avoid_collisions(&mut [&mut archive_path]);
            kobo::write(&archive_path, output, shell, config.debug)
        }
        OutputFormat::Epub => {
            let mut package = config.output_dir.join(format!("{}.epub", config.prefix));
            config::avoid_collisions(&mut [&mut package]);
            epub::write(&package, &config.metadata, &output.index.sorted_keys())
        }
    }
}
