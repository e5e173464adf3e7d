//! StarDict format support (.ifo / .idx / .dict files).
//!
//! The index is a flat sequence of records, each a NUL-terminated UTF-8
//! key followed by a big-endian u32 offset and u32 length into the
//! concatenated content file.

use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use log::{debug, info, warn};

use crate::dict::builder::BuildOutput;
use crate::dict::codec::CodecShell;
use crate::dict::collate;
use crate::dict::error::{ConvertError, Result};
use crate::dict::models::{Metadata, RawEntry};

/// Content markers a usable `.ifo` may declare.
const ALLOWED_TYPE_SEQUENCES: &[&str] = &["m", "l", "g", "x", "y", "k", "w", "h"];

/// Resolved StarDict input files plus the declared content marker.
#[derive(Debug)]
pub struct StardictSource {
    pub idx: PathBuf,
    pub dict: PathBuf,
    /// The `sametypesequence` value; forwarded to the entry parser as its
    /// format hint.
    pub type_sequence: String,
}

/// Locate and gate the three input files for dictionary `prefix`.
///
/// The `.ifo` must exist and declare a known `sametypesequence`. The
/// `.idx` and `.dict` may instead be present as `.idx.gz` / `.dict.dz`
/// siblings, which are decompressed on the fly next to them.
pub fn resolve_source(prefix: &str) -> Result<StardictSource> {
    let ifo = PathBuf::from(format!("{}.ifo", prefix));
    let type_sequence = check_ifo(&ifo)?;
    info!("input dictionary has sequence type '{}'", type_sequence);

    let idx = super::materialize(PathBuf::from(format!("{}.idx", prefix)), "gz")?;
    let dict = super::materialize(PathBuf::from(format!("{}.dict", prefix)), "dz")?;

    Ok(StardictSource {
        idx,
        dict,
        type_sequence,
    })
}

/// Verify the metadata file and extract its `sametypesequence`.
fn check_ifo(ifo: &Path) -> Result<String> {
    if !ifo.is_file() {
        return Err(ConvertError::SourceNotFound(ifo.to_path_buf()));
    }
    let content = fs::read_to_string(ifo)?;
    let type_sequence = content
        .lines()
        .filter_map(|line| line.trim().strip_prefix("sametypesequence="))
        .next_back()
        .unwrap_or("")
        .to_string();

    if ALLOWED_TYPE_SEQUENCES.contains(&type_sequence.as_str()) {
        Ok(type_sequence)
    } else {
        Err(ConvertError::BadMetadata {
            path: ifo.to_path_buf(),
            reason: format!("unsupported sametypesequence '{}'", type_sequence),
        })
    }
}

/// Read the dictionary into raw (key, definition) pairs.
pub fn read(source: &StardictSource, ignore_case: bool) -> Result<Vec<RawEntry>> {
    let index = fs::read(&source.idx)?;
    let content = fs::read(&source.dict)?;
    let entries = parse_index(&index, &content, ignore_case)?;
    info!("read {} entries from {}", entries.len(), source.idx.display());
    Ok(entries)
}

/// Scan the index bytes for NUL-terminated keys and slice the content
/// blob by each record's offset/length.
fn parse_index(index: &[u8], content: &[u8], ignore_case: bool) -> Result<Vec<RawEntry>> {
    let mut entries = Vec::new();
    let mut pos = 0usize;

    while let Some(nul) = index[pos..].iter().position(|&b| b == 0) {
        let key_end = pos + nul;
        let rest = &index[key_end + 1..];
        if rest.len() < 8 {
            return Err(ConvertError::MalformedIndex(format!(
                "record truncated at byte {}: {} trailing byte(s) after key",
                key_end,
                rest.len()
            )));
        }

        let mut key = String::from_utf8(index[pos..key_end].to_vec())
            .map_err(|e| ConvertError::MalformedIndex(format!("non-UTF-8 key: {}", e)))?;
        if ignore_case {
            key = collate::fold_key(&key);
        }

        let offset = BigEndian::read_u32(&rest[0..4]) as usize;
        let length = BigEndian::read_u32(&rest[4..8]) as usize;
        let end = offset + length;
        if end > content.len() {
            return Err(ConvertError::MalformedIndex(format!(
                "definition for '{}' out of bounds: {} > {}",
                key,
                end,
                content.len()
            )));
        }

        entries.push(RawEntry::new(key, &content[offset..end]));
        pos = key_end + 1 + 8;
    }

    if pos < index.len() {
        debug!("ignoring {} trailing byte(s) after last record", index.len() - pos);
    }
    Ok(entries)
}

/// Output file names for a StarDict conversion.
#[derive(Debug)]
pub struct StardictTarget {
    pub dict: PathBuf,
    pub idx: PathBuf,
    pub ifo: PathBuf,
}

/// Write the builder output as a StarDict dictionary.
///
/// The content file is handed to the external compressor afterwards; on
/// success the uncompressed file is dropped (kept in debug runs), on
/// failure it stays in service with a warning.
pub fn write(
    target: &StardictTarget,
    metadata: &Metadata,
    output: &BuildOutput,
    shell: &CodecShell,
    debug_mode: bool,
) -> Result<Vec<PathBuf>> {
    let content: &[u8] = output.chunks.first().map(Vec::as_slice).unwrap_or(&[]);
    fs::write(&target.dict, content)?;

    let mut index = Vec::new();
    for key in output.index.sorted_keys() {
        for record in output.index.records(key) {
            index.extend_from_slice(record.key.as_bytes());
            index.push(0);
            index.write_u32::<BigEndian>(record.offset as u32)?;
            index.write_u32::<BigEndian>(record.length as u32)?;
        }
    }
    fs::write(&target.idx, &index)?;

    write_ifo(target, metadata, output.index.len(), index.len())?;

    let mut artifacts = vec![target.idx.clone(), target.ifo.clone()];
    if shell.compress(&target.dict)? {
        let mut dz = target.dict.as_os_str().to_os_string();
        dz.push(".dz");
        artifacts.push(PathBuf::from(dz));
        if debug_mode {
            artifacts.push(target.dict.clone());
        } else {
            fs::remove_file(&target.dict)?;
        }
    } else {
        warn!("shipping {} uncompressed", target.dict.display());
        artifacts.push(target.dict.clone());
    }

    info!("wrote StarDict dictionary {}", target.ifo.display());
    Ok(artifacts)
}

fn write_ifo(
    target: &StardictTarget,
    metadata: &Metadata,
    word_count: usize,
    idx_size: usize,
) -> Result<()> {
    let mut ifo = String::new();
    ifo.push_str("StarDict's dict ifo file\n");
    ifo.push_str("version=2.4.2\n");
    ifo.push_str(&format!("wordcount={}\n", word_count));
    ifo.push_str(&format!("idxfilesize={}\n", idx_size));
    ifo.push_str(&format!("bookname={}\n", metadata.title));
    ifo.push_str(&format!("date={}\n", metadata.year));
    ifo.push_str("sametypesequence=m\n");
    ifo.push_str(&format!(
        "description={}<br/>{}<br/>{}\n",
        metadata.description, metadata.license, metadata.copyright
    ));
    fs::write(&target.ifo, ifo)?;
    Ok(())
}
