//! Zip and gzip plumbing shared by the format readers and writers.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::error::Result;

/// Extract every member of `archive` into `dest`, returning the extracted
/// paths. Nested directories are created as needed.
pub fn unzip(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut extracted = Vec::with_capacity(zip.len());

    for i in 0..zip.len() {
        let mut member = zip.by_index(i)?;
        let Some(relative) = member.enclosed_name().map(Path::to_path_buf) else {
            debug!("skipping archive member with unsafe name: {}", member.name());
            continue;
        };
        let target = dest.join(relative);
        if member.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut member, &mut out)?;
        extracted.push(target);
    }

    info!(
        "extracted {} file(s) from {}",
        extracted.len(),
        archive.display()
    );
    Ok(extracted)
}

/// Extract a single named member of `archive` to `target`.
pub fn unzip_member(archive: &Path, member: &str, target: &Path) -> Result<()> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut entry = zip.by_name(member)?;
    let mut out = File::create(target)?;
    io::copy(&mut entry, &mut out)?;
    Ok(())
}

/// Create `archive` holding the given files, deflate-compressed, each
/// stored under its file name (no directory components).
pub fn zip_files(archive: &Path, files: &[PathBuf]) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(archive)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        zip.start_file(name, options)?;
        let mut input = File::open(path)?;
        io::copy(&mut input, &mut zip)?;
    }

    zip.finish()?;
    info!("created archive {}", archive.display());
    Ok(())
}

/// Decompress a gzip member file (`.gz` / `.dz` sibling) into `target`.
pub fn gunzip_to(compressed: &Path, target: &Path) -> Result<()> {
    let mut decoder = GzDecoder::new(File::open(compressed)?);
    let mut out = File::create(target)?;
    io::copy(&mut decoder, &mut out)?;
    debug!(
        "decompressed {} -> {}",
        compressed.display(),
        target.display()
    );
    Ok(())
}

/// Gzip-compress `data` into `target`.
pub fn gzip_bytes(data: &[u8], target: &Path) -> Result<()> {
    let mut encoder =
        flate2::write::GzEncoder::new(File::create(target)?, flate2::Compression::default());
    encoder.write_all(data)?;
    encoder.finish()?;
    Ok(())
}

/// Read a gzip file fully into memory.
pub fn gunzip_bytes(compressed: &Path) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(File::open(compressed)?);
    let mut data = Vec::new();
    decoder.read_to_end(&mut data)?;
    Ok(data)
}
