//! Bookeen Odyssey format support.
//!
//! A dictionary is a zip archive of numbered content chunks (`c_1`,
//! `c_2`, ...) paired with a SQLite index whose key column carries the
//! engine's case-insensitive collation. Offsets in the index are relative
//! to the chunk named by each row.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rusqlite::{params, Connection};

use crate::dict::archive;
use crate::dict::builder::BuildOutput;
use crate::dict::collate;
use crate::dict::error::{ConvertError, Result};
use crate::dict::models::{Metadata, RawEntry};

/// Chunk file name prefix inside the dictionary archive.
const CHUNK_PREFIX: &str = "c_";

/// Collation name the index schema binds to the key column.
const COLLATION: &str = "IcuNoCase";

/// The empty index template: the schema plus one seed row per metadata
/// table, filled in by the writer's updates.
const INDEX_TEMPLATE: &str = "
CREATE TABLE T_DictVersion (F_DictType TEXT, F_Version TEXT);
CREATE TABLE T_DictInfo (
    F_LangFrom TEXT, F_LangTo TEXT,
    F_Licence TEXT, F_Copyright TEXT,
    F_Title TEXT, F_Description TEXT, F_Year TEXT,
    F_Alphabet TEXT, F_xhtmlHeader TEXT
);
CREATE TABLE T_DictIndex (
    F_Flags INTEGER, F_Key TEXT COLLATE IcuNoCase,
    F_Offset INTEGER, F_Size INTEGER, F_ChunkNum INTEGER
);
CREATE INDEX I_DictIndex_Key ON T_DictIndex (F_Key);
INSERT INTO T_DictVersion VALUES ('', '');
INSERT INTO T_DictInfo VALUES ('', '', '', '', '', '', '', '', '');
";

fn open_index(path: &Path) -> Result<Connection> {
    let connection = Connection::open(path)?;
    connection.create_collation(COLLATION, |a, b| collate::compare(a, b))?;
    Ok(connection)
}

/// Read an Odyssey dictionary into raw (key, definition) pairs.
///
/// The archive is extracted into a run-scoped directory which is removed
/// when the read completes (kept in debug runs).
pub fn read(idx: &Path, dict: &Path, ignore_case: bool, debug_mode: bool) -> Result<Vec<RawEntry>> {
    let staging = tempfile::TempDir::new()?;
    archive::unzip(dict, staging.path())?;

    let connection = open_index(idx)?;
    let mut statement = connection.prepare("SELECT * FROM T_DictIndex")?;
    let rows = statement.query_map([], |row| {
        Ok((
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, i64>(4)?,
        ))
    })?;

    // Group index rows by chunk number so each chunk file is opened once.
    let mut by_chunk: BTreeMap<i64, Vec<(String, i64, i64)>> = BTreeMap::new();
    for row in rows {
        let (mut key, offset, size, chunk) = row?;
        if ignore_case {
            key = collate::fold_key(&key);
        }
        by_chunk.entry(chunk).or_default().push((key, offset, size));
    }

    let mut entries = Vec::new();
    for (chunk, records) in by_chunk {
        let chunk_path = staging.path().join(format!("{}{}", CHUNK_PREFIX, chunk));
        if !chunk_path.is_file() {
            return Err(ConvertError::MissingChunk(chunk as u32));
        }
        let content = fs::read(&chunk_path)?;
        debug!("slicing {} record(s) from chunk {}", records.len(), chunk);
        for (key, offset, size) in records {
            let start = offset as usize;
            let end = start + size as usize;
            if end > content.len() {
                return Err(ConvertError::MalformedIndex(format!(
                    "definition for '{}' out of bounds in chunk {}: {} > {}",
                    key,
                    chunk,
                    end,
                    content.len()
                )));
            }
            entries.push(RawEntry::new(key, &content[start..end]));
        }
    }

    if debug_mode {
        let kept = staging.into_path();
        info!("debug: keeping extracted chunks in {}", kept.display());
    }
    info!("read {} entries from {}", entries.len(), idx.display());
    Ok(entries)
}

/// Output file names for an Odyssey conversion.
#[derive(Debug)]
pub struct OdysseyTarget {
    pub dict: PathBuf,
    pub idx: PathBuf,
}

/// Write the builder output as an Odyssey dictionary: staged chunk files
/// zipped into the `.dict` artifact, and the SQLite index populated,
/// annotated with metadata, and compacted.
pub fn write(
    target: &OdysseyTarget,
    metadata: &Metadata,
    output: &BuildOutput,
    debug_mode: bool,
) -> Result<Vec<PathBuf>> {
    // Stage chunk files. An empty dictionary still ships one empty chunk
    // so the artifact stays structurally valid.
    let staging = tempfile::TempDir::new()?;
    let mut chunk_files = Vec::new();
    let chunk_count = output.chunks.len().max(1);
    for number in 1..=chunk_count {
        let path = staging.path().join(format!("{}{}", CHUNK_PREFIX, number));
        let bytes: &[u8] = output
            .chunks
            .get(number - 1)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        fs::write(&path, bytes)?;
        chunk_files.push(path);
    }

    // The index starts from the empty template each run.
    if target.idx.exists() {
        fs::remove_file(&target.idx)?;
    }
    let connection = open_index(&target.idx)?;
    connection.execute_batch(INDEX_TEMPLATE)?;
    connection.execute("DELETE FROM T_DictIndex", [])?;

    {
        let mut insert =
            connection.prepare("INSERT INTO T_DictIndex VALUES (?1, ?2, ?3, ?4, ?5)")?;
        for record in &output.records {
            insert.execute(params![
                0i64,
                record.key,
                record.offset as i64,
                record.length as i64,
                record.chunk as i64 + 1,
            ])?;
        }
    }
    info!(
        "indexed {} record(s) across {} chunk file(s)",
        output.records.len(),
        chunk_count
    );

    archive::zip_files(&target.dict, &chunk_files)?;

    update_metadata(&connection, metadata)?;
    connection.execute_batch("VACUUM")?;
    drop(connection);

    if debug_mode {
        let kept = staging.into_path();
        info!("debug: keeping staged chunks in {}", kept.display());
    }

    info!(
        "wrote Odyssey dictionary {} and index {}",
        target.dict.display(),
        target.idx.display()
    );
    Ok(vec![target.dict.clone(), target.idx.clone()])
}

fn update_metadata(connection: &Connection, metadata: &Metadata) -> Result<()> {
    let header = format!(
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\"  \
         \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\" \
         [<!ENTITY ns \"&#8226;\">]>\
         <html xml:lang=\"{}\" xmlns=\"http://www.w3.org/1999/xhtml\">\
         <head><title></title></head><body>",
        metadata.language_from
    );

    connection.execute("UPDATE T_DictInfo SET F_xhtmlHeader = ?1", params![header])?;
    connection.execute(
        "UPDATE T_DictInfo SET F_LangFrom = ?1",
        params![metadata.language_from],
    )?;
    connection.execute(
        "UPDATE T_DictInfo SET F_LangTo = ?1",
        params![metadata.language_to],
    )?;
    connection.execute(
        "UPDATE T_DictInfo SET F_Licence = ?1",
        params![metadata.license],
    )?;
    connection.execute(
        "UPDATE T_DictInfo SET F_Copyright = ?1",
        params![metadata.copyright],
    )?;
    connection.execute("UPDATE T_DictInfo SET F_Title = ?1", params![metadata.title])?;
    connection.execute(
        "UPDATE T_DictInfo SET F_Description = ?1",
        params![metadata.description],
    )?;
    connection.execute("UPDATE T_DictInfo SET F_Year = ?1", params![metadata.year])?;
    connection.execute("UPDATE T_DictInfo SET F_Alphabet = ?1", params!["Z"])?;

    connection.execute(
        "UPDATE T_DictVersion SET F_DictType = ?1",
        params!["stardict"],
    )?;
    connection.execute("UPDATE T_DictVersion SET F_Version = ?1", params!["1"])?;
    Ok(())
}
