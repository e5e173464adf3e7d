//! Data structures shared across the conversion pipeline.

use clap::ValueEnum;

/// A raw (key, definition) pair as decoded by a format reader, before the
/// entry parser has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub key: String,
    pub definition: Vec<u8>,
}

impl RawEntry {
    pub fn new(key: impl Into<String>, definition: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            definition: definition.into(),
        }
    }
}

/// The canonical unit of convertible dictionary content.
///
/// Produced by the entry parser, consumed once by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Primary sort/lookup key.
    pub word: String,
    /// When false, the entry contributes no content but its substitutions
    /// still feed the global substitution table.
    pub include: bool,
    /// Alternate keys pointing at the same definition.
    pub synonyms: Vec<String>,
    /// Deferred (alias, target) key mappings, resolved after indexing.
    pub substitutions: Vec<(String, String)>,
    /// Opaque definition bytes.
    pub definition: Vec<u8>,
}

impl Entry {
    /// An included entry with no synonyms or substitutions.
    pub fn included(word: impl Into<String>, definition: impl Into<Vec<u8>>) -> Self {
        Self {
            word: word.into(),
            include: true,
            synonyms: Vec::new(),
            substitutions: Vec::new(),
            definition: definition.into(),
        }
    }
}

/// A (key -> content locator) binding produced by the builder.
///
/// Records with identical `(chunk, offset, length)` refer to the same
/// definition bytes; synonyms and resolved aliases are pointer duplicates,
/// never content duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub key: String,
    /// 0-based content chunk id. Always 0 in single-stream mode.
    pub chunk: u32,
    /// Byte offset into the chunk (chunk-relative in chunked mode).
    pub offset: u64,
    /// Byte length of the referenced slice.
    pub length: u64,
}

/// Descriptive metadata threaded through to the writers.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub language_from: String,
    pub language_to: String,
    pub license: String,
    pub copyright: String,
    pub title: String,
    pub description: String,
    pub year: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            language_from: String::new(),
            language_to: String::new(),
            license: "GNU GPL 3".to_string(),
            copyright: "GNU GPL 3".to_string(),
            title: String::new(),
            description: String::new(),
            year: "2012".to_string(),
        }
    }
}

/// Supported input dictionary formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// StarDict (.ifo/.idx/.dict)
    Stardict,
    /// XML interchange document
    Xml,
    /// Bookeen Odyssey (.dict zip + .dict.idx SQLite index)
    Odyssey,
    /// Kobo dicthtml zip (keys only; definitions are not recoverable)
    Kobo,
}

/// Supported output dictionary formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Bookeen Odyssey (.dict zip + .dict.idx SQLite index)
    Odyssey,
    /// StarDict (.ifo/.idx/.dict, dictzip-compressed when available)
    Stardict,
    /// XML interchange document
    Xml,
    /// Kobo dicthtml zip with a MARISA trie key index
    Kobo,
    /// EPUB package listing the index of terms
    Epub,
}
