//! # dictconv
//!
//! Converts dictionaries between five on-disk formats: StarDict, Bookeen
//! Odyssey, Kobo, XML interchange, and EPUB (index-of-terms only).
//!
//! The engine is a sequential pipeline: a format reader decodes raw
//! (key, definition) pairs, an [`dict::EntryParser`] turns them into
//! canonical entries (synonyms, alias substitutions, include flags), the
//! chunked builder assigns content offsets and resolves aliases, and a
//! format writer emits the final artifacts. External compression and
//! trie tools are reached through [`dict::CodecShell`].
pub mod dict;

// Re-export the main types for convenience
pub use dict::{
    convert,
    models::{Entry, IndexRecord, InputFormat, Metadata, OutputFormat, RawEntry},
    CodecShell, Config, ConvertError, DefaultParser, EntryParser, Result,
};
