//! The pluggable transform from raw (key, definition) pairs into canonical
//! entries.
//!
//! Consumers with structured source material (inflected forms, alias
//! tables) implement [`EntryParser`] to emit synonyms and substitutions;
//! everyone else gets [`DefaultParser`], which includes every pair as-is.

use log::debug;

use super::error::{ConvertError, Result};
use super::models::{Entry, RawEntry};

/// Transform raw reader output into canonical entries.
///
/// `hint` carries the source format's content type marker (for StarDict
/// input, the `sametypesequence` value); `ignore_case` reports whether keys
/// were already lower-cased at read time.
pub trait EntryParser {
    fn parse(&self, raw: Vec<RawEntry>, hint: &str, ignore_case: bool) -> Result<Vec<Entry>>;
}

/// The built-in parser: wraps each raw pair as an included entry with no
/// synonyms and no substitutions.
#[derive(Debug, Default)]
pub struct DefaultParser;

impl EntryParser for DefaultParser {
    fn parse(&self, raw: Vec<RawEntry>, _hint: &str, _ignore_case: bool) -> Result<Vec<Entry>> {
        Ok(raw
            .into_iter()
            .map(|r| Entry::included(r.key, r.definition))
            .collect())
    }
}

/// Probe a parser with empty input before first use.
///
/// A hook that cannot handle the empty probe is unusable; the run must
/// fail here rather than fall back to the default behind the caller's back.
pub fn validate(parser: &dyn EntryParser) -> Result<()> {
    match parser.parse(Vec::new(), "x", false) {
        Ok(entries) if entries.is_empty() => {
            debug!("entry parser passed validation probe");
            Ok(())
        }
        Ok(entries) => Err(ConvertError::ParserUnavailable(format!(
            "probe with empty input produced {} entries",
            entries.len()
        ))),
        Err(e) => Err(ConvertError::ParserUnavailable(e.to_string())),
    }
}
