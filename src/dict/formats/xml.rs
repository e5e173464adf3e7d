//! XML interchange format support.
//!
//! The reader is a literal-delimiter scanner, not an XML parser: it walks
//! the document for `<entry>` markers and slices out the `<key>` and
//! `<def>` segments between their literal tags. Nested or malformed
//! markup is out of contract; scanning simply stops at the first position
//! with no further `<entry>`. Upgrading this to a validating parser would
//! change which inputs are accepted.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::dict::builder::BuildOutput;
use crate::dict::collate;
use crate::dict::error::{ConvertError, Result};
use crate::dict::models::RawEntry;

/// Read the XML document into raw (key, definition) pairs.
pub fn read(source: &Path, ignore_case: bool) -> Result<Vec<RawEntry>> {
    if !source.is_file() {
        return Err(ConvertError::SourceNotFound(source.to_path_buf()));
    }
    let document = fs::read_to_string(source)?;
    let entries = scan(&document, ignore_case);
    info!("read {} entries from {}", entries.len(), source.display());
    Ok(entries)
}

/// Extract entry segments by literal delimiters.
fn scan(document: &str, ignore_case: bool) -> Vec<RawEntry> {
    let mut entries = Vec::new();
    let mut search_from = 0usize;

    while let Some(entry_pos) = find_from(document, "<entry>", search_from) {
        let key = slice_tag(document, entry_pos, "<key>", "</key>");
        let definition = slice_tag(document, entry_pos, "<def>", "</def>");
        if let (Some(key), Some(definition)) = (key, definition) {
            let key = if ignore_case {
                collate::fold_key(key.trim())
            } else {
                key.trim().to_string()
            };
            entries.push(RawEntry::new(key, definition.trim().as_bytes()));
        }
        search_from = entry_pos + 1;
    }

    entries
}

fn find_from(document: &str, needle: &str, from: usize) -> Option<usize> {
    document.get(from..)?.find(needle).map(|pos| from + pos)
}

/// The text between `open` and `close`, searched from `from`.
fn slice_tag<'a>(document: &'a str, from: usize, open: &str, close: &str) -> Option<&'a str> {
    let start = find_from(document, open, from)? + open.len();
    let end = find_from(document, close, start)?;
    Some(&document[start..end])
}

/// Write the builder output as an XML document, one entry per record in
/// collation order.
pub fn write(target: &Path, output: &BuildOutput) -> Result<Vec<PathBuf>> {
    let mut document = String::new();
    document.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>");
    document.push_str("<!DOCTYPE document SYSTEM \"dictionary.dtd\">");
    document.push_str("<dictionary>");
    for key in output.index.sorted_keys() {
        for record in output.index.records(key) {
            let definition = output.definition(record)?;
            document.push_str(&format!(
                "<entry><key>{}</key><def>{}</def></entry>",
                key,
                String::from_utf8_lossy(definition)
            ));
        }
    }
    document.push_str("</dictionary>");

    fs::write(target, document)?;
    info!("wrote XML dictionary {}", target.display());
    Ok(vec![target.to_path_buf()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_entries_with_trimming() {
        let doc = "<dictionary>\n  <entry><key> apple </key><def> a fruit </def></entry>\n\
                   <entry><key>banana</key><def>a fruit too</def></entry>\n</dictionary>";
        let entries = scan(doc, false);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "apple");
        assert_eq!(entries[0].definition, b"a fruit");
        assert_eq!(entries[1].key, "banana");
    }

    #[test]
    fn stops_silently_when_no_further_entry_tag() {
        let doc = "<dictionary><entry><key>a</key><def>1</def></entry>trailing junk";
        let entries = scan(doc, false);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn empty_document_yields_no_entries() {
        assert!(scan("<dictionary></dictionary>", false).is_empty());
        assert!(scan("", false).is_empty());
    }

    #[test]
    fn folds_keys_when_ignoring_case() {
        let doc = "<entry><key>Apple</key><def>x</def></entry>";
        let entries = scan(doc, true);
        assert_eq!(entries[0].key, "apple");
    }
}
