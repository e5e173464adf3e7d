//! Kobo dicthtml format support.
//!
//! A dictionary is a zip archive of gzip-compressed shard documents, one
//! per two-character key prefix, plus a MARISA trie (`words`) over the
//! full key list. Reading is inherently partial: keys can be recovered
//! from the trie by reverse lookup, but definitions live in paired
//! encrypted content and come back empty.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::dict::archive;
use crate::dict::builder::BuildOutput;
use crate::dict::codec::CodecShell;
use crate::dict::collate;
use crate::dict::error::Result;
use crate::dict::models::RawEntry;

/// Shard used for keys whose prefix characters are not allowed.
const DEFAULT_SHARD: &str = "11";

/// Trie file name inside the archive.
const TRIE_NAME: &str = "words";

/// How many sequential ids the reverse lookup probes.
const PROBE_IDS: u64 = 1_000_000;

/// Whether `ch` may appear in a shard prefix: non-ASCII characters and
/// ASCII lowercase letters only.
fn is_char_allowed(ch: char) -> bool {
    !ch.is_ascii() || ch.is_ascii_lowercase()
}

/// Compute the two-character shard prefix for a key.
///
/// The key is case-folded first; single-character keys are padded with
/// `a`; any disallowed character in the first two positions falls back to
/// the default shard.
pub fn shard_prefix(key: &str) -> String {
    let folded = collate::fold_key(key);
    let mut chars = folded.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return DEFAULT_SHARD.to_string(),
    };
    let second = chars.next().unwrap_or('a');

    if is_char_allowed(first) && is_char_allowed(second) {
        let mut prefix = String::new();
        prefix.push(first);
        prefix.push(second);
        prefix
    } else {
        DEFAULT_SHARD.to_string()
    }
}

/// Read the key list of a Kobo dictionary by reverse-looking-up the trie.
///
/// Definitions are not recoverable and are returned empty.
pub fn read(source: &Path, shell: &CodecShell, ignore_case: bool) -> Result<Vec<RawEntry>> {
    let staging = tempfile::TempDir::new()?;
    let trie = staging.path().join(TRIE_NAME);
    archive::unzip_member(source, TRIE_NAME, &trie)?;

    let stdout = shell.reverse_lookup(&trie, PROBE_IDS)?;
    let mut entries = Vec::new();
    for line in stdout.lines() {
        let mut fields = line.split('\t');
        let (Some(_id), Some(key)) = (fields.next(), fields.next()) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        let key = if ignore_case {
            collate::fold_key(key)
        } else {
            key.to_string()
        };
        entries.push(RawEntry::new(key, Vec::new()));
    }

    warn!(
        "recovered {} key(s) from {}; definitions are not recoverable from this format",
        entries.len(),
        source.display()
    );
    Ok(entries)
}

/// Write the builder output as a Kobo dictionary archive.
///
/// Shard documents are staged, gzip-compressed in place, and zipped
/// together with the trie index built over the sorted key list. Trie
/// construction has no fallback, so its failure aborts the run.
pub fn write(
    target: &Path,
    output: &BuildOutput,
    shell: &CodecShell,
    debug_mode: bool,
) -> Result<Vec<PathBuf>> {
    let staging = tempfile::TempDir::new()?;
    let keys = output.index.sorted_keys();

    // Group keys by shard, keeping shards in first-appearance order.
    let mut shard_order: Vec<String> = Vec::new();
    let mut shard_keys: std::collections::HashMap<String, Vec<&str>> =
        std::collections::HashMap::new();
    for key in &keys {
        let prefix = shard_prefix(key);
        shard_keys
            .entry(prefix.clone())
            .or_insert_with(|| {
                shard_order.push(prefix);
                Vec::new()
            })
            .push(key);
    }

    let mut files = Vec::with_capacity(shard_order.len() + 1);
    for prefix in &shard_order {
        let mut document = String::new();
        document.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?><html>");
        for key in &shard_keys[prefix] {
            for record in output.index.records(key) {
                let definition = output.definition(record)?;
                document.push_str(&format!(
                    "<w><a name=\"{}\"/><div><b>{}</b><br/>{}</div></w>",
                    key,
                    key,
                    String::from_utf8_lossy(definition)
                ));
            }
        }
        document.push_str("</html>");

        // Shard files carry the .html name but hold gzip data.
        let path = staging.path().join(format!("{}.html", prefix));
        archive::gzip_bytes(document.as_bytes(), &path)?;
        files.push(path);
    }
    info!("wrote {} shard document(s)", shard_order.len());

    let trie = staging.path().join(TRIE_NAME);
    shell.build_trie(&keys, &trie)?;
    files.push(trie);

    archive::zip_files(target, &files)?;

    if debug_mode {
        let kept = staging.into_path();
        info!("debug: keeping staged shards in {}", kept.display());
    }

    info!("wrote Kobo dictionary {}", target.display());
    Ok(vec![target.to_path_buf()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_uses_first_two_folded_characters() {
        assert_eq!(shard_prefix("apple"), "ap");
        assert_eq!(shard_prefix("Apple"), "ap");
        assert_eq!(shard_prefix("zebra"), "ze");
    }

    #[test]
    fn single_character_keys_are_padded() {
        assert_eq!(shard_prefix("x"), "xa");
    }

    #[test]
    fn empty_and_disallowed_keys_fall_back_to_the_default_shard() {
        assert_eq!(shard_prefix(""), DEFAULT_SHARD);
        assert_eq!(shard_prefix("1984"), DEFAULT_SHARD);
        assert_eq!(shard_prefix("-dash"), DEFAULT_SHARD);
        assert_eq!(shard_prefix("a1"), DEFAULT_SHARD);
    }

    #[test]
    fn non_ascii_prefixes_are_allowed() {
        assert_eq!(shard_prefix("étude"), "ét");
        assert_eq!(shard_prefix("中文"), "中文");
    }

    #[test]
    fn uppercase_folds_before_the_allowed_check() {
        // 'Z' alone would be disallowed; the fold makes it 'z'.
        assert_eq!(shard_prefix("Zoo"), "zo");
    }
}
