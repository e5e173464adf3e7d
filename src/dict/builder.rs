//! The chunked content/index builder.
//!
//! Takes canonical entries and produces the content store (one or more
//! size-bounded chunks), one index record per key (word, synonym, or
//! resolved alias), and a key-to-records lookup table. This is the single
//! place where byte offsets are assigned; every writer consumes its output
//! instead of re-deriving positions.

use std::collections::HashMap;

use log::{debug, info};

use super::collate;
use super::error::{ConvertError, Result};
use super::models::{Entry, IndexRecord};

/// Observed content chunks on the Odyssey reader sit between 2^18 and
/// 2^19 bytes; new chunks are cut at the lower bound.
pub const DEFAULT_CHUNK_THRESHOLD: u64 = 262_144;

/// How definition bytes are laid out in the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunking {
    /// All definitions concatenated into a single stream; offsets are
    /// global. StarDict-style targets.
    SingleStream,
    /// Definitions paginated into size-bounded chunks; offsets are
    /// chunk-relative. Odyssey-style targets.
    Chunked,
}

/// How many records one key may hold in the lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// First record per key wins; later duplicates are dropped.
    Single,
    /// Every record is retained ("multiset" index).
    Multi,
}

/// Builder configuration, chosen by the target format's writer.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub chunking: Chunking,
    pub multiplicity: Multiplicity,
    /// Capacity threshold for chunk rollover (ignored in single-stream
    /// mode).
    pub threshold: u64,
    /// Sort entries by word before assigning offsets. Required for targets
    /// whose on-disk lookup binary-searches the index; multiset targets
    /// that sort keys at write time leave this off.
    pub presort: bool,
}

impl BuildOptions {
    pub fn chunked() -> Self {
        Self {
            chunking: Chunking::Chunked,
            multiplicity: Multiplicity::Single,
            threshold: DEFAULT_CHUNK_THRESHOLD,
            presort: true,
        }
    }

    pub fn single_stream() -> Self {
        Self {
            chunking: Chunking::SingleStream,
            multiplicity: Multiplicity::Multi,
            threshold: DEFAULT_CHUNK_THRESHOLD,
            presort: false,
        }
    }
}

/// Key-to-records lookup table built alongside the content store.
#[derive(Debug)]
pub struct DictionaryIndex {
    map: HashMap<String, Vec<IndexRecord>>,
    /// Keys in first-seen order; the basis for the stable sorted listing.
    keys: Vec<String>,
    multiplicity: Multiplicity,
}

impl DictionaryIndex {
    fn new(multiplicity: Multiplicity) -> Self {
        Self {
            map: HashMap::new(),
            keys: Vec::new(),
            multiplicity,
        }
    }

    fn insert(&mut self, record: IndexRecord) {
        match self.map.get_mut(&record.key) {
            Some(existing) => {
                if self.multiplicity == Multiplicity::Multi {
                    existing.push(record);
                }
                // Single-valued mode keeps the first record per key.
            }
            None => {
                self.keys.push(record.key.clone());
                self.map.insert(record.key.clone(), vec![record]);
            }
        }
    }

    /// All records bound to `key`, in insertion order.
    pub fn records(&self, key: &str) -> &[IndexRecord] {
        self.map.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first record bound to `key`, if any.
    pub fn first(&self, key: &str) -> Option<&IndexRecord> {
        self.map.get(key).and_then(|records| records.first())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in collation order. The sort is stable, so keys that compare
    /// equal (case-only differences) keep their first-seen order.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        keys.sort_by(|a, b| collate::compare(a, b));
        keys
    }
}

/// The builder's complete output: content chunks, every emitted record in
/// emission order, and the key lookup table.
#[derive(Debug)]
pub struct BuildOutput {
    pub chunks: Vec<Vec<u8>>,
    pub records: Vec<IndexRecord>,
    pub index: DictionaryIndex,
}

impl BuildOutput {
    /// Slice the definition bytes a record points at.
    pub fn definition(&self, record: &IndexRecord) -> Result<&[u8]> {
        let chunk = self
            .chunks
            .get(record.chunk as usize)
            .ok_or(ConvertError::MissingChunk(record.chunk))?;
        let start = record.offset as usize;
        let end = start + record.length as usize;
        if end > chunk.len() {
            return Err(ConvertError::MalformedIndex(format!(
                "record for '{}' out of bounds: {} > {}",
                record.key,
                end,
                chunk.len()
            )));
        }
        Ok(&chunk[start..end])
    }
}

/// Assign content offsets and build the index for `entries`.
///
/// Excluded entries contribute only their substitutions. Synonyms receive
/// records at the same offset/length as their word (no content
/// duplication). After all entries are placed, the accumulated
/// substitutions are resolved: each alias becomes a pointer copy of its
/// target's first record, and aliases whose target never made it into the
/// index are dropped silently.
pub fn build(mut entries: Vec<Entry>, options: &BuildOptions) -> BuildOutput {
    if options.presort {
        entries.sort_by(|a, b| collate::compare(&a.word, &b.word));
    }

    let mut sealed: Vec<Vec<u8>> = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut records: Vec<IndexRecord> = Vec::new();
    let mut index = DictionaryIndex::new(options.multiplicity);
    let mut substitutions: Vec<(String, String)> = Vec::new();

    for entry in entries {
        if !entry.include {
            substitutions.extend(entry.substitutions);
            continue;
        }

        let length = entry.definition.len() as u64;

        // A definition is never split: seal the chunk up front when this
        // write would push a non-empty chunk past the threshold. An
        // oversized definition lands whole in a fresh chunk, which may then
        // exceed the threshold on its own.
        if options.chunking == Chunking::Chunked
            && !current.is_empty()
            && current.len() as u64 + length > options.threshold
        {
            sealed.push(std::mem::take(&mut current));
        }

        let chunk = sealed.len() as u32;
        let offset = current.len() as u64;
        current.extend_from_slice(&entry.definition);

        let record = IndexRecord {
            key: entry.word,
            chunk,
            offset,
            length,
        };
        index.insert(record.clone());
        records.push(record);

        for synonym in entry.synonyms {
            let record = IndexRecord {
                key: synonym,
                chunk,
                offset,
                length,
            };
            index.insert(record.clone());
            records.push(record);
        }
    }

    let mut resolved = 0usize;
    for (alias, target) in substitutions {
        match index.first(&target).cloned() {
            Some(target_record) => {
                let record = IndexRecord {
                    key: alias,
                    chunk: target_record.chunk,
                    offset: target_record.offset,
                    length: target_record.length,
                };
                index.insert(record.clone());
                records.push(record);
                resolved += 1;
            }
            None => {
                debug!("dropping substitution '{}' -> absent '{}'", alias, target);
            }
        }
    }

    let chunks = if records.is_empty() {
        Vec::new()
    } else {
        sealed.push(current);
        sealed
    };

    info!(
        "built {} index records ({} distinct keys, {} resolved aliases) across {} chunk(s)",
        records.len(),
        index.len(),
        resolved,
        chunks.len()
    );

    BuildOutput {
        chunks,
        records,
        index,
    }
}
