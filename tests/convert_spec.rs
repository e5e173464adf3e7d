use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use dictconv::dict::builder::{self, BuildOptions};
use dictconv::dict::config::Config;
use dictconv::dict::formats::{odyssey, stardict};
use dictconv::dict::{convert, CodecShell, ConvertError, DefaultParser, EntryParser};
use dictconv::{Entry, InputFormat, Metadata, OutputFormat, RawEntry};
use tempfile::TempDir;

/// Entries used across the fixtures: (key, definition).
const FIXTURE_ENTRIES: &[(&str, &str)] = &[
    ("apple", "a fruit"),
    ("banana", "a fruit too"),
    ("cherry", "a small stone fruit"),
    ("Date", "a palm fruit"),
];

fn shell_without_tools() -> CodecShell {
    CodecShell {
        dictzip: PathBuf::from("/nonexistent/dictzip"),
        marisa_build: PathBuf::from("/nonexistent/marisa-build"),
        marisa_reverse_lookup: PathBuf::from("/nonexistent/marisa-reverse-lookup"),
    }
}

/// Build a StarDict fixture (ifo/idx/dict) for `prefix` inside `dir`.
fn write_stardict_fixture(dir: &Path, prefix: &str, entries: &[(&str, &str)]) {
    let mut content: Vec<u8> = Vec::new();
    let mut index: Vec<u8> = Vec::new();
    for (key, definition) in entries {
        let offset = content.len() as u32;
        content.extend_from_slice(definition.as_bytes());
        index.extend_from_slice(key.as_bytes());
        index.push(0);
        index.extend_from_slice(&offset.to_be_bytes());
        index.extend_from_slice(&(definition.len() as u32).to_be_bytes());
    }
    fs::write(dir.join(format!("{}.dict", prefix)), &content).unwrap();
    fs::write(dir.join(format!("{}.idx", prefix)), &index).unwrap();
    fs::write(
        dir.join(format!("{}.ifo", prefix)),
        "StarDict's dict ifo file\nversion=2.4.2\nsametypesequence=m\n",
    )
    .unwrap();
}

fn write_xml_fixture(dir: &Path, prefix: &str, entries: &[(&str, &str)]) {
    let mut document = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?><dictionary>");
    for (key, definition) in entries {
        document.push_str(&format!(
            "<entry><key>{}</key><def>{}</def></entry>",
            key, definition
        ));
    }
    document.push_str("</dictionary>");
    fs::write(dir.join(format!("{}.xml", prefix)), document).unwrap();
}

fn base_config(dir: &Path, prefix: &str, input: InputFormat, output: OutputFormat) -> Config {
    let mut config = Config::new(
        dir.join(prefix).to_string_lossy().into_owned(),
        input,
        output,
    );
    config.metadata = Metadata {
        language_from: "en".to_string(),
        language_to: "it".to_string(),
        title: "Test dictionary".to_string(),
        description: "A dictionary for tests".to_string(),
        ..Metadata::default()
    };
    config.output_dir = dir.to_path_buf();
    config
}

fn entry_map(entries: &[RawEntry]) -> HashMap<String, Vec<u8>> {
    entries
        .iter()
        .map(|e| (e.key.clone(), e.definition.clone()))
        .collect()
}

#[test]
fn stardict_to_odyssey_round_trips() {
    let dir = TempDir::new().unwrap();
    write_stardict_fixture(dir.path(), "foo", FIXTURE_ENTRIES);

    let mut config = base_config(dir.path(), "foo", InputFormat::Stardict, OutputFormat::Odyssey);
    config.install_zip = true;
    let artifacts = convert(&config, &DefaultParser, &shell_without_tools()).unwrap();

    let dict = dir.path().join("en-it.dict");
    let idx = dir.path().join("en-it.dict.idx");
    assert!(artifacts.contains(&dict), "missing {:?} in {:?}", dict, artifacts);
    assert!(artifacts.contains(&idx));

    // The .install bundle holds the dictionary and its index.
    let install = dir.path().join("en-it.dict.install");
    assert!(artifacts.contains(&install));
    let mut bundle = zip::ZipArchive::new(fs::File::open(&install).unwrap()).unwrap();
    assert!(bundle.by_name("en-it.dict").is_ok());
    assert!(bundle.by_name("en-it.dict.idx").is_ok());

    let read_back = odyssey::read(&idx, &dict, false, false).unwrap();
    let expected: HashMap<String, Vec<u8>> = FIXTURE_ENTRIES
        .iter()
        .map(|(k, d)| (k.to_string(), d.as_bytes().to_vec()))
        .collect();
    assert_eq!(entry_map(&read_back), expected);
}

#[test]
fn odyssey_chunks_round_trip_across_rollovers() {
    let dir = TempDir::new().unwrap();
    let mut options = BuildOptions::chunked();
    options.threshold = 16;

    let entries: Vec<Entry> = (0..10)
        .map(|i| Entry::included(format!("word{:02}", i), format!("definition number {}", i)))
        .collect();
    let output = builder::build(entries, &options);
    assert!(output.chunks.len() > 1, "fixture should span several chunks");

    let target = odyssey::OdysseyTarget {
        dict: dir.path().join("en-en.dict"),
        idx: dir.path().join("en-en.dict.idx"),
    };
    odyssey::write(&target, &Metadata::default(), &output, false).unwrap();

    let read_back = odyssey::read(&target.idx, &target.dict, false, false).unwrap();
    assert_eq!(read_back.len(), 10);
    let map = entry_map(&read_back);
    for i in 0..10 {
        assert_eq!(
            map[&format!("word{:02}", i)],
            format!("definition number {}", i).into_bytes()
        );
    }
}

#[test]
fn xml_to_stardict_degrades_without_dictzip() {
    let dir = TempDir::new().unwrap();
    write_xml_fixture(dir.path(), "bar", FIXTURE_ENTRIES);

    let config = base_config(dir.path(), "bar", InputFormat::Xml, OutputFormat::Stardict);
    let artifacts = convert(&config, &DefaultParser, &shell_without_tools()).unwrap();

    // Compression degraded: the uncompressed .dict stays in service.
    let dict = dir.path().join("bar.dict");
    assert!(artifacts.contains(&dict));
    assert!(!dir.path().join("bar.dict.dz").exists());

    let source = stardict::resolve_source(&dir.path().join("bar").to_string_lossy()).unwrap();
    assert_eq!(source.type_sequence, "m");
    let read_back = stardict::read(&source, false).unwrap();
    let expected: HashMap<String, Vec<u8>> = FIXTURE_ENTRIES
        .iter()
        .map(|(k, d)| (k.to_string(), d.as_bytes().to_vec()))
        .collect();
    assert_eq!(entry_map(&read_back), expected);

    // StarDict index keys come out in collation order.
    let keys: Vec<&str> = read_back.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["apple", "banana", "cherry", "Date"]);

    let ifo = fs::read_to_string(dir.path().join("bar.ifo")).unwrap();
    assert!(ifo.contains("wordcount=4"));
    assert!(ifo.contains("bookname=Test dictionary"));
    assert!(ifo.contains("sametypesequence=m"));
}

#[test]
fn compressed_stardict_inputs_are_materialized() {
    let dir = TempDir::new().unwrap();
    write_stardict_fixture(dir.path(), "zipped", FIXTURE_ENTRIES);

    // Replace the flat files with their compressed siblings.
    let idx = dir.path().join("zipped.idx");
    let dict = dir.path().join("zipped.dict");
    let idx_bytes = fs::read(&idx).unwrap();
    let dict_bytes = fs::read(&dict).unwrap();
    dictconv::dict::archive::gzip_bytes(&idx_bytes, &dir.path().join("zipped.idx.gz")).unwrap();
    dictconv::dict::archive::gzip_bytes(&dict_bytes, &dir.path().join("zipped.dict.dz")).unwrap();
    fs::remove_file(&idx).unwrap();
    fs::remove_file(&dict).unwrap();

    let source = stardict::resolve_source(&dir.path().join("zipped").to_string_lossy()).unwrap();
    let read_back = stardict::read(&source, false).unwrap();
    assert_eq!(read_back.len(), FIXTURE_ENTRIES.len());
}

#[test]
fn missing_stardict_source_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = base_config(dir.path(), "ghost", InputFormat::Stardict, OutputFormat::Xml);
    let err = convert(&config, &DefaultParser, &shell_without_tools()).unwrap_err();
    assert!(matches!(err, ConvertError::SourceNotFound(_)));
}

#[test]
fn xml_round_trips_through_the_literal_scanner() {
    let dir = TempDir::new().unwrap();
    write_xml_fixture(dir.path(), "src", FIXTURE_ENTRIES);

    let config = base_config(dir.path(), "src", InputFormat::Xml, OutputFormat::Xml);
    let artifacts = convert(&config, &DefaultParser, &shell_without_tools()).unwrap();
    // Output collides with the input name and is renamed.
    let renamed = dir.path().join("new.src.xml");
    assert_eq!(artifacts, vec![renamed.clone()]);

    let mut reread_config =
        base_config(dir.path(), "new.src", InputFormat::Xml, OutputFormat::Xml);
    reread_config.output_dir = dir.path().to_path_buf();
    let second = convert(&reread_config, &DefaultParser, &shell_without_tools()).unwrap();
    assert_eq!(second, vec![dir.path().join("new.new.src.xml")]);

    let document = fs::read_to_string(&renamed).unwrap();
    for (key, definition) in FIXTURE_ENTRIES {
        assert!(document.contains(&format!("<key>{}</key><def>{}</def>", key, definition)));
    }
}

#[test]
fn epub_package_has_a_stored_mimetype_and_lists_every_term() {
    let dir = TempDir::new().unwrap();
    write_xml_fixture(dir.path(), "terms", FIXTURE_ENTRIES);

    let config = base_config(dir.path(), "terms", InputFormat::Xml, OutputFormat::Epub);
    let artifacts = convert(&config, &DefaultParser, &shell_without_tools()).unwrap();
    let package = dir.path().join("terms.epub");
    assert_eq!(artifacts, vec![package.clone()]);

    let mut epub = zip::ZipArchive::new(fs::File::open(&package).unwrap()).unwrap();
    {
        let mimetype = epub.by_index(0).unwrap();
        assert_eq!(mimetype.name(), "mimetype");
        assert_eq!(mimetype.compression(), zip::CompressionMethod::Stored);
    }
    let mut mimetype_body = String::new();
    std::io::Read::read_to_string(&mut epub.by_name("mimetype").unwrap(), &mut mimetype_body)
        .unwrap();
    assert_eq!(mimetype_body, "application/epub+zip");

    let mut index_body = String::new();
    std::io::Read::read_to_string(
        &mut epub.by_name("OEBPS/index.xhtml").unwrap(),
        &mut index_body,
    )
    .unwrap();
    for (key, _) in FIXTURE_ENTRIES {
        assert!(index_body.contains(key), "missing term {}", key);
    }
}

#[test]
fn kobo_output_fails_without_the_trie_builder() {
    let dir = TempDir::new().unwrap();
    write_xml_fixture(dir.path(), "kb", FIXTURE_ENTRIES);

    let config = base_config(dir.path(), "kb", InputFormat::Xml, OutputFormat::Kobo);
    let err = convert(&config, &DefaultParser, &shell_without_tools()).unwrap_err();
    assert!(matches!(err, ConvertError::ExternalTool { .. }));
}

/// Parser used to exercise synonyms, exclusions, and substitutions end to
/// end.
struct AliasingParser;

impl EntryParser for AliasingParser {
    fn parse(
        &self,
        raw: Vec<RawEntry>,
        _hint: &str,
        _ignore_case: bool,
    ) -> dictconv::Result<Vec<Entry>> {
        let mut entries: Vec<Entry> = raw
            .into_iter()
            .map(|r| {
                let mut entry = Entry::included(r.key, r.definition);
                if entry.word == "banana" {
                    entry.synonyms.push("plantain".to_string());
                }
                entry
            })
            .collect();
        if !entries.is_empty() {
            // An excluded entry carrying one resolvable and one dangling
            // substitution.
            entries.push(Entry {
                word: "zz-control".to_string(),
                include: false,
                synonyms: Vec::new(),
                substitutions: vec![
                    ("pomme".to_string(), "apple".to_string()),
                    ("dangling".to_string(), "no-such-word".to_string()),
                ],
                definition: Vec::new(),
            });
        }
        Ok(entries)
    }
}

#[test]
fn synonyms_and_substitutions_survive_a_full_conversion() {
    let dir = TempDir::new().unwrap();
    write_xml_fixture(dir.path(), "alias", FIXTURE_ENTRIES);

    let config = base_config(dir.path(), "alias", InputFormat::Xml, OutputFormat::Stardict);
    convert(&config, &AliasingParser, &shell_without_tools()).unwrap();

    let source = stardict::resolve_source(&dir.path().join("alias").to_string_lossy()).unwrap();
    let read_back = stardict::read(&source, false).unwrap();
    let map = entry_map(&read_back);

    // 4 fixture words + synonym + resolved alias; the dangling alias and
    // the excluded entry contribute nothing.
    assert_eq!(read_back.len(), 6);
    assert_eq!(map["plantain"], map["banana"]);
    assert_eq!(map["pomme"], map["apple"]);
    assert!(!map.contains_key("dangling"));
    assert!(!map.contains_key("zz-control"));

    let ifo = fs::read_to_string(dir.path().join("alias.ifo")).unwrap();
    assert!(ifo.contains("wordcount=6"));
}

#[cfg(unix)]
mod with_fake_marisa {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Install executable stand-ins for the MARISA tools: the builder
    /// stores the newline-joined key list verbatim, the reverse lookup
    /// replays it as (id, key) lines.
    fn fake_shell(dir: &Path) -> CodecShell {
        let build = dir.join("fake-marisa-build");
        fs::write(&build, "#!/bin/sh\ncat > \"$2\"\n").unwrap();
        let lookup = dir.join("fake-marisa-reverse-lookup");
        fs::write(
            &lookup,
            "#!/bin/sh\ncat > /dev/null\ni=0\nwhile IFS= read -r w; do\n  printf '%s\\t%s\\n' \"$i\" \"$w\"\n  i=$((i+1))\ndone < \"$1\"\n",
        )
        .unwrap();
        for tool in [&build, &lookup] {
            let mut permissions = fs::metadata(tool).unwrap().permissions();
            permissions.set_mode(0o755);
            fs::set_permissions(tool, permissions).unwrap();
        }
        CodecShell {
            dictzip: PathBuf::from("/nonexistent/dictzip"),
            marisa_build: build,
            marisa_reverse_lookup: lookup,
        }
    }

    #[test]
    fn kobo_keys_round_trip_through_the_trie_tools() {
        let dir = TempDir::new().unwrap();
        write_xml_fixture(dir.path(), "kobo-src", FIXTURE_ENTRIES);
        let shell = fake_shell(dir.path());

        let mut config =
            base_config(dir.path(), "kobo-src", InputFormat::Xml, OutputFormat::Kobo);
        config.metadata.language_to = "en".to_string();
        let artifacts = convert(&config, &DefaultParser, &shell).unwrap();
        let archive_path = dir.path().join("dicthtml.zip");
        assert_eq!(artifacts, vec![archive_path.clone()]);

        // The archive holds one gzipped shard per prefix plus the trie.
        let mut archive = zip::ZipArchive::new(fs::File::open(&archive_path).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        for shard in ["ap.html", "ba.html", "ch.html", "da.html", "words"] {
            assert!(names.contains(&shard.to_string()), "missing {}", shard);
        }

        // Reading back recovers the keys (definitions are not
        // recoverable from this format).
        let read_config =
            base_config(dir.path(), "dicthtml", InputFormat::Kobo, OutputFormat::Xml);
        let produced = convert(&read_config, &DefaultParser, &shell).unwrap();
        let document = fs::read_to_string(&produced[0]).unwrap();
        for (key, _) in FIXTURE_ENTRIES {
            assert!(
                document.contains(&format!("<key>{}</key>", key)),
                "missing key {} in {}",
                key,
                document
            );
        }
    }
}
