//! EPUB output: a minimal navigable e-book whose content is the sorted
//! index of terms. Definitions are intentionally omitted from this
//! format.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::dict::error::Result;
use crate::dict::models::Metadata;

/// Write the key list as an EPUB 3 package.
///
/// The `mimetype` member must come first and be stored uncompressed for
/// the container to be recognized.
pub fn write(target: &Path, metadata: &Metadata, keys: &[&str]) -> Result<Vec<PathBuf>> {
    let mut epub = ZipWriter::new(File::create(target)?);
    let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);

    epub.start_file("mimetype", stored)?;
    std::io::Write::write_all(&mut epub, b"application/epub+zip")?;

    epub.start_file("META-INF/container.xml", deflated)?;
    std::io::Write::write_all(&mut epub, CONTAINER_XML.as_bytes())?;

    epub.start_file("OEBPS/package.opf", deflated)?;
    std::io::Write::write_all(&mut epub, package_document(metadata).as_bytes())?;

    epub.start_file("OEBPS/nav.xhtml", deflated)?;
    std::io::Write::write_all(&mut epub, nav_document(metadata).as_bytes())?;

    epub.start_file("OEBPS/index.xhtml", deflated)?;
    std::io::Write::write_all(&mut epub, index_document(metadata, keys).as_bytes())?;

    epub.finish()?;
    info!("wrote EPUB index {} ({} terms)", target.display(), keys.len());
    Ok(vec![target.to_path_buf()])
}

const CONTAINER_XML: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<container version=\"1.0\" xmlns=\"urn:oasis:names:tc:opendocument:xmlns:container\">\n\
  <rootfiles>\n\
    <rootfile full-path=\"OEBPS/package.opf\" media-type=\"application/oebps-package+xml\"/>\n\
  </rootfiles>\n\
</container>\n";

fn package_document(metadata: &Metadata) -> String {
    let language = if metadata.language_from.is_empty() {
        "en"
    } else {
        &metadata.language_from
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<package xmlns=\"http://www.idpf.org/2007/opf\" version=\"3.0\" unique-identifier=\"uid\">\n\
  <metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n\
    <dc:identifier id=\"uid\">urn:dictconv:{}</dc:identifier>\n\
    <dc:title>{}</dc:title>\n\
    <dc:language>{}</dc:language>\n\
  </metadata>\n\
  <manifest>\n\
    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n\
    <item id=\"index\" href=\"index.xhtml\" media-type=\"application/xhtml+xml\"/>\n\
  </manifest>\n\
  <spine>\n\
    <itemref idref=\"index\"/>\n\
  </spine>\n\
</package>\n",
        escape(language),
        escape(&metadata.title),
        escape(language)
    )
}

fn nav_document(metadata: &Metadata) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\">\n\
  <head><title>{}</title></head>\n\
  <body>\n\
    <nav epub:type=\"toc\">\n\
      <ol><li><a href=\"index.xhtml\">Index</a></li></ol>\n\
    </nav>\n\
  </body>\n\
</html>\n",
        escape(&metadata.title)
    )
}

fn index_document(metadata: &Metadata, keys: &[&str]) -> String {
    let mut body = String::new();
    for key in keys {
        body.push_str("      <p>");
        body.push_str(&escape(key));
        body.push_str("</p>\n");
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<html xmlns=\"http://www.w3.org/1999/xhtml\">\n\
  <head><title>{}</title></head>\n\
  <body>\n\
    <section>\n\
{}    </section>\n\
  </body>\n\
</html>\n",
        escape(&metadata.title),
        body
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(escape("a & b <c>"), "a &amp; b &lt;c&gt;");
    }

    #[test]
    fn index_document_lists_every_key() {
        let doc = index_document(&Metadata::default(), &["apple", "banana"]);
        assert!(doc.contains("<p>apple</p>"));
        assert!(doc.contains("<p>banana</p>"));
    }
}
