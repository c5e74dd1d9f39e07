use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use touchfish::config::AdmissionConfig;
use touchfish::{Format, IngestionError, LibraryStore, MemoryStore, ingest};

const CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OPS/package.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const PACKAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Agnes Grey</dc:title>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ch1" href="text/chapter%201.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="text/chapter2.xhtml" media-type="application/xhtml+xml"/>
    <item id="css" href="style.css" media-type="text/css"/>
  </manifest>
  <spine>
    <itemref idref="ch1"/>
    <itemref idref="css"/>
    <itemref idref="ch2"/>
  </spine>
</package>"#;

const CHAPTER_1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>I</title><style>p { text-indent: 1em; }</style></head>
<body>
  <h1>Chapter I</h1>
  <p>All true histories contain
     instruction.</p>
  <script>alert("never shown")</script>
  <p>My father was a clergyman.</p>
</body>
</html>"#;

const CHAPTER_2: &str = r#"<html xmlns="http://www.w3.org/1999/xhtml">
<body><span>Chapter II</span> <span>The first lesson.</span></body>
</html>"#;

fn build_epub(files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

#[test]
fn test_epub_pipeline() {
    let epub = build_epub(&[
        ("mimetype", "application/epub+zip"),
        ("META-INF/container.xml", CONTAINER),
        ("OPS/package.opf", PACKAGE),
        ("OPS/text/chapter 1.xhtml", CHAPTER_1),
        ("OPS/text/chapter2.xhtml", CHAPTER_2),
    ]);

    let file = ingest("Agnes Grey.epub", &epub, &AdmissionConfig::default()).unwrap();

    assert_eq!(file.format, Format::ArchiveEbook);
    assert_eq!(file.title, "Agnes Grey");
    assert_eq!(
        file.extraction.text,
        "Chapter I\n\nAll true histories contain instruction.\n\nMy father was a clergyman.\n\nChapter II The first lesson."
    );
    assert!(file.extraction.warnings.is_empty());
}

#[tokio::test]
async fn test_missing_container_creates_no_record() {
    let epub = build_epub(&[
        ("mimetype", "application/epub+zip"),
        ("OPS/package.opf", PACKAGE),
        ("OPS/text/chapter2.xhtml", CHAPTER_2),
    ]);
    let library = LibraryStore::new(MemoryStore::new());

    let result = ingest("broken.epub", &epub, &AdmissionConfig::default());
    let err = result.as_ref().unwrap_err();
    assert_eq!(err.kind(), "ArchiveError");
    assert_eq!(err.user_message(), "The file may be damaged, please choose it again");

    if let Ok(file) = result {
        library
            .import_document(&file.extraction.text, Some(&file.title), 100)
            .await
            .unwrap();
    }
    let listed = library.list_documents().await.unwrap();
    assert!(listed.is_empty());
    assert_eq!(listed.current_id, None);
}

#[test]
fn test_plain_text_pipeline() {
    let file = ingest(
        "notes.TXT",
        "\u{feff}Hello world.\r\n\r\n\r\n\r\nThis is page two.\r\n".as_bytes(),
        &AdmissionConfig::default(),
    )
    .unwrap();
    assert_eq!(file.extraction.text, "Hello world.\n\nThis is page two.");
    assert_eq!(file.title, "notes");
}

#[test]
fn test_admission_runs_before_extraction() {
    let config = AdmissionConfig {
        max_input_bytes: 8,
        ..Default::default()
    };
    assert_eq!(
        ingest("big.txt", b"more than eight bytes", &config).unwrap_err(),
        IngestionError::OversizeInput { size: 21, limit: 8 }
    );
    assert_eq!(
        ingest("slides.pptx", b"x", &AdmissionConfig::default()).unwrap_err().kind(),
        "UnsupportedFormat"
    );
}

#[test]
fn test_failure_classes() {
    let config = AdmissionConfig::default();
    assert_eq!(
        ingest("blank.txt", b" \n\n \r\n", &config).unwrap_err(),
        IngestionError::EmptyContent
    );
    assert_eq!(
        ingest("latin1.txt", b"caf\xe9 au lait", &config).unwrap_err(),
        IngestionError::EncodingError
    );
    assert_eq!(
        ingest("fake.pdf", b"%PDF-1.4 truncated", &config).unwrap_err().kind(),
        "ArchiveError"
    );
}
