use fb2info::{
    process, CancelToken, ExtractOptions, ExtractionError, Mode, Outcome,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const DUNE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0" xmlns:l="http://www.w3.org/1999/xlink">
  <description>
    <title-info>
      <genre>sf</genre>
      <author>
        <first-name>Frank</first-name>
        <last-name>Herbert</last-name>
      </author>
      <book-title>Dune</book-title>
      <lang>en</lang>
      <sequence name="Dune Chronicles" number="1"/>
    </title-info>
  </description>
  <body>
    <section><p>A beginning is the time for taking the most delicate care...</p></section>
  </body>
</FictionBook>"#;

fn write_plain(dir: &TempDir, name: &str, xml: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, xml).unwrap();
    path
}

fn write_zip(dir: &TempDir, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.path().join(name);
    let mut writer = ZipWriter::new(fs::File::create(&path).unwrap());
    for (entry, data) in entries {
        writer
            .start_file(*entry, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}

fn run(path: &Path) -> Result<Outcome, ExtractionError> {
    process(path, &ExtractOptions::default(), &CancelToken::new())
}

fn extracted(path: &Path) -> fb2info::BookMetadata {
    match run(path).unwrap() {
        Outcome::Extracted(meta) => meta,
        other => panic!("expected metadata, got {other:?}"),
    }
}

#[test]
fn scenario_a_plain_title() {
    let dir = TempDir::new().unwrap();
    let path = write_plain(&dir, "book.fb2", DUNE);
    assert_eq!(extracted(&path).title.as_deref(), Some("Dune"));
}

#[test]
fn scenario_b_zipped_author() {
    let dir = TempDir::new().unwrap();
    let path = write_zip(
        &dir,
        "archive.fb2.zip",
        &[("cover.txt", "not a book"), ("dune.fb2", DUNE)],
    );
    let meta = extracted(&path);
    assert_eq!(meta.first_name.as_deref(), Some("Frank"));
    assert_eq!(meta.last_name.as_deref(), Some("Herbert"));
}

#[test]
fn scenario_c_sequence() {
    let dir = TempDir::new().unwrap();
    let path = write_plain(&dir, "book.fb2", DUNE);
    assert_eq!(
        extracted(&path).sequence().as_deref(),
        Some("Dune Chronicles - 1")
    );
}

#[test]
fn scenario_d_unsupported_name() {
    let dir = TempDir::new().unwrap();
    // Valid FB2 content does not matter; the name decides
    let path = write_plain(&dir, "notes.txt", DUNE);
    assert_eq!(run(&path).unwrap(), Outcome::Unsupported);
}

#[test]
fn scenario_e_corrupt_zip() {
    let dir = TempDir::new().unwrap();
    let path = write_plain(&dir, "broken.fb2.zip", "PK\u{3}\u{4} definitely not a zip");
    let err = run(&path).unwrap_err();
    assert!(matches!(err, ExtractionError::CantOpenArchive { .. }));
    assert_eq!(err.render().rsplit(", Code: ").next(), Some("2"));
}

#[test]
fn zip_without_fb2_entry() {
    let dir = TempDir::new().unwrap();
    let path = write_zip(&dir, "empty.fb2.zip", &[("readme.txt", "hello")]);
    let err = run(&path).unwrap_err();
    assert!(matches!(err, ExtractionError::NoFb2EntryFound { .. }));
}

#[test]
fn zip_with_zero_size_entry() {
    let dir = TempDir::new().unwrap();
    let path = write_zip(&dir, "blank.fb2.zip", &[("blank.fb2", "")]);
    let meta = extracted(&path);
    assert_eq!(meta.title, None);
    assert!(meta.is_empty());
}

#[test]
fn zip_with_unparseable_entry() {
    let dir = TempDir::new().unwrap();
    let path = write_zip(&dir, "junk.fb2.zip", &[("junk.fb2", "plain words, no markup")]);
    let err = run(&path).unwrap_err();
    assert!(matches!(err, ExtractionError::BufferParseFailed { .. }));
}

#[test]
fn plain_file_that_is_not_xml() {
    let dir = TempDir::new().unwrap();
    let path = write_plain(&dir, "fake.fb2", "");
    let err = run(&path).unwrap_err();
    assert!(matches!(err, ExtractionError::InvalidDocument { .. }));
}

#[test]
fn repeated_runs_are_identical() {
    let dir = TempDir::new().unwrap();
    let path = write_zip(&dir, "dune.fb2.zip", &[("dune.fb2", DUNE)]);
    assert_eq!(run(&path).unwrap(), run(&path).unwrap());
}

#[test]
fn dom_mode_matches_streaming_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = write_plain(&dir, "book.fb2", DUNE);
    let dom = process(
        &path,
        &ExtractOptions {
            mode: Mode::Dom,
            ..Default::default()
        },
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(dom, run(&path).unwrap());
}

#[test]
fn windows_1251_book_in_both_modes() {
    let dir = TempDir::new().unwrap();
    let xml = DUNE
        .replace(r#"encoding="utf-8""#, r#"encoding="windows-1251""#)
        .replace("<book-title>Dune</book-title>", "<book-title>Дюна</book-title>");
    let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(&xml);
    let path = dir.path().join("dune.fb2");
    fs::write(&path, &bytes).unwrap();

    for mode in [Mode::Streaming, Mode::Dom] {
        let options = ExtractOptions {
            mode,
            ..Default::default()
        };
        match process(&path, &options, &CancelToken::new()).unwrap() {
            Outcome::Extracted(meta) => assert_eq!(meta.title.as_deref(), Some("Дюна")),
            other => panic!("expected metadata in {mode:?} mode, got {other:?}"),
        }
    }
}

#[test]
fn parallel_extractions_are_independent() {
    use std::thread;

    let dir = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = (0..8)
        .map(|i| {
            let xml = DUNE.replace("Dune</book-title>", &format!("Dune {i}</book-title>"));
            write_plain(&dir, &format!("book{i}.fb2"), &xml)
        })
        .collect();

    let handles: Vec<_> = paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| thread::spawn(move || (i, extracted(&path))))
        .collect();

    for handle in handles {
        let (i, meta) = handle.join().unwrap();
        assert_eq!(meta.title, Some(format!("Dune {i}")));
    }
}
