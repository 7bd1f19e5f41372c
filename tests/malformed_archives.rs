//! Tests for malformed, truncated and malicious inputs.
//!
//! Every case must fail with the right reason, write no output, and leave
//! the input file untouched.

mod common;

use std::fs;
use std::path::Path;

use kmz_renamer::{Error, FailureReason, RenameOptions, Renamer};

use common::{create_kmz_file, create_zip, kml_document, placemark};

fn run_expecting_failure(renamer: &Renamer, input: &Path) -> Error {
    let dir = input.parent().expect("input has a parent");
    let output = dir.join("out.kmz");
    let before = fs::read(input).ok();

    let err = renamer.run(input, &output).unwrap_err();

    assert!(!output.exists(), "no output may be written on failure");
    assert_eq!(fs::read(input).ok(), before, "input must not change");
    err
}

// =============================================================================
// Broken Containers
// =============================================================================

#[test]
fn test_empty_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("empty.kmz");
    fs::write(&input, b"").unwrap();

    let err = run_expecting_failure(&Renamer::default(), &input);
    assert_eq!(err.reason(), FailureReason::ArchiveUnreadable);
}

#[test]
fn test_truncated_archive() {
    let doc = kml_document(&placemark(Some("A"), 0.0, 0.0));
    let bytes = create_zip(&[("doc.kml", doc.as_bytes())]);
    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("truncated.kmz");
    fs::write(&input, &bytes[..bytes.len() / 2]).unwrap();

    let err = run_expecting_failure(&Renamer::default(), &input);
    assert_eq!(err.reason(), FailureReason::ArchiveUnreadable);
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = Renamer::default()
        .run(dir.path().join("nope.kmz"), dir.path().join("out.kmz"))
        .unwrap_err();
    assert!(matches!(err, Error::ArchiveUnreadable { .. }));
}

#[test]
fn test_directory_named_doc_kml_is_not_a_document() {
    let (_dir, input) = create_kmz_file(&[("doc.kml/", b""), ("doc.kml/inner.txt", b"x")]);

    let err = run_expecting_failure(&Renamer::default(), &input);
    assert_eq!(err.reason(), FailureReason::DocumentNotFound);
}

// =============================================================================
// Hostile Entries
// =============================================================================

#[test]
fn test_path_traversal_entry_rejected() {
    let doc = kml_document(&placemark(Some("A"), 0.0, 0.0));
    let (dir, input) = create_kmz_file(&[
        ("doc.kml", doc.as_bytes()),
        ("../escaped.txt", b"gotcha"),
    ]);

    let err = run_expecting_failure(&Renamer::default(), &input);
    assert!(err.is_security_error());
    assert_eq!(err.reason(), FailureReason::ArchiveUnreadable);
    assert!(!dir.path().join("escaped.txt").exists());
}

#[test]
fn test_expansion_limit() {
    let doc = kml_document(&placemark(Some("A"), 0.0, 0.0));
    let padding = vec![b' '; 64 * 1024];
    let (_dir, input) = create_kmz_file(&[("doc.kml", doc.as_bytes()), ("pad.txt", &padding)]);

    let renamer = Renamer::new(RenameOptions::new().max_unpacked_size(Some(16 * 1024)));
    let err = run_expecting_failure(&renamer, &input);
    assert!(matches!(err, Error::ResourceLimitExceeded { limit } if limit == 16 * 1024));
}

// =============================================================================
// Broken Documents
// =============================================================================

#[test]
fn test_malformed_documents() {
    let cases: &[&[u8]] = &[
        b"",
        b"<kml xmlns=\"http://www.opengis.net/kml/2.2\"><Placemark>",
        b"<kml xmlns=\"http://www.opengis.net/kml/2.2\"><Placemark></Folder></kml>",
        b"<kml:kml><kml:Placemark/></kml:kml>",
        b"<kml/><kml/>",
    ];

    for case in cases {
        let (_dir, input) = create_kmz_file(&[("doc.kml", *case)]);
        let err = run_expecting_failure(&Renamer::default(), &input);
        assert_eq!(
            err.reason(),
            FailureReason::MalformedMarkup,
            "case {:?}",
            String::from_utf8_lossy(case)
        );
    }
}

#[test]
fn test_wrong_namespace_has_no_placemarks() {
    let doc = b"<kml xmlns=\"http://earth.google.com/kml/2.0\"><Placemark><name>Old</name></Placemark></kml>";
    let (_dir, input) = create_kmz_file(&[("doc.kml", doc.as_slice())]);

    let err = run_expecting_failure(&Renamer::default(), &input);
    assert_eq!(err.reason(), FailureReason::NoPlacemarksFound);
}
