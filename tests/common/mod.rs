//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Opening tag of a KML document in the default namespace.
pub const KML_OPEN: &str = "<kml xmlns=\"http://www.opengis.net/kml/2.2\">";

/// Wraps `body` in a KML document with a declaration.
pub fn kml_document(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}<Document>{}</Document></kml>",
        KML_OPEN, body
    )
}

/// A placemark element with an optional name and a point.
pub fn placemark(name: Option<&str>, lon: f64, lat: f64) -> String {
    let name = name
        .map(|n| format!("<name>{}</name>", n))
        .unwrap_or_default();
    format!(
        "<Placemark>{}<Point><coordinates>{},{}</coordinates></Point></Placemark>",
        name, lon, lat
    )
}

/// Creates an in-memory zip archive.
///
/// Names ending in `/` are written as directory entries.
pub fn create_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default())
                    .expect("add directory");
            } else {
                zip.start_file(*name, SimpleFileOptions::default())
                    .expect("start file");
                zip.write_all(data).expect("write entry");
            }
        }
        zip.finish().expect("finish zip");
    }
    buffer.into_inner()
}

/// Writes a KMZ archive to a fresh temporary directory.
///
/// Returns the directory (which must outlive the test) and the archive path.
pub fn create_kmz_file(entries: &[(&str, &[u8])]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("input.kmz");
    std::fs::write(&path, create_zip(entries)).expect("Failed to write archive");
    (dir, path)
}

/// Reads every file entry of a zip archive into a map keyed by entry name.
pub fn read_zip(path: &Path) -> BTreeMap<String, Vec<u8>> {
    read_zip_ordered(path).into_iter().collect()
}

/// Reads every file entry of a zip archive in archive order.
pub fn read_zip_ordered(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = std::fs::File::open(path).expect("open output");
    let mut archive = ZipArchive::new(file).expect("output is a zip archive");
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).expect("read entry");
        if entry.is_dir() {
            continue;
        }
        let mut data = Vec::new();
        entry.read_to_end(&mut data).expect("read entry data");
        entries.push((entry.name().to_string(), data));
    }
    entries
}

/// Returns the placemark names of a KML document in document order.
pub fn placemark_names(document: &[u8]) -> Vec<Option<String>> {
    kmz_renamer::rewrite::survey(document)
        .expect("document parses")
        .into_iter()
        .map(|p| p.name)
        .collect()
}

/// Lists the scratch directories currently present in the temp directory.
pub fn scratch_dirs() -> Vec<PathBuf> {
    std::fs::read_dir(std::env::temp_dir())
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("kmz-renamer-"))
                })
                .collect::<Vec<_>>()
        })
        .map(|mut dirs| {
            dirs.sort();
            dirs
        })
        .unwrap_or_default()
}
