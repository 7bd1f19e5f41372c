//! Writing the output archive.
//!
//! Every regular file below the scratch root is stored under its path
//! relative to that root. The KML document goes first, since KMZ readers
//! take the first `.kml` entry as the main document; the rest follow in walk
//! order. Entry contents are copied byte for byte.
//!
//! The archive is built in a temporary file next to `output` and renamed over
//! it once complete, so a failed run never leaves a partial archive behind.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::progress::ProgressReporter;
use crate::scratch::sorted_walk;
use crate::unpack::UnpackedArchive;
use crate::{ArchivePath, Compression, Error, Result};

const TEMP_PREFIX: &str = ".kmz-renamer-";
const TEMP_SUFFIX: &str = ".tmp";

/// Counts from a repack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepackSummary {
    /// Number of file entries written.
    pub entries_written: usize,
    /// Total uncompressed bytes written.
    pub bytes_written: u64,
}

/// Packs every file below `root` into a new zip archive at `output`.
///
/// `document` is written first. Modification times recorded in `unpacked`
/// are carried over to the matching entries.
///
/// # Errors
///
/// - [`Error::OutputWrite`] if the archive cannot be created, written or
///   moved to `output`.
/// - [`Error::Io`] if a file in the scratch directory cannot be read.
pub fn repack(
    root: &Path,
    document: &ArchivePath,
    output: &Path,
    unpacked: &UnpackedArchive,
    compression: Compression,
    reporter: &mut dyn ProgressReporter,
) -> Result<RepackSummary> {
    let mut entries = collect_entries(root)?;
    if let Some(index) = entries.iter().position(|(path, _)| path == document) {
        let first = entries.remove(index);
        entries.insert(0, first);
    }

    let out = |e: io::Error| Error::output_write(output, e);

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(&parent)
        .map_err(out)?;

    let mut summary = RepackSummary::default();
    {
        let mut zip = ZipWriter::new(BufWriter::new(tmp.as_file_mut()));
        for (archive_path, full_path) in &entries {
            let data = fs::read(full_path)?;
            let size = data.len() as u64;

            let mut options = file_options(compression, size);
            if let Some(modified) = unpacked.entry(archive_path).and_then(|e| e.modified) {
                options = options.last_modified_time(modified);
            }

            zip.start_file(archive_path.as_str(), options)
                .map_err(|e| out(zip_to_io(e)))?;
            zip.write_all(&data).map_err(out)?;

            summary.entries_written += 1;
            summary.bytes_written += size;
            reporter.on_entry(archive_path, size);
        }
        let mut writer = zip.finish().map_err(|e| out(zip_to_io(e)))?;
        writer.flush().map_err(out)?;
    }
    tmp.as_file().sync_all().map_err(out)?;
    tmp.persist(output).map_err(|e| out(e.error))?;

    log::debug!(
        "wrote {} entries ({} bytes) to '{}'",
        summary.entries_written,
        summary.bytes_written,
        output.display()
    );
    Ok(summary)
}

/// Lists the regular files below `root` with their entry names.
fn collect_entries(root: &Path) -> Result<Vec<(ArchivePath, PathBuf)>> {
    let mut entries = Vec::new();
    for entry in sorted_walk(root, usize::MAX) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).map_err(|_| {
            Error::InvalidArchivePath(format!(
                "'{}' is outside the scratch directory",
                entry.path().display()
            ))
        })?;
        entries.push((
            ArchivePath::from_relative_path(relative)?,
            entry.path().to_path_buf(),
        ));
    }
    Ok(entries)
}

fn file_options(compression: Compression, size: u64) -> SimpleFileOptions {
    let options = SimpleFileOptions::default().large_file(size >= u64::from(u32::MAX));
    match compression.normalized() {
        Compression::Stored => options.compression_method(CompressionMethod::Stored),
        Compression::Deflated { level } => options
            .compression_method(CompressionMethod::Deflated)
            .compression_level(level.map(i64::from)),
    }
}

fn zip_to_io(e: ZipError) -> io::Error {
    match e {
        ZipError::Io(e) => e,
        other => io::Error::other(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{NoProgress, StateLog};
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn read_back(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                entry.read_to_end(&mut data).unwrap();
                (entry.name().to_string(), data)
            })
            .collect()
    }

    fn scratch_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("files")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("a.txt"), b"alpha").unwrap();
        fs::write(root.join("files").join("doc.kml"), b"<kml/>").unwrap();
        fs::write(root.join("files").join("icon.png"), [0x89, b'P', b'N', b'G']).unwrap();
        dir
    }

    #[test]
    fn test_repack_document_first_and_bytes_intact() {
        let scratch = scratch_tree();
        let out_dir = TempDir::new().unwrap();
        let output = out_dir.path().join("out.kmz");
        let document = ArchivePath::new("files/doc.kml").unwrap();

        let summary = repack(
            scratch.path(),
            &document,
            &output,
            &UnpackedArchive::default(),
            Compression::default(),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(summary.entries_written, 3);
        assert_eq!(summary.bytes_written, 15);
        let entries = read_back(&output);
        let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["files/doc.kml", "a.txt", "files/icon.png"]);
        assert_eq!(entries[2].1, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_repack_stored() {
        let scratch = scratch_tree();
        let out_dir = TempDir::new().unwrap();
        let output = out_dir.path().join("out.kmz");

        repack(
            scratch.path(),
            &ArchivePath::new("files/doc.kml").unwrap(),
            &output,
            &UnpackedArchive::default(),
            Compression::Stored,
            &mut NoProgress,
        )
        .unwrap();

        let mut archive = ZipArchive::new(fs::File::open(&output).unwrap()).unwrap();
        for i in 0..archive.len() {
            assert_eq!(
                archive.by_index(i).unwrap().compression(),
                CompressionMethod::Stored
            );
        }
    }

    #[test]
    fn test_repack_deflate_level_boundaries() {
        let scratch = scratch_tree();
        let out_dir = TempDir::new().unwrap();
        let document = ArchivePath::new("files/doc.kml").unwrap();
        let cases = [
            (Compression::deflated(0), CompressionMethod::Stored),
            (Compression::Deflated { level: Some(0) }, CompressionMethod::Stored),
            (Compression::deflated(1), CompressionMethod::Deflated),
            (Compression::deflated(9), CompressionMethod::Deflated),
            (Compression::Deflated { level: Some(200) }, CompressionMethod::Deflated),
        ];

        for (i, (compression, method)) in cases.into_iter().enumerate() {
            let output = out_dir.path().join(format!("out-{}.kmz", i));
            repack(
                scratch.path(),
                &document,
                &output,
                &UnpackedArchive::default(),
                compression,
                &mut NoProgress,
            )
            .unwrap();

            let mut archive = ZipArchive::new(fs::File::open(&output).unwrap()).unwrap();
            assert_eq!(archive.by_index(0).unwrap().compression(), method, "{:?}", compression);
            assert_eq!(read_back(&output)[0].1, b"<kml/>");
        }
    }

    #[test]
    fn test_repack_reports_entries() {
        let scratch = scratch_tree();
        let out_dir = TempDir::new().unwrap();
        let mut log = StateLog::new();

        repack(
            scratch.path(),
            &ArchivePath::new("files/doc.kml").unwrap(),
            &out_dir.path().join("out.kmz"),
            &UnpackedArchive::default(),
            Compression::default(),
            &mut log,
        )
        .unwrap();
        assert_eq!(log.entries(), 3);
    }

    #[test]
    fn test_repack_unwritable_output_leaves_nothing() {
        let scratch = scratch_tree();
        let out_dir = TempDir::new().unwrap();
        let output = out_dir.path().join("missing").join("out.kmz");

        let err = repack(
            scratch.path(),
            &ArchivePath::new("files/doc.kml").unwrap(),
            &output,
            &UnpackedArchive::default(),
            Compression::default(),
            &mut NoProgress,
        )
        .unwrap_err();

        assert!(matches!(err, Error::OutputWrite { .. }));
        assert!(!output.exists());
        assert_eq!(fs::read_dir(out_dir.path()).unwrap().count(), 0);
    }
}
