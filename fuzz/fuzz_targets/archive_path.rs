//! Fuzz target for ArchivePath::new with arbitrary string input.
//!
//! Run with: cargo +nightly fuzz run archive_path
//!
//! Every accepted path must resolve strictly below the directory it is
//! joined to, since extraction and repacking both rely on that.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let Ok(path_str) = std::str::from_utf8(data) else {
        return;
    };
    let root = Path::new("/scratch");

    // Dot segments are folded away, never escaping the root.
    if let Ok(path) = kmz_renamer::ArchivePath::from_relative_path(Path::new(path_str)) {
        assert!(path.to_path_under(root).starts_with(root));
        assert!(kmz_renamer::ArchivePath::new(path.as_str()).is_ok());
    }

    let Ok(path) = kmz_renamer::ArchivePath::new(path_str) else {
        return;
    };

    let normalized = path.as_str();
    assert!(
        !normalized.split('/').any(|s| s.is_empty() || s == "." || s == ".."),
        "Unsafe segment accepted: {:?}",
        normalized
    );
    assert!(!normalized.starts_with('/'), "Absolute path accepted: {:?}", normalized);
    assert!(!normalized.contains('\0'), "NUL byte accepted: {:?}", normalized);

    assert!(path.to_path_under(root).starts_with(root));
});
