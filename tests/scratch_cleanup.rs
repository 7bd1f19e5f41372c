//! Scratch directory cleanup.
//!
//! Kept in its own test binary with a single test: it compares snapshots of
//! the system temp directory, which parallel tests in the same process would
//! disturb.

use kmz_renamer::Renamer;

mod common;
use common::{create_kmz_file, kml_document, placemark, scratch_dirs};

#[test]
fn test_scratch_removed_on_every_exit_path() {
    let before = scratch_dirs();

    let good = kml_document(&placemark(None, 0.0, 0.0));
    let (dir, input) = create_kmz_file(&[("doc.kml", good.as_bytes()), ("a.txt", b"a")]);
    let renamer = Renamer::default();

    // success
    renamer.run(&input, dir.path().join("ok.kmz")).unwrap();
    // output failure after everything else succeeded
    assert!(
        renamer
            .run(&input, dir.path().join("missing").join("out.kmz"))
            .is_err()
    );
    // no placemarks
    let empty = kml_document("");
    let (dir2, input2) = create_kmz_file(&[("doc.kml", empty.as_bytes())]);
    assert!(renamer.run(&input2, dir2.path().join("out.kmz")).is_err());
    // no document
    let (dir3, input3) = create_kmz_file(&[("x.txt", b"x")]);
    assert!(renamer.run(&input3, dir3.path().join("out.kmz")).is_err());
    // listing
    renamer.list(&input).unwrap();

    assert_eq!(scratch_dirs(), before);
}
