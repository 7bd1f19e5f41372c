//! Fuzz target for the placemark rewriter with arbitrary document bytes.
//!
//! Run with: cargo +nightly fuzz run rewrite_kml
//!
//! Properties checked on every accepted input:
//! - the rewrite never panics
//! - the output is itself a valid document with the same placemark count
//! - every placemark carries its positional label

#![no_main]

use libfuzzer_sys::fuzz_target;
use kmz_renamer::rewrite::{rewrite, survey};

fuzz_target!(|data: &[u8]| {
    let Ok(rewritten) = rewrite(data, "?-") else {
        return;
    };

    let placemarks = survey(&rewritten.document).expect("rewritten document must parse");
    assert_eq!(placemarks.len(), rewritten.summary.placemarks);
    for placemark in &placemarks {
        assert_eq!(
            placemark.name.as_deref(),
            Some(format!("?-{}", placemark.ordinal).as_str()),
            "placemark {} lost its label",
            placemark.ordinal
        );
    }
});
