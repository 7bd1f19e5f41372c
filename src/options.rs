//! Options controlling the rename pipeline.

/// Conventional name of the KML document inside a KMZ archive.
pub const DEFAULT_DOCUMENT_NAME: &str = "doc.kml";

/// Prefix of the positional labels written into placemark names.
pub const DEFAULT_LABEL_PREFIX: &str = "?-";

/// Default bound on directory depth when scanning for a nested document.
pub const DEFAULT_MAX_SCAN_DEPTH: usize = 32;

/// Default cap on the total uncompressed size of an input archive (1 GiB).
pub const DEFAULT_MAX_UNPACKED_SIZE: u64 = 1024 * 1024 * 1024;

/// Storage method for entries in the output archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Entries are stored uncompressed.
    Stored,
    /// Entries are Deflate-compressed.
    Deflated {
        /// Compression level 1-9, or `None` for the codec default.
        level: Option<u8>,
    },
}

impl Compression {
    /// Lowest level the Deflate codec accepts.
    pub const MIN_DEFLATE_LEVEL: u8 = 1;
    /// Highest level the Deflate codec accepts.
    pub const MAX_DEFLATE_LEVEL: u8 = 9;

    /// Deflate at the given level.
    ///
    /// Level 0 means no compression and maps to [`Compression::Stored`];
    /// values above 9 are clamped.
    ///
    /// ```
    /// use kmz_renamer::Compression;
    ///
    /// assert_eq!(Compression::deflated(0), Compression::Stored);
    /// assert_eq!(Compression::deflated(12), Compression::Deflated { level: Some(9) });
    /// ```
    pub fn deflated(level: u8) -> Self {
        match level {
            0 => Self::Stored,
            level => Self::Deflated {
                level: Some(level.min(Self::MAX_DEFLATE_LEVEL)),
            },
        }
    }

    /// Returns this setting with any out-of-range level brought into
    /// range, as [`Compression::deflated`] would.
    pub fn normalized(self) -> Self {
        match self {
            Self::Deflated { level: Some(level) } => Self::deflated(level),
            other => other,
        }
    }
}

impl Default for Compression {
    fn default() -> Self {
        Self::Deflated { level: None }
    }
}

/// Options for renaming placemarks in a KMZ archive.
///
/// # Example
///
/// ```rust
/// use kmz_renamer::{Compression, RenameOptions};
///
/// let options = RenameOptions::new()
///     .label_prefix("P-")
///     .compression(Compression::deflated(9));
/// assert_eq!(options.document_name, "doc.kml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOptions {
    /// File name of the KML document to look for.
    pub document_name: String,
    /// Text placed before the counter in every label.
    pub label_prefix: String,
    /// Maximum directory depth searched for a nested document.
    pub max_scan_depth: usize,
    /// Maximum total uncompressed size of the input, `None` for unlimited.
    pub max_unpacked_size: Option<u64>,
    /// Storage method for the output archive.
    pub compression: Compression,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            max_scan_depth: DEFAULT_MAX_SCAN_DEPTH,
            max_unpacked_size: Some(DEFAULT_MAX_UNPACKED_SIZE),
            compression: Compression::default(),
        }
    }
}

impl RenameOptions {
    /// Creates new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document file name to look for.
    pub fn document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }

    /// Sets the label prefix.
    pub fn label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    /// Sets the maximum scan depth for nested documents.
    pub fn max_scan_depth(mut self, depth: usize) -> Self {
        self.max_scan_depth = depth;
        self
    }

    /// Sets the uncompressed size limit.
    pub fn max_unpacked_size(mut self, limit: Option<u64>) -> Self {
        self.max_unpacked_size = limit;
        self
    }

    /// Sets the output storage method.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}
