//! KML placemark renaming.
//!
//! The rewriter is event based: the document is streamed through a
//! namespace-aware reader and every event is written back unchanged, except
//! for the `name` children of placemarks. Namespace declarations, prefixes,
//! comments, CDATA sections and whitespace therefore survive byte for byte.
//!
//! A placemark is any element in the KML 2.2 namespace with local name
//! `Placemark`, at any depth. Its name is its first direct child in the KML
//! namespace with local name `name`.
//!
//! Rewriting takes two passes over the input. The first records which
//! placemarks already carry a name; the second pass then knows, at each
//! placemark's start tag, whether to insert a new first child or to overwrite
//! the existing one further down.
//!
//! Documents are read in the encoding their XML declaration names (UTF-8 if
//! none). Untouched bytes are never re-encoded; written labels are encoded to
//! match, with characters the encoding lacks written as character references.

use std::fs;
use std::io;
use std::path::Path;

use quick_xml::encoding::Decoder;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use quick_xml::writer::Writer;

use crate::{Error, Result};

/// The KML 2.2 namespace URI.
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A placemark found by [`survey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacemarkSummary {
    /// 1-based position in document order.
    pub ordinal: usize,
    /// Text of the existing name child, `None` if there is none.
    pub name: Option<String>,
    /// Number of ancestor elements.
    pub depth: usize,
}

/// Counts from a rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    /// Placemarks that received a label.
    pub placemarks: usize,
    /// Placemarks that had no name child and got one inserted.
    pub names_inserted: usize,
}

/// A rewritten document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    /// The serialized document, starting with an XML declaration.
    pub document: Vec<u8>,
    /// What was changed.
    pub summary: RewriteSummary,
}

/// Lists every placemark in document order without modifying anything.
///
/// # Errors
///
/// Returns [`Error::MalformedMarkup`] if the document is not well-formed.
///
/// # Example
///
/// ```
/// use kmz_renamer::rewrite::survey;
///
/// let kml = br#"<kml xmlns="http://www.opengis.net/kml/2.2">
///   <Placemark><name>Tower</name></Placemark>
///   <Placemark/>
/// </kml>"#;
/// let placemarks = survey(kml).unwrap();
/// assert_eq!(placemarks.len(), 2);
/// assert_eq!(placemarks[0].name.as_deref(), Some("Tower"));
/// assert_eq!(placemarks[1].name, None);
/// ```
pub fn survey(document: &[u8]) -> Result<Vec<PlacemarkSummary>> {
    scan(document, NameText::Decode)
}

/// Whether [`scan`] decodes the text of existing names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameText {
    Decode,
    /// Only record that a name exists; its content is about to be replaced.
    PresenceOnly,
}

fn scan(document: &[u8], names: NameText) -> Result<Vec<PlacemarkSummary>> {
    let mut reader = open_reader(strip_bom(document));
    let mut structure = Structure::default();
    let mut placemarks: Vec<PlacemarkSummary> = Vec::new();
    // (index into placemarks, depth of its children)
    let mut open: Vec<(usize, usize)> = Vec::new();
    let mut capture: Option<NameCapture> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let (ns, event) = reader
            .read_resolved_event()
            .map_err(|e| Error::malformed(position, e.to_string()))?;
        let tag = classify(&ns, &event, position)?;
        let depth = structure.depth();
        structure.track(&event, position)?;

        match event {
            Event::Start(_) | Event::Empty(_) => {
                // Whatever sits inside a name being captured is replaced
                // wholesale on rewrite, so it is not inspected here either.
                if capture.is_some() {
                    continue;
                }
                let is_start = matches!(event, Event::Start(_));
                match tag {
                    Tag::Name => {
                        if let Some(&(index, child_depth)) = open.last() {
                            if child_depth == depth && placemarks[index].name.is_none() {
                                placemarks[index].name = Some(String::new());
                                if is_start {
                                    capture = Some(NameCapture {
                                        index,
                                        depth: depth + 1,
                                    });
                                }
                            }
                        }
                    }
                    Tag::Placemark => {
                        placemarks.push(PlacemarkSummary {
                            ordinal: placemarks.len() + 1,
                            name: None,
                            depth,
                        });
                        if is_start {
                            open.push((placemarks.len() - 1, depth + 1));
                        }
                    }
                    Tag::Other => {}
                }
            }
            Event::End(_) => {
                if capture.as_ref().is_some_and(|c| c.depth == depth) {
                    capture = None;
                }
                if open.last().is_some_and(|&(_, child_depth)| child_depth == depth) {
                    open.pop();
                }
            }
            Event::Text(text) if names == NameText::Decode => {
                if let Some(c) = capture.as_ref().filter(|c| c.depth == depth) {
                    let text = text
                        .unescape()
                        .map_err(|e| Error::malformed(position, e.to_string()))?;
                    if let Some(name) = placemarks[c.index].name.as_mut() {
                        name.push_str(&text);
                    }
                }
            }
            Event::CData(data) if names == NameText::Decode => {
                if let Some(c) = capture.as_ref().filter(|c| c.depth == depth) {
                    let text = data
                        .decode()
                        .map_err(|e| Error::malformed(position, e.to_string()))?;
                    if let Some(name) = placemarks[c.index].name.as_mut() {
                        name.push_str(&text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(placemarks)
}

/// Renames every placemark to `<label_prefix><ordinal>`.
///
/// Existing name children keep their position, tag and attributes; only
/// their content is replaced. Placemarks without one get a new name element
/// as their first child, written with the placemark's own namespace prefix.
/// Every other event is copied through unchanged.
///
/// The output always starts with an XML declaration that names its encoding:
/// an existing declaration is kept (gaining `encoding="UTF-8"` if it had no
/// encoding), otherwise `<?xml version="1.0" encoding="UTF-8"?>` is added. A
/// leading UTF-8 byte order mark is dropped. Labels are written in the
/// declared encoding.
///
/// # Errors
///
/// - [`Error::MalformedMarkup`] if the document is not well-formed.
/// - [`Error::NoPlacemarks`] if it contains no placemark.
///
/// # Example
///
/// ```
/// use kmz_renamer::rewrite::rewrite;
///
/// let kml = br#"<kml xmlns="http://www.opengis.net/kml/2.2"><Placemark><Point/></Placemark></kml>"#;
/// let rewritten = rewrite(kml, "?-").unwrap();
/// assert_eq!(
///     String::from_utf8(rewritten.document).unwrap(),
///     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
///      <kml xmlns=\"http://www.opengis.net/kml/2.2\"><Placemark><name>?-1</name><Point/></Placemark></kml>"
/// );
/// assert_eq!(rewritten.summary.names_inserted, 1);
/// ```
pub fn rewrite(document: &[u8], label_prefix: &str) -> Result<Rewritten> {
    let body = strip_bom(document);
    let placemarks = scan(body, NameText::PresenceOnly)?;
    if placemarks.is_empty() {
        return Err(Error::NoPlacemarks);
    }

    let mut reader = open_reader(body);
    let mut writer = Writer::new(Vec::with_capacity(body.len() + placemarks.len() * 24 + 64));
    let mut structure = Structure::default();
    let mut labels = Labeler::new(label_prefix);
    let mut frames: Vec<Frame> = Vec::new();
    let mut skip_until: Option<usize> = None;
    let mut prolog_written = false;
    let mut summary = RewriteSummary::default();

    loop {
        let position = reader.buffer_position() as u64;
        let (ns, event) = reader
            .read_resolved_event()
            .map_err(|e| Error::malformed(position, e.to_string()))?;
        let tag = classify(&ns, &event, position)?;
        let depth = structure.depth();
        structure.track(&event, position)?;
        let decoder = reader.decoder();

        if !prolog_written {
            prolog_written = true;
            if let Event::Decl(decl) = &event {
                emit(&mut writer, Event::Decl(declared_encoding(decl, position)?))?;
                continue;
            }
            emit(
                &mut writer,
                Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
            )?;
            emit(&mut writer, Event::Text(BytesText::new("\n")))?;
        }

        // Inside a name being overwritten: drop everything up to its end tag.
        if let Some(name_depth) = skip_until {
            match event {
                Event::End(end) if depth == name_depth => {
                    skip_until = None;
                    emit(&mut writer, Event::End(end))?;
                }
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(start) => match tag {
                Tag::Name => match take_pending_label(&mut frames, depth) {
                    Some(label) => {
                        emit(&mut writer, Event::Start(start))?;
                        write_label(&mut writer, &label, decoder);
                        skip_until = Some(depth + 1);
                    }
                    None => emit(&mut writer, Event::Start(start))?,
                },
                Tag::Placemark => {
                    let (ordinal, label) = labels.next_label();
                    let prefix = element_prefix(&start, position)?;
                    emit(&mut writer, Event::Start(start))?;
                    if has_name(&placemarks, ordinal) {
                        frames.push(Frame {
                            depth: depth + 1,
                            pending: Some(label),
                        });
                    } else {
                        write_name(&mut writer, &prefix, &label, decoder)?;
                        summary.names_inserted += 1;
                        frames.push(Frame {
                            depth: depth + 1,
                            pending: None,
                        });
                    }
                }
                Tag::Other => emit(&mut writer, Event::Start(start))?,
            },
            Event::Empty(empty) => match tag {
                Tag::Name => match take_pending_label(&mut frames, depth) {
                    Some(label) => {
                        emit(&mut writer, Event::Start(empty.borrow()))?;
                        write_label(&mut writer, &label, decoder);
                        emit(&mut writer, Event::End(empty.to_end()))?;
                    }
                    None => emit(&mut writer, Event::Empty(empty))?,
                },
                Tag::Placemark => {
                    let (_, label) = labels.next_label();
                    let prefix = element_prefix(&empty, position)?;
                    emit(&mut writer, Event::Start(empty.borrow()))?;
                    write_name(&mut writer, &prefix, &label, decoder)?;
                    emit(&mut writer, Event::End(empty.to_end()))?;
                    summary.names_inserted += 1;
                }
                Tag::Other => emit(&mut writer, Event::Empty(empty))?,
            },
            Event::End(end) => {
                if frames.last().is_some_and(|f| f.depth == depth) {
                    frames.pop();
                }
                emit(&mut writer, Event::End(end))?;
            }
            Event::Eof => break,
            other => emit(&mut writer, other)?,
        }
    }

    summary.placemarks = labels.assigned();
    debug_assert_eq!(summary.placemarks, placemarks.len());

    Ok(Rewritten {
        document: writer.into_inner(),
        summary,
    })
}

/// Rewrites the document at `path` in place.
///
/// The file is only written once the whole document has been rewritten, so
/// a malformed document or one without placemarks is left untouched.
pub fn rewrite_file(path: &Path, label_prefix: &str) -> Result<RewriteSummary> {
    let original = fs::read(path)?;
    let rewritten = rewrite(&original, label_prefix)?;
    fs::write(path, &rewritten.document)?;
    log::debug!(
        "rewrote '{}': {} placemarks, {} names inserted",
        path.display(),
        rewritten.summary.placemarks,
        rewritten.summary.names_inserted
    );
    Ok(rewritten.summary)
}

/// Hands out positional labels; the counter starts at 1.
struct Labeler<'a> {
    prefix: &'a str,
    next: usize,
}

impl<'a> Labeler<'a> {
    fn new(prefix: &'a str) -> Self {
        Self { prefix, next: 1 }
    }

    /// Returns the next ordinal and its label.
    fn next_label(&mut self) -> (usize, String) {
        let ordinal = self.next;
        self.next += 1;
        (ordinal, format!("{}{}", self.prefix, ordinal))
    }

    fn assigned(&self) -> usize {
        self.next - 1
    }
}

/// An open placemark during rewrite.
struct Frame {
    /// Depth of the placemark's direct children.
    depth: usize,
    /// Label still to be written into the existing name child.
    pending: Option<String>,
}

/// A name child whose text is being collected by [`survey`].
struct NameCapture {
    index: usize,
    /// Depth of the name element's content.
    depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Placemark,
    Name,
    Other,
}

/// Element nesting and well-formedness checks shared by both passes.
#[derive(Debug, Default)]
struct Structure {
    depth: usize,
    seen_root: bool,
    seen_any: bool,
}

impl Structure {
    fn depth(&self) -> usize {
        self.depth
    }

    fn track(&mut self, event: &Event<'_>, position: u64) -> Result<()> {
        let first = !self.seen_any;
        self.seen_any = true;
        match event {
            Event::Decl(_) if !first => {
                return Err(Error::malformed(
                    position,
                    "XML declaration not at document start",
                ));
            }
            Event::Start(_) | Event::Empty(_) => {
                if self.depth == 0 {
                    if self.seen_root {
                        return Err(Error::malformed(position, "multiple root elements"));
                    }
                    self.seen_root = true;
                }
                if matches!(event, Event::Start(_)) {
                    self.depth += 1;
                }
            }
            Event::End(_) => {
                self.depth = self
                    .depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::malformed(position, "unexpected end tag"))?;
            }
            Event::Text(text)
                if self.depth == 0 && !text.iter().all(u8::is_ascii_whitespace) =>
            {
                return Err(Error::malformed(position, "text outside the root element"));
            }
            Event::CData(_) if self.depth == 0 => {
                return Err(Error::malformed(position, "CDATA outside the root element"));
            }
            Event::Eof => {
                if self.depth > 0 {
                    return Err(Error::malformed(
                        position,
                        format!("{} unclosed element(s)", self.depth),
                    ));
                }
                if !self.seen_root {
                    return Err(Error::malformed(position, "no root element"));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn open_reader(document: &[u8]) -> NsReader<&[u8]> {
    let mut reader = NsReader::from_reader(document);
    let config = reader.config_mut();
    config.trim_text(false);
    config.expand_empty_elements = false;
    config.check_end_names = true;
    reader
}

fn strip_bom(document: &[u8]) -> &[u8] {
    document.strip_prefix(UTF8_BOM).unwrap_or(document)
}

fn classify(ns: &ResolveResult<'_>, event: &Event<'_>, position: u64) -> Result<Tag> {
    let start = match event {
        Event::Start(e) | Event::Empty(e) => e,
        _ => return Ok(Tag::Other),
    };
    match ns {
        ResolveResult::Bound(Namespace(uri)) if *uri == KML_NAMESPACE.as_bytes() => {}
        ResolveResult::Unknown(prefix) => {
            return Err(Error::malformed(
                position,
                format!(
                    "unbound namespace prefix '{}'",
                    String::from_utf8_lossy(prefix)
                ),
            ));
        }
        _ => return Ok(Tag::Other),
    }
    Ok(match start.local_name().as_ref() {
        b"Placemark" => Tag::Placemark,
        b"name" => Tag::Name,
        _ => Tag::Other,
    })
}

fn has_name(placemarks: &[PlacemarkSummary], ordinal: usize) -> bool {
    placemarks
        .get(ordinal - 1)
        .is_some_and(|p| p.name.is_some())
}

/// Takes the pending label if an element at `depth` is a direct child of the
/// innermost open placemark.
fn take_pending_label(frames: &mut [Frame], depth: usize) -> Option<String> {
    frames
        .last_mut()
        .filter(|f| f.depth == depth)
        .and_then(|f| f.pending.take())
}

fn element_prefix(start: &BytesStart<'_>, position: u64) -> Result<String> {
    match start.name().prefix() {
        Some(prefix) => std::str::from_utf8(prefix.as_ref())
            .map(str::to_string)
            .map_err(|e| Error::malformed(position, e.to_string())),
        None => Ok(String::new()),
    }
}

fn write_name(
    writer: &mut Writer<Vec<u8>>,
    prefix: &str,
    label: &str,
    decoder: Decoder,
) -> Result<()> {
    let qualified = if prefix.is_empty() {
        "name".to_string()
    } else {
        format!("{}:name", prefix)
    };
    emit(writer, Event::Start(BytesStart::new(qualified.as_str())))?;
    write_label(writer, label, decoder);
    emit(writer, Event::End(BytesEnd::new(qualified.as_str())))
}

/// Writes `label` as escaped text in the document's encoding.
fn write_label(writer: &mut Writer<Vec<u8>>, label: &str, decoder: Decoder) {
    let escaped = escape(label);
    let (encoded, _, _) = decoder.encoding().encode(&escaped);
    writer.get_mut().extend_from_slice(&encoded);
}

/// Returns `decl` with an encoding, adding `UTF-8` if it named none.
fn declared_encoding(decl: &BytesDecl<'_>, position: u64) -> Result<BytesDecl<'static>> {
    if decl.encoding().is_some() {
        return Ok(decl.clone().into_owned());
    }
    let version = decl
        .version()
        .map_err(|e| Error::malformed(position, e.to_string()))?;
    let version = std::str::from_utf8(&version)
        .map_err(|e| Error::malformed(position, e.to_string()))?
        .to_string();
    let standalone = match decl.standalone() {
        Some(value) => {
            let value = value.map_err(|e| Error::malformed(position, e.to_string()))?;
            Some(
                std::str::from_utf8(&value)
                    .map_err(|e| Error::malformed(position, e.to_string()))?
                    .to_string(),
            )
        }
        None => None,
    };
    Ok(BytesDecl::new(&version, Some("UTF-8"), standalone.as_deref()).into_owned())
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Io(io::Error::other(e)))
}
