//! SVG document reading and writing.
//!
//! The document is streamed twice with [`quick_xml`]. The first pass
//! collects every `<path>` and the id of every element. The second pass
//! copies the source event by event, so comments, processing
//! instructions, whitespace and character references survive unchanged;
//! only `<path>` start tags are rewritten or dropped.

use std::collections::{HashMap, HashSet};

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesStart, Event};

use linkpath_engine::{ChainConfig, ChainDiagnostics, ChainResult, SourcePath};

use crate::SvgError;
use crate::path_data::{build_path_data, parse_path_data};

/// Inkscape shape marker removed from rewritten paths, so editors stop
/// regenerating the old geometry from shape parameters.
const SODIPODI_TYPE: &str = "sodipodi:type";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

#[derive(Debug, Clone, PartialEq, Eq)]
struct PathEntry {
    key: String,
    d: String,
}

/// A parsed SVG document with its `<path>` elements keyed for chaining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgPaths {
    source: String,
    declared: bool,
    paths: Vec<PathEntry>,
    path_keys: Vec<String>,
    /// Local element name for the first element carrying each id.
    elements: HashMap<String, String>,
}

impl SvgPaths {
    /// Keys of every `<path>` element, in document order.
    ///
    /// A key is the element's `id` when present and unique, otherwise
    /// `path{n}` where `n` is the element's position among all paths.
    #[must_use]
    pub fn path_keys(&self) -> &[String] {
        &self.path_keys
    }

    /// Parse every path's `d` attribute into a chaining source.
    ///
    /// # Errors
    ///
    /// Returns [`SvgError::PathData`] naming the first path whose data
    /// cannot be converted.
    pub fn sources(&self) -> Result<Vec<SourcePath<String>>, SvgError> {
        self.paths.iter().map(PathEntry::source).collect()
    }

    /// Chaining sources for the paths named by `ids`, in selection order.
    ///
    /// An empty selection takes every path, like [`SvgPaths::sources`].
    /// Repeated ids are taken once.
    ///
    /// # Errors
    ///
    /// Returns [`SvgError::UnknownId`] for an id no element carries,
    /// [`SvgError::NotAPath`] for an id on some other element, and
    /// [`SvgError::PathData`] for a selected path with unreadable data.
    pub fn select(&self, ids: &[String]) -> Result<Vec<SourcePath<String>>, SvgError> {
        if ids.is_empty() {
            return self.sources();
        }

        let mut taken = HashSet::new();
        let mut sources = Vec::with_capacity(ids.len());
        for id in ids {
            if !taken.insert(id.as_str()) {
                continue;
            }
            let Some(element) = self.elements.get(id) else {
                return Err(SvgError::UnknownId(id.clone()));
            };
            match self.paths.iter().find(|entry| entry.key == *id) {
                Some(entry) => sources.push(entry.source()?),
                None => {
                    return Err(SvgError::NotAPath {
                        id: id.clone(),
                        element: element.clone(),
                    });
                }
            }
        }
        tracing::debug!(selected = sources.len(), "selected paths by id");
        Ok(sources)
    }

    fn entry(&self, index: usize) -> Result<&PathEntry, SvgError> {
        self.paths
            .get(index)
            .ok_or_else(|| SvgError::Document("document changed between passes".to_owned()))
    }
}

impl PathEntry {
    fn source(&self) -> Result<SourcePath<String>, SvgError> {
        let subpaths = parse_path_data(&self.d).map_err(|source| SvgError::PathData {
            id: self.key.clone(),
            source,
        })?;
        Ok(SourcePath::new(self.key.clone(), subpaths))
    }
}

fn document_error(err: impl std::fmt::Display) -> SvgError {
    SvgError::Document(err.to_string())
}

fn is_path(tag: &BytesStart<'_>) -> bool {
    tag.local_name().as_ref() == b"path"
}

/// Decoded `(name, value)` pairs in source order.
fn read_attributes(tag: &BytesStart<'_>) -> Result<Vec<(String, String)>, SvgError> {
    tag.attributes()
        .map(|attr| {
            let attr = attr.map_err(document_error)?;
            let value = attr.unescape_value().map_err(document_error)?;
            Ok((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value.into_owned(),
            ))
        })
        .collect()
}

/// Read an SVG document.
///
/// # Errors
///
/// Returns [`SvgError::Document`] if the markup cannot be parsed or has no
/// single root element, and [`SvgError::NoPaths`] if it has no `<path>`
/// elements.
pub fn read_paths(content: &str) -> Result<SvgPaths, SvgError> {
    let mut reader = Reader::from_str(content);
    let mut depth = 0_usize;
    let mut roots = 0_usize;
    let mut declared = false;
    let mut elements = HashMap::new();
    let mut paths = Vec::new();
    let mut path_ids = HashSet::new();

    loop {
        let (tag, opens) = match reader.read_event().map_err(document_error)? {
            Event::Start(tag) => (tag, true),
            Event::Empty(tag) => (tag, false),
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                continue;
            }
            Event::Decl(_) => {
                declared = true;
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        if depth == 0 {
            roots += 1;
            if roots > 1 {
                return Err(SvgError::Document("second root element".to_owned()));
            }
        }
        if opens {
            depth += 1;
        }

        let attributes = read_attributes(&tag)?;
        let id = attributes
            .iter()
            .find(|(name, _)| name == "id")
            .map(|(_, value)| value.clone());
        if let Some(id) = &id {
            let local = String::from_utf8_lossy(tag.local_name().as_ref()).into_owned();
            elements.entry(id.clone()).or_insert(local);
        }

        if is_path(&tag) {
            let key = match id {
                Some(id) if path_ids.insert(id.clone()) => id,
                _ => format!("path{}", paths.len()),
            };
            let d = attributes
                .into_iter()
                .find(|(name, _)| name == "d")
                .map(|(_, value)| value)
                .unwrap_or_default();
            paths.push(PathEntry { key, d });
        }
    }

    if depth != 0 {
        return Err(SvgError::Document("unclosed element".to_owned()));
    }
    if roots == 0 {
        return Err(SvgError::Document("no root element".to_owned()));
    }
    if paths.is_empty() {
        return Err(SvgError::NoPaths);
    }

    tracing::debug!(
        paths = paths.len(),
        ids = elements.len(),
        "read SVG document"
    );
    let path_keys = paths.iter().map(|entry| entry.key.clone()).collect();
    Ok(SvgPaths {
        source: content.to_owned(),
        declared,
        paths,
        path_keys,
        elements,
    })
}

/// What happens to one `<path>` on the way out.
enum PathEdit {
    Keep,
    Replace(BytesStart<'static>),
    Remove,
}

fn edit_path(
    tag: &BytesStart<'_>,
    entry: &PathEntry,
    result: &ChainResult<String>,
) -> Result<PathEdit, SvgError> {
    let Some(chains) = result.get(&entry.key) else {
        return Ok(PathEdit::Keep);
    };
    if chains.is_empty() {
        return Ok(PathEdit::Remove);
    }

    let d = build_path_data(chains);
    let mut out = BytesStart::new(String::from_utf8_lossy(tag.name().as_ref()).into_owned());
    let mut wrote_d = false;
    for (name, value) in read_attributes(tag)? {
        match name.as_str() {
            SODIPODI_TYPE => {}
            "d" => {
                out.push_attribute(("d", d.as_str()));
                wrote_d = true;
            }
            _ => out.push_attribute((name.as_str(), value.as_str())),
        }
    }
    if !wrote_d {
        out.push_attribute(("d", d.as_str()));
    }
    Ok(PathEdit::Replace(out))
}

/// Write `paths` back out with the chained geometry from `result`.
///
/// Each `<path>` whose key has chains in `result` gets a new `d` and loses
/// its `sodipodi:type`; a path left with no chains is removed along with
/// its content. Paths absent from `result`, and everything that is not a
/// path, are copied from the source unchanged.
///
/// # Errors
///
/// Returns [`SvgError::Document`] if the source cannot be streamed again.
pub fn write_document(paths: &SvgPaths, result: &ChainResult<String>) -> Result<String, SvgError> {
    let mut reader = Reader::from_str(&paths.source);
    let mut writer = Writer::new(Vec::with_capacity(paths.source.len()));
    let mut next_path = 0_usize;
    let mut skipping = 0_usize;

    loop {
        match reader.read_event().map_err(document_error)? {
            Event::Eof => break,
            event if skipping > 0 => match event {
                Event::Start(tag) => {
                    if is_path(&tag) {
                        next_path += 1;
                    }
                    skipping += 1;
                }
                Event::Empty(tag) if is_path(&tag) => next_path += 1,
                Event::End(_) => skipping -= 1,
                _ => {}
            },
            Event::Start(tag) if is_path(&tag) => {
                let entry = paths.entry(next_path)?;
                next_path += 1;
                match edit_path(&tag, entry, result)? {
                    PathEdit::Keep => writer.write_event(Event::Start(tag)),
                    PathEdit::Replace(out) => writer.write_event(Event::Start(out)),
                    PathEdit::Remove => {
                        skipping = 1;
                        Ok(())
                    }
                }
                .map_err(document_error)?;
            }
            Event::Empty(tag) if is_path(&tag) => {
                let entry = paths.entry(next_path)?;
                next_path += 1;
                match edit_path(&tag, entry, result)? {
                    PathEdit::Keep => writer.write_event(Event::Empty(tag)),
                    PathEdit::Replace(out) => writer.write_event(Event::Empty(out)),
                    PathEdit::Remove => Ok(()),
                }
                .map_err(document_error)?;
            }
            event => writer.write_event(event).map_err(document_error)?,
        }
    }

    let body = String::from_utf8(writer.into_inner()).map_err(document_error)?;
    if paths.declared {
        Ok(body)
    } else {
        Ok(format!("{XML_DECLARATION}{body}"))
    }
}

/// Chain the paths of an SVG document and return the rewritten document.
///
/// `ids` limits chaining to the named paths; an empty slice chains every
/// path. Unselected paths are written unchanged.
///
/// # Errors
///
/// Returns an [`SvgError`] if the document, the selection, or any selected
/// path data cannot be read, or if chaining fails.
pub fn chain_svg(
    content: &str,
    config: &ChainConfig,
    ids: &[String],
) -> Result<(String, ChainDiagnostics), SvgError> {
    let paths = read_paths(content)?;
    let result = linkpath_engine::chain_paths(paths.select(ids)?, config)?;
    let svg = write_document(&paths, &result)?;
    Ok((svg, result.diagnostics))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TWO_PIECES: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
  <g id="layer1">
    <path id="a" d="M 0 0 L 10 0" style="stroke:black"/>
    <path id="b" d="M 10 0.005 L 20 0" sodipodi:type="arc"/>
  </g>
  <rect id="frame" x="0" y="0" width="5" height="5"/>
</svg>"#;

    const THREE_IN_A_ROW: &str = r#"<svg><path id="a" d="M 0 0 L 10 0"/><path id="b" d="M 10 0 L 20 0"/><path id="c" d="M 20 0 L 30 0"/><rect id="r" width="1" height="1"/></svg>"#;

    fn config(epsilon: f64) -> ChainConfig {
        ChainConfig {
            epsilon,
            ..ChainConfig::default()
        }
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|&name| name.to_owned()).collect()
    }

    #[test]
    fn read_collects_paths_in_document_order() {
        let paths = read_paths(TWO_PIECES).unwrap();
        assert_eq!(paths.path_keys(), ["a", "b"]);

        let sources = paths.sources().unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].owner, "a");
        assert_eq!(sources[0].subpaths[0].len(), 2);
    }

    #[test]
    fn missing_and_duplicate_ids_get_positional_keys() {
        let svg = r#"<svg><path d="M0 0 L1 0"/><path id="x" d="M5 5 L6 6"/><path id="x" d="M9 9 L8 8"/></svg>"#;
        let paths = read_paths(svg).unwrap();
        assert_eq!(paths.path_keys(), ["path0", "x", "path2"]);
    }

    #[test]
    fn document_without_paths_is_rejected() {
        let err = read_paths(r#"<svg><rect width="1" height="1"/></svg>"#).unwrap_err();
        assert!(matches!(err, SvgError::NoPaths));
    }

    #[test]
    fn unclosed_root_is_a_document_error() {
        let err = read_paths(r#"<svg><path id="p" d="M0 0 L1 0"/>"#).unwrap_err();
        assert!(matches!(err, SvgError::Document(_)));
    }

    #[test]
    fn bad_path_data_names_the_path() {
        let paths = read_paths(r#"<svg><path id="arc" d="M0 0 A 5 5 0 0 1 10 0"/></svg>"#)
            .unwrap();
        let err = paths.sources().unwrap_err();
        assert!(matches!(err, SvgError::PathData { ref id, .. } if id == "arc"));
    }

    #[test]
    fn chained_document_drops_absorbed_path() {
        let (svg, diagnostics) = chain_svg(TWO_PIECES, &config(0.01), &[]).unwrap();

        assert_eq!(diagnostics.link_count, 1);
        assert_eq!(diagnostics.owners_obsoleted, 1);
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg"));
        assert!(svg.contains(r#"id="a""#));
        assert!(!svg.contains(r#"id="b""#));
        assert!(svg.contains(r#"style="stroke:black""#));
        assert!(svg.contains(r#"id="layer1""#));
        assert!(svg.contains(r#"<rect id="frame" x="0" y="0" width="5" height="5"/>"#));
        assert!(svg.contains(r#"d="M0,0 C"#));
    }

    #[test]
    fn unlinked_paths_are_rewritten_in_place() {
        let (svg, diagnostics) = chain_svg(TWO_PIECES, &config(0.001), &[]).unwrap();

        assert_eq!(diagnostics.link_count, 0);
        assert!(svg.contains(r#"id="a""#));
        assert!(svg.contains(r#"id="b""#));
        assert!(!svg.contains("sodipodi:type"));
    }

    #[test]
    fn removed_path_takes_its_content_along() {
        let svg = r#"<svg><path id="a" d="M 0 0 L 10 0"/><path id="b" d="M 10 0 L 20 0"><title>tail</title></path><desc>kept</desc></svg>"#;
        let (out, diagnostics) = chain_svg(svg, &config(0.01), &[]).unwrap();

        assert_eq!(diagnostics.owners_obsoleted, 1);
        assert!(!out.contains("tail"));
        assert!(out.contains("<desc>kept</desc></svg>"));
    }

    #[test]
    fn text_content_survives() {
        let svg = r#"<svg><title>A &amp; B</title><path id="p" d="M0 0 L1 0"/></svg>"#;
        let (out, _) = chain_svg(svg, &ChainConfig::default(), &[]).unwrap();
        assert!(out.contains("<title>A &amp; B</title>"));
    }

    #[test]
    fn character_references_survive_in_text_and_attributes() {
        let svg = r#"<svg><title>a&#169;b</title><g inkscape:label="x&#xA9;y"><path id="p" inkscape:label="p&#169;q" d="M0 0 L1 0"/></g></svg>"#;
        let (out, _) = chain_svg(svg, &ChainConfig::default(), &[]).unwrap();

        assert!(!out.contains("&amp;#"));
        assert!(out.contains("<title>a&#169;b</title>"));
        assert!(out.contains(r#"<g inkscape:label="x&#xA9;y">"#));
        // The rewritten path carries the decoded character.
        assert!(out.contains("inkscape:label=\"p\u{a9}q\""));

        let reread = read_paths(&out).unwrap();
        assert_eq!(reread.path_keys(), ["p"]);
    }

    #[test]
    fn comments_instructions_and_whitespace_survive() {
        let svg = "<?xml version=\"1.0\"?>\n<!-- drawn by hand -->\n<svg>\n  <?app hint?>\n  <text xml:space=\"preserve\"><tspan> </tspan></text>\n  <path id=\"p\" d=\"M0 0 L1 0\"/>\n</svg>\n";
        let (out, _) = chain_svg(svg, &ChainConfig::default(), &[]).unwrap();

        assert!(out.starts_with("<?xml version=\"1.0\"?>\n<!-- drawn by hand -->\n<svg>\n"));
        assert_eq!(out.matches("<?xml").count(), 1);
        assert!(out.contains("<?app hint?>"));
        assert!(out.contains(r#"<text xml:space="preserve"><tspan> </tspan></text>"#));
        assert!(out.ends_with("</svg>\n"));
    }

    #[test]
    fn selection_leaves_unselected_neighbour_untouched() {
        let (out, diagnostics) =
            chain_svg(THREE_IN_A_ROW, &config(0.01), &ids(&["a", "b"])).unwrap();

        assert_eq!(diagnostics.fragment_count, 2);
        assert_eq!(diagnostics.link_count, 1);
        assert!(!out.contains(r#"id="b""#));
        // `c` touches the joined end but was not selected.
        assert!(out.contains(r#"<path id="c" d="M 20 0 L 30 0"/>"#));
    }

    #[test]
    fn selection_follows_given_order_once() {
        let paths = read_paths(THREE_IN_A_ROW).unwrap();
        let sources = paths.select(&ids(&["c", "a", "c"])).unwrap();
        let owners: Vec<_> = sources.iter().map(|s| s.owner.as_str()).collect();
        assert_eq!(owners, ["c", "a"]);
    }

    #[test]
    fn unknown_id_is_rejected() {
        let paths = read_paths(THREE_IN_A_ROW).unwrap();
        let err = paths.select(&ids(&["a", "zz"])).unwrap_err();
        assert_eq!(err, SvgError::UnknownId("zz".to_owned()));
    }

    #[test]
    fn selecting_a_non_path_is_rejected() {
        let paths = read_paths(THREE_IN_A_ROW).unwrap();
        let err = paths.select(&ids(&["r"])).unwrap_err();
        assert_eq!(
            err,
            SvgError::NotAPath {
                id: "r".to_owned(),
                element: "rect".to_owned(),
            }
        );
        assert_eq!(err.to_string(), "object r is not a path but a <rect>");
    }
}
