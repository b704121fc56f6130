//! PPTX file parser implementation.

use deckcast_core::{Error, Position, Presentation, PresentationFormat, Result, Slide};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Placeholder types that never belong in narration.
const SKIPPED_PLACEHOLDERS: &[&str] = &["sldNum", "dt", "ftr", "hdr", "sldImg"];

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser {
    /// Whether to read speaker notes.
    include_notes: bool,
}

impl PptxParser {
    /// Create a new PPTX parser that also reads speaker notes.
    pub fn new() -> Self {
        Self {
            include_notes: true,
        }
    }

    /// Set whether speaker notes are extracted.
    pub fn with_notes(mut self, include: bool) -> Self {
        self.include_notes = include;
        self
    }

    /// Open a deck from disk, checking its format first.
    pub fn parse_path(&self, path: &Path) -> Result<Presentation> {
        let mut file = File::open(path)?;

        let mut magic = [0u8; 8];
        let read = file.read(&mut magic)?;

        let format = PresentationFormat::detect(&magic[..read], path).ok_or_else(|| {
            Error::UnsupportedFormat(format!("{} is not a presentation", path.display()))
        })?;

        if format == PresentationFormat::LegacyPpt {
            return Err(Error::UnsupportedFormat(format!(
                "{} is a legacy .ppt file; save it as .pptx first",
                path.display()
            )));
        }

        file.rewind()?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("presentation.pptx");

        self.parse(BufReader::new(file), filename)
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Presentation> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_order = self.get_slide_order(&mut archive)?;
        log::debug!("Found {} slides in {}", slide_order.len(), filename);

        let slides = slide_order
            .iter()
            .enumerate()
            .map(|(idx, slide_path)| self.parse_slide(&mut archive, slide_path, idx + 1))
            .collect::<Result<Vec<_>>>()?;

        Ok(Presentation::new(filename, slides))
    }

    /// Get the ordered list of slide paths.
    ///
    /// The order comes from `p:sldIdLst` in presentation.xml. Decks without
    /// that list fall back to the numbers in the slide part names.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, PRESENTATION_RELS_PATH)?;
        let relationships = parse_relationships(&rels_content)?;

        let slide_rels: HashMap<&str, &Relationship> = relationships
            .iter()
            .filter(|r| r.is_slide())
            .map(|r| (r.id.as_str(), r))
            .collect();

        let listed = match self.read_file_from_archive(archive, PRESENTATION_PATH) {
            Ok(content) => parse_slide_id_list(&content)?,
            Err(e) => {
                log::warn!("Could not read {}: {}", PRESENTATION_PATH, e);
                Vec::new()
            }
        };

        let ordered: Vec<String> = listed
            .iter()
            .filter_map(|rid| slide_rels.get(rid.as_str()))
            .map(|rel| resolve_target("ppt", &rel.target))
            .collect();

        if !ordered.is_empty() {
            return Ok(ordered);
        }

        // Numbered parts first, in number order; anything else by path.
        let mut slides: Vec<(Option<usize>, String)> = slide_rels
            .values()
            .map(|rel| {
                let number = trailing_number(&rel.target).or_else(|| trailing_number(&rel.id));
                (number, resolve_target("ppt", &rel.target))
            })
            .collect();
        slides.sort_by(|a, b| (a.0.is_none(), a.0, &a.1).cmp(&(b.0.is_none(), b.0, &b.1)));

        Ok(slides.into_iter().map(|(_, path)| path).collect())
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<Slide> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let mut slide = Slide::new(slide_number);
        slide.hidden = is_hidden_slide(&content);

        for shape in extract_shapes_from_xml(&content) {
            if shape.is_narratable() {
                slide.push_block(shape.text, shape.position);
            }
        }
        slide.sort_blocks();

        if self.include_notes {
            slide.notes = self.read_notes(archive, slide_path);
        }

        Ok(slide)
    }

    /// Read the speaker notes linked from a slide, if any.
    ///
    /// Missing or unreadable notes are logged and treated as absent.
    fn read_notes<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Option<String> {
        let (dir, file) = slide_path.rsplit_once('/')?;
        let rels_path = format!("{}/_rels/{}.rels", dir, file);

        let rels_content = self.read_file_from_archive(archive, &rels_path).ok()?;
        let notes_rel = match parse_relationships(&rels_content) {
            Ok(rels) => rels.into_iter().find(|r| r.is_notes())?,
            Err(e) => {
                log::warn!("Skipping notes for {}: {}", slide_path, e);
                return None;
            }
        };

        let notes_path = resolve_target(dir, &notes_rel.target);
        let content = match self.read_file_from_archive(archive, &notes_path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Skipping notes for {}: {}", slide_path, e);
                return None;
            }
        };

        let text = extract_shapes_from_xml(&content)
            .into_iter()
            .filter(ShapeInfo::is_narratable)
            .map(|shape| shape.text)
            .collect::<Vec<_>>()
            .join("\n");

        (!text.trim().is_empty()).then_some(text)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// One `Relationship` entry from a `.rels` part.
#[derive(Debug, Default)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

impl Relationship {
    fn is_slide(&self) -> bool {
        self.rel_type.ends_with("/slide")
    }

    fn is_notes(&self) -> bool {
        self.rel_type.ends_with("/notesSlide")
    }
}

/// Parse all relationships of a `.rels` part.
fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel = Relationship::default();
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"Id" => rel.id = value,
                        _ => {}
                    }
                }
                relationships.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Relationship ids of the slides listed in `p:sldIdLst`, in deck order.
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // `id` is the numeric slide id; the prefixed `r:id` is the relationship.
                if let Some(attr) = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref().ends_with(b":id"))
                {
                    ids.push(String::from_utf8_lossy(&attr.value).to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::PptxParseError(format!(
                    "Error parsing {}: {}",
                    PRESENTATION_PATH, e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Information about a shape extracted from XML.
#[derive(Debug, Default)]
struct ShapeInfo {
    text: String,
    position: Option<Position>,
    /// Placeholder type, `body` when the placeholder carries no type.
    placeholder: Option<String>,
}

impl ShapeInfo {
    fn is_narratable(&self) -> bool {
        if self.text.trim().is_empty() {
            return false;
        }
        !matches!(&self.placeholder, Some(ph) if SKIPPED_PLACEHOLDERS.contains(&ph.as_str()))
    }

    /// Record the `x`/`y` attributes of an `a:off` element.
    fn set_offset(&mut self, e: &BytesStart) {
        let (mut x, mut y) = (None, None);
        for attr in e.attributes().flatten() {
            let value = String::from_utf8_lossy(&attr.value).parse::<i64>().ok();
            match attr.key.as_ref() {
                b"x" => x = value,
                b"y" => y = value,
                _ => {}
            }
        }
        if let (Some(x), Some(y)) = (x, y) {
            self.position = Some(Position { x, y });
        }
    }

    fn set_placeholder(&mut self, e: &BytesStart) {
        let ph_type = e
            .attributes()
            .flatten()
            .find(|a| a.key.as_ref() == b"type")
            .map(|a| String::from_utf8_lossy(&a.value).to_string());
        self.placeholder = Some(ph_type.unwrap_or_else(|| "body".to_string()));
    }
}

/// Extract shapes with text, position and placeholder type from slide or notes XML.
fn extract_shapes_from_xml(xml_content: &str) -> Vec<ShapeInfo> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);

    let mut current_shape: Option<ShapeInfo> = None;
    let mut offset_seen = false;
    let mut in_text_body = false;
    let mut in_paragraph = false;
    let mut in_text_run = false;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"sp" | b"pic" | b"graphicFrame" => {
                        current_shape = Some(ShapeInfo::default());
                        offset_seen = false;
                    }
                    b"off" if !offset_seen => {
                        if let Some(ref mut shape) = current_shape {
                            shape.set_offset(e);
                            offset_seen = true;
                        }
                    }
                    b"ph" => {
                        if let Some(ref mut shape) = current_shape {
                            shape.set_placeholder(e);
                        }
                    }
                    b"txBody" => {
                        in_text_body = true;
                    }
                    b"p" if in_text_body => {
                        in_paragraph = true;
                        if !current_text.is_empty() {
                            current_text.push('\n');
                        }
                    }
                    b"t" if in_paragraph => {
                        in_text_run = true;
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"off" if !offset_seen => {
                        if let Some(ref mut shape) = current_shape {
                            shape.set_offset(e);
                            offset_seen = true;
                        }
                    }
                    b"ph" => {
                        if let Some(ref mut shape) = current_shape {
                            shape.set_placeholder(e);
                        }
                    }
                    b"br" if in_paragraph => {
                        current_text.push('\n');
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_text_run {
                    let text = e.unescape().unwrap_or_default();
                    current_text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"sp" | b"pic" | b"graphicFrame" => {
                        // End of shape - save it
                        if let Some(mut shape) = current_shape.take() {
                            shape.text = current_text.trim().to_string();
                            if !shape.text.is_empty() {
                                shapes.push(shape);
                            }
                        }
                        current_text.clear();
                        in_text_body = false;
                        in_paragraph = false;
                        in_text_run = false;
                    }
                    b"txBody" => {
                        in_text_body = false;
                    }
                    b"p" => {
                        in_paragraph = false;
                    }
                    b"t" => {
                        in_text_run = false;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!(
                    "XML parsing error at position {}, keeping {} shapes: {}",
                    reader.buffer_position(),
                    shapes.len(),
                    e
                );
                break;
            }
            _ => {}
        }
    }

    shapes
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Whether the slide root carries `show="0"`.
fn is_hidden_slide(xml: &str) -> bool {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if local_name(e.name().as_ref()) != b"sld" {
                    return false;
                }
                return e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"show")
                    .is_some_and(|a| matches!(a.value.as_ref(), b"0" | b"false"));
            }
            Ok(Event::Eof) | Err(_) => return false,
            _ => {}
        }
    }
}

/// Trailing number of a part name or relationship id (`slide3.xml`, `rId2`).
fn trailing_number(s: &str) -> Option<usize> {
    let stem = s.trim_end_matches(".rels").trim_end_matches(".xml");
    let digits_start = stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    stem[digits_start..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::{CompressionMethod, ZipWriter};

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;
    const REL_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    const REL_NOTES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";

    fn shape(text: &str, y: u32, placeholder: Option<&str>) -> String {
        let ph = placeholder
            .map(|t| format!(r#"<p:ph type="{}"/>"#, t))
            .unwrap_or_default();
        let paragraphs: String = text
            .split('\n')
            .map(|line| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", line))
            .collect();
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Shape"/><p:cNvSpPr/><p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="100" y="{y}"/><a:ext cx="10" cy="10"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/>{paragraphs}</p:txBody></p:sp>"#
        )
    }

    fn slide_xml(shapes: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {NS}><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
            shapes.concat()
        )
    }

    fn notes_xml(text: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:notes {NS}><p:cSld><p:spTree>{}{}{}</p:spTree></p:cSld></p:notes>"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#,
            shape(text, 0, Some("body")),
            shape("7", 900, Some("sldNum")),
        )
    }

    /// Build a deck whose `sldIdLst` lists the slides in the given order while
    /// the relationship ids number them differently.
    fn build_pptx(slides: &[(String, Option<String>)], listed_order: &[usize]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);

        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
        );
        for i in 0..slides.len() {
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}" Target="slides/slide{}.xml"/>"#,
                i + 2,
                REL_SLIDE,
                i + 1
            ));
        }
        rels.push_str("</Relationships>");

        let ids: String = listed_order
            .iter()
            .enumerate()
            .map(|(n, i)| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + n, i + 1))
            .collect();
        let presentation = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {NS}><p:sldIdLst>{ids}</p:sldIdLst></p:presentation>"#
        );

        zip.start_file(PRESENTATION_RELS_PATH, options).unwrap();
        zip.write_all(rels.as_bytes()).unwrap();
        zip.start_file(PRESENTATION_PATH, options).unwrap();
        zip.write_all(presentation.as_bytes()).unwrap();

        for (i, (slide, notes)) in slides.iter().enumerate() {
            let n = i + 1;
            zip.start_file(format!("ppt/slides/slide{}.xml", n), options)
                .unwrap();
            zip.write_all(slide.as_bytes()).unwrap();

            if let Some(notes) = notes {
                let slide_rels = format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="{}" Target="../notesSlides/notesSlide{}.xml"/></Relationships>"#,
                    REL_NOTES, n
                );
                zip.start_file(format!("ppt/slides/_rels/slide{}.xml.rels", n), options)
                    .unwrap();
                zip.write_all(slide_rels.as_bytes()).unwrap();
                zip.start_file(format!("ppt/notesSlides/notesSlide{}.xml", n), options)
                    .unwrap();
                zip.write_all(notes.as_bytes()).unwrap();
            }
        }

        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_trailing_number() {
        assert_eq!(trailing_number("rId12"), Some(12));
        assert_eq!(trailing_number("slides/slide3.xml"), Some(3));
        assert_eq!(trailing_number("slide3.xml.rels"), Some(3));
        assert_eq!(trailing_number("presentation.xml"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("ppt", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(
            resolve_target("ppt/slides", "../notesSlides/notesSlide1.xml"),
            "ppt/notesSlides/notesSlide1.xml"
        );
        assert_eq!(resolve_target("ppt", "/ppt/slides/slide2.xml"), "ppt/slides/slide2.xml");
    }

    #[test]
    fn test_shapes_keep_spaces_between_runs_and_breaks() {
        let xml = slide_xml(&[String::from(
            r#"<p:sp><p:spPr><a:xfrm><a:off x="0" y="0"/></a:xfrm></p:spPr><p:txBody><a:p><a:r><a:t>Hello </a:t></a:r><a:r><a:t>world</a:t></a:r><a:br/><a:r><a:t>again &amp; again</a:t></a:r></a:p></p:txBody></p:sp>"#,
        )]);

        let shapes = extract_shapes_from_xml(&xml);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].text, "Hello world\nagain & again");
    }

    #[test]
    fn test_table_text_is_extracted() {
        let xml = slide_xml(&[String::from(
            r#"<p:graphicFrame><p:xfrm><a:off x="5" y="50"/></p:xfrm><a:graphic><a:graphicData><a:tbl><a:tr><a:tc><a:txBody><a:p><a:r><a:t>Q1</a:t></a:r></a:p></a:txBody></a:tc><a:tc><a:txBody><a:p><a:r><a:t>Q2</a:t></a:r></a:p></a:txBody></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
        )]);

        let shapes = extract_shapes_from_xml(&xml);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].text, "Q1\nQ2");
        assert_eq!(shapes[0].position, Some(Position { x: 5, y: 50 }));
    }

    #[test]
    fn test_footer_placeholders_are_not_narrated() {
        let xml = slide_xml(&[
            shape("Agenda", 10, Some("title")),
            shape("12", 900, Some("sldNum")),
            shape("Confidential", 900, Some("ftr")),
        ]);

        let narratable: Vec<_> = extract_shapes_from_xml(&xml)
            .into_iter()
            .filter(ShapeInfo::is_narratable)
            .map(|s| s.text)
            .collect();
        assert_eq!(narratable, vec!["Agenda"]);
    }

    #[test]
    fn test_parse_orders_slides_and_reads_notes() {
        let slides = vec![
            (slide_xml(&[shape("First by rId", 0, Some("title"))]), None),
            (
                slide_xml(&[
                    shape("Body text", 500, None),
                    shape("Second by rId", 100, Some("title")),
                ]),
                Some(notes_xml("Say hello to everyone.")),
            ),
            (slide_xml(&[]), None),
        ];
        // Deck order: rId3 (slide2), rId2 (slide1), rId4 (slide3)
        let bytes = build_pptx(&slides, &[2, 1, 3]);

        let presentation = PptxParser::new()
            .parse(Cursor::new(bytes), "deck.pptx")
            .unwrap();

        assert_eq!(presentation.slides.len(), 3);
        assert_eq!(presentation.text_bearing_slides(), 2);

        let first = &presentation.slides[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.text(), "Second by rId\nBody text");
        assert_eq!(first.notes.as_deref(), Some("Say hello to everyone."));

        assert_eq!(presentation.slides[1].text(), "First by rId");
        assert_eq!(presentation.slides[1].notes, None);
        assert!(!presentation.slides[2].has_text());
    }

    #[test]
    fn test_hidden_slide_keeps_its_number() {
        let hidden = slide_xml(&[shape("Hidden", 0, None)]).replace("<p:sld ", r#"<p:sld show="0" "#);
        let slides = vec![
            (slide_xml(&[shape("A", 0, None)]), None),
            (hidden, None),
            (slide_xml(&[shape("C", 0, None)]), None),
        ];
        let bytes = build_pptx(&slides, &[1, 2, 3]);

        let presentation = PptxParser::new()
            .parse(Cursor::new(bytes), "deck.pptx")
            .unwrap();

        let flags: Vec<(usize, bool)> = presentation
            .slides
            .iter()
            .map(|s| (s.number, s.hidden))
            .collect();
        assert_eq!(flags, vec![(1, false), (2, true), (3, false)]);
        assert_eq!(presentation.slides[2].text(), "C");
    }

    #[test]
    fn test_is_hidden_slide() {
        assert!(is_hidden_slide(&format!(r#"<?xml version="1.0"?><p:sld {NS} show="0"/>"#)));
        assert!(!is_hidden_slide(&format!(r#"<p:sld {NS} show="1"><p:cSld/></p:sld>"#)));
        assert!(!is_hidden_slide(&slide_xml(&[])));
        assert!(!is_hidden_slide("not xml <"));
    }

    #[test]
    fn test_parse_without_notes() {
        let slides = vec![(
            slide_xml(&[shape("Title", 0, None)]),
            Some(notes_xml("Hidden notes")),
        )];
        let bytes = build_pptx(&slides, &[1]);

        let presentation = PptxParser::new()
            .with_notes(false)
            .parse(Cursor::new(bytes), "deck.pptx")
            .unwrap();

        assert_eq!(presentation.slides[0].notes, None);
    }

    #[test]
    fn test_fallback_order_without_slide_list() {
        let slides = vec![
            (slide_xml(&[shape("One", 0, None)]), None),
            (slide_xml(&[shape("Two", 0, None)]), None),
        ];
        let bytes = build_pptx(&slides, &[]);

        let presentation = PptxParser::new()
            .parse(Cursor::new(bytes), "deck.pptx")
            .unwrap();

        let texts: Vec<String> = presentation.slides.iter().map(|s| s.text()).collect();
        assert_eq!(texts, vec!["One", "Two"]);
    }

    #[test]
    fn test_not_a_zip() {
        let err = PptxParser::new()
            .parse(Cursor::new(b"not a zip".to_vec()), "deck.pptx")
            .unwrap_err();
        assert!(matches!(err, Error::ZipError(_)));
    }

    #[test]
    fn test_parse_path_rejects_legacy_ppt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.ppt");
        let mut bytes = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        bytes.extend_from_slice(&[0u8; 64]);
        std::fs::write(&path, bytes).unwrap();

        let err = PptxParser::new().parse_path(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_parse_path_reads_deck_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Quarterly Review.pptx");
        let slides = vec![(slide_xml(&[shape("Hello", 0, None)]), None)];
        std::fs::write(&path, build_pptx(&slides, &[1])).unwrap();

        let presentation = PptxParser::new().parse_path(&path).unwrap();
        assert_eq!(presentation.filename, "Quarterly Review.pptx");
        assert_eq!(presentation.slides.len(), 1);
    }
}
