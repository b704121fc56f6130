//! Domain types for extracted deck content and video generation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A parsed slide deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    /// File name of the deck, without directories.
    pub filename: String,
    /// Slides in deck order.
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn new(filename: impl Into<String>, slides: Vec<Slide>) -> Self {
        Self {
            filename: filename.into(),
            slides,
        }
    }

    /// Number of slides that carry any visible text.
    pub fn text_bearing_slides(&self) -> usize {
        self.slides.iter().filter(|s| s.has_text()).count()
    }
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Container format of a deck on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Office Open XML (`.pptx`), a ZIP package.
    Pptx,
    /// Binary PowerPoint 97-2003 (`.ppt`). Recognised only to be rejected.
    LegacyPpt,
}

impl PresentationFormat {
    /// Identify a deck from its leading bytes, falling back to the file extension.
    pub fn detect(header: &[u8], path: &Path) -> Option<Self> {
        if header.starts_with(ZIP_MAGIC) {
            return Some(Self::Pptx);
        }
        if header.starts_with(OLE_MAGIC) {
            return Some(Self::LegacyPpt);
        }

        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::LegacyPpt),
            _ => None,
        }
    }
}

/// Top-left corner of a shape in EMUs. Orders top-to-bottom, then left-to-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub y: i64,
    pub x: i64,
}

/// Text of one shape on a slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    /// Shapes that inherit their frame from the layout carry no position.
    pub position: Option<Position>,
}

/// A single slide: its visible text and speaker notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,
    /// Text blocks in reading order.
    pub blocks: Vec<TextBlock>,
    pub notes: Option<String>,
    /// Marked "hide slide" in the deck.
    #[serde(default)]
    pub hidden: bool,
}

impl Slide {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            blocks: Vec::new(),
            notes: None,
            hidden: false,
        }
    }

    pub fn push_block(&mut self, text: impl Into<String>, position: Option<Position>) {
        self.blocks.push(TextBlock {
            text: text.into(),
            position,
        });
    }

    /// Put blocks in reading order. Unpositioned blocks (usually inherited
    /// titles) come first and keep their document order.
    pub fn sort_blocks(&mut self) {
        self.blocks.sort_by_key(|block| block.position);
    }

    /// Visible text, one block per line, blank blocks skipped.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_text(&self) -> bool {
        self.blocks.iter().any(|b| !b.text.trim().is_empty())
    }

    /// Speaker notes, if present and not blank.
    pub fn notes_text(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// A rendered slide image ready for upload.
#[derive(Debug, Clone)]
pub struct SlideImage {
    /// 1-based slide number this image belongs to.
    pub slide_number: usize,
    /// File name used for upload and MIME detection.
    pub file_name: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// Output video dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

impl Default for Dimension {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Background behind the avatar in one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    /// Solid colour, e.g. `#FFFFFF`.
    Color(String),
    /// A previously uploaded image asset.
    Image { asset_id: String },
}

/// One narrated scene of the generated video.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Slide this scene narrates.
    pub slide_number: usize,
    /// Text spoken by the avatar.
    pub narration: String,
    pub background: Background,
}

/// A complete video generation request, independent of the remote wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRequest {
    pub title: String,
    pub dimension: Dimension,
    pub scenes: Vec<Scene>,
}

/// Status of a video being generated remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoStatus {
    /// Queued but not started.
    Pending,
    /// Rendering in progress; carries the raw status string.
    Processing(String),
    /// Finished; the video can be downloaded from `url`.
    Completed { url: String },
    /// The service gave up on the video.
    Failed { error: String },
}

/// Summary of a finished conversion, printed as JSON by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub video_id: String,
    pub video_url: String,
    pub output: PathBuf,
    pub title: String,
    pub slides_processed: usize,
    pub slides_with_images: usize,
    pub bytes_written: u64,
}
