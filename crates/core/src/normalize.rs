//! Text normalization for spoken narration.
//!
//! Slide text is written to be read, not heard: bullets, ragged line breaks
//! and layout whitespace all end up in the avatar's voice track if they are
//! passed through untouched. The normalizer turns a block of slide text into
//! a single run of prose with sentence punctuation the voice can follow.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Longest narration accepted for a single scene.
pub const MAX_SCENE_TEXT_CHARS: usize = 5000;

/// Regex to collapse runs of horizontal whitespace into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}\u{3000}]+").unwrap());

/// Regex to match a bullet glyph at the start of a line.
static BULLET_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[•◦▪▫■□●○►▶‣⁃∙·*\-–—]+\s+").unwrap());

/// Regex to match filename suffixes that aren't part of the deck title.
static FILENAME_SUFFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[-_]?\s*\b(final|draft|slides?|slideshow|deck|presentation|pptx?|v\d+)\s*$")
        .unwrap()
});

/// Characters after which no extra sentence punctuation is added.
const TERMINAL_CHARS: &[char] = &[
    '.', '!', '?', ':', ';', '…', // Latin
    '。', '！', '？', '：', '；', // CJK full-width
];

/// Characters that mark a line as continuing into the next one.
const CONTINUATION_CHARS: &[char] = &[',', '，', '、'];

/// Whether a character belongs to a script written without spaces.
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}' // Hiragana, Katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{AC00}'..='\u{D7AF}' // Hangul syllables
        | '\u{3000}'..='\u{303F}' // CJK punctuation
        | '\u{FF00}'..='\u{FFEF}' // Full-width forms
    )
}

/// Derive a readable video title from a deck filename.
///
/// Removes the extension and suffixes like "final", "slides" or "v2",
/// and turns underscores into spaces.
pub fn title_from_filename(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map(|(name, _)| name)
        .unwrap_or(filename);

    let mut name = stem.replace('_', " ");
    loop {
        let cleaned = FILENAME_SUFFIX_REGEX.replace(&name, "").to_string();
        if cleaned == name {
            break;
        }
        name = cleaned;
    }

    let collapsed = WHITESPACE_COLLAPSE_REGEX.replace_all(name.trim(), " ").to_string();
    if collapsed.is_empty() {
        stem.trim().to_string()
    } else {
        collapsed
    }
}

/// First `max_chars` characters of `text` on a single line, followed by an ellipsis.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = WHITESPACE_COLLAPSE_REGEX
        .replace_all(&text.replace(['\r', '\n'], " "), " ")
        .trim()
        .to_string();
    let mut out: String = flat.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// Normalizer that turns slide text into speakable narration.
#[derive(Debug, Clone)]
pub struct NarrationNormalizer {
    /// Maximum characters of narration per scene.
    max_chars: usize,
    /// Whether to add sentence punctuation to bare lines.
    punctuate_lines: bool,
}

impl Default for NarrationNormalizer {
    fn default() -> Self {
        Self {
            max_chars: MAX_SCENE_TEXT_CHARS,
            punctuate_lines: true,
        }
    }
}

impl NarrationNormalizer {
    /// Create a normalizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum narration length per scene.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.max(16);
        self
    }

    /// Set whether bare lines get a terminal full stop.
    pub fn with_punctuate_lines(mut self, punctuate: bool) -> Self {
        self.punctuate_lines = punctuate;
        self
    }

    /// Normalize text into individual cleaned lines.
    ///
    /// - Applies Unicode NFC
    /// - Normalizes line endings, including PowerPoint's vertical-tab breaks
    /// - Strips leading bullet glyphs
    /// - Collapses whitespace runs and drops empty lines
    pub fn normalize_to_lines(&self, text: &str) -> Vec<String> {
        let composed: String = text.nfc().collect();
        let unified = composed
            .replace("\r\n", "\n")
            .replace(['\r', '\u{000B}', '\u{2028}'], "\n");

        unified
            .lines()
            .map(|line| {
                let stripped = BULLET_PREFIX_REGEX.replace(line, "");
                WHITESPACE_COLLAPSE_REGEX
                    .replace_all(&stripped, " ")
                    .trim()
                    .to_string()
            })
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Normalize a block of slide text into one narration paragraph.
    pub fn normalize(&self, text: &str) -> String {
        let lines = self.normalize_to_lines(text);
        let mut result = String::new();

        for line in lines {
            let line = if self.punctuate_lines {
                punctuate(&line)
            } else {
                line
            };

            if let (Some(prev), Some(next)) = (result.chars().last(), line.chars().next()) {
                if !(is_cjk(prev) && is_cjk(next)) {
                    result.push(' ');
                }
            }
            result.push_str(&line);
        }

        self.truncate(&result)
    }

    /// Cut text down to the maximum length, preferring a word boundary.
    pub fn truncate(&self, text: &str) -> String {
        if text.chars().count() <= self.max_chars {
            return text.to_string();
        }

        let keep = self.max_chars.saturating_sub(3);
        let head: String = text.chars().take(keep).collect();
        let cut = match head.rfind(char::is_whitespace) {
            Some(pos) if pos > head.len() / 2 => &head[..pos],
            _ => head.as_str(),
        };

        format!("{}...", cut.trim_end())
    }
}

/// Add a full stop to a line that does not already end a sentence.
fn punctuate(line: &str) -> String {
    match line.chars().last() {
        Some(c) if TERMINAL_CHARS.contains(&c) || CONTINUATION_CHARS.contains(&c) => {
            line.to_string()
        }
        Some(c) if is_cjk(c) => format!("{}。", line),
        Some(_) => format!("{}.", line),
        None => String::new(),
    }
}
