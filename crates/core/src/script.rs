//! Narration script building.
//!
//! Turns extracted slides into one narration segment per scene. Each segment
//! remembers where its words came from so later stages (rewriting, reporting)
//! can treat speaker notes, slide text and placeholders differently.

use crate::normalize::NarrationNormalizer;
use crate::{Error, Presentation, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Narration spoken for a slide that has no usable text.
pub fn placeholder_narration(slide_number: usize) -> String {
    format!(
        "This is slide {}, which mainly presents visual content.",
        slide_number
    )
}

/// Which slide content the narration is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationSource {
    /// Speaker notes when present, slide text otherwise.
    #[default]
    Auto,
    /// Speaker notes only.
    Notes,
    /// Visible slide text only.
    SlideText,
}

impl FromStr for NarrationSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "notes" => Ok(Self::Notes),
            "text" | "slide-text" | "slide_text" => Ok(Self::SlideText),
            other => Err(format!(
                "unknown narration source '{}', expected auto, notes or text",
                other
            )),
        }
    }
}

/// Where a segment's narration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentOrigin {
    Notes,
    SlideText,
    Placeholder,
    /// Rewritten by a language model.
    Generated,
}

impl fmt::Display for SegmentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SegmentOrigin::Notes => "notes",
            SegmentOrigin::SlideText => "slide text",
            SegmentOrigin::Placeholder => "placeholder",
            SegmentOrigin::Generated => "generated",
        };
        f.write_str(label)
    }
}

/// Narration for a single slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationSegment {
    /// 1-based number of the slide narrated.
    pub slide_number: usize,

    /// Text the avatar will speak.
    pub text: String,

    pub origin: SegmentOrigin,

    /// Raw visible slide text, kept for rewriting.
    pub slide_text: String,
}

/// The narration for a whole deck, one segment per scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationScript {
    pub title: String,
    pub segments: Vec<NarrationSegment>,
}

impl NarrationScript {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render the script as plain text, one block per slide separated by blank lines.
    ///
    /// # Example output
    /// ```text
    /// # Quarterly Review
    ///
    /// [Slide 1 - slide text]
    /// Quarterly results. Revenue up 12%.
    ///
    /// [Slide 2 - placeholder]
    /// This is slide 2, which mainly presents visual content.
    /// ```
    pub fn to_text(&self) -> String {
        let mut blocks = vec![format!("# {}", self.title)];
        blocks.extend(self.segments.iter().map(|segment| {
            format!(
                "[Slide {} - {}]\n{}",
                segment.slide_number, segment.origin, segment.text
            )
        }));

        format!("{}\n", blocks.join("\n\n"))
    }
}

/// Builds a [`NarrationScript`] from an extracted presentation.
#[derive(Debug, Clone, Default)]
pub struct ScriptBuilder {
    source: NarrationSource,
    skip_empty: bool,
    skip_hidden: bool,
    max_slides: Option<usize>,
    normalizer: NarrationNormalizer,
}

impl ScriptBuilder {
    /// Create a builder that narrates every slide from notes or slide text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose which slide content to narrate.
    pub fn with_source(mut self, source: NarrationSource) -> Self {
        self.source = source;
        self
    }

    /// Drop slides without text instead of narrating a placeholder.
    pub fn with_skip_empty(mut self, skip: bool) -> Self {
        self.skip_empty = skip;
        self
    }

    /// Leave out slides marked hidden in the deck.
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Only narrate the first `max` slides.
    pub fn with_max_slides(mut self, max: Option<usize>) -> Self {
        self.max_slides = max.filter(|m| *m > 0);
        self
    }

    pub fn with_normalizer(mut self, normalizer: NarrationNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Build the script.
    ///
    /// Fails with [`Error::EmptyPresentation`] when no slide is left to narrate.
    pub fn build(&self, presentation: &Presentation, title: &str) -> Result<NarrationScript> {
        let limit = self.max_slides.unwrap_or(usize::MAX);
        let mut segments = Vec::new();

        for slide in presentation.slides.iter().take(limit) {
            if self.skip_hidden && slide.hidden {
                log::debug!("Skipping hidden slide {}", slide.number);
                continue;
            }

            let slide_text = slide.text();
            let notes = slide.notes_text();

            let candidate = match self.source {
                NarrationSource::Auto => notes
                    .map(|n| (n.to_string(), SegmentOrigin::Notes))
                    .or_else(|| {
                        slide
                            .has_text()
                            .then(|| (slide_text.clone(), SegmentOrigin::SlideText))
                    }),
                NarrationSource::Notes => notes.map(|n| (n.to_string(), SegmentOrigin::Notes)),
                NarrationSource::SlideText => slide
                    .has_text()
                    .then(|| (slide_text.clone(), SegmentOrigin::SlideText)),
            };

            let narrated = candidate
                .map(|(raw, origin)| (self.normalizer.normalize(&raw), origin))
                .filter(|(text, _)| !text.is_empty());

            let (text, origin) = match narrated {
                Some(found) => found,
                None if self.skip_empty => {
                    log::debug!("Skipping slide {} without narration text", slide.number);
                    continue;
                }
                None => (
                    placeholder_narration(slide.number),
                    SegmentOrigin::Placeholder,
                ),
            };

            segments.push(NarrationSegment {
                slide_number: slide.number,
                text,
                origin,
                slide_text,
            });
        }

        if segments.is_empty() {
            return Err(Error::EmptyPresentation);
        }

        log::info!(
            "Built narration for {} of {} slides",
            segments.len(),
            presentation.slides.len()
        );

        Ok(NarrationScript {
            title: title.to_string(),
            segments,
        })
    }
}
