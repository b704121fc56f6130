//! Core domain types, narration scripting, configuration and the conversion
//! pipeline for turning a slide deck into a narrated avatar video.

pub mod config;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod ports;
pub mod retry;
pub mod script;
pub mod types;

pub use config::{CharacterKind, HeygenSettings, OpenAiSettings, Settings, VideoSettings};
pub use error::{Error, Result};
pub use normalize::NarrationNormalizer;
pub use pipeline::{Pipeline, PipelineOptions};
pub use ports::{ScriptWriter, SlideRenderer, VideoService};
pub use retry::RetryPolicy;
pub use script::{NarrationScript, NarrationSegment, NarrationSource, ScriptBuilder, SegmentOrigin};
pub use types::{
    Background, ConversionReport, Dimension, Position, Presentation, PresentationFormat, Scene,
    Slide, SlideImage, TextBlock, VideoRequest, VideoStatus,
};
