//! Local tool integrations: slide rendering with LibreOffice and poppler,
//! and output verification with ffprobe.

pub mod libreoffice;
pub mod probe;
mod tool;

pub use libreoffice::LibreOfficeRenderer;
pub use probe::{probe_video, VideoProbe};
