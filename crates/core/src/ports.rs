//! Boundaries to the external collaborators of the pipeline.
//!
//! Each trait is implemented by an adapter crate (Heygen, OpenAI,
//! LibreOffice) and by in-memory doubles in tests.

use crate::{Result, SlideImage, VideoRequest, VideoStatus};
use async_trait::async_trait;
use std::path::Path;

/// Remote avatar video service.
#[async_trait]
pub trait VideoService: Send + Sync {
    /// Upload an image and return the service's asset id.
    async fn upload_asset(&self, bytes: Vec<u8>, file_name: &str) -> Result<String>;

    /// Submit a video for generation and return its id.
    async fn create_video(&self, request: &VideoRequest) -> Result<String>;

    /// Fetch the current status of a video.
    async fn video_status(&self, video_id: &str) -> Result<VideoStatus>;

    /// Download a finished video to `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Rewrites raw slide text into narration.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    async fn write_narration(&self, slide_number: usize, slide_text: &str) -> Result<String>;
}

/// Rasterises the slides of a deck.
#[async_trait]
pub trait SlideRenderer: Send + Sync {
    /// Render every slide of `input`, in slide order.
    async fn render(&self, input: &Path) -> Result<Vec<SlideImage>>;
}
