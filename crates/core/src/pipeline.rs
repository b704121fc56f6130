//! The deck-to-video conversion pipeline.
//!
//! Runs strictly in order: rewrite narration, render and upload slide
//! images, submit the video, poll until it is ready, download it.

use crate::normalize::preview;
use crate::ports::{ScriptWriter, SlideRenderer, VideoService};
use crate::script::{NarrationScript, SegmentOrigin};
use crate::{
    Background, ConversionReport, Dimension, Error, Result, Scene, Settings, VideoRequest,
    VideoStatus,
};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

/// Tunables for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub dimension: Dimension,
    /// Background colour for scenes without a slide image.
    pub background_color: String,
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            dimension: Dimension::default(),
            background_color: "#FFFFFF".to_string(),
            poll_interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(30 * 60),
        }
    }
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            dimension: settings.video.dimension,
            background_color: settings.heygen.background_color.clone(),
            poll_interval: settings.video.poll_interval,
            max_wait: settings.video.max_wait,
        }
    }
}

/// Orchestrates one conversion against the configured collaborators.
pub struct Pipeline<'a> {
    video: &'a dyn VideoService,
    renderer: Option<&'a dyn SlideRenderer>,
    writer: Option<&'a dyn ScriptWriter>,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(video: &'a dyn VideoService, options: PipelineOptions) -> Self {
        Self {
            video,
            renderer: None,
            writer: None,
            options,
        }
    }

    /// Use slide images as scene backgrounds.
    pub fn with_renderer(mut self, renderer: &'a dyn SlideRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Rewrite slide-text narration before generation.
    pub fn with_writer(mut self, writer: &'a dyn ScriptWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Run the whole conversion and write the video to `output`.
    pub async fn run(
        &self,
        script: NarrationScript,
        input: &Path,
        output: &Path,
    ) -> Result<ConversionReport> {
        if script.is_empty() {
            return Err(Error::EmptyPresentation);
        }

        let script = self.rewrite(script).await;
        self.generate(&script, input, output).await
    }

    /// Produce the video for an already final script, without rewriting it.
    pub async fn generate(
        &self,
        script: &NarrationScript,
        input: &Path,
        output: &Path,
    ) -> Result<ConversionReport> {
        if script.is_empty() {
            return Err(Error::EmptyPresentation);
        }

        let assets = self.upload_slide_images(input, script).await?;
        let request = self.build_request(script, &assets);

        log::info!(
            "Submitting video '{}' with {} scenes",
            request.title,
            request.scenes.len()
        );
        let video_id = self.video.create_video(&request).await?;
        log::info!("Video created with id {}", video_id);

        let video_url = self.wait_for_video(&video_id).await?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes_written = self.video.download(&video_url, output).await?;
        log::info!("Saved {} bytes to {}", bytes_written, output.display());

        Ok(ConversionReport {
            video_id,
            video_url,
            output: output.to_path_buf(),
            title: request.title,
            slides_processed: request.scenes.len(),
            slides_with_images: assets.len(),
            bytes_written,
        })
    }

    /// Rewrite slide-text segments through the writer, if one is configured.
    ///
    /// Notes and placeholders are left alone. A failed rewrite keeps the
    /// normalized slide text.
    pub async fn rewrite(&self, mut script: NarrationScript) -> NarrationScript {
        let Some(writer) = self.writer else {
            return script;
        };

        for segment in script
            .segments
            .iter_mut()
            .filter(|s| s.origin == SegmentOrigin::SlideText)
        {
            match writer
                .write_narration(segment.slide_number, &segment.slide_text)
                .await
            {
                Ok(text) if !text.trim().is_empty() => {
                    segment.text = text.trim().to_string();
                    segment.origin = SegmentOrigin::Generated;
                }
                Ok(_) => log::warn!(
                    "Empty narration returned for slide {}, keeping slide text",
                    segment.slide_number
                ),
                Err(e) => log::warn!(
                    "Narration rewrite failed for slide {} ({}): {}",
                    segment.slide_number,
                    preview(&segment.slide_text, 50),
                    e
                ),
            }
        }

        script
    }

    /// Render slides and upload the images of narrated slides.
    ///
    /// Returns slide number to asset id. Slides whose image could not be
    /// rendered or uploaded are absent from the map.
    async fn upload_slide_images(
        &self,
        input: &Path,
        script: &NarrationScript,
    ) -> Result<HashMap<usize, String>> {
        let Some(renderer) = self.renderer else {
            return Ok(HashMap::new());
        };

        let images = renderer.render(input).await?;
        log::info!("Rendered {} slide images", images.len());

        let mut by_slide: HashMap<usize, _> = images
            .into_iter()
            .map(|image| (image.slide_number, image))
            .collect();

        let mut assets = HashMap::new();
        for segment in &script.segments {
            let Some(image) = by_slide.remove(&segment.slide_number) else {
                log::warn!("No image rendered for slide {}", segment.slide_number);
                continue;
            };

            match self.video.upload_asset(image.bytes, &image.file_name).await {
                Ok(asset_id) => {
                    log::info!(
                        "Uploaded {} as asset {}",
                        image.file_name,
                        asset_id
                    );
                    assets.insert(segment.slide_number, asset_id);
                }
                Err(e) => log::error!(
                    "Failed to upload image for slide {}: {}",
                    segment.slide_number,
                    e
                ),
            }
        }

        if assets.is_empty() {
            return Err(Error::ExternalTool {
                tool: "slide rendering".to_string(),
                message: "no slide image could be rendered and uploaded".to_string(),
            });
        }

        Ok(assets)
    }

    /// Map the script onto scenes, one per segment, in order.
    pub fn build_request(
        &self,
        script: &NarrationScript,
        assets: &HashMap<usize, String>,
    ) -> VideoRequest {
        let scenes = script
            .segments
            .iter()
            .map(|segment| Scene {
                slide_number: segment.slide_number,
                narration: segment.text.clone(),
                background: match assets.get(&segment.slide_number) {
                    Some(asset_id) => Background::Image {
                        asset_id: asset_id.clone(),
                    },
                    None => Background::Color(self.options.background_color.clone()),
                },
            })
            .collect();

        VideoRequest {
            title: script.title.clone(),
            dimension: self.options.dimension,
            scenes,
        }
    }

    /// Poll until the video is finished, returning its download URL.
    async fn wait_for_video(&self, video_id: &str) -> Result<String> {
        log::info!(
            "Waiting for video {}, checking every {:?}",
            video_id,
            self.options.poll_interval
        );
        let started = Instant::now();

        loop {
            match self.video.video_status(video_id).await? {
                VideoStatus::Completed { url } => return Ok(url),
                VideoStatus::Failed { error } => return Err(Error::VideoFailed(error)),
                status => {
                    let elapsed = started.elapsed();
                    if elapsed + self.options.poll_interval > self.options.max_wait {
                        return Err(Error::Timeout(format!(
                            "video {} not ready after {:?} (last status {:?})",
                            video_id, elapsed, status
                        )));
                    }
                    log::info!("Video status: {:?}, waiting...", status);
                    tokio::time::sleep(self.options.poll_interval).await;
                }
            }
        }
    }
}
