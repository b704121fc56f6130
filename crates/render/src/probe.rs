//! Output verification using ffprobe.
//!
//! Confirms that a downloaded video is a readable container with a video
//! stream, and reports its duration and frame size.

use crate::tool::run_tool;
use deckcast_core::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::ffi::OsStr;
use std::path::Path;

/// Summary of a probed video file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoProbe {
    pub format_name: String,
    pub duration_secs: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
}

impl VideoProbe {
    /// True when the file has a video stream and a positive duration.
    pub fn is_playable(&self) -> bool {
        self.video_codec.is_some() && self.duration_secs.is_some_and(|d| d > 0.0)
    }
}

/// Probe a video with the `ffprobe` found in PATH.
pub async fn probe_video(path: &Path) -> Result<VideoProbe> {
    probe_video_with(Path::new("ffprobe"), path).await
}

/// Probe a video with a specific ffprobe executable.
pub async fn probe_video_with(ffprobe: &Path, path: &Path) -> Result<VideoProbe> {
    if !path.exists() {
        return Err(Error::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    log::debug!("Probing {}", path.display());

    let args = [
        OsStr::new("-v"),
        OsStr::new("error"),
        OsStr::new("-print_format"),
        OsStr::new("json"),
        OsStr::new("-show_format"),
        OsStr::new("-show_streams"),
        path.as_os_str(),
    ];
    let output = run_tool(ffprobe, &args).await?;

    let json: Value = serde_json::from_slice(&output.stdout).map_err(|e| Error::ExternalTool {
        tool: "ffprobe".to_string(),
        message: format!("unreadable JSON output: {}", e),
    })?;

    parse_probe_json(&json)
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_probe_json(json: &Value) -> Result<VideoProbe> {
    let format = json.get("format").ok_or_else(|| Error::ExternalTool {
        tool: "ffprobe".to_string(),
        message: "output has no format section".to_string(),
    })?;

    let mut probe = VideoProbe {
        format_name: format
            .get("format_name")
            .and_then(|f| f.as_str())
            .unwrap_or("unknown")
            .to_string(),
        // ffprobe reports durations as decimal strings
        duration_secs: format
            .get("duration")
            .and_then(|d| d.as_str())
            .and_then(|d| d.parse().ok()),
        ..Default::default()
    };

    let streams = json
        .get("streams")
        .and_then(|s| s.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    for stream in streams {
        let codec = stream
            .get("codec_name")
            .and_then(|c| c.as_str())
            .map(|s| s.to_string());

        match stream.get("codec_type").and_then(|t| t.as_str()) {
            Some("video") if probe.video_codec.is_none() => {
                probe.video_codec = codec;
                probe.width = stream
                    .get("width")
                    .and_then(|w| w.as_u64())
                    .map(|w| w as u32);
                probe.height = stream
                    .get("height")
                    .and_then(|h| h.as_u64())
                    .map(|h| h as u32);
            }
            Some("audio") if probe.audio_codec.is_none() => {
                probe.audio_codec = codec;
            }
            _ => {}
        }
    }

    Ok(probe)
}
