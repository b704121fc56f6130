//! Wire types for the Heygen REST API.

use deckcast_core::{Background, CharacterKind, Dimension, Error, Result, VideoStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Presenter size relative to the frame.
pub const AVATAR_SCALE: f32 = 0.33;
/// Presenter offset from the frame centre, as a fraction of the frame.
pub const AVATAR_OFFSET: f32 = 0.42;

/// Body of `POST /v2/video/generate`.
#[derive(Debug, Serialize)]
pub struct GenerateVideoRequest {
    pub video_inputs: Vec<VideoInput>,
    pub dimension: Dimension,
    pub title: String,
}

/// One scene of a generated video.
#[derive(Debug, Serialize)]
pub struct VideoInput {
    pub character: Character,
    pub voice: Voice,
    pub background: WireBackground,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

/// The presenter shown in a scene.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Character {
    TalkingPhoto {
        talking_photo_id: String,
        scale: f32,
        offset: Offset,
    },
    Avatar {
        avatar_id: String,
        avatar_style: String,
        scale: f32,
        offset: Offset,
    },
}

impl Character {
    /// Build the presenter for the configured character kind.
    pub fn new(kind: CharacterKind, id: &str) -> Self {
        let offset = Offset {
            x: AVATAR_OFFSET,
            y: AVATAR_OFFSET,
        };
        match kind {
            CharacterKind::TalkingPhoto => Character::TalkingPhoto {
                talking_photo_id: id.to_string(),
                scale: AVATAR_SCALE,
                offset,
            },
            CharacterKind::Avatar => Character::Avatar {
                avatar_id: id.to_string(),
                avatar_style: "normal".to_string(),
                scale: AVATAR_SCALE,
                offset,
            },
        }
    }
}

/// Text-to-speech voice for a scene.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Voice {
    Text { input_text: String, voice_id: String },
}

/// Scene background.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireBackground {
    Color { value: String },
    Image { image_asset_id: String },
}

impl From<&Background> for WireBackground {
    fn from(background: &Background) -> Self {
        match background {
            Background::Color(value) => WireBackground::Color {
                value: value.clone(),
            },
            Background::Image { asset_id } => WireBackground::Image {
                image_asset_id: asset_id.clone(),
            },
        }
    }
}

/// Common response wrapper: `{ "code": ..., "data": {...}, "error": ... }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// The `data` payload, or an API error explaining why it is missing.
    pub fn into_data(self, what: &str) -> Result<T> {
        match self.data {
            Some(data) => Ok(data),
            None => Err(Error::api(
                "Heygen",
                200,
                format!(
                    "response to {} carried no data: {}",
                    what,
                    self.error
                        .as_ref()
                        .map(describe_error)
                        .or(self.message)
                        .unwrap_or_else(|| "no details".to_string())
                ),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadData {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateData {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusData {
    pub status: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl StatusData {
    /// Map the service's status vocabulary onto [`VideoStatus`].
    pub fn into_status(self) -> Result<VideoStatus> {
        match self.status.as_str() {
            "completed" | "success" => match self.video_url {
                Some(url) if !url.is_empty() => Ok(VideoStatus::Completed { url }),
                _ => Err(Error::api(
                    "Heygen",
                    200,
                    "video reported complete without a video_url",
                )),
            },
            "failed" | "error" => Ok(VideoStatus::Failed {
                error: self
                    .error
                    .as_ref()
                    .map(describe_error)
                    .unwrap_or_else(|| "unknown error".to_string()),
            }),
            "pending" | "waiting" => Ok(VideoStatus::Pending),
            other => Ok(VideoStatus::Processing(other.to_string())),
        }
    }
}

/// Turn an error value (string or `{ "message": ... }` object) into text.
pub fn describe_error(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("detail"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        Value::Null => "unknown error".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_talking_photo_scene_shape() {
        let input = VideoInput {
            character: Character::new(CharacterKind::TalkingPhoto, "photo-1"),
            voice: Voice::Text {
                input_text: "Hello class.".into(),
                voice_id: "voice-1".into(),
            },
            background: WireBackground::from(&Background::Image {
                asset_id: "asset-9".into(),
            }),
        };

        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["character"]["type"], "talking_photo");
        assert_eq!(value["character"]["talking_photo_id"], "photo-1");
        assert_eq!(value["character"]["offset"]["x"].as_f64().unwrap() as f32, 0.42);
        assert_eq!(
            value["voice"],
            json!({"type": "text", "input_text": "Hello class.", "voice_id": "voice-1"})
        );
        assert_eq!(
            value["background"],
            json!({"type": "image", "image_asset_id": "asset-9"})
        );
    }

    #[test]
    fn test_avatar_and_color_background() {
        let character = serde_json::to_value(Character::new(CharacterKind::Avatar, "av-1")).unwrap();
        assert_eq!(character["type"], "avatar");
        assert_eq!(character["avatar_id"], "av-1");
        assert_eq!(character["avatar_style"], "normal");

        let background =
            serde_json::to_value(WireBackground::from(&Background::Color("#FFFFFF".into())))
                .unwrap();
        assert_eq!(background, json!({"type": "color", "value": "#FFFFFF"}));
    }

    #[test]
    fn test_request_dimension() {
        let request = GenerateVideoRequest {
            video_inputs: vec![],
            dimension: Dimension::default(),
            title: "Deck".into(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["dimension"], json!({"width": 1280, "height": 720}));
    }

    #[test]
    fn test_status_mapping() {
        let parse = |v: Value| {
            serde_json::from_value::<StatusData>(v)
                .unwrap()
                .into_status()
        };

        assert_eq!(
            parse(json!({"status": "completed", "video_url": "https://x/v.mp4"})).unwrap(),
            VideoStatus::Completed {
                url: "https://x/v.mp4".into()
            }
        );
        assert_eq!(
            parse(json!({"status": "failed", "error": {"code": 40001, "message": "bad voice"}}))
                .unwrap(),
            VideoStatus::Failed {
                error: "bad voice".into()
            }
        );
        assert_eq!(
            parse(json!({"status": "error"})).unwrap(),
            VideoStatus::Failed {
                error: "unknown error".into()
            }
        );
        assert_eq!(parse(json!({"status": "waiting"})).unwrap(), VideoStatus::Pending);
        assert_eq!(
            parse(json!({"status": "processing"})).unwrap(),
            VideoStatus::Processing("processing".into())
        );
        assert!(parse(json!({"status": "completed"})).is_err());
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: Envelope<GenerateData> =
            serde_json::from_value(json!({"data": null, "error": {"message": "quota exceeded"}}))
                .unwrap();
        let err = envelope.into_data("generate").unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_describe_error() {
        assert_eq!(describe_error(&json!("boom")), "boom");
        assert_eq!(describe_error(&json!({"detail": "bad"})), "bad");
        assert_eq!(describe_error(&json!({"code": 1})), r#"{"code":1}"#);
        assert_eq!(describe_error(&Value::Null), "unknown error");
    }
}
