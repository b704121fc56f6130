//! Heygen API client.
//!
//! Implements the [`VideoService`] port: asset upload, multi-scene video
//! generation, status polling and download of the finished file.

use crate::models::{
    Character, Envelope, GenerateData, GenerateVideoRequest, StatusData, UploadData, VideoInput,
    Voice, WireBackground,
};
use async_trait::async_trait;
use deckcast_core::{Error, HeygenSettings, Result, RetryPolicy, VideoRequest, VideoService, VideoStatus};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const SERVICE: &str = "Heygen";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Client for the Heygen REST API.
pub struct HeygenClient {
    http: Client,
    settings: HeygenSettings,
    retry: RetryPolicy,
}

impl HeygenClient {
    /// Create a client from validated settings.
    pub fn new(settings: HeygenSettings, retry: RetryPolicy) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            settings,
            retry,
        })
    }

    /// Translate a [`VideoRequest`] into the generate payload.
    pub fn generate_payload(&self, request: &VideoRequest) -> GenerateVideoRequest {
        let video_inputs = request
            .scenes
            .iter()
            .map(|scene| VideoInput {
                character: Character::new(self.settings.character, &self.settings.avatar_id),
                voice: Voice::Text {
                    input_text: scene.narration.clone(),
                    voice_id: self.settings.voice_id.clone(),
                },
                background: WireBackground::from(&scene.background),
            })
            .collect();

        GenerateVideoRequest {
            video_inputs,
            dimension: request.dimension,
            title: request.title.clone(),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("X-Api-Key", &self.settings.api_key)
            .header("Accept", "application/json")
    }
}

#[async_trait]
impl VideoService for HeygenClient {
    async fn upload_asset(&self, bytes: Vec<u8>, file_name: &str) -> Result<String> {
        let url = format!("{}/v1/asset", self.settings.upload_base);
        let mime = guess_mime(file_name);
        log::debug!("Uploading {} ({}, {} bytes)", file_name, mime, bytes.len());

        let envelope: Envelope<UploadData> = self
            .retry
            .run("Heygen asset upload", || {
                execute(
                    self.authorized(self.http.post(&url))
                        .header("Content-Type", mime)
                        .body(bytes.clone()),
                )
            })
            .await?;

        envelope
            .into_data("asset upload")?
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::api(SERVICE, 200, format!("upload of {} returned no asset id", file_name))
            })
    }

    async fn create_video(&self, request: &VideoRequest) -> Result<String> {
        let url = format!("{}/v2/video/generate", self.settings.api_base);
        let payload = self.generate_payload(request);

        let envelope: Envelope<GenerateData> = self
            .retry
            .run("Heygen video generate", || {
                execute(self.authorized(self.http.post(&url)).json(&payload))
            })
            .await?;

        envelope
            .into_data("video generate")?
            .video_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::api(SERVICE, 200, "video generate returned no video_id"))
    }

    async fn video_status(&self, video_id: &str) -> Result<VideoStatus> {
        let url = format!("{}/v1/video_status.get", self.settings.api_base);

        let envelope: Envelope<StatusData> = self
            .retry
            .run("Heygen video status", || {
                execute(
                    self.authorized(self.http.get(&url))
                        .query(&[("video_id", video_id)]),
                )
            })
            .await?;

        envelope.into_data("video status")?.into_status()
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        self.retry
            .run("video download", || download_to(&self.http, url, dest))
            .await
    }
}

/// Send a request and decode a JSON body, mapping failures onto [`Error`].
async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await.map_err(transport)?;
    let status = response.status();
    let body = response.text().await.map_err(transport)?;

    if !status.is_success() {
        return Err(Error::api(SERVICE, status.as_u16(), error_message(&body)));
    }

    serde_json::from_str(&body).map_err(|e| {
        Error::api(
            SERVICE,
            status.as_u16(),
            format!("unexpected response body: {}", e),
        )
    })
}

/// Stream a file to disk, returning the number of bytes written.
///
/// The body lands in a temporary file beside `dest` that replaces `dest`
/// only once the whole body has arrived.
async fn download_to(http: &Client, url: &str, dest: &Path) -> Result<u64> {
    let mut response = http.get(url).send().await.map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::api(SERVICE, status.as_u16(), error_message(&body)));
    }

    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let partial = tempfile::Builder::new()
        .prefix(".deckcast-")
        .suffix(".part")
        .tempfile_in(dir)?;

    let mut file = tokio::fs::File::from_std(partial.reopen()?);
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(transport)? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    partial.persist(dest).map_err(|e| Error::IoError(e.error))?;
    Ok(written)
}

fn transport(e: reqwest::Error) -> Error {
    Error::Http(e.to_string())
}

/// Pull a readable message out of an error body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let candidate = value
            .get("error")
            .filter(|e| !e.is_null())
            .or_else(|| value.get("message"));
        if let Some(found) = candidate {
            return crate::models::describe_error(found);
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.chars().take(300).collect()
    }
}

/// MIME type for an uploaded file, by extension. Defaults to PNG.
pub fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckcast_core::{Background, CharacterKind, Dimension, Scene};
    use std::sync::{Arc, Mutex};
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    fn settings() -> HeygenSettings {
        settings_for("https://api.heygen.com", "https://upload.heygen.com")
    }

    fn settings_for(api_base: &str, upload_base: &str) -> HeygenSettings {
        HeygenSettings {
            api_key: "hg_test".into(),
            avatar_id: "photo-1".into(),
            voice_id: "voice-1".into(),
            character: CharacterKind::TalkingPhoto,
            api_base: api_base.into(),
            upload_base: upload_base.into(),
            background_color: "#FFFFFF".into(),
        }
    }

    /// Local HTTP server answering one canned response per connection.
    struct TestServer {
        base: String,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl TestServer {
        async fn start(responses: Vec<String>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let requests = Arc::new(Mutex::new(Vec::new()));

            let log = requests.clone();
            tokio::spawn(async move {
                for response in responses {
                    let (mut stream, _) = listener.accept().await.unwrap();
                    let request = read_request(&mut stream).await;
                    log.lock().unwrap().push(request);
                    stream.write_all(response.as_bytes()).await.unwrap();
                    stream.shutdown().await.ok();
                }
            });

            Self { base, requests }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        fn client(&self, retry: RetryPolicy) -> HeygenClient {
            HeygenClient::new(settings_for(&self.base, &self.base), retry).unwrap()
        }
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn respond(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    fn one_scene_request() -> VideoRequest {
        VideoRequest {
            title: "Deck".into(),
            dimension: Dimension::default(),
            scenes: vec![Scene {
                slide_number: 1,
                narration: "One.".into(),
                background: Background::Color("#FFFFFF".into()),
            }],
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::default().with_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_generate_payload_keeps_scene_order() {
        let client = HeygenClient::new(settings(), RetryPolicy::none()).unwrap();
        let request = VideoRequest {
            title: "Deck".into(),
            dimension: Dimension::default(),
            scenes: vec![
                Scene {
                    slide_number: 1,
                    narration: "One.".into(),
                    background: Background::Image {
                        asset_id: "a1".into(),
                    },
                },
                Scene {
                    slide_number: 2,
                    narration: "Two.".into(),
                    background: Background::Color("#FFFFFF".into()),
                },
            ],
        };

        let value = serde_json::to_value(client.generate_payload(&request)).unwrap();
        let inputs = value["video_inputs"].as_array().unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0]["voice"]["input_text"], "One.");
        assert_eq!(inputs[0]["background"]["image_asset_id"], "a1");
        assert_eq!(inputs[1]["voice"]["input_text"], "Two.");
        assert_eq!(inputs[1]["background"]["type"], "color");
        assert_eq!(inputs[1]["character"]["talking_photo_id"], "photo-1");
        assert_eq!(value["title"], "Deck");
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("slide_1.png"), "image/png");
        assert_eq!(guess_mime("slide_1.JPG"), "image/jpeg");
        assert_eq!(guess_mime("clip.mp4"), "video/mp4");
        assert_eq!(guess_mime("no_extension"), "image/png");
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"code":400,"error":{"message":"invalid voice_id"}}"#),
            "invalid voice_id"
        );
        assert_eq!(
            error_message(r#"{"error":null,"message":"Unauthorized"}"#),
            "Unauthorized"
        );
        assert_eq!(error_message("  "), "empty response body");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_create_video_sends_key_and_payload() {
        let server = TestServer::start(vec![respond(
            "200 OK",
            r#"{"code":100,"data":{"video_id":"vid-1"},"error":null}"#,
        )])
        .await;

        let video_id = server
            .client(RetryPolicy::none())
            .create_video(&one_scene_request())
            .await
            .unwrap();
        assert_eq!(video_id, "vid-1");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("POST /v2/video/generate "));
        assert!(requests[0].to_lowercase().contains("x-api-key: hg_test"));
        assert!(requests[0].contains(r#""input_text":"One.""#));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = TestServer::start(vec![
            respond("503 Service Unavailable", r#"{"error":{"message":"busy"}}"#),
            respond("429 Too Many Requests", r#"{"message":"slow down"}"#),
            respond("200 OK", r#"{"data":{"video_id":"vid-2"}}"#),
        ])
        .await;

        let video_id = server
            .client(fast_retry())
            .create_video(&one_scene_request())
            .await
            .unwrap();

        assert_eq!(video_id, "vid-2");
        assert_eq!(server.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_client_errors_fail_immediately() {
        let server = TestServer::start(vec![
            respond("400 Bad Request", r#"{"error":{"message":"invalid voice_id"}}"#),
            respond("200 OK", r#"{"data":{"video_id":"never"}}"#),
        ])
        .await;

        let err = server
            .client(fast_retry())
            .create_video(&one_scene_request())
            .await
            .unwrap_err();

        match err {
            Error::Api {
                status, message, ..
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid voice_id");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_body_is_an_api_error() {
        let server = TestServer::start(vec![respond("200 OK", "<html>maintenance</html>")]).await;

        let err = server
            .client(RetryPolicy::none())
            .video_status("vid-1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_video_status_query() {
        let server = TestServer::start(vec![respond(
            "200 OK",
            r#"{"data":{"status":"completed","video_url":"https://cdn.example/v.mp4"}}"#,
        )])
        .await;

        let status = server
            .client(RetryPolicy::none())
            .video_status("vid-1")
            .await
            .unwrap();
        assert_eq!(
            status,
            VideoStatus::Completed {
                url: "https://cdn.example/v.mp4".into()
            }
        );
        assert!(server.requests()[0].starts_with("GET /v1/video_status.get?video_id=vid-1 "));
    }

    #[tokio::test]
    async fn test_upload_asset_sends_raw_bytes() {
        let server = TestServer::start(vec![respond(
            "200 OK",
            r#"{"code":100,"data":{"id":"asset-7"}}"#,
        )])
        .await;

        let asset_id = server
            .client(RetryPolicy::none())
            .upload_asset(b"PNGDATA".to_vec(), "slide_1.png")
            .await
            .unwrap();
        assert_eq!(asset_id, "asset-7");

        let request = &server.requests()[0];
        assert!(request.starts_with("POST /v1/asset "));
        assert!(request.to_lowercase().contains("content-type: image/png"));
        assert!(request.ends_with("PNGDATA"));
    }

    #[tokio::test]
    async fn test_download_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("lesson.mp4");
        let server = TestServer::start(vec![respond("200 OK", "video-bytes")]).await;

        let written = server
            .client(RetryPolicy::none())
            .download(&format!("{}/v.mp4", server.base), &dest)
            .await
            .unwrap();

        assert_eq!(written, 11);
        assert_eq!(std::fs::read(&dest).unwrap(), b"video-bytes");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_truncated_download_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("lesson.mp4");
        let truncated = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: 100000\r\nConnection: close\r\n\r\n{}",
            "x".repeat(5000)
        );
        let server = TestServer::start(vec![truncated]).await;

        let err = server
            .client(RetryPolicy::none())
            .download(&format!("{}/v.mp4", server.base), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
