//! Runtime configuration read from the environment and `.env` files.
//!
//! Everything is resolved and validated up front so that a missing or
//! malformed credential stops the run before any request leaves the machine.

use crate::{Dimension, Error, Result, RetryPolicy};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const HEYGEN_API_KEY: &str = "HEYGEN_API_KEY";
pub const HEYGEN_AVATAR_ID: &str = "HEYGEN_AVATAR_ID";
pub const HEYGEN_VOICE_ID: &str = "HEYGEN_VOICE_ID";
pub const HEYGEN_CHARACTER_TYPE: &str = "HEYGEN_CHARACTER_TYPE";
pub const HEYGEN_API_BASE: &str = "HEYGEN_API_BASE";
pub const HEYGEN_UPLOAD_BASE: &str = "HEYGEN_UPLOAD_BASE";
pub const HEYGEN_BACKGROUND_COLOR: &str = "HEYGEN_BACKGROUND_COLOR";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const OPENAI_API_BASE: &str = "OPENAI_API_BASE";
pub const POLL_INTERVAL_SECS: &str = "DECKCAST_POLL_INTERVAL_SECS";
pub const MAX_WAIT_SECS: &str = "DECKCAST_MAX_WAIT_SECS";
pub const RETRY_ATTEMPTS: &str = "DECKCAST_RETRY_ATTEMPTS";
pub const VIDEO_WIDTH: &str = "DECKCAST_VIDEO_WIDTH";
pub const VIDEO_HEIGHT: &str = "DECKCAST_VIDEO_HEIGHT";

const DEFAULT_HEYGEN_API_BASE: &str = "https://api.heygen.com";
const DEFAULT_HEYGEN_UPLOAD_BASE: &str = "https://upload.heygen.com";
const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_BACKGROUND_COLOR: &str = "#FFFFFF";

/// Values people leave in `.env` templates instead of a real key.
const PLACEHOLDER_KEYS: &[&str] = &[
    "your_api_key",
    "your-api-key",
    "your_api_key_here",
    "changeme",
    "change_me",
    "replace_me",
    "xxx",
];

/// Load a `.env` file into the process environment.
///
/// With an explicit path the file must exist; otherwise a `.env` in the
/// working directory (or any parent) is used when present.
pub fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenv::from_path(path).map_err(|e| {
                Error::InvalidConfig(format!("cannot load {}: {}", path.display(), e))
            })?;
            log::debug!("Loaded environment from {}", path.display());
        }
        None => match dotenv::dotenv() {
            Ok(found) => log::debug!("Loaded environment from {}", found.display()),
            Err(e) if e.not_found() => log::debug!("No .env file found"),
            Err(e) => return Err(Error::InvalidConfig(format!("cannot load .env: {}", e))),
        },
    }
    Ok(())
}

/// Check that an API key looks usable before it is sent anywhere.
pub fn validate_api_key(name: &str, value: &str) -> Result<String> {
    let key = value.trim();
    if key.is_empty() {
        return Err(Error::MissingEnv(name.to_string()));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control() || !c.is_ascii()) {
        return Err(Error::InvalidConfig(format!(
            "{} contains whitespace or non-ASCII characters",
            name
        )));
    }
    let lowered = key.to_lowercase();
    if PLACEHOLDER_KEYS.contains(&lowered.as_str()) || (key.starts_with('<') && key.ends_with('>'))
    {
        return Err(Error::InvalidConfig(format!(
            "{} still holds a placeholder value",
            name
        )));
    }
    Ok(key.to_string())
}

/// How the presenter appears in each scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterKind {
    /// A photo animated into a talking head (`talking_photo_id`).
    #[default]
    TalkingPhoto,
    /// A stock or custom studio avatar (`avatar_id`).
    Avatar,
}

impl FromStr for CharacterKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "talking_photo" | "talking-photo" | "photo" => Ok(Self::TalkingPhoto),
            "avatar" => Ok(Self::Avatar),
            other => Err(format!(
                "unknown character type '{}', expected talking_photo or avatar",
                other
            )),
        }
    }
}

/// Heygen credentials and presenter selection.
#[derive(Clone)]
pub struct HeygenSettings {
    pub api_key: String,
    pub avatar_id: String,
    pub voice_id: String,
    pub character: CharacterKind,
    pub api_base: String,
    pub upload_base: String,
    /// Scene background used when a slide has no image.
    pub background_color: String,
}

impl fmt::Debug for HeygenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeygenSettings")
            .field("api_key", &"<redacted>")
            .field("avatar_id", &self.avatar_id)
            .field("voice_id", &self.voice_id)
            .field("character", &self.character)
            .field("api_base", &self.api_base)
            .field("upload_base", &self.upload_base)
            .field("background_color", &self.background_color)
            .finish()
    }
}

/// OpenAI credentials for narration rewriting.
#[derive(Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

impl fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Output and polling parameters.
#[derive(Debug, Clone)]
pub struct VideoSettings {
    pub dimension: Dimension,
    pub poll_interval: Duration,
    /// Give up waiting for the remote render after this long.
    pub max_wait: Duration,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            dimension: Dimension::default(),
            poll_interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(30 * 60),
        }
    }
}

/// All configuration for a conversion run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub heygen: HeygenSettings,
    /// Present only when `OPENAI_API_KEY` is set.
    pub openai: Option<OpenAiSettings>,
    pub video: VideoSettings,
    pub retry: RetryPolicy,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |name: &str| get(name).ok_or_else(|| Error::MissingEnv(name.to_string()));

        let heygen = HeygenSettings {
            api_key: validate_api_key(HEYGEN_API_KEY, &require(HEYGEN_API_KEY)?)?,
            avatar_id: require(HEYGEN_AVATAR_ID)?,
            voice_id: require(HEYGEN_VOICE_ID)?,
            character: match get(HEYGEN_CHARACTER_TYPE) {
                Some(raw) => raw.parse().map_err(Error::InvalidConfig)?,
                None => CharacterKind::default(),
            },
            api_base: base_url(HEYGEN_API_BASE, get(HEYGEN_API_BASE), DEFAULT_HEYGEN_API_BASE)?,
            upload_base: base_url(
                HEYGEN_UPLOAD_BASE,
                get(HEYGEN_UPLOAD_BASE),
                DEFAULT_HEYGEN_UPLOAD_BASE,
            )?,
            background_color: get(HEYGEN_BACKGROUND_COLOR)
                .unwrap_or_else(|| DEFAULT_BACKGROUND_COLOR.to_string()),
        };

        let openai = match get(OPENAI_API_KEY) {
            Some(key) => Some(OpenAiSettings {
                api_key: validate_api_key(OPENAI_API_KEY, &key)?,
                model: get(OPENAI_MODEL).unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                api_base: base_url(OPENAI_API_BASE, get(OPENAI_API_BASE), DEFAULT_OPENAI_API_BASE)?,
            }),
            None => None,
        };

        let defaults = VideoSettings::default();
        let video = VideoSettings {
            dimension: Dimension {
                width: parse_number(VIDEO_WIDTH, get(VIDEO_WIDTH))?
                    .unwrap_or(defaults.dimension.width),
                height: parse_number(VIDEO_HEIGHT, get(VIDEO_HEIGHT))?
                    .unwrap_or(defaults.dimension.height),
            },
            poll_interval: parse_number(POLL_INTERVAL_SECS, get(POLL_INTERVAL_SECS))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            max_wait: parse_number(MAX_WAIT_SECS, get(MAX_WAIT_SECS))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_wait),
        };

        let retry = match parse_number::<usize>(RETRY_ATTEMPTS, get(RETRY_ATTEMPTS))? {
            Some(attempts) => RetryPolicy::default().with_max_attempts(attempts),
            None => RetryPolicy::default(),
        };

        Ok(Self {
            heygen,
            openai,
            video,
            retry,
        })
    }

    /// OpenAI settings, or an error naming the missing key.
    pub fn require_openai(&self) -> Result<&OpenAiSettings> {
        self.openai
            .as_ref()
            .ok_or_else(|| Error::MissingEnv(OPENAI_API_KEY.to_string()))
    }
}

fn base_url(name: &str, value: Option<String>, default: &str) -> Result<String> {
    let url = value.unwrap_or_else(|| default.to_string());
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(Error::InvalidConfig(format!(
            "{} must be an http(s) URL, got '{}'",
            name, url
        )));
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn parse_number<T>(name: &str, value: Option<String>) -> Result<Option<T>>
where
    T: FromStr + PartialOrd + Default,
{
    match value {
        None => Ok(None),
        Some(raw) => match raw.parse::<T>() {
            Ok(n) if n > T::default() => Ok(Some(n)),
            _ => Err(Error::InvalidConfig(format!(
                "{} must be a positive integer, got '{}'",
                name, raw
            ))),
        },
    }
}
