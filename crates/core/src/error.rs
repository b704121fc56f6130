//! Error types for deck-to-video conversion.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a presentation into a video.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a local file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to parse the PPTX file structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// The presentation has no slides left to narrate.
    #[error("Presentation contains no slides to narrate")]
    EmptyPresentation,

    /// A required environment variable is missing.
    #[error("Missing environment variable {0}; set it in the environment or the .env file")]
    MissingEnv(String),

    /// A configuration value is present but unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The request never produced an HTTP response (connect, timeout, body read).
    #[error("HTTP transport error: {0}")]
    Http(String),

    /// A remote API answered with a non-success status or an unusable body.
    #[error("{service} API error (status {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// The remote service reported that video generation failed.
    #[error("Video generation failed: {0}")]
    VideoFailed(String),

    /// The video did not finish within the allowed time.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Slide rendering or probing through an external tool failed.
    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    /// Narration rewriting failed.
    #[error("Narration error: {0}")]
    Narration(String),
}

impl Error {
    /// Shorthand for an [`Error::Api`], used by the HTTP adapters.
    pub fn api(service: &'static str, status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            service,
            status,
            message: message.into(),
        }
    }

    /// Whether a request that failed with this error is worth repeating.
    ///
    /// Transport failures, rate limiting and server-side errors are retried;
    /// other API rejections (bad key, bad payload) are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
