//! OpenAI narration writer.
//!
//! Implements the [`ScriptWriter`] port with the chat completions API,
//! asking the model to narrate each slide as a virtual teacher.

use async_trait::async_trait;
use deckcast_core::{Error, OpenAiSettings, Result, RetryPolicy, ScriptWriter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SERVICE: &str = "OpenAI";

const SYSTEM_PROMPT: &str = "You are a virtual teacher. Explain the slide content in concise, \
easy-to-understand language with a professional and friendly tone. Reply with the spoken \
narration only, without headings, lists or stage directions.";

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 300;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Rewrites slide text into narration with an OpenAI chat model.
pub struct OpenAiScriptWriter {
    client: Client,
    settings: OpenAiSettings,
    retry: RetryPolicy,
}

impl OpenAiScriptWriter {
    /// Create a writer with the given credentials
    pub fn new(settings: OpenAiSettings, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            settings,
            retry,
        })
    }

    fn build_request(&self, slide_text: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Write the narration for a slide with the following text:\n{}",
                        slide_text
                    ),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.settings.api_base))
            .bearer_auth(&self.settings.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Chat completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::api(SERVICE, status.as_u16(), error_text.trim().to_string()));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            Error::Narration(format!("Failed to parse completion response: {}", e))
        })?;

        first_choice(completion)
    }
}

fn first_choice(completion: ChatCompletionResponse) -> Result<String> {
    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| Error::Narration("No completion choices returned".to_string()))
}

#[async_trait]
impl ScriptWriter for OpenAiScriptWriter {
    async fn write_narration(&self, slide_number: usize, slide_text: &str) -> Result<String> {
        let request = self.build_request(slide_text);
        log::info!(
            "Writing narration for slide {} with model {}",
            slide_number,
            self.settings.model
        );

        let content = self
            .retry
            .run("OpenAI chat completion", || self.complete(&request))
            .await?;

        log::debug!(
            "Slide {} narration: {} characters",
            slide_number,
            content.chars().count()
        );
        Ok(content)
    }
}
