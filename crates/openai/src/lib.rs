//! Narration rewriting through the OpenAI chat completions API.

pub mod writer;

pub use writer::OpenAiScriptWriter;
