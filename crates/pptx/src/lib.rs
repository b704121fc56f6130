//! PPTX (Office Open XML) parser for slide text and speaker notes.
//!
//! Parses .pptx files which are ZIP archives containing XML documents.

pub mod parser;

pub use parser::PptxParser;
