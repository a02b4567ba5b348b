//! Gemini `generateContent` client used as the text-generation collaborator.

pub mod client;
mod response;
pub mod types;

pub use client::{GeminiClient, TextGenerator};
