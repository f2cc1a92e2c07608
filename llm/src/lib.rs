//! Text generation backed by an Ollama server.
//!
//! [`OllamaClient`] implements [`council::Generator`] with a single
//! non-streaming completion per turn. [`process`] starts and stops a local
//! `ollama` daemon on a best-effort basis.

pub mod client;
pub mod error;
pub mod process;

pub use client::OllamaClient;
pub use error::LLMError;
