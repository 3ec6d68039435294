//! `devkit-ai`: AI collaborator for devkit.
//!
//! ```text
//! Assistant<G>      ← builds prompts (ask, explain, commit, rewind, panic, logs)
//!     │
//!     ▼
//! TextGenerator     ← prompt in, text out, Result<String, AiError>
//!     │
//!     ▼
//! GeminiClient      ← blocking POST to {base_url}/v1beta/models/{model}:generateContent
//! ```
//!
//! Failures are always an [`AiError`] variant; the CLI maps each one to its
//! own message and never retries.

pub mod client;
pub mod error;
pub mod prompts;


pub use client::{GeminiClient, TextGenerator};
pub use error::AiError;
pub use prompts::{parse_suggested_command, Assistant};
