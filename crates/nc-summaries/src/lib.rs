//! # nc-summaries
//!
//! AI summaries of management users' daily work.
//!
//! An OpenAI-compatible chat-completion client (Groq by default) fills one
//! of two prompt templates: a plain daily summary of a user's logs, or a
//! task-aware review comparing assigned tasks against the day's logs.

pub mod llm;
pub mod prompts;
pub mod summarizer;

pub use llm::{GroqClient, LlmClient, LlmError};
pub use summarizer::{Summarizer, TaskReview, UserSummary};
