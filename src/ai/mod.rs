//! Hosted completion API integration

pub mod chat;
pub mod client;
pub mod stream;

pub use chat::{ChatClient, ChatMessage, Role};
pub use client::{ApiClient, ApiError};
pub use stream::CompletionStream;
