//! # dify-client - Typed Dify API Client
//!
//! A small, pragmatic Rust client for the Dify conversational-AI platform
//! API: knowledge-base management, chat and completion messaging, and
//! workflow execution.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - One typed client per endpoint group (chat, completion, workflow,
//!   knowledge base), resolved by name from a registry
//! - Blocking and streaming response modes; streaming decoded into typed
//!   Server-Sent Event records
//! - Bearer-token authentication with redacted secrets
//! - Type-safe request/response models with snake_case wire naming
//!
//! ## Architecture
//!
//! Configuration happens once: a [`ClientRegistry`] is built from a list of
//! [`ApiSecret`]s (name, key, API kind) and shared [`DifyOptions`]. Each
//! resolved client is immutable, cheap to clone, and bound to exactly one
//! endpoint group, so the wrong operation for a key is a compile error.
//!
//! Message and workflow requests carry a response-mode flag, but the mode is
//! always forced by the method you call: `*_blocking` returns one decoded
//! DTO, `*_streaming` returns a lazy [`StreamEvent`] sequence that ends at
//! end-of-input and releases the connection when dropped.
//!
//! ## Example
//! ```no_run
//! use dify_client::{ApiKind, ApiSecret, ChatRequest, ClientRegistry, DifyOptions};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ClientRegistry::new(
//!         [ApiSecret::new("support-bot", "app-xxxx", ApiKind::Chat)],
//!         DifyOptions::default(),
//!     )?;
//!
//!     let chat = registry.chat("support-bot")?;
//!     let request = ChatRequest::new("What can you do?".to_string(), "user-1".to_string());
//!
//!     let mut events = chat.send_chat_message_streaming(request).await?;
//!     while let Some(event) = events.next().await {
//!         println!("{:?}", event?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod apis;
pub mod client;
pub mod event;
pub mod http;
pub mod model;
pub mod options;
pub mod sse;
pub mod streaming;

// Re-exports for convenience
pub use apis::chat::{ChatClient, ChatRequest};
pub use apis::completion::{CompletionClient, CompletionRequest};
pub use apis::knowledge::KnowledgeBaseClient;
pub use apis::workflow::{WorkflowClient, WorkflowRunRequest};
pub use client::{ApiKind, ApiSecret, ClientRegistry, DifyError};
pub use event::StreamEvent;
pub use options::{DifyOptions, SecretString};
pub use streaming::{EventStream, ResponseMode, UnknownEventPolicy};
