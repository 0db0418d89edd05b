//! Typed endpoint-group clients.
//!
//! One client per Dify API kind; each exposes one method per REST operation
//! and nothing from any other group.

pub mod chat;
pub mod completion;
pub mod knowledge;
pub mod workflow;

// Re-export for convenience
pub use chat::ChatClient;
pub use completion::CompletionClient;
pub use knowledge::KnowledgeBaseClient;
pub use workflow::WorkflowClient;
