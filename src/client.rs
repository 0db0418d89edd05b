//! Error taxonomy and the named client registry.
//!
//! A registry is built once at application startup from a list of
//! [`ApiSecret`]s and is immutable afterwards. Each secret binds a logical
//! name to a key and an [`ApiKind`]; resolving a name yields a typed client
//! for exactly that kind's endpoint group, so calling (say) a knowledge-base
//! operation on a chat client is a type error rather than a runtime one.

use std::collections::HashMap;

use reqwest::StatusCode;
use thiserror::Error;

use crate::apis::chat::ChatClient;
use crate::apis::completion::CompletionClient;
use crate::apis::knowledge::KnowledgeBaseClient;
use crate::apis::workflow::WorkflowClient;
use crate::http::{build_http_client, HttpApi};
use crate::options::{DifyOptions, SecretString};

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum DifyError {
    /// Transport-level failure (DNS, connection, TLS, timeout), passed
    /// through from the HTTP layer unwrapped.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status; `body` is the raw
    /// response text.
    #[error("request failed with status {status}: {body}")]
    RequestFailed { status: StatusCode, body: String },

    /// A response body did not match the expected schema.
    #[error("failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stream frame carried an `event` discriminator this crate does not
    /// know. See [`crate::streaming::UnknownEventPolicy`].
    #[error("unrecognized stream event type `{0}`")]
    UnknownEventType(String),

    /// No secret of the requested kind was registered under this name.
    #[error("no API secret registered under name `{0}`")]
    UnknownClientName(String),

    /// Invalid client configuration or request invariant violation.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DifyError {
    pub(crate) fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        DifyError::Decode {
            context: context.into(),
            source,
        }
    }
}

/// The endpoint group a secret grants access to.
///
/// Dify issues one key per application (or knowledge base), and each key only
/// works against its own group of endpoints.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ApiKind {
    KnowledgeBase,
    Completion,
    Chat,
    Workflow,
}

impl ApiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKind::KnowledgeBase => "knowledge_base",
            ApiKind::Completion => "completion",
            ApiKind::Chat => "chat",
            ApiKind::Workflow => "workflow",
        }
    }
}

impl std::fmt::Display for ApiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured API credential: a unique name, the bearer key, the
/// endpoint group it unlocks, and an optional per-secret base URL override.
#[derive(Debug, Clone)]
pub struct ApiSecret {
    pub name: String,
    pub key: SecretString,
    pub kind: ApiKind,
    pub base_url: Option<String>,
}

impl ApiSecret {
    pub fn new(name: impl Into<String>, key: impl Into<SecretString>, kind: ApiKind) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            kind,
            base_url: None,
        }
    }

    /// Point this secret at a host other than the registry-wide base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }
}

/// Immutable name → secret mapping producing typed endpoint-group clients.
///
/// One `reqwest` client (connection pool) is shared by everything the
/// registry hands out, so resolved clients are cheap and safe to use
/// concurrently.
///
/// # Example
/// ```no_run
/// use dify_client::{ApiKind, ApiSecret, ClientRegistry, DifyOptions};
///
/// # fn main() -> Result<(), dify_client::DifyError> {
/// let registry = ClientRegistry::new(
///     [
///         ApiSecret::new("support-bot", "app-xxxx", ApiKind::Chat),
///         ApiSecret::new("faq-kb", "dataset-xxxx", ApiKind::KnowledgeBase),
///     ],
///     DifyOptions::default(),
/// )?;
///
/// let chat = registry.chat("support-bot")?;
/// # Ok(())
/// # }
/// ```
pub struct ClientRegistry {
    http: reqwest::Client,
    options: DifyOptions,
    secrets: HashMap<String, ApiSecret>,
}

impl ClientRegistry {
    /// Build a registry from configured secrets. Later duplicates of a name
    /// win, matching last-wins configuration layering.
    pub fn new(
        secrets: impl IntoIterator<Item = ApiSecret>,
        options: DifyOptions,
    ) -> Result<Self, DifyError> {
        let http = build_http_client(&options)?;
        let secrets = secrets
            .into_iter()
            .map(|secret| (secret.name.clone(), secret))
            .collect();

        Ok(Self {
            http,
            options,
            secrets,
        })
    }

    /// Resolve a chat-application client.
    pub fn chat(&self, name: &str) -> Result<ChatClient, DifyError> {
        Ok(ChatClient::from_api(self.resolve(name, ApiKind::Chat)?))
    }

    /// Resolve a completion-application client.
    pub fn completion(&self, name: &str) -> Result<CompletionClient, DifyError> {
        Ok(CompletionClient::from_api(
            self.resolve(name, ApiKind::Completion)?,
        ))
    }

    /// Resolve a workflow-application client.
    pub fn workflow(&self, name: &str) -> Result<WorkflowClient, DifyError> {
        Ok(WorkflowClient::from_api(
            self.resolve(name, ApiKind::Workflow)?,
        ))
    }

    /// Resolve a knowledge-base client.
    pub fn knowledge_base(&self, name: &str) -> Result<KnowledgeBaseClient, DifyError> {
        Ok(KnowledgeBaseClient::from_api(
            self.resolve(name, ApiKind::KnowledgeBase)?,
        ))
    }

    /// Names of every registered secret.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.secrets.keys().map(String::as_str)
    }

    fn resolve(&self, name: &str, kind: ApiKind) -> Result<HttpApi, DifyError> {
        let secret = self
            .secrets
            .get(name)
            .filter(|secret| secret.kind == kind)
            .ok_or_else(|| DifyError::UnknownClientName(name.to_string()))?;

        let base_url = secret
            .base_url
            .clone()
            .unwrap_or_else(|| self.options.base_url.clone());

        Ok(HttpApi::from_parts(
            self.http.clone(),
            base_url,
            secret.key.clone(),
            self.options.unknown_event_policy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ClientRegistry {
        ClientRegistry::new(
            [
                ApiSecret::new("support-bot", "app-chat-key", ApiKind::Chat),
                ApiSecret::new("faq-kb", "dataset-key", ApiKind::KnowledgeBase),
                ApiSecret::new("summarizer", "app-completion-key", ApiKind::Completion),
                ApiSecret::new("etl", "app-workflow-key", ApiKind::Workflow),
            ],
            DifyOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn resolves_each_registered_kind() {
        let registry = registry();
        assert!(registry.chat("support-bot").is_ok());
        assert!(registry.knowledge_base("faq-kb").is_ok());
        assert!(registry.completion("summarizer").is_ok());
        assert!(registry.workflow("etl").is_ok());
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = registry().chat("nonexistent").unwrap_err();
        assert!(matches!(err, DifyError::UnknownClientName(name) if name == "nonexistent"));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        // "faq-kb" exists, but not as a chat application
        let err = registry().chat("faq-kb").unwrap_err();
        assert!(matches!(err, DifyError::UnknownClientName(_)));
    }

    #[test]
    fn later_duplicate_names_win() {
        let registry = ClientRegistry::new(
            [
                ApiSecret::new("bot", "old-key", ApiKind::Chat),
                ApiSecret::new("bot", "new-key", ApiKind::Workflow),
            ],
            DifyOptions::default(),
        )
        .unwrap();

        assert!(registry.chat("bot").is_err());
        assert!(registry.workflow("bot").is_ok());
    }

    #[test]
    fn api_kind_wire_names() {
        assert_eq!(ApiKind::KnowledgeBase.as_str(), "knowledge_base");
        assert_eq!(ApiKind::Chat.to_string(), "chat");
    }
}
