//! Completion (text-generation) application API.
//!
//! Completion applications are stateless: no conversation persists between
//! requests. Good for translation, summarization, and other one-shot
//! generation.

use bytes::Bytes;
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::DifyError;
use crate::http::{file_part, HttpApi};
use crate::model::{
    AppInfo, AppParameters, FeedbackRequest, FileInput, MessageMetadata, ResultResponse,
    StopRequest, TextToAudioRequest, UploadedFile,
};
use crate::options::{DifyOptions, SecretString};
use crate::streaming::{AppRequest, EventStream, ResponseMode};

/// Body of `POST /completion-messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// End-user input text.
    pub query: String,

    /// Values for the variables the application defines.
    #[serde(default = "empty_inputs")]
    pub inputs: Value,

    /// Overwritten by the send helper that is called.
    #[serde(default)]
    pub response_mode: ResponseMode,

    /// End-user identifier, unique within the application.
    pub user: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileInput>>,
}

fn empty_inputs() -> Value {
    Value::Object(Default::default())
}

impl CompletionRequest {
    pub fn new(query: String, user: String) -> Self {
        Self {
            query,
            inputs: empty_inputs(),
            response_mode: ResponseMode::default(),
            user,
            files: None,
        }
    }

    /// Set the application input variables.
    pub fn with_inputs(mut self, inputs: Value) -> Self {
        self.inputs = inputs;
        self
    }

    /// Attach files.
    pub fn with_files(mut self, files: Vec<FileInput>) -> Self {
        self.files = Some(files);
        self
    }
}

impl AppRequest for CompletionRequest {
    fn response_mode_mut(&mut self) -> &mut ResponseMode {
        &mut self.response_mode
    }

    fn user(&self) -> &str {
        &self.user
    }
}

/// Blocking-mode response of `POST /completion-messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub message_id: String,
    /// Fixed to `completion`.
    pub mode: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
    #[serde(default)]
    pub create_at: i64,
}

/// Client for one completion application, bound to its API key.
#[derive(Clone)]
pub struct CompletionClient {
    api: HttpApi,
}

impl CompletionClient {
    /// Create a standalone client outside a registry.
    pub fn new(key: impl Into<SecretString>, options: &DifyOptions) -> Result<Self, DifyError> {
        Ok(Self {
            api: HttpApi::new(key.into(), options)?,
        })
    }

    pub(crate) fn from_api(api: HttpApi) -> Self {
        Self { api }
    }

    /// Send a completion request and wait for the complete answer. The
    /// request's `response_mode` is forced to blocking.
    pub async fn send_completion_message_blocking(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, DifyError> {
        self.api
            .post_app_blocking("/completion-messages", request)
            .await
    }

    /// Send a completion request and receive the answer as a typed event
    /// stream. The request's `response_mode` is forced to streaming.
    pub async fn send_completion_message_streaming(
        &self,
        request: CompletionRequest,
    ) -> Result<EventStream, DifyError> {
        self.api
            .post_app_streaming("/completion-messages", request)
            .await
    }

    /// Stop an in-flight generation. Streaming mode only.
    pub async fn stop_completion_message(
        &self,
        task_id: &str,
        user: impl Into<String>,
    ) -> Result<ResultResponse, DifyError> {
        self.api
            .post_json(
                &format!("/completion-messages/{task_id}/stop"),
                &StopRequest { user: user.into() },
            )
            .await
    }

    /// Record end-user feedback on a message.
    pub async fn message_feedback(
        &self,
        message_id: &str,
        request: &FeedbackRequest,
    ) -> Result<ResultResponse, DifyError> {
        self.api
            .post_json(&format!("/messages/{message_id}/feedbacks"), request)
            .await
    }

    /// Upload a file for use in later messages.
    pub async fn upload_file(
        &self,
        user: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, DifyError> {
        let form = Form::new()
            .text("user", user.into())
            .part("file", file_part(file_name.into(), bytes));
        self.api.post_multipart("/files/upload", form).await
    }

    /// Synthesize speech from a message or literal text.
    pub async fn text_to_audio(&self, request: &TextToAudioRequest) -> Result<Bytes, DifyError> {
        self.api.post_json_bytes("/text-to-audio", request).await
    }

    pub async fn app_info(&self) -> Result<AppInfo, DifyError> {
        self.api.get_json("/info").await
    }

    pub async fn app_parameters(&self) -> Result<AppParameters, DifyError> {
        self.api.get_json("/parameters").await
    }
}
