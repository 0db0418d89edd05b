//! Chat application API.
//!
//! Chat applications keep per-conversation state server-side, so previous
//! history feeds into each response. Covers messaging in both response
//! modes, conversation management, feedback, suggested questions, file
//! upload, and the audio endpoints.

use bytes::Bytes;
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::DifyError;
use crate::http::{file_part, HttpApi};
use crate::model::{
    AppInfo, AppMeta, AppParameters, AudioToTextResponse, FeedbackRequest, FileInput,
    MessageMetadata, Rating, ResultResponse, StopRequest, TextToAudioRequest, UploadedFile,
};
use crate::options::{DifyOptions, SecretString};
use crate::streaming::{AppRequest, EventStream, ResponseMode};

/// Body of `POST /chat-messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// End-user input text.
    pub query: String,

    /// Values for the variables the application defines.
    #[serde(default = "empty_inputs")]
    pub inputs: Value,

    /// Overwritten by the send helper that is called; see
    /// [`crate::streaming`].
    #[serde(default)]
    pub response_mode: ResponseMode,

    /// End-user identifier, unique within the application.
    pub user: String,

    /// Continue an existing conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileInput>>,

    /// Auto-title new conversations; disable to title them later via
    /// [`ChatClient::rename_conversation`].
    #[serde(default = "default_true")]
    pub auto_generate_name: bool,
}

fn empty_inputs() -> Value {
    Value::Object(Default::default())
}

fn default_true() -> bool {
    true
}

impl ChatRequest {
    pub fn new(query: String, user: String) -> Self {
        Self {
            query,
            inputs: empty_inputs(),
            response_mode: ResponseMode::default(),
            user,
            conversation_id: None,
            files: None,
            auto_generate_name: true,
        }
    }

    /// Set the application input variables.
    pub fn with_inputs(mut self, inputs: Value) -> Self {
        self.inputs = inputs;
        self
    }

    /// Continue the given conversation.
    pub fn with_conversation_id(mut self, conversation_id: String) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    /// Attach files.
    pub fn with_files(mut self, files: Vec<FileInput>) -> Self {
        self.files = Some(files);
        self
    }
}

impl AppRequest for ChatRequest {
    fn response_mode_mut(&mut self) -> &mut ResponseMode {
        &mut self.response_mode
    }

    fn user(&self) -> &str {
        &self.user
    }
}

/// Blocking-mode response of `POST /chat-messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub message_id: String,
    pub conversation_id: String,
    /// Fixed to `chat`.
    pub mode: String,
    /// The complete answer text.
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
    #[serde(default)]
    pub create_at: i64,
}

/// One conversation of the calling end-user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub inputs: Value,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub introduction: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Page of `GET /conversations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationList {
    #[serde(default)]
    pub data: Vec<Conversation>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub limit: u32,
}

/// Sort order for the conversation list. The `-` prefix means descending.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    #[serde(rename = "created_at")]
    CreatedAt,
    #[serde(rename = "-created_at")]
    CreatedAtDesc,
    #[serde(rename = "updated_at")]
    UpdatedAt,
    #[serde(rename = "-updated_at")]
    UpdatedAtDesc,
}

/// Query of `GET /conversations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationsQuery {
    pub user: String,
    /// ID of the last record of the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_id: Option<String>,
    /// 1..=100, default 20.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Defaults to `-updated_at` server-side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
}

/// Body of `POST /conversations/{id}/name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenameConversationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Ask the server to generate the title instead of supplying one.
    #[serde(default)]
    pub auto_generate: bool,
    pub user: String,
}

/// Query of `GET /messages` (conversation history, newest first).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessagesQuery {
    pub conversation_id: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// One history entry: the user's query and the application's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub id: String,
    pub conversation_id: String,
    #[serde(default)]
    pub inputs: Value,
    pub query: String,
    #[serde(default)]
    pub message_files: Vec<HistoryMessageFile>,
    pub answer: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub feedback: Option<MessageFeedback>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessageFile {
    pub id: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub url: String,
    pub belongs_to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageFeedback {
    #[serde(default)]
    pub rating: Option<Rating>,
}

/// Page of `GET /messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub limit: u32,
}

/// Response of `GET /messages/{id}/suggested`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedQuestions {
    pub result: String,
    #[serde(default)]
    pub data: Vec<String>,
}

#[derive(Serialize)]
struct UserBody {
    user: String,
}

/// Client for one chat application, bound to its API key.
#[derive(Clone, Debug)]
pub struct ChatClient {
    api: HttpApi,
}

impl ChatClient {
    /// Create a standalone client outside a registry.
    pub fn new(key: impl Into<SecretString>, options: &DifyOptions) -> Result<Self, DifyError> {
        Ok(Self {
            api: HttpApi::new(key.into(), options)?,
        })
    }

    pub(crate) fn from_api(api: HttpApi) -> Self {
        Self { api }
    }

    /// Send a chat message and wait for the complete answer.
    ///
    /// The request's `response_mode` is forced to blocking. Note that agent
    /// applications reject blocking mode.
    pub async fn send_chat_message_blocking(
        &self,
        request: ChatRequest,
    ) -> Result<ChatCompletionResponse, DifyError> {
        self.api.post_app_blocking("/chat-messages", request).await
    }

    /// Send a chat message and receive the answer as a typed event stream.
    ///
    /// The request's `response_mode` is forced to streaming. Dropping the
    /// returned stream before end-of-input releases the connection.
    pub async fn send_chat_message_streaming(
        &self,
        request: ChatRequest,
    ) -> Result<EventStream, DifyError> {
        self.api.post_app_streaming("/chat-messages", request).await
    }

    /// Stop an in-flight generation. Streaming mode only; `task_id` comes
    /// from the stream's events.
    pub async fn stop_chat_message(
        &self,
        task_id: &str,
        user: impl Into<String>,
    ) -> Result<ResultResponse, DifyError> {
        self.api
            .post_json(
                &format!("/chat-messages/{task_id}/stop"),
                &StopRequest { user: user.into() },
            )
            .await
    }

    /// List the calling end-user's conversations, most recent first.
    pub async fn conversations(
        &self,
        query: &ConversationsQuery,
    ) -> Result<ConversationList, DifyError> {
        self.api.get_json_query("/conversations", query).await
    }

    /// Rename a conversation, or have the server title it.
    pub async fn rename_conversation(
        &self,
        conversation_id: &str,
        request: &RenameConversationRequest,
    ) -> Result<Conversation, DifyError> {
        self.api
            .post_json(&format!("/conversations/{conversation_id}/name"), request)
            .await
    }

    /// Delete a conversation.
    pub async fn delete_conversation(
        &self,
        conversation_id: &str,
        user: impl Into<String>,
    ) -> Result<ResultResponse, DifyError> {
        self.api
            .delete_json(
                &format!("/conversations/{conversation_id}"),
                &UserBody { user: user.into() },
            )
            .await
    }

    /// Page through a conversation's history, newest first.
    pub async fn messages(&self, query: &MessagesQuery) -> Result<MessageList, DifyError> {
        self.api.get_json_query("/messages", query).await
    }

    /// Suggested follow-up questions for a message.
    pub async fn suggested_questions(
        &self,
        message_id: &str,
        user: &str,
    ) -> Result<SuggestedQuestions, DifyError> {
        self.api
            .get_json_query(&format!("/messages/{message_id}/suggested"), &[("user", user)])
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

    /// Transcribe an audio file. Supported formats: mp3, mp4, mpeg, mpga,
    /// m4a, wav, webm; 15MB limit.
    pub async fn audio_to_text(
        &self,
        user: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<AudioToTextResponse, DifyError> {
        let form = Form::new()
            .text("user", user.into())
            .part("file", file_part(file_name.into(), bytes));
        self.api.post_multipart("/audio-to-text", form).await
    }

    /// Synthesize speech from a message or literal text; returns the audio
    /// payload.
    pub async fn text_to_audio(&self, request: &TextToAudioRequest) -> Result<Bytes, DifyError> {
        self.api.post_json_bytes("/text-to-audio", request).await
    }

    pub async fn app_info(&self) -> Result<AppInfo, DifyError> {
        self.api.get_json("/info").await
    }

    pub async fn app_parameters(&self) -> Result<AppParameters, DifyError> {
        self.api.get_json("/parameters").await
    }

    pub async fn app_meta(&self) -> Result<AppMeta, DifyError> {
        self.api.get_json("/meta").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_request_serializes_with_snake_case_keys() {
        let request = ChatRequest::new("What can you do?".to_string(), "abc-123".to_string())
            .with_inputs(json!({"tier": "pro"}));

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "query": "What can you do?",
                "inputs": {"tier": "pro"},
                "response_mode": "blocking",
                "user": "abc-123",
                "auto_generate_name": true
            })
        );
    }

    #[test]
    fn chat_request_round_trips() {
        let request = ChatRequest::new("Hello".to_string(), "abc-123".to_string())
            .with_conversation_id("c1".to_string())
            .with_files(vec![FileInput::local_file(
                crate::model::FileType::Image,
                "upload-1",
            )]);

        let encoded = serde_json::to_string(&request).unwrap();
        let decoded: ChatRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn blocking_response_decodes_the_documented_shape() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"message_id":"m1","conversation_id":"c1","mode":"chat","answer":"Hi","create_at":1}"#,
        )
        .unwrap();

        assert_eq!(response.answer, "Hi");
        assert_eq!(response.mode, "chat");
        assert_eq!(response.create_at, 1);
        assert!(response.metadata.is_none());
    }

    #[test]
    fn conversation_list_decodes() {
        let list: ConversationList = serde_json::from_value(json!({
            "data": [
                {"id": "c1", "name": "First chat", "inputs": {}, "status": "normal",
                 "introduction": "", "created_at": 1705395332, "updated_at": 1705395332}
            ],
            "has_more": false,
            "limit": 20
        }))
        .unwrap();

        assert_eq!(list.data.len(), 1);
        assert_eq!(list.data[0].name, "First chat");
    }

    #[test]
    fn sort_by_wire_values_keep_the_descending_prefix() {
        assert_eq!(
            serde_json::to_value(SortBy::UpdatedAtDesc).unwrap(),
            json!("-updated_at")
        );
        assert_eq!(
            serde_json::to_value(SortBy::CreatedAt).unwrap(),
            json!("created_at")
        );
    }

    #[test]
    fn history_messages_use_the_messages_key() {
        let list: MessageList = serde_json::from_value(json!({
            "messages": [
                {"id": "m1", "conversation_id": "c1", "inputs": {}, "query": "Hi",
                 "answer": "Hello!", "created_at": 1705395332,
                 "feedback": {"rating": "like"}}
            ],
            "has_more": false,
            "limit": 20
        }))
        .unwrap();

        assert_eq!(list.messages.len(), 1);
        assert_eq!(list.messages[0].feedback.as_ref().unwrap().rating, Some(Rating::Like));
    }
}
