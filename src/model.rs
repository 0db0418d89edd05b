//! DTOs shared across the endpoint groups.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File category accepted by application requests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// TXT, MD, PDF, HTML, XLSX, DOCX, CSV, PPTX, XML, EPUB, ...
    Document,
    /// JPG, JPEG, PNG, GIF, WEBP, SVG.
    Image,
    /// MP3, M4A, WAV, WEBM, AMR.
    Audio,
    /// MP4, MOV, MPEG, MPGA.
    Video,
    /// Anything else.
    Custom,
}

/// How an attached file reaches the server.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMethod {
    /// The file is fetched from `url`.
    RemoteUrl,
    /// The file was uploaded beforehand; referenced by `upload_file_id`.
    LocalFile,
}

/// A file attached to a chat, completion, or workflow request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInput {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_methods: Option<TransferMethod>,

    /// Set when `transfer_methods` is `remote_url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Set when `transfer_methods` is `local_file`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_file_id: Option<String>,
}

impl FileInput {
    /// Attach a file the server should fetch from a URL.
    pub fn remote_url(file_type: FileType, url: impl Into<String>) -> Self {
        Self {
            file_type: Some(file_type),
            transfer_methods: Some(TransferMethod::RemoteUrl),
            url: Some(url.into()),
            upload_file_id: None,
        }
    }

    /// Attach a previously uploaded file by its ID.
    pub fn local_file(file_type: FileType, upload_file_id: impl Into<String>) -> Self {
        Self {
            file_type: Some(file_type),
            transfer_methods: Some(TransferMethod::LocalFile),
            url: None,
            upload_file_id: Some(upload_file_id.into()),
        }
    }
}

/// Acknowledgement body used by stop, feedback, and delete operations.
/// `result` is always `"success"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultResponse {
    pub result: String,
}

/// Body of the stop-generation and stop-workflow operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopRequest {
    /// Must match the `user` of the message being stopped.
    pub user: String,
}

/// Usage and attribution metadata attached to completed messages.
///
/// The shapes vary per model provider, so both fields stay untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retriever_resources: Option<Value>,
}

/// End-user verdict on a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Like,
    Dislike,
}

/// Body of the message-feedback operation. A `rating` of `None` revokes
/// earlier feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub rating: Option<Rating>,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Record returned by the file-upload endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    /// Present on the knowledge-base upload-file lookup.
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Response of the speech-to-text operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioToTextResponse {
    pub text: String,
}

/// Body of the text-to-speech operation: either an existing message or
/// literal text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextToAudioRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    pub user: String,
}

/// Basic application information (`GET /info`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Application input/feature configuration (`GET /parameters`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppParameters {
    #[serde(default)]
    pub opening_statement: Option<String>,
    #[serde(default)]
    pub suggested_questions_after_answer: Option<FeatureToggle>,
    #[serde(default)]
    pub speech_to_text: Option<FeatureToggle>,
    #[serde(default)]
    pub retriever_resource: Option<FeatureToggle>,
    #[serde(default)]
    pub annotation_reply: Option<FeatureToggle>,
    #[serde(default)]
    pub user_input_form: Vec<UserInputForm>,
    #[serde(default)]
    pub file_upload: Option<FileUploadConfig>,
    #[serde(default)]
    pub system_parameters: Option<SystemParameters>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureToggle {
    pub enabled: bool,
}

/// One input control; exactly one of the fields is set per entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInputForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_input: Option<TextControl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<TextControl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<SelectControl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextControl {
    pub label: String,
    pub variable: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectControl {
    pub label: String,
    pub variable: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUploadConfig {
    #[serde(default)]
    pub image: Option<ImageUploadConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUploadConfig {
    pub enabled: bool,
    #[serde(default)]
    pub number_limits: u32,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub transfer_methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemParameters {
    #[serde(default)]
    pub file_size_limit: u64,
    #[serde(default)]
    pub image_file_size_limit: u64,
    #[serde(default)]
    pub audio_file_size_limit: u64,
    #[serde(default)]
    pub video_file_size_limit: u64,
}

/// Application tool icons (`GET /meta`). Icon values are either URLs or
/// inline emoji objects, so the payload stays untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMeta {
    #[serde(default)]
    pub tool_icons: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_input_serializes_with_snake_case_keys() {
        let file = FileInput::remote_url(FileType::Image, "https://example.com/cat.png");
        let value = serde_json::to_value(&file).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "image",
                "transfer_methods": "remote_url",
                "url": "https://example.com/cat.png"
            })
        );
    }

    #[test]
    fn file_input_round_trips() {
        let file = FileInput::local_file(FileType::Document, "upload-1");
        let encoded = serde_json::to_string(&file).unwrap();
        let decoded: FileInput = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, file);
    }

    #[test]
    fn unknown_enum_wire_value_fails_decode() {
        let err = serde_json::from_value::<TransferMethod>(json!("carrier_pigeon")).unwrap_err();
        assert!(err.to_string().contains("unknown variant"));
    }

    #[test]
    fn feedback_rating_wire_names() {
        assert_eq!(serde_json::to_value(Rating::Like).unwrap(), json!("like"));
        assert_eq!(
            serde_json::to_value(Rating::Dislike).unwrap(),
            json!("dislike")
        );
    }

    #[test]
    fn revoking_feedback_sends_null_rating() {
        let request = FeedbackRequest {
            rating: None,
            user: "abc-123".to_string(),
            content: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"rating": null, "user": "abc-123"}));
    }

    #[test]
    fn app_parameters_decode_tolerates_partial_payloads() {
        let parameters: AppParameters = serde_json::from_value(json!({
            "opening_statement": "Hello!",
            "speech_to_text": {"enabled": true},
            "user_input_form": [
                {"text_input": {"label": "Name", "variable": "name", "required": true, "default": ""}},
                {"select": {"label": "Tier", "variable": "tier", "options": ["free", "pro"]}}
            ]
        }))
        .unwrap();

        assert_eq!(parameters.opening_statement.as_deref(), Some("Hello!"));
        assert!(parameters.speech_to_text.unwrap().enabled);
        assert_eq!(parameters.user_input_form.len(), 2);
        assert_eq!(
            parameters.user_input_form[1].select.as_ref().unwrap().options,
            vec!["free", "pro"]
        );
        assert!(parameters.file_upload.is_none());
    }
}
