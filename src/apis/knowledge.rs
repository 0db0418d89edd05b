//! Knowledge-base (dataset) API.
//!
//! Datasets hold documents; documents are split into segments (chunks) that
//! get embedded and retrieved. Covers dataset CRUD, document creation and
//! update by text or file, indexing progress, segment CRUD, and retrieval.

use nonempty::NonEmpty;
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::DifyError;
use crate::http::{file_part, HttpApi};
use crate::model::{ResultResponse, UploadedFile};
use crate::options::{DifyOptions, SecretString};

/// Index mode: trade embedding cost against retrieval quality.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingTechnique {
    HighQuality,
    Economy,
}

/// Format of the indexed content.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocForm {
    /// Documents are embedded directly; the default for economy indexing.
    TextModel,
    /// Parent-child mode.
    HierarchicalModel,
    /// Q&A pairs are generated per segment and the questions embedded.
    QaModel,
}

/// Dataset visibility.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    OnlyMe,
    #[default]
    AllTeamMembers,
    PartialMembers,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetProvider {
    Vendor,
    External,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    SemanticSearch,
    FullTextSearch,
    HybridSearch,
}

/// A knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub data_source_type: Option<String>,
    #[serde(default)]
    pub indexing_technique: Option<IndexingTechnique>,
    #[serde(default)]
    pub app_count: u32,
    #[serde(default)]
    pub document_count: u32,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default)]
    pub embedding_model_provider: Option<String>,
    #[serde(default)]
    pub embedding_available: Option<bool>,
}

/// Page of `GET /datasets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetList {
    #[serde(default)]
    pub data: Vec<Dataset>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub page: u32,
}

/// Body of `POST /datasets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDatasetRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexing_technique: Option<IndexingTechnique>,
    #[serde(default)]
    pub permission: Permission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<DatasetProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_knowledge_api_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_knowledge_id: Option<String>,
}

impl CreateDatasetRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            indexing_technique: None,
            permission: Permission::default(),
            provider: None,
            external_knowledge_api_id: None,
            external_knowledge_id: None,
        }
    }
}

/// Retrieval configuration for a document or a retrieve call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalModel {
    pub search_method: SearchMethod,
    #[serde(default)]
    pub reranking_enable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reranking_model: Option<RerankingModel>,
    /// Number of results to return.
    pub top_k: u32,
    #[serde(default)]
    pub score_threshold_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankingModel {
    pub reranking_provider_name: String,
    pub reranking_model_name: String,
}

/// Cleaning/segmentation mode.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessMode {
    #[default]
    Automatic,
    Custom,
}

/// Cleaning and segmentation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessRule {
    #[serde(default)]
    pub mode: ProcessMode,
    /// Empty in automatic mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<ProcessRules>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessRules {
    #[serde(default)]
    pub pre_processing_rules: Vec<PreProcessingRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<Segmentation>,
    /// `full-doc` or `paragraph` retrieval for parent chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subchunk_segmentation: Option<SubChunkSegmentation>,
}

/// `remove_extra_spaces` or `remove_urls_emails`, toggled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreProcessingRule {
    pub id: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    /// Single delimiter; defaults to `\n` server-side.
    pub separator: String,
    /// Maximum tokens per segment, default 1000.
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubChunkSegmentation {
    pub separator: String,
    /// Must stay below the parent chunk length.
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<u32>,
}

/// A document inside a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub data_source_type: Option<String>,
    #[serde(default)]
    pub data_source_info: Option<DataSourceInfo>,
    #[serde(default)]
    pub dataset_process_rule_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_from: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub tokens: Option<u64>,
    #[serde(default)]
    pub indexing_status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub disabled_at: Option<i64>,
    #[serde(default)]
    pub disabled_by: Option<String>,
    #[serde(default)]
    pub archived: Option<bool>,
    #[serde(default)]
    pub display_status: Option<String>,
    #[serde(default)]
    pub word_count: Option<u64>,
    #[serde(default)]
    pub hit_count: Option<u64>,
    #[serde(default)]
    pub doc_form: Option<DocForm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceInfo {
    pub upload_file_id: String,
}

/// Response of the document create/update operations: the document plus the
/// batch token for polling indexing progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub document: Document,
    pub batch: String,
}

/// Page of `GET /datasets/{id}/documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub data: Vec<Document>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub page: u32,
}

/// Body of `POST /datasets/{id}/document/create_by_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDocumentByTextRequest {
    pub name: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexing_technique: Option<IndexingTechnique>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_form: Option<DocForm>,
    /// Q&A mode only: the document language, e.g. `English`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_rule: Option<ProcessRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_model: Option<RetrievalModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model_provider: Option<String>,
}

impl CreateDocumentByTextRequest {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            indexing_technique: None,
            doc_form: None,
            doc_language: None,
            process_rule: None,
            retrieval_model: None,
            embedding_model: None,
            embedding_model_provider: None,
        }
    }
}

/// Body of `POST /datasets/{id}/documents/{doc}/update_by_text`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDocumentByTextRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_rule: Option<ProcessRule>,
}

/// Metadata side of the file-based create/update operations; sent as the
/// `data` form field next to the file part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFileMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexing_technique: Option<IndexingTechnique>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_form: Option<DocForm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_rule: Option<ProcessRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_model: Option<RetrievalModel>,
}

/// Indexing progress of one document in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingStatus {
    pub id: String,
    pub indexing_status: String,
    #[serde(default)]
    pub processing_started_at: Option<f64>,
    #[serde(default)]
    pub parsing_completed_at: Option<f64>,
    #[serde(default)]
    pub cleaning_completed_at: Option<f64>,
    #[serde(default)]
    pub splitting_completed_at: Option<f64>,
    #[serde(default)]
    pub completed_at: Option<f64>,
    #[serde(default)]
    pub paused_at: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub stopped_at: Option<f64>,
    #[serde(default)]
    pub completed_segments: u32,
    #[serde(default)]
    pub total_segments: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingStatusList {
    #[serde(default)]
    pub data: Vec<IndexingStatus>,
}

/// A stored segment (chunk) of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub document_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub tokens: u64,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub index_node_id: Option<String>,
    #[serde(default)]
    pub index_node_hash: Option<String>,
    #[serde(default)]
    pub hit_count: u64,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub disabled_at: Option<i64>,
    #[serde(default)]
    pub disabled_by: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub indexing_at: Option<i64>,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub stopped_at: Option<i64>,
}

/// One segment to create: the content, and for Q&A-mode datasets the
/// answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentInput {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl SegmentInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            answer: None,
            keywords: None,
        }
    }
}

/// Body of `POST /datasets/{id}/documents/{doc}/segments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSegmentsRequest {
    pub segments: NonEmpty<SegmentInput>,
}

/// Response of segment creation and listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentList {
    #[serde(default)]
    pub data: Vec<Segment>,
    #[serde(default)]
    pub doc_form: Option<DocForm>,
}

/// Updated fields of one segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentUpdate {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Body of `POST /datasets/{id}/documents/{doc}/segments/{seg}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateSegmentRequest {
    pub segment: SegmentUpdate,
}

/// Response of a single-segment update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentResponse {
    pub data: Segment,
    #[serde(default)]
    pub doc_form: Option<DocForm>,
}

/// Query of the segment listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Body of `POST /datasets/{id}/retrieve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_model: Option<RetrievalModel>,
}

/// Response of `POST /datasets/{id}/retrieve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub query: RetrieveQuery,
    #[serde(default)]
    pub records: Vec<RetrieveRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveQuery {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveRecord {
    pub segment: Segment,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub tsne_position: Option<Value>,
}

/// Client for the knowledge-base API, bound to a dataset API key.
#[derive(Clone)]
pub struct KnowledgeBaseClient {
    api: HttpApi,
}

impl KnowledgeBaseClient {
    /// Create a standalone client outside a registry.
    pub fn new(key: impl Into<SecretString>, options: &DifyOptions) -> Result<Self, DifyError> {
        Ok(Self {
            api: HttpApi::new(key.into(), options)?,
        })
    }

    pub(crate) fn from_api(api: HttpApi) -> Self {
        Self { api }
    }

    /// Create an empty dataset.
    pub async fn create_dataset(&self, request: &CreateDatasetRequest) -> Result<Dataset, DifyError> {
        self.api.post_json("/datasets", request).await
    }

    /// Page through the datasets this key can see.
    pub async fn list_datasets(&self, page: u32, limit: u32) -> Result<DatasetList, DifyError> {
        self.api
            .get_json_query("/datasets", &[("page", page), ("limit", limit)])
            .await
    }

    /// Delete a dataset. The server answers with an empty body.
    pub async fn delete_dataset(&self, dataset_id: &str) -> Result<(), DifyError> {
        self.api.delete(&format!("/datasets/{dataset_id}")).await
    }

    /// Create a document from text.
    pub async fn create_document_by_text(
        &self,
        dataset_id: &str,
        request: &CreateDocumentByTextRequest,
    ) -> Result<DocumentResponse, DifyError> {
        self.api
            .post_json(
                &format!("/datasets/{dataset_id}/document/create_by_text"),
                request,
            )
            .await
    }

    /// Create a document from a file; `meta` rides along as the `data` form
    /// field.
    pub async fn create_document_by_file(
        &self,
        dataset_id: &str,
        meta: &DocumentFileMeta,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<DocumentResponse, DifyError> {
        let form = document_form(meta, file_name.into(), bytes)?;
        self.api
            .post_multipart(
                &format!("/datasets/{dataset_id}/document/create_by_file"),
                form,
            )
            .await
    }

    /// Replace a document's content from text.
    pub async fn update_document_by_text(
        &self,
        dataset_id: &str,
        document_id: &str,
        request: &UpdateDocumentByTextRequest,
    ) -> Result<DocumentResponse, DifyError> {
        self.api
            .post_json(
                &format!("/datasets/{dataset_id}/documents/{document_id}/update_by_text"),
                request,
            )
            .await
    }

    /// Replace a document's content from a file.
    pub async fn update_document_by_file(
        &self,
        dataset_id: &str,
        document_id: &str,
        meta: &DocumentFileMeta,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<DocumentResponse, DifyError> {
        let form = document_form(meta, file_name.into(), bytes)?;
        self.api
            .post_multipart(
                &format!("/datasets/{dataset_id}/documents/{document_id}/update_by_file"),
                form,
            )
            .await
    }

    /// Embedding progress for a create/update batch.
    pub async fn indexing_status(
        &self,
        dataset_id: &str,
        batch: &str,
    ) -> Result<IndexingStatusList, DifyError> {
        self.api
            .get_json(&format!(
                "/datasets/{dataset_id}/documents/{batch}/indexing-status"
            ))
            .await
    }

    /// Page through a dataset's documents.
    pub async fn list_documents(
        &self,
        dataset_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<DocumentList, DifyError> {
        self.api
            .get_json_query(
                &format!("/datasets/{dataset_id}/documents"),
                &[("page", page), ("limit", limit)],
            )
            .await
    }

    /// Delete a document.
    pub async fn delete_document(
        &self,
        dataset_id: &str,
        document_id: &str,
    ) -> Result<ResultResponse, DifyError> {
        self.api
            .delete_expect_json(&format!("/datasets/{dataset_id}/documents/{document_id}"))
            .await
    }

    /// Add segments to a document.
    pub async fn create_segments(
        &self,
        dataset_id: &str,
        document_id: &str,
        request: &CreateSegmentsRequest,
    ) -> Result<SegmentList, DifyError> {
        self.api
            .post_json(
                &format!("/datasets/{dataset_id}/documents/{document_id}/segments"),
                request,
            )
            .await
    }

    /// List a document's segments, optionally filtered.
    pub async fn list_segments(
        &self,
        dataset_id: &str,
        document_id: &str,
        query: &SegmentsQuery,
    ) -> Result<SegmentList, DifyError> {
        self.api
            .get_json_query(
                &format!("/datasets/{dataset_id}/documents/{document_id}/segments"),
                query,
            )
            .await
    }

    /// Update one segment.
    pub async fn update_segment(
        &self,
        dataset_id: &str,
        document_id: &str,
        segment_id: &str,
        request: &UpdateSegmentRequest,
    ) -> Result<SegmentResponse, DifyError> {
        self.api
            .post_json(
                &format!("/datasets/{dataset_id}/documents/{document_id}/segments/{segment_id}"),
                request,
            )
            .await
    }

    /// Delete one segment.
    pub async fn delete_segment(
        &self,
        dataset_id: &str,
        document_id: &str,
        segment_id: &str,
    ) -> Result<ResultResponse, DifyError> {
        self.api
            .delete_expect_json(&format!(
                "/datasets/{dataset_id}/documents/{document_id}/segments/{segment_id}"
            ))
            .await
    }

    /// The upload-file record behind a file-sourced document.
    pub async fn upload_file_info(
        &self,
        dataset_id: &str,
        document_id: &str,
    ) -> Result<UploadedFile, DifyError> {
        self.api
            .get_json(&format!(
                "/datasets/{dataset_id}/documents/{document_id}/upload-file"
            ))
            .await
    }

    /// Query the dataset's retrieval pipeline directly.
    pub async fn retrieve(
        &self,
        dataset_id: &str,
        request: &RetrieveRequest,
    ) -> Result<RetrieveResponse, DifyError> {
        self.api
            .post_json(&format!("/datasets/{dataset_id}/retrieve"), request)
            .await
    }
}

fn document_form(
    meta: &DocumentFileMeta,
    file_name: String,
    bytes: Vec<u8>,
) -> Result<Form, DifyError> {
    let data = serde_json::to_string(meta)
        .map_err(|e| DifyError::Config(format!("failed to encode document metadata: {e}")))?;
    Ok(Form::new()
        .text("data", data)
        .part("file", file_part(file_name, bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nonempty::nonempty;
    use serde_json::json;

    #[test]
    fn indexing_technique_wire_names() {
        assert_eq!(
            serde_json::to_value(IndexingTechnique::HighQuality).unwrap(),
            json!("high_quality")
        );
        assert_eq!(
            serde_json::to_value(DocForm::QaModel).unwrap(),
            json!("qa_model")
        );
        assert_eq!(
            serde_json::to_value(Permission::OnlyMe).unwrap(),
            json!("only_me")
        );
    }

    #[test]
    fn unknown_indexing_technique_fails_decode() {
        let err = serde_json::from_value::<IndexingTechnique>(json!("medium_quality")).unwrap_err();
        assert!(err.to_string().contains("unknown variant"));
    }

    #[test]
    fn create_dataset_request_round_trips() {
        let request = CreateDatasetRequest {
            indexing_technique: Some(IndexingTechnique::Economy),
            description: Some("release notes".to_string()),
            ..CreateDatasetRequest::new("releases")
        };

        let encoded = serde_json::to_string(&request).unwrap();
        let decoded: CreateDatasetRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn create_dataset_request_omits_absent_fields() {
        let value = serde_json::to_value(CreateDatasetRequest::new("releases")).unwrap();
        assert_eq!(
            value,
            json!({"name": "releases", "permission": "all_team_members"})
        );
    }

    #[test]
    fn dataset_decodes_a_sparse_record() {
        let dataset: Dataset = serde_json::from_value(json!({
            "id": "ds-1",
            "name": "releases",
            "description": null,
            "provider": "vendor",
            "permission": "only_me",
            "indexing_technique": "high_quality",
            "app_count": 0,
            "document_count": 2,
            "word_count": 1024,
            "created_by": "u-1",
            "created_at": 1705395332
        }))
        .unwrap();

        assert_eq!(dataset.indexing_technique, Some(IndexingTechnique::HighQuality));
        assert!(dataset.embedding_model.is_none());
    }

    #[test]
    fn create_segments_request_serializes_as_plain_array() {
        let request = CreateSegmentsRequest {
            segments: nonempty![
                SegmentInput::new("first chunk"),
                SegmentInput {
                    answer: Some("42".to_string()),
                    ..SegmentInput::new("what is the answer?")
                },
            ],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["segments"].as_array().unwrap().len(), 2);
        assert_eq!(value["segments"][1]["answer"], "42");
    }

    #[test]
    fn retrieve_response_decodes() {
        let response: RetrieveResponse = serde_json::from_value(json!({
            "query": {"content": "release cadence"},
            "records": [{
                "segment": {
                    "id": "seg-1",
                    "position": 1,
                    "document_id": "doc-1",
                    "content": "We release every six weeks.",
                    "word_count": 5,
                    "tokens": 7,
                    "keywords": ["release"],
                    "hit_count": 3,
                    "enabled": true,
                    "status": "completed"
                },
                "score": 0.82
            }]
        }))
        .unwrap();

        assert_eq!(response.records.len(), 1);
        assert_eq!(response.records[0].score, Some(0.82));
        assert_eq!(response.records[0].segment.keywords, vec!["release"]);
    }

    #[test]
    fn process_rule_defaults_to_automatic() {
        let rule = ProcessRule::default();
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({"mode": "automatic"})
        );
    }
}
