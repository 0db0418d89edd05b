//! Workflow application API.
//!
//! Runs published workflows in either response mode, inspects runs, stops
//! tasks, and pages execution logs. A streaming run yields
//! `workflow_started` / `node_started` / `node_finished` frames and closes
//! with `workflow_finished`.

use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::DifyError;
use crate::http::{file_part, HttpApi};
use crate::model::{AppInfo, AppParameters, FileInput, ResultResponse, StopRequest, UploadedFile};
use crate::options::{DifyOptions, SecretString};
use crate::streaming::{AppRequest, EventStream, ResponseMode};

/// Body of `POST /workflows/run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRunRequest {
    /// Values for the workflow's input variables.
    #[serde(default = "empty_inputs")]
    pub inputs: Value,

    /// Overwritten by the run helper that is called.
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

impl WorkflowRunRequest {
    pub fn new(user: String) -> Self {
        Self {
            inputs: empty_inputs(),
            response_mode: ResponseMode::default(),
            user,
            files: None,
        }
    }

    /// Set the workflow input variables.
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

impl AppRequest for WorkflowRunRequest {
    fn response_mode_mut(&mut self) -> &mut ResponseMode {
        &mut self.response_mode
    }

    fn user(&self) -> &str {
        &self.user
    }
}

/// Blocking-mode response of `POST /workflows/run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRunResponse {
    #[serde(default)]
    pub workflow_run_id: Option<String>,
    pub task_id: String,
    pub data: WorkflowRunData,
}

/// Result of one workflow run. Also the `data` payload of
/// `workflow_finished` stream frames and the body of `GET
/// /workflows/run/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRunData {
    /// Workflow run ID.
    pub id: String,
    pub workflow_id: String,
    /// `running` / `succeeded` / `failed` / `stopped`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub outputs: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    /// Elapsed seconds.
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub finished_at: i64,
}

/// Run status filter for the log listing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Running,
    Succeeded,
    Failed,
    Stopped,
}

/// Query of `GET /workflows/logs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowLogsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Page of `GET /workflows/logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowLogList {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub data: Vec<WorkflowLogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowLogEntry {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub workflow_run: Option<WorkflowRunSummary>,
    #[serde(default)]
    pub created_from: Option<String>,
    #[serde(default)]
    pub created_by_role: Option<String>,
    #[serde(default)]
    pub created_by_account: Option<Value>,
    #[serde(default)]
    pub created_by_end_user: Option<Value>,
    #[serde(default)]
    pub created_at: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRunSummary {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub created_at: Option<f64>,
    #[serde(default)]
    pub finished_at: Option<f64>,
}

/// Client for one workflow application, bound to its API key.
#[derive(Clone)]
pub struct WorkflowClient {
    api: HttpApi,
}

impl WorkflowClient {
    /// Create a standalone client outside a registry.
    pub fn new(key: impl Into<SecretString>, options: &DifyOptions) -> Result<Self, DifyError> {
        Ok(Self {
            api: HttpApi::new(key.into(), options)?,
        })
    }

    pub(crate) fn from_api(api: HttpApi) -> Self {
        Self { api }
    }

    /// Execute the published workflow and wait for the final result. The
    /// request's `response_mode` is forced to blocking; runs longer than
    /// 100 seconds through Dify cloud are cut off, so prefer streaming.
    pub async fn run_workflow_blocking(
        &self,
        request: WorkflowRunRequest,
    ) -> Result<WorkflowRunResponse, DifyError> {
        self.api.post_app_blocking("/workflows/run", request).await
    }

    /// Execute the published workflow as a typed event stream. The
    /// request's `response_mode` is forced to streaming.
    pub async fn run_workflow_streaming(
        &self,
        request: WorkflowRunRequest,
    ) -> Result<EventStream, DifyError> {
        self.api.post_app_streaming("/workflows/run", request).await
    }

    /// Fetch the current state of a run by its `workflow_run_id`.
    pub async fn get_workflow_run(&self, workflow_run_id: &str) -> Result<WorkflowRunData, DifyError> {
        self.api
            .get_json(&format!("/workflows/run/{workflow_run_id}"))
            .await
    }

    /// Stop a running task. Streaming mode only; `task_id` comes from the
    /// stream's events.
    pub async fn stop_workflow_task(
        &self,
        task_id: &str,
        user: impl Into<String>,
    ) -> Result<ResultResponse, DifyError> {
        self.api
            .post_json(
                &format!("/workflows/tasks/{task_id}/stop"),
                &StopRequest { user: user.into() },
            )
            .await
    }

    /// Page through the workflow's execution logs.
    pub async fn workflow_logs(&self, query: &WorkflowLogsQuery) -> Result<WorkflowLogList, DifyError> {
        self.api.get_json_query("/workflows/logs", query).await
    }

    /// Upload a file for use in later runs.
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

    pub async fn app_info(&self) -> Result<AppInfo, DifyError> {
        self.api.get_json("/info").await
    }

    pub async fn app_parameters(&self) -> Result<AppParameters, DifyError> {
        self.api.get_json("/parameters").await
    }
}
