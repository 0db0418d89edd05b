//! Typed stream events for Dify's `text/event-stream` responses.
//!
//! Every frame on the wire is a JSON document whose `event` key selects the
//! payload shape. [`StreamEvent`] models the full set of frames emitted by
//! chat, completion, and workflow applications; [`StreamEvent::from_json`]
//! reads the discriminator first and then decodes the rest of the frame
//! against the selected variant's schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::apis::workflow::WorkflowRunData;
use crate::client::DifyError;
use crate::model::MessageMetadata;

/// One decoded frame of a streaming response.
///
/// `message_end` and `workflow_finished` conventionally close their
/// respective runs, and `error` closes either; the server sends nothing
/// after them. Iteration itself ends at end-of-stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A chunk of LLM answer text.
    Message(MessageChunk),
    /// A chunk of answer text from an agent-mode application.
    AgentMessage(MessageChunk),
    /// An agent iteration: thought, tool invocation, and observation.
    AgentThought(AgentThoughtChunk),
    /// A new file attached to the message, ready for display.
    MessageFile(MessageFileChunk),
    /// End of a message stream; carries usage metadata.
    MessageEnd(MessageEndChunk),
    /// Replaces all answer text so far (content moderation hit).
    MessageReplace(MessageChunk),
    /// A workflow run has started.
    WorkflowStarted(WorkflowStartedChunk),
    /// A workflow node has started executing.
    NodeStarted(NodeStartedChunk),
    /// A workflow node finished, successfully or not.
    NodeFinished(NodeFinishedChunk),
    /// The workflow run finished, successfully or not.
    WorkflowFinished(WorkflowFinishedChunk),
    /// A server-side failure reported in-stream.
    Error(ErrorChunk),
    /// Keep-alive, sent every 10s.
    Ping,
}

/// Payload of `message`, `agent_message`, and `message_replace` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageChunk {
    /// Task ID, usable with the stop-generation endpoints.
    pub task_id: String,
    pub message_id: String,
    pub conversation_id: String,
    /// Answer text carried by this chunk.
    pub answer: String,
    #[serde(default)]
    pub created_at: i64,
}

/// Payload of `agent_thought` frames (agent-mode applications only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentThoughtChunk {
    /// Unique per agent iteration.
    pub id: String,
    pub task_id: String,
    pub message_id: String,
    /// Position of this thought within the message, starting at 1.
    #[serde(default)]
    pub position: u32,
    pub thought: String,
    /// Tool output observed by the agent.
    pub observation: String,
    /// Tool names, `;`-separated when several were invoked.
    pub tool: String,
    /// Tool input as a JSON-encoded string.
    pub tool_input: String,
    #[serde(default)]
    pub created_at: i64,
    /// File IDs referenced by this thought.
    pub message_files: Vec<String>,
    pub file_id: String,
    pub conversation_id: String,
}

/// Payload of `message_file` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageFileChunk {
    pub id: String,
    #[serde(rename = "type")]
    pub file_type: String,
    /// Always `assistant` on this interface.
    pub belongs_to: String,
    pub url: String,
    pub conversation_id: String,
}

/// Payload of `message_end` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEndChunk {
    pub task_id: String,
    pub message_id: String,
    pub conversation_id: String,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
}

/// Payload of `workflow_started` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStartedChunk {
    pub task_id: String,
    pub workflow_run_id: String,
    #[serde(default)]
    pub data: Option<WorkflowStartedData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStartedData {
    /// Workflow run ID.
    pub id: String,
    pub workflow_id: String,
    /// Monotonic per application, starting at 1.
    #[serde(default)]
    pub sequence_number: u32,
    #[serde(default)]
    pub created_at: i64,
}

/// Payload of `node_started` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStartedChunk {
    pub task_id: String,
    pub workflow_run_id: String,
    #[serde(default)]
    pub data: Option<NodeStartedData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStartedData {
    pub id: String,
    pub node_id: String,
    pub node_type: String,
    pub title: String,
    /// Execution order, for tracing display.
    #[serde(default)]
    pub index: u32,
    /// Absent on the first node of a run.
    #[serde(default)]
    pub predecessor_node_id: Option<String>,
    #[serde(default)]
    pub inputs: Option<Value>,
    #[serde(default)]
    pub created_at: i64,
}

/// Payload of `node_finished` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeFinishedChunk {
    pub task_id: String,
    pub workflow_run_id: String,
    #[serde(default)]
    pub data: Option<NodeFinishedData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeFinishedData {
    pub id: String,
    pub node_id: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub predecessor_node_id: Option<String>,
    #[serde(default)]
    pub inputs: Option<Value>,
    #[serde(default)]
    pub process_data: Option<Value>,
    #[serde(default)]
    pub outputs: Option<Value>,
    /// `running` / `succeeded` / `failed` / `stopped`.
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    /// Elapsed seconds.
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub execution_metadata: Option<Value>,
    #[serde(default)]
    pub created_at: i64,
}

/// Payload of `workflow_finished` frames. `data` matches the blocking
/// workflow-run response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowFinishedChunk {
    pub task_id: String,
    pub workflow_run_id: String,
    #[serde(default)]
    pub data: Option<WorkflowRunData>,
}

/// Payload of `error` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorChunk {
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub message_id: Option<String>,
    /// HTTP status code reported by the server.
    #[serde(default)]
    pub status: Option<u16>,
    pub code: String,
    pub message: String,
}

impl StreamEvent {
    /// Decode one frame payload (the JSON after the `data: ` prefix).
    ///
    /// Reads the `event` discriminator first, then decodes the remaining
    /// keys against that variant's schema. A recognized discriminator with a
    /// mismatched payload is a [`DifyError::Decode`]; an unrecognized
    /// discriminator is [`DifyError::UnknownEventType`] so callers can
    /// choose to skip or abort.
    pub fn from_json(data: &str) -> Result<Self, DifyError> {
        let value: Value =
            serde_json::from_str(data).map_err(|e| DifyError::decode("stream event frame", e))?;

        let kind = match value.get("event").and_then(Value::as_str) {
            Some(kind) => kind.to_owned(),
            None => {
                return Err(DifyError::decode(
                    "stream event frame",
                    serde::de::Error::custom("missing `event` discriminator"),
                ))
            }
        };

        let event = match kind.as_str() {
            "message" => StreamEvent::Message(decode_payload(&kind, value)?),
            "agent_message" => StreamEvent::AgentMessage(decode_payload(&kind, value)?),
            "agent_thought" => StreamEvent::AgentThought(decode_payload(&kind, value)?),
            "message_file" => StreamEvent::MessageFile(decode_payload(&kind, value)?),
            "message_end" => StreamEvent::MessageEnd(decode_payload(&kind, value)?),
            "message_replace" => StreamEvent::MessageReplace(decode_payload(&kind, value)?),
            "workflow_started" => StreamEvent::WorkflowStarted(decode_payload(&kind, value)?),
            "node_started" => StreamEvent::NodeStarted(decode_payload(&kind, value)?),
            "node_finished" => StreamEvent::NodeFinished(decode_payload(&kind, value)?),
            "workflow_finished" => StreamEvent::WorkflowFinished(decode_payload(&kind, value)?),
            "error" => StreamEvent::Error(decode_payload(&kind, value)?),
            "ping" => StreamEvent::Ping,
            _ => return Err(DifyError::UnknownEventType(kind)),
        };

        Ok(event)
    }

    /// The wire discriminator of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Message(_) => "message",
            StreamEvent::AgentMessage(_) => "agent_message",
            StreamEvent::AgentThought(_) => "agent_thought",
            StreamEvent::MessageFile(_) => "message_file",
            StreamEvent::MessageEnd(_) => "message_end",
            StreamEvent::MessageReplace(_) => "message_replace",
            StreamEvent::WorkflowStarted(_) => "workflow_started",
            StreamEvent::NodeStarted(_) => "node_started",
            StreamEvent::NodeFinished(_) => "node_finished",
            StreamEvent::WorkflowFinished(_) => "workflow_finished",
            StreamEvent::Error(_) => "error",
            StreamEvent::Ping => "ping",
        }
    }

    /// The task ID carried by this event, for correlating with the
    /// stop-generation endpoints. `ping` and `message_file` frames carry
    /// none.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            StreamEvent::Message(c) | StreamEvent::AgentMessage(c) | StreamEvent::MessageReplace(c) => {
                Some(&c.task_id)
            }
            StreamEvent::AgentThought(c) => Some(&c.task_id),
            StreamEvent::MessageEnd(c) => Some(&c.task_id),
            StreamEvent::WorkflowStarted(c) => Some(&c.task_id),
            StreamEvent::NodeStarted(c) => Some(&c.task_id),
            StreamEvent::NodeFinished(c) => Some(&c.task_id),
            StreamEvent::WorkflowFinished(c) => Some(&c.task_id),
            StreamEvent::Error(c) if !c.task_id.is_empty() => Some(&c.task_id),
            _ => None,
        }
    }

    /// Whether the server sends no further frames after this one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::MessageEnd(_) | StreamEvent::WorkflowFinished(_) | StreamEvent::Error(_)
        )
    }
}

fn decode_payload<T: serde::de::DeserializeOwned>(kind: &str, value: Value) -> Result<T, DifyError> {
    serde_json::from_value(value).map_err(|e| DifyError::decode(format!("`{kind}` event"), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_message_event() {
        let event = StreamEvent::from_json(
            r#"{"event":"message","task_id":"t1","message_id":"m1","conversation_id":"c1","answer":"Hi","created_at":1705398420}"#,
        )
        .unwrap();

        match &event {
            StreamEvent::Message(chunk) => {
                assert_eq!(chunk.answer, "Hi");
                assert_eq!(chunk.created_at, 1705398420);
            }
            other => panic!("expected message event, got {other:?}"),
        }
        assert_eq!(event.kind(), "message");
        assert_eq!(event.task_id(), Some("t1"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn decodes_agent_thought_event() {
        let event = StreamEvent::from_json(
            r#"{"event":"agent_thought","id":"th1","task_id":"t1","message_id":"m1","position":1,
                "thought":"look it up","observation":"42","tool":"search",
                "tool_input":"{\"search\":{\"query\":\"meaning of life\"}}",
                "created_at":1705395332,"message_files":["f1"],"file_id":"f1","conversation_id":"c1"}"#,
        )
        .unwrap();

        match event {
            StreamEvent::AgentThought(chunk) => {
                assert_eq!(chunk.position, 1);
                assert_eq!(chunk.tool, "search");
                assert_eq!(chunk.message_files, vec!["f1".to_string()]);
            }
            other => panic!("expected agent_thought event, got {other:?}"),
        }
    }

    #[test]
    fn decodes_message_end_with_metadata() {
        let event = StreamEvent::from_json(
            r#"{"event":"message_end","task_id":"t1","message_id":"m1","conversation_id":"c1",
                "metadata":{"usage":{"total_tokens":12},"retriever_resources":[]}}"#,
        )
        .unwrap();

        match &event {
            StreamEvent::MessageEnd(chunk) => {
                let metadata = chunk.metadata.as_ref().unwrap();
                assert_eq!(metadata.usage.as_ref().unwrap()["total_tokens"], 12);
            }
            other => panic!("expected message_end event, got {other:?}"),
        }
        assert!(event.is_terminal());
    }

    #[test]
    fn message_end_metadata_is_optional() {
        let event = StreamEvent::from_json(
            r#"{"event":"message_end","task_id":"t1","message_id":"m1","conversation_id":"c1"}"#,
        )
        .unwrap();
        assert!(matches!(event, StreamEvent::MessageEnd(chunk) if chunk.metadata.is_none()));
    }

    #[test]
    fn decodes_workflow_lifecycle_events() {
        let started = StreamEvent::from_json(
            r#"{"event":"workflow_started","task_id":"t1","workflow_run_id":"r1",
                "data":{"id":"r1","workflow_id":"w1","sequence_number":3,"created_at":1705395332}}"#,
        )
        .unwrap();
        assert!(matches!(
            &started,
            StreamEvent::WorkflowStarted(chunk) if chunk.data.as_ref().unwrap().sequence_number == 3
        ));

        let node_finished = StreamEvent::from_json(
            r#"{"event":"node_finished","task_id":"t1","workflow_run_id":"r1",
                "data":{"id":"n1","node_id":"node-a","index":2,"status":"succeeded",
                        "outputs":{"text":"done"},"elapsed_time":0.42,"created_at":1705395332}}"#,
        )
        .unwrap();
        match node_finished {
            StreamEvent::NodeFinished(chunk) => {
                let data = chunk.data.unwrap();
                assert_eq!(data.status, "succeeded");
                assert!(data.predecessor_node_id.is_none());
                assert_eq!(data.elapsed_time, Some(0.42));
            }
            other => panic!("expected node_finished event, got {other:?}"),
        }

        let finished = StreamEvent::from_json(
            r#"{"event":"workflow_finished","task_id":"t1","workflow_run_id":"r1",
                "data":{"id":"r1","workflow_id":"w1","status":"succeeded","outputs":{"answer":"ok"},
                        "elapsed_time":1.5,"total_tokens":99,"total_steps":4,
                        "created_at":1705395332,"finished_at":1705395334}}"#,
        )
        .unwrap();
        assert!(finished.is_terminal());
        assert!(matches!(
            finished,
            StreamEvent::WorkflowFinished(chunk)
                if chunk.data.as_ref().unwrap().total_tokens == Some(99)
        ));
    }

    #[test]
    fn decodes_error_event() {
        let event = StreamEvent::from_json(
            r#"{"event":"error","task_id":"t1","message_id":"m1","status":400,
                "code":"invalid_param","message":"inputs is required"}"#,
        )
        .unwrap();

        match &event {
            StreamEvent::Error(chunk) => {
                assert_eq!(chunk.code, "invalid_param");
                assert_eq!(chunk.status, Some(400));
            }
            other => panic!("expected error event, got {other:?}"),
        }
        assert!(event.is_terminal());
    }

    #[test]
    fn decodes_ping_event() {
        let event = StreamEvent::from_json(r#"{"event":"ping"}"#).unwrap();
        assert_eq!(event, StreamEvent::Ping);
        assert_eq!(event.task_id(), None);
    }

    #[test]
    fn unknown_discriminator_is_reported_by_name() {
        let err = StreamEvent::from_json(r#"{"event":"tts_chunk","audio":"..."}"#).unwrap_err();
        assert!(matches!(err, DifyError::UnknownEventType(kind) if kind == "tts_chunk"));
    }

    #[test]
    fn missing_discriminator_is_a_decode_error() {
        let err = StreamEvent::from_json(r#"{"answer":"Hi"}"#).unwrap_err();
        assert!(matches!(err, DifyError::Decode { .. }));
    }

    #[test]
    fn recognized_event_with_bad_payload_is_a_decode_error() {
        // answer is required on message frames
        let err = StreamEvent::from_json(
            r#"{"event":"message","task_id":"t1","message_id":"m1","conversation_id":"c1"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DifyError::Decode { .. }));
    }

    #[test]
    fn unexpected_extra_fields_are_tolerated() {
        let event = StreamEvent::from_json(
            r#"{"event":"message","task_id":"t1","message_id":"m1","conversation_id":"c1",
                "answer":"Hi","created_at":1,"brand_new_field":true}"#,
        )
        .unwrap();
        assert!(matches!(event, StreamEvent::Message(_)));
    }
}
