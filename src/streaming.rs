//! Dual-mode response handling: blocking bodies and event streams.
//!
//! Chat, completion, and workflow requests all carry a `response_mode` flag.
//! The helpers here force the flag to match the call that was chosen, gate on
//! the HTTP status before touching the body, and then either decode the body
//! as one DTO (blocking) or as a lazy, pull-based sequence of
//! [`StreamEvent`]s (streaming).
//!
//! Streaming is single-pass and fail-fast: a malformed frame terminates the
//! sequence with the error that was detected, and dropping the stream at any
//! point releases the underlying connection.

use std::pin::Pin;

use bytes::Bytes;
use futures::future;
use futures::stream::{Stream, StreamExt};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::DifyError;
use crate::event::StreamEvent;
use crate::http::HttpApi;
use crate::sse;

/// How the server should deliver an application response.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Typewriter-style delivery over SSE. Recommended; blocking requests
    /// through Dify cloud are cut off after 100 seconds, and agent
    /// applications accept nothing else.
    Streaming,

    /// One complete payload after server-side execution finishes.
    #[default]
    Blocking,
}

/// Policy for stream frames whose `event` discriminator is not recognized.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum UnknownEventPolicy {
    /// Terminate the stream with [`DifyError::UnknownEventType`].
    #[default]
    Fail,

    /// Drop the frame and keep reading.
    Skip,
}

/// A lazy, single-pass sequence of decoded stream events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, DifyError>> + Send>>;

/// A request body that carries the dual-mode flag.
///
/// Callers never need to set the flag themselves: the blocking and streaming
/// helpers overwrite it before dispatch. Do not share one request value
/// across concurrent calls expecting different modes.
pub trait AppRequest: Serialize {
    /// Mutable slot for the response-mode flag.
    fn response_mode_mut(&mut self) -> &mut ResponseMode;

    /// The end-user identifier; must be non-empty.
    fn user(&self) -> &str;
}

/// Force the response mode and check the request invariants.
pub(crate) fn prepare<R: AppRequest>(mut request: R, mode: ResponseMode) -> Result<R, DifyError> {
    if request.user().trim().is_empty() {
        return Err(DifyError::Config(
            "request `user` must not be empty".to_string(),
        ));
    }
    *request.response_mode_mut() = mode;
    Ok(request)
}

/// Decode a blocking response body, gating on the HTTP status first.
///
/// A non-2xx response never reaches the success-DTO decoder; its body is
/// returned verbatim inside [`DifyError::RequestFailed`].
pub(crate) fn decode_blocking<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    context: &str,
) -> Result<T, DifyError> {
    if !status.is_success() {
        return Err(DifyError::RequestFailed {
            status,
            body: body.to_string(),
        });
    }

    serde_json::from_str(body).map_err(|e| DifyError::decode(context.to_string(), e))
}

/// Decode an SSE byte stream into typed events.
///
/// Frames arrive in wire order. The first error (transport, decode, or
/// unknown discriminator under [`UnknownEventPolicy::Fail`]) is yielded and
/// then the sequence ends; nothing is silently skipped except frames the
/// `Skip` policy drops.
pub(crate) fn event_stream<S, E>(byte_stream: S, policy: UnknownEventPolicy) -> EventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<DifyError> + Send + 'static,
{
    let events = sse::data_lines(byte_stream)
        .filter_map(move |item| {
            future::ready(match item {
                Ok(data) => match StreamEvent::from_json(&data) {
                    Ok(event) => Some(Ok(event)),
                    Err(DifyError::UnknownEventType(kind))
                        if policy == UnknownEventPolicy::Skip =>
                    {
                        tracing::debug!(event = %kind, "skipping unrecognized stream event");
                        None
                    }
                    Err(e) => Some(Err(e)),
                },
                Err(e) => Some(Err(e)),
            })
        })
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            if item.is_err() {
                *failed = true;
            }
            future::ready(Some(item))
        });

    Box::pin(events)
}

impl HttpApi {
    /// Send an application request in blocking mode and decode the complete
    /// response body.
    pub(crate) async fn post_app_blocking<R, T>(&self, path: &str, request: R) -> Result<T, DifyError>
    where
        R: AppRequest,
        T: DeserializeOwned,
    {
        let request = prepare(request, ResponseMode::Blocking)?;
        let response = self.post(path).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_blocking(status, &body, path)
    }

    /// Send an application request in streaming mode and open the response
    /// body as an event stream.
    ///
    /// A non-2xx status is surfaced here, before any event is yielded.
    pub(crate) async fn post_app_streaming<R>(
        &self,
        path: &str,
        request: R,
    ) -> Result<EventStream, DifyError>
    where
        R: AppRequest,
    {
        let request = prepare(request, ResponseMode::Streaming)?;
        let response = self.post(path).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DifyError::RequestFailed { status, body });
        }

        Ok(event_stream(
            response.bytes_stream(),
            self.unknown_event_policy(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::chat::{ChatCompletionResponse, ChatRequest};
    use futures::stream;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn chat_request(user: &str) -> ChatRequest {
        ChatRequest::new("Hello".to_string(), user.to_string())
    }

    fn byte_stream(
        parts: Vec<&'static str>,
    ) -> impl Stream<Item = Result<Bytes, DifyError>> + Send {
        stream::iter(
            parts
                .into_iter()
                .map(|p| Ok(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn response_mode_wire_names_are_snake_case() {
        assert_eq!(
            serde_json::to_value(ResponseMode::Streaming).unwrap(),
            serde_json::json!("streaming")
        );
        assert_eq!(
            serde_json::to_value(ResponseMode::Blocking).unwrap(),
            serde_json::json!("blocking")
        );
    }

    #[test]
    fn prepare_forces_the_requested_mode() {
        let mut request = chat_request("abc-123");
        *request.response_mode_mut() = ResponseMode::Streaming;

        let request = prepare(request, ResponseMode::Blocking).unwrap();
        assert_eq!(request.response_mode, ResponseMode::Blocking);

        let request = prepare(request, ResponseMode::Streaming).unwrap();
        assert_eq!(request.response_mode, ResponseMode::Streaming);
    }

    #[test]
    fn prepare_rejects_empty_user() {
        let err = prepare(chat_request("  "), ResponseMode::Blocking).unwrap_err();
        assert!(matches!(err, DifyError::Config(_)));
    }

    #[test]
    fn decode_blocking_returns_the_dto_on_success() {
        let body = r#"{"message_id":"m1","conversation_id":"c1","mode":"chat","answer":"Hi","create_at":1}"#;
        let response: ChatCompletionResponse =
            decode_blocking(StatusCode::OK, body, "/chat-messages").unwrap();

        assert_eq!(response.answer, "Hi");
        assert_eq!(response.message_id, "m1");
        assert_eq!(response.create_at, 1);
    }

    #[test]
    fn decode_blocking_surfaces_error_status_without_decoding() {
        let body = r#"{"code":"not_found","message":"x"}"#;
        let err = decode_blocking::<ChatCompletionResponse>(
            StatusCode::NOT_FOUND,
            body,
            "/chat-messages",
        )
        .unwrap_err();

        match err {
            DifyError::RequestFailed { status, body: got } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(got, body);
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[test]
    fn decode_blocking_reports_shape_mismatch() {
        let err = decode_blocking::<ChatCompletionResponse>(
            StatusCode::OK,
            r#"{"unexpected":"shape"}"#,
            "/chat-messages",
        )
        .unwrap_err();
        assert!(matches!(err, DifyError::Decode { .. }));
    }

    #[tokio::test]
    async fn decodes_a_message_stream_in_order() {
        let input = byte_stream(vec![
            "data: {\"event\":\"message\",\"task_id\":\"t1\",\"message_id\":\"m1\",\"conversation_id\":\"c1\",\"answer\":\"Hi\",\"created_at\":1}\n\n",
            "data: {\"event\":\"message_end\",\"task_id\":\"t1\",\"message_id\":\"m1\",\"conversation_id\":\"c1\"}\n\n",
        ]);

        let events: Vec<_> = event_stream(input, UnknownEventPolicy::Fail).collect().await;
        assert_eq!(events.len(), 2);

        match events[0].as_ref().unwrap() {
            StreamEvent::Message(chunk) => assert_eq!(chunk.answer, "Hi"),
            other => panic!("expected message event, got {other:?}"),
        }
        let last = events[1].as_ref().unwrap();
        assert!(matches!(last, StreamEvent::MessageEnd(_)));
        assert!(last.is_terminal());
    }

    #[tokio::test]
    async fn keep_alive_noise_is_never_yielded() {
        let input = byte_stream(vec![
            ": comment\n\n",
            "data: {\"event\":\"ping\"}\n\n",
            "\n\n",
            "data: {\"event\":\"message\",\"task_id\":\"t1\",\"message_id\":\"m1\",\"conversation_id\":\"c1\",\"answer\":\"Hi\"}\n\n",
        ]);

        let events: Vec<_> = event_stream(input, UnknownEventPolicy::Fail).collect().await;
        let kinds: Vec<_> = events.iter().map(|e| e.as_ref().unwrap().kind()).collect();
        assert_eq!(kinds, vec!["ping", "message"]);
    }

    #[tokio::test]
    async fn malformed_frame_fails_fast_after_valid_events() {
        let input = byte_stream(vec![
            "data: {\"event\":\"message\",\"task_id\":\"t1\",\"message_id\":\"m1\",\"conversation_id\":\"c1\",\"answer\":\"Hi\"}\n\n",
            "data: {not json at all\n\n",
            "data: {\"event\":\"message_end\",\"task_id\":\"t1\",\"message_id\":\"m1\",\"conversation_id\":\"c1\"}\n\n",
        ]);

        let events: Vec<_> = event_stream(input, UnknownEventPolicy::Fail).collect().await;

        // the valid prefix, then the error, then nothing
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(events[1], Err(DifyError::Decode { .. })));
    }

    #[tokio::test]
    async fn unknown_event_fails_the_stream_by_default() {
        let input = byte_stream(vec![
            "data: {\"event\":\"tts_chunk\",\"audio\":\"AAAA\"}\n\n",
            "data: {\"event\":\"ping\"}\n\n",
        ]);

        let events: Vec<_> = event_stream(input, UnknownEventPolicy::Fail).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(DifyError::UnknownEventType(_))));
    }

    #[tokio::test]
    async fn unknown_event_can_be_skipped_by_policy() {
        let input = byte_stream(vec![
            "data: {\"event\":\"tts_chunk\",\"audio\":\"AAAA\"}\n\n",
            "data: {\"event\":\"ping\"}\n\n",
        ]);

        let events: Vec<_> = event_stream(input, UnknownEventPolicy::Skip).collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), &StreamEvent::Ping);
    }

    #[tokio::test]
    async fn dropping_the_stream_releases_the_connection() {
        struct DropFlag(Arc<AtomicBool>);
        impl Drop for DropFlag {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let released = Arc::new(AtomicBool::new(false));
        let guard = DropFlag(released.clone());

        // an open connection: one frame, then silence
        let input = byte_stream(vec![
            "data: {\"event\":\"message\",\"task_id\":\"t1\",\"message_id\":\"m1\",\"conversation_id\":\"c1\",\"answer\":\"Hi\"}\n\n",
        ])
        .chain(stream::pending())
        .map(move |item| {
            let _held = &guard;
            item
        });

        let mut events = event_stream(input, UnknownEventPolicy::Fail);
        let first = events.next().await.unwrap().unwrap();
        assert_eq!(first.kind(), "message");
        assert!(!released.load(Ordering::SeqCst));

        drop(events);
        assert!(released.load(Ordering::SeqCst));
    }
}
