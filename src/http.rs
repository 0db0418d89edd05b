//! HTTP plumbing: client construction and the authenticating dispatcher.
//!
//! Every request a typed client makes goes through [`HttpApi::request`],
//! which joins the base URL with the operation path and attaches the bearer
//! token. Retry and socket-level behavior stay with `reqwest`.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::DifyError;
use crate::options::{DifyOptions, SecretString};
use crate::streaming::{decode_blocking, UnknownEventPolicy};

/// Build a configured HTTP client from the shared options.
///
/// Applies the timeout, proxy, and extra default headers.
pub fn build_http_client(options: &DifyOptions) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();

    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &options.proxy {
        if let Ok(proxy) = reqwest::Proxy::all(proxy_url) {
            builder = builder.proxy(proxy);
        }
    }

    if let Some(extra) = &options.extra_headers {
        let mut headers = HeaderMap::new();
        for (key, value) in extra {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(key.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, value);
            }
        }
        builder = builder.default_headers(headers);
    }

    builder.build()
}

/// One authenticated endpoint surface: shared connection pool, base URL,
/// and the secret for exactly one API key.
#[derive(Clone, Debug)]
pub(crate) struct HttpApi {
    http: Client,
    base_url: String,
    key: SecretString,
    policy: UnknownEventPolicy,
}

impl HttpApi {
    /// Build a standalone surface with its own connection pool.
    pub(crate) fn new(key: SecretString, options: &DifyOptions) -> Result<Self, DifyError> {
        let http = build_http_client(options)?;
        Ok(Self::from_parts(
            http,
            options.base_url.clone(),
            key,
            options.unknown_event_policy,
        ))
    }

    /// Build a surface over an existing pool (registry path).
    pub(crate) fn from_parts(
        http: Client,
        base_url: String,
        key: SecretString,
        policy: UnknownEventPolicy,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
            policy,
        }
    }

    pub(crate) fn unknown_event_policy(&self) -> UnknownEventPolicy {
        self.policy
    }

    /// Start a request against `path`, with the authorization header
    /// attached. The secret itself is never logged.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "dispatching request");
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.key.expose_secret()),
            )
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DifyError> {
        let response = self.request(Method::GET, path).send().await?;
        read_json(response, path).await
    }

    pub(crate) async fn get_json_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, DifyError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.request(Method::GET, path).query(query).send().await?;
        read_json(response, path).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, DifyError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.post(path).json(body).send().await?;
        read_json(response, path).await
    }

    /// POST expecting a non-JSON payload back (audio bytes).
    pub(crate) async fn post_json_bytes<B>(&self, path: &str, body: &B) -> Result<Bytes, DifyError>
    where
        B: Serialize + ?Sized,
    {
        let response = self.post(path).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DifyError::RequestFailed { status, body });
        }
        Ok(response.bytes().await?)
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, DifyError> {
        let response = self.post(path).multipart(form).send().await?;
        read_json(response, path).await
    }

    pub(crate) async fn delete_json<B, T>(&self, path: &str, body: &B) -> Result<T, DifyError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(Method::DELETE, path).json(body).send().await?;
        read_json(response, path).await
    }

    /// DELETE without a body, decoding the acknowledgement JSON.
    pub(crate) async fn delete_expect_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, DifyError> {
        let response = self.request(Method::DELETE, path).send().await?;
        read_json(response, path).await
    }

    /// DELETE where the server answers with an empty 2xx body.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), DifyError> {
        let response = self.request(Method::DELETE, path).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DifyError::RequestFailed { status, body });
        }
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, context: &str) -> Result<T, DifyError> {
    let status = response.status();
    let body = response.text().await?;
    decode_blocking(status, &body, context)
}

/// A named file part for multipart uploads.
pub(crate) fn file_part(file_name: String, bytes: Vec<u8>) -> Part {
    Part::bytes(bytes).file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn builds_client_with_timeout() {
        let options = DifyOptions::new().with_timeout(Duration::from_secs(30));
        assert!(build_http_client(&options).is_ok());
    }

    #[test]
    fn builds_client_with_proxy_and_headers() {
        let options = DifyOptions::new()
            .with_proxy("http://proxy.example.com:8080".to_string())
            .with_header("X-Request-Source".to_string(), "tests".to_string());
        assert!(build_http_client(&options).is_ok());
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let api = HttpApi::from_parts(
            Client::new(),
            "https://api.dify.ai/v1/".to_string(),
            SecretString::from("app-key"),
            UnknownEventPolicy::Fail,
        );
        assert_eq!(api.base_url, "https://api.dify.ai/v1");
    }
}
