//! REST client for the ranking backend.
//!
//! Wraps the HTTP endpoints (job submission, long-poll result retrieval,
//! heartbeat) using [`reqwest`].

use async_trait::async_trait;
use rankgraph_core::types::TaskId;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

use crate::messages::{
    SubmitRequest, CHECK_TASK_RESULT_PATH, HEARTBEAT_PATH, IMAGES_FIELD,
};
use crate::transport::{PollReply, Transport, TransportError};

/// HTTP transport for a single backend.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for a backend.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://host:8000/api`.
    ///
    /// No request timeout is set: long polls are held open until the
    /// gateway answers.
    pub fn new(base_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a transport reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn multipart_form(request: &SubmitRequest) -> Result<Form, TransportError> {
        let mut form = Form::new();
        if let SubmitRequest::ImageTranscribe { images } = request {
            for image in images {
                let part = Part::bytes(image.bytes.clone())
                    .file_name(image.name.clone())
                    .mime_str(&image.content_type)?;
                form = form.part(IMAGES_FIELD, part);
            }
        }
        Ok(form)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`TransportError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body.
    async fn parse_response(
        response: reqwest::Response,
    ) -> Result<serde_json::Value, TransportError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    /// Sends a `POST` to the request's endpoint: JSON for text bodies,
    /// multipart with one `images` part per file for uploads.
    async fn submit(&self, request: &SubmitRequest) -> Result<serde_json::Value, TransportError> {
        let builder = self.client.post(self.url(request.endpoint()));
        let builder = match request.json_body() {
            Some(body) => builder.json(&body),
            None => builder.multipart(Self::multipart_form(request)?),
        };

        let response = builder.send().await?;
        Self::parse_response(response).await
    }

    /// Sends `GET /check_task_result?task_id=...`. A 502 means the
    /// gateway timed out the long poll.
    async fn check_task_result(&self, task_id: &TaskId) -> Result<PollReply, TransportError> {
        let response = self
            .client
            .get(self.url(CHECK_TASK_RESULT_PATH))
            .query(&[("task_id", task_id.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::BAD_GATEWAY {
            return Ok(PollReply::GatewayTimeout);
        }

        Self::parse_response(response).await.map(PollReply::Ready)
    }

    /// Sends `GET /heartbeat`; only a 200 counts as alive.
    async fn heartbeat(&self) -> Result<bool, TransportError> {
        let response = self.client.get(self.url(HEARTBEAT_PATH)).send().await?;
        Ok(response.status() == StatusCode::OK)
    }
}
