use super::types::{CapturedImage, ClassificationResult, UPLOAD_FIELD};
use super::{Classifier, ClassifyError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use std::time::Duration;

/// Classifier that POSTs the image to a remote endpoint as multipart form data
pub struct HttpClassifier {
    client: Client,
    endpoint: Url,
}

impl HttpClassifier {
    /// Build a classifier for `endpoint`
    ///
    /// Without a timeout the transport's defaults apply.
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        tracing::info!("Classification endpoint: {}", endpoint);

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, image: CapturedImage) -> Result<ClassificationResult, ClassifyError> {
        let size = image.bytes.len();
        let part = Part::bytes(image.bytes)
            .file_name(image.filename)
            .mime_str(image.mime)
            .map_err(ClassifyError::Transport)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        tracing::debug!(bytes = size, "Uploading frame to {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(ClassifyError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Status(status));
        }

        let body = response.bytes().await.map_err(ClassifyError::Transport)?;
        let result: ClassificationResult =
            serde_json::from_slice(&body).map_err(ClassifyError::Malformed)?;

        tracing::debug!(label = %result.label, confidence = %result.confidence, "Classification received");

        Ok(result)
    }
}
