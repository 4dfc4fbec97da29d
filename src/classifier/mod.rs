mod http;
pub mod types;

pub use http::HttpClassifier;
pub use types::{CapturedImage, ClassificationResult, Label};

use async_trait::async_trait;
use reqwest::StatusCode;

/// Failure talking to the classification endpoint
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("request to classification endpoint failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("classification endpoint answered with status {0}")]
    Status(StatusCode),

    #[error("classification response did not match the expected shape: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Trait for image classification backends
#[async_trait]
pub trait Classifier {
    /// Upload one image and return the endpoint's verdict
    async fn classify(&self, image: CapturedImage) -> Result<ClassificationResult, ClassifyError>;
}
