use crate::classifier::ClassifyError;

/// Why a cycle ended without a verdict
///
/// The `Display` text is what the user sees. Low-level causes are logged
/// where they occur and never shown verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerdictError {
    #[error("Camera unavailable. Allow camera access and try again.")]
    CaptureUnavailable,

    #[error("Could not reach the classification backend. Please try again.")]
    TransportFailure,

    #[error("The classification backend sent a response we could not read.")]
    MalformedResponse,
}

impl From<&ClassifyError> for VerdictError {
    fn from(err: &ClassifyError) -> Self {
        match err {
            ClassifyError::Transport(_) | ClassifyError::Status(_) => VerdictError::TransportFailure,
            ClassifyError::Malformed(_) => VerdictError::MalformedResponse,
        }
    }
}
