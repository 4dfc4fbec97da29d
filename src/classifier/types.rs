use crate::capture::EncodedFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Multipart field name the endpoint reads the image from
pub const UPLOAD_FIELD: &str = "file";

/// Filename attached to every upload
pub const UPLOAD_FILENAME: &str = "selfie.jpg";

pub const UPLOAD_MIME: &str = "image/jpeg";

/// Still frame packaged for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: &'static str,
}

impl From<EncodedFrame> for CapturedImage {
    fn from(frame: EncodedFrame) -> Self {
        Self {
            bytes: frame.into_bytes(),
            mime: UPLOAD_MIME,
            filename: UPLOAD_FILENAME,
        }
    }
}

/// Two-valued hygiene category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    FreshClean,
    NeedsBath,
}

impl Label {
    pub fn headline(&self) -> &'static str {
        match self {
            Label::FreshClean => "Fresh & clean",
            Label::NeedsBath => "Needs attention",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::FreshClean => write!(f, "fresh_clean"),
            Label::NeedsBath => write!(f, "needs_bath"),
        }
    }
}

/// Classification endpoint response
///
/// `confidence` is a display string and is never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub status: String,
    pub label: Label,
    pub confidence: String,
    pub verdict: String,
}
