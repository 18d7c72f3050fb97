//! JSON bodies exchanged with the backend.

use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// One labeled object in a frame. Display data only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in frame pixels.
    #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[f32; 4]>,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            bounds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CameraFrameRequest {
    pub frame: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CameraFrameResponse {
    pub processed_frame: String,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// Result of one `/camera-stream` exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Encoded annotated frame (JPEG as sent by the backend).
    pub frame: Vec<u8>,
    pub mime: Option<String>,
    pub detections: Vec<Detection>,
}

/// Backend identifier of an uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        SessionId(value.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UploadResponse {
    pub session_id: SessionId,
    #[serde(default)]
    pub message: Option<String>,
}

pub const STATUS_COMPLETED: &str = "completed";

/// One event of `/detection-stream/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub detections: Option<Vec<Detection>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "clip_url")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub top_species: Option<Vec<String>>,
}

impl ProgressEvent {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some(STATUS_COMPLETED)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct IdentifyRequest {
    pub image: String,
}

/// Answer of `/api/identify-wildlife`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    pub species: String,
    pub confidence: f32,
    #[serde(default)]
    pub information: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl Identification {
    /// The backend answers with a canned record when it could not identify
    /// anything.
    pub fn is_fallback(&self) -> bool {
        self.source.as_deref() == Some("fallback")
    }

    pub fn facts(&self) -> impl Iterator<Item = &str> {
        self.information
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

/// Row of `/video-details/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    #[serde(default)]
    pub id: Option<i64>,
    pub session_id: SessionId,
    #[serde(default)]
    pub original_video_path: Option<String>,
    #[serde(default)]
    pub processed_video_path: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub detected_classes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl VideoDetails {
    /// `detected_classes` is stored comma separated.
    pub fn detected_classes(&self) -> Vec<String> {
        self.detected_classes
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|class| !class.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some(STATUS_COMPLETED)
    }
}
