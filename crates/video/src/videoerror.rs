use std::fmt;

#[derive(Debug)]
pub enum VideoError {
    Device(String),
    Permission(String),
    Stream(String),
    Decode(image::ImageError),
    Channel(String),
}

impl VideoError {
    /// True when the camera exists but this process may not open it.
    pub fn is_permission(&self) -> bool {
        matches!(self, VideoError::Permission(_))
    }
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::Device(msg) => write!(f, "device error: {msg}"),
            VideoError::Permission(msg) => write!(f, "camera access denied: {msg}"),
            VideoError::Stream(msg) => write!(f, "stream error: {msg}"),
            VideoError::Decode(err) => write!(f, "decode error: {err}"),
            VideoError::Channel(msg) => write!(f, "channel error: {msg}"),
        }
    }
}

impl std::error::Error for VideoError {}

impl From<std::io::Error> for VideoError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => VideoError::Permission(err.to_string()),
            _ => VideoError::Device(err.to_string()),
        }
    }
}

impl From<image::ImageError> for VideoError {
    fn from(err: image::ImageError) -> Self {
        VideoError::Decode(err)
    }
}
