use {image::ImageError, remote::RemoteError, std::fmt, std::time::Duration, video::VideoError};

#[derive(Debug)]
pub enum LiveError {
    Capture(VideoError),
    Encode(ImageError),
    Decode(ImageError),
    Remote(RemoteError),
    Timeout(Duration),
    Stalled(Duration),
    Surface(String),
}

impl LiveError {
    /// Camera access was refused; retrying will not help.
    pub fn is_permission(&self) -> bool {
        matches!(self, LiveError::Capture(err) if err.is_permission())
    }
}

impl fmt::Display for LiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveError::Capture(err) => write!(f, "capture failed: {err}"),
            LiveError::Encode(err) => write!(f, "frame encoding failed: {err}"),
            LiveError::Decode(err) => write!(f, "annotated frame unreadable: {err}"),
            LiveError::Remote(err) => write!(f, "annotator failed: {err}"),
            LiveError::Timeout(after) => {
                write!(f, "annotator did not answer within {} ms", after.as_millis())
            }
            LiveError::Stalled(after) => {
                write!(f, "no frame from the source within {} ms", after.as_millis())
            }
            LiveError::Surface(msg) => write!(f, "surface error: {msg}"),
        }
    }
}

impl std::error::Error for LiveError {}

impl From<VideoError> for LiveError {
    fn from(err: VideoError) -> Self {
        LiveError::Capture(err)
    }
}

impl From<RemoteError> for LiveError {
    fn from(err: RemoteError) -> Self {
        LiveError::Remote(err)
    }
}
