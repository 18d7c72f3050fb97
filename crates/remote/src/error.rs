use std::fmt;

#[derive(Debug)]
pub enum RemoteError {
    Http(String),
    Connection(String),
    Timeout,
    Server { status: u16, message: String },
    Parse(String),
    Io(std::io::Error),
    InvalidInput(String),
}

impl RemoteError {
    /// Transport level failures worth retrying: the backend was unreachable,
    /// slow, or answered with a 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Connection(_) | RemoteError::Timeout => true,
            RemoteError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Http(msg) => write!(f, "http error: {msg}"),
            RemoteError::Connection(msg) => write!(f, "connection error: {msg}"),
            RemoteError::Timeout => write!(f, "request timed out"),
            RemoteError::Server { status, message } => {
                write!(f, "server error (status {status}): {message}")
            }
            RemoteError::Parse(msg) => write!(f, "parse error: {msg}"),
            RemoteError::Io(err) => write!(f, "io error: {err}"),
            RemoteError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else if err.is_connect() {
            RemoteError::Connection(err.to_string())
        } else if err.is_decode() {
            RemoteError::Parse(err.to_string())
        } else {
            RemoteError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Parse(err.to_string())
    }
}

impl From<image::ImageError> for RemoteError {
    fn from(err: image::ImageError) -> Self {
        RemoteError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(err: std::io::Error) -> Self {
        RemoteError::Io(err)
    }
}
