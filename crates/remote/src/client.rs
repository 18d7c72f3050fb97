use {
    crate::{
        wire::{CameraFrameRequest, CameraFrameResponse, IdentifyRequest, UploadResponse},
        *,
    },
    futures_util::stream::{self, Stream},
    reqwest::{Response, multipart},
    serde::de::DeserializeOwned,
    std::{collections::VecDeque, path::Path},
    tokio::io::{AsyncReadExt, AsyncWriteExt},
};

// read size of streamed uploads
const UPLOAD_CHUNK: usize = 64 * 1024;

/// File extensions accepted by `upload_video`, with the mime type sent along.
const VIDEO_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
    ("mpg", "video/mpeg"),
    ("mpeg", "video/mpeg"),
    ("wmv", "video/x-ms-wmv"),
    ("flv", "video/x-flv"),
    ("3gp", "video/3gpp"),
];

/// Mime type for a video path, `None` when the extension is not a video one.
pub fn video_mime(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    VIDEO_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

// the file is sent as it is read, never held in memory whole
fn file_body(file: tokio::fs::File) -> reqwest::Body {
    let chunks = stream::try_unfold(file, |mut file| async move {
        let mut chunk = vec![0u8; UPLOAD_CHUNK];
        let n = file.read(&mut chunk).await?;
        if n == 0 {
            return Ok::<_, std::io::Error>(None);
        }
        chunk.truncate(n);
        Ok(Some((chunk, file)))
    });
    reqwest::Body::wrap_stream(chunks)
}

#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    config: RemoteConfig,
}

impl Client {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let config = RemoteConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Absolute URL for a backend path. Already absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.config.base_url, path)
        } else {
            format!("{}/{}", self.config.base_url, path)
        }
    }

    // non-2xx answers become Server, with the backend's `{error}` text if any
    async fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value.get("error")?.as_str().map(str::to_string))
            .unwrap_or(body);
        Err(RemoteError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<R: DeserializeOwned>(response: Response) -> Result<R, RemoteError> {
        let response = Self::check(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send one JPEG frame to `/camera-stream` and get the annotated frame
    /// and detections back.
    pub async fn annotate_frame(&self, jpeg: &[u8]) -> Result<Annotation, RemoteError> {
        let request = CameraFrameRequest {
            frame: image::to_data_url(image::JPEG_MIME, jpeg),
        };
        let response = self
            .http
            .post(self.url("/camera-stream"))
            .timeout(self.config.timeout)
            .json(&request)
            .send()
            .await?;
        let response: CameraFrameResponse = Self::json(response).await?;
        let (mime, frame) = image::parse_data_url(&response.processed_frame)?;
        log::debug!(
            "camera-stream: {} byte frame, {} detections",
            frame.len(),
            response.detections.len()
        );
        Ok(Annotation {
            frame,
            mime,
            detections: response.detections,
        })
    }

    /// Upload a video file to `/process-video`. Processing continues on the
    /// backend; follow it with `detection_stream`.
    pub async fn upload_video(&self, path: &Path) -> Result<SessionId, RemoteError> {
        let Some(mime) = video_mime(path) else {
            return Err(RemoteError::InvalidInput(format!(
                "{} is not a video file",
                path.display()
            )));
        };
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("video")
            .to_string();
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        if length == 0 {
            return Err(RemoteError::InvalidInput(format!(
                "{} is empty",
                path.display()
            )));
        }
        log::info!("uploading {} ({} bytes)", file_name, length);

        let part = multipart::Part::stream_with_length(file_body(file), length)
            .file_name(file_name)
            .mime_str(mime)?;
        let form = multipart::Form::new().part("file", part);
        let response = self
            .http
            .post(self.url("/process-video"))
            .multipart(form)
            .send()
            .await?;
        let response: UploadResponse = Self::json(response).await?;
        if let Some(message) = &response.message {
            log::info!("session {}: {}", response.session_id, message);
        }
        Ok(response.session_id)
    }

    /// Open the progress event stream of an uploaded video.
    pub async fn detection_stream(
        &self,
        session: &SessionId,
    ) -> Result<DetectionStream, RemoteError> {
        let response = self
            .http
            .get(self.url(&format!("/detection-stream/{}", session)))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(DetectionStream::new(response))
    }

    /// Ask `/api/identify-wildlife` what animal is in a photo.
    pub async fn identify_wildlife(
        &self,
        mime: &str,
        photo: &[u8],
    ) -> Result<Identification, RemoteError> {
        if photo.is_empty() {
            return Err(RemoteError::InvalidInput("empty image".to_string()));
        }
        let request = IdentifyRequest {
            image: image::to_data_url(mime, photo),
        };
        let response = self
            .http
            .post(self.url("/api/identify-wildlife"))
            .timeout(self.config.timeout)
            .json(&request)
            .send()
            .await?;
        Self::json(response).await
    }

    pub async fn video_details(&self, session: &SessionId) -> Result<VideoDetails, RemoteError> {
        let response = self
            .http
            .get(self.url(&format!("/video-details/{}", session)))
            .timeout(self.config.timeout)
            .send()
            .await?;
        Self::json(response).await
    }

    /// Fetch a processed clip (`/processed/<file>` or a full URL) into `dest`.
    /// Returns the number of bytes written.
    pub async fn download(&self, url_path: &str, dest: &Path) -> Result<u64, RemoteError> {
        let response = self.http.get(self.url(url_path)).send().await?;
        let mut response = Self::check(response).await?;
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        log::info!("downloaded {} bytes to {}", written, dest.display());
        Ok(written)
    }
}

/// Progress events of one upload, in arrival order. Ends after the
/// `completed` event or when the server closes the connection.
pub struct DetectionStream {
    response: Option<Response>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl DetectionStream {
    fn new(response: Response) -> Self {
        Self {
            response: Some(response),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    pub async fn next_event(&mut self) -> Option<Result<ProgressEvent, RemoteError>> {
        loop {
            if self.finished {
                return None;
            }
            if let Some(payload) = self.pending.pop_front() {
                return match serde_json::from_str::<ProgressEvent>(&payload) {
                    Ok(event) => {
                        if event.is_completed() {
                            self.finished = true;
                            self.response = None;
                        }
                        Some(Ok(event))
                    }
                    Err(error) => Some(Err(RemoteError::Parse(format!(
                        "bad event {payload:?}: {error}"
                    )))),
                };
            }
            let Some(response) = self.response.as_mut() else {
                self.finished = true;
                return None;
            };
            match response.chunk().await {
                Ok(Some(chunk)) => match self.decoder.push(&chunk) {
                    Ok(payloads) => self.pending.extend(payloads),
                    Err(error) => {
                        self.response = None;
                        self.finished = true;
                        return Some(Err(error));
                    }
                },
                Ok(None) => {
                    self.response = None;
                    self.pending.extend(self.decoder.finish());
                }
                Err(error) => {
                    self.response = None;
                    self.finished = true;
                    return Some(Err(error.into()));
                }
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<ProgressEvent, RemoteError>> {
        stream::unfold(self, |mut events| async move {
            let item = events.next_event().await?;
            Some((item, events))
        })
    }
}
