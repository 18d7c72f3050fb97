use {
    futures_util::StreamExt,
    remote::*,
    std::{path::PathBuf, time::Duration},
    tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        sync::mpsc,
        time::sleep,
    },
};

struct Reply {
    status: u16,
    content_type: &'static str,
    chunks: Vec<Vec<u8>>,
}

impl Reply {
    fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            chunks: vec![body.to_string().into_bytes()],
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            chunks: vec![body.as_bytes().to_vec()],
        }
    }

    fn events(chunks: &[&str]) -> Self {
        Self {
            status: 200,
            content_type: "text/event-stream",
            chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
        }
    }
}

struct Request {
    head: String,
    body: Vec<u8>,
}

impl Request {
    fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

async fn read_request(stream: &mut TcpStream) -> Request {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let head_end = loop {
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "client closed before sending a request");
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = find(&data, b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&data[..head_end]).to_string();
    let length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while data.len() < head_end + length {
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "client closed mid body");
        data.extend_from_slice(&buf[..n]);
    }
    Request {
        head,
        body: data[head_end..head_end + length].to_vec(),
    }
}

/// Answer one connection per reply, in order, and hand back what was asked.
async fn serve(replies: Vec<Reply>) -> (String, mpsc::UnboundedReceiver<Request>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (sender, receiver) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        for reply in replies {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            sender.send(request).ok();
            let length: usize = reply.chunks.iter().map(Vec::len).sum();
            let reason = match reply.status {
                200 => "OK",
                404 => "Not Found",
                500 => "Internal Server Error",
                _ => "Status",
            };
            let head = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                reply.status, reason, reply.content_type, length
            );
            if stream.write_all(head.as_bytes()).await.is_err() {
                continue;
            }
            // the client may hang up early, e.g. after a completed event
            for chunk in reply.chunks {
                if stream.write_all(&chunk).await.is_err() || stream.flush().await.is_err() {
                    break;
                }
                sleep(Duration::from_millis(10)).await;
            }
            stream.shutdown().await.ok();
        }
    });
    (format!("http://{}", addr), receiver)
}

fn client(base_url: &str) -> Client {
    Client::new(
        RemoteConfig::default()
            .with_base_url(base_url)
            .with_timeout(Duration::from_secs(5)),
    )
    .unwrap()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("remote-{}-{}", std::process::id(), name))
}

#[tokio::test]
async fn test_annotate_frame_posts_jpeg_data_url() {
    let (base_url, mut requests) = serve(vec![Reply::json(
        200,
        serde_json::json!({
            "processed_frame": image::to_data_url(image::JPEG_MIME, &[1, 2, 3]),
            "detections": [{"label": "deer", "confidence": 0.823, "box": [10, 20, 110, 220]}],
        }),
    )])
    .await;

    let annotation = client(&base_url)
        .annotate_frame(&[0xff, 0xd8, 0xff])
        .await
        .unwrap();
    assert_eq!(annotation.frame, vec![1, 2, 3]);
    assert_eq!(annotation.mime.as_deref(), Some("image/jpeg"));
    assert_eq!(annotation.detections.len(), 1);
    assert_eq!(annotation.detections[0].label, "deer");
    assert_eq!(
        annotation.detections[0].bounds,
        Some([10.0, 20.0, 110.0, 220.0])
    );

    let request = requests.recv().await.unwrap();
    assert!(request.request_line().starts_with("POST /camera-stream "));
    assert_eq!(
        request.json()["frame"],
        image::to_data_url(image::JPEG_MIME, &[0xff, 0xd8, 0xff])
    );
}

#[tokio::test]
async fn test_annotate_frame_accepts_bare_base64() {
    let (base_url, _requests) = serve(vec![Reply::json(
        200,
        serde_json::json!({"processed_frame": "AQID"}),
    )])
    .await;

    let annotation = client(&base_url).annotate_frame(&[0]).await.unwrap();
    assert_eq!(annotation.frame, vec![1, 2, 3]);
    assert_eq!(annotation.mime, None);
    assert!(annotation.detections.is_empty());
}

#[tokio::test]
async fn test_server_error_carries_backend_message() {
    let (base_url, _requests) = serve(vec![Reply::json(
        500,
        serde_json::json!({"error": "model not loaded"}),
    )])
    .await;

    let error = client(&base_url).annotate_frame(&[0]).await.unwrap_err();
    match &error {
        RemoteError::Server { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "model not loaded");
        }
        other => panic!("Expected RemoteError::Server, got {:?}", other),
    }
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_plain_error_body_is_kept() {
    let (base_url, _requests) = serve(vec![Reply::text(404, "no such route")]).await;

    let error = client(&base_url).annotate_frame(&[0]).await.unwrap_err();
    match error {
        RemoteError::Server { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "no such route");
        }
        other => panic!("Expected RemoteError::Server, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_response_is_parse_error() {
    let (base_url, _requests) = serve(vec![Reply::text(200, "<html>oops</html>")]).await;

    let error = client(&base_url).annotate_frame(&[0]).await.unwrap_err();
    assert!(matches!(error, RemoteError::Parse(_)), "got {:?}", error);
}

#[tokio::test]
async fn test_bad_processed_frame_is_parse_error() {
    let (base_url, _requests) = serve(vec![Reply::json(
        200,
        serde_json::json!({"processed_frame": "data:image/jpeg;base64,!!!"}),
    )])
    .await;

    let error = client(&base_url).annotate_frame(&[0]).await.unwrap_err();
    assert!(matches!(error, RemoteError::Parse(_)), "got {:?}", error);
}

#[tokio::test]
async fn test_upload_video_sends_multipart_file() {
    let path = temp_path("clip.mp4");
    tokio::fs::write(&path, b"not really a video").await.unwrap();
    let (base_url, mut requests) = serve(vec![Reply::json(
        200,
        serde_json::json!({"session_id": "abc-123", "message": "Processing started"}),
    )])
    .await;

    let session = client(&base_url).upload_video(&path).await.unwrap();
    assert_eq!(session, SessionId::from("abc-123"));

    let request = requests.recv().await.unwrap();
    assert!(request.request_line().starts_with("POST /process-video "));
    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains(&format!(
        "filename=\"{}\"",
        path.file_name().unwrap().to_str().unwrap()
    )));
    assert!(body.to_lowercase().contains("content-type: video/mp4"));
    assert!(body.contains("not really a video"));

    tokio::fs::remove_file(&path).await.ok();
}

#[tokio::test]
async fn test_upload_streams_file_larger_than_one_chunk() {
    let path = temp_path("long.webm");
    let video: Vec<u8> = (0..300_000u32).map(|i| (i % 253) as u8).collect();
    tokio::fs::write(&path, &video).await.unwrap();
    let (base_url, mut requests) =
        serve(vec![Reply::json(200, serde_json::json!({"session_id": "s-9"}))]).await;

    let session = client(&base_url).upload_video(&path).await.unwrap();
    assert_eq!(session.as_str(), "s-9");

    let request = requests.recv().await.unwrap();
    let start = find(&request.body, b"\r\n\r\n").expect("no part header") + 4;
    assert_eq!(&request.body[start..start + video.len()], &video[..]);
    assert!(request.body[start + video.len()..].starts_with(b"\r\n--"));

    tokio::fs::remove_file(&path).await.ok();
}

#[tokio::test]
async fn test_upload_rejects_empty_file() {
    let path = temp_path("empty.mp4");
    tokio::fs::write(&path, b"").await.unwrap();
    let error = client("http://127.0.0.1:9")
        .upload_video(&path)
        .await
        .unwrap_err();
    assert!(matches!(error, RemoteError::InvalidInput(_)), "got {:?}", error);
    tokio::fs::remove_file(&path).await.ok();
}

#[tokio::test]
async fn test_upload_rejects_non_video_before_sending() {
    let client = client("http://127.0.0.1:9");
    let error = client
        .upload_video(std::path::Path::new("notes.txt"))
        .await
        .unwrap_err();
    assert!(matches!(error, RemoteError::InvalidInput(_)), "got {:?}", error);
}

#[tokio::test]
async fn test_detection_stream_ends_on_completed() {
    let (base_url, mut requests) = serve(vec![Reply::events(&[
        "data: {\"progress\": 10, \"detections\": []}\n\n",
        "data: {\"progress\": 55, \"detect",
        "ions\": [{\"label\": \"fox\", \"confidence\": 0.7, \"box\": [1, 2, 3, 4]}]}\n\n",
        "data: {\"status\": \"completed\", \"clip_url\": \"/processed/clip_x.mp4\", \"top_species\": [\"fox\"], \"progress\": 100}\n\n",
        "data: {\"progress\": 999}\n\n",
    ])])
    .await;

    let stream = client(&base_url)
        .detection_stream(&SessionId::from("abc"))
        .await
        .unwrap();
    let events: Vec<ProgressEvent> = stream
        .into_stream()
        .map(|event| event.unwrap())
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].progress, Some(10.0));
    assert_eq!(events[1].detections.as_ref().unwrap()[0].label, "fox");
    assert!(events[2].is_completed());
    assert_eq!(events[2].video_url.as_deref(), Some("/processed/clip_x.mp4"));
    assert_eq!(events[2].top_species, Some(vec!["fox".to_string()]));

    let request = requests.recv().await.unwrap();
    assert!(request.request_line().starts_with("GET /detection-stream/abc "));
}

#[tokio::test]
async fn test_detection_stream_ends_when_server_closes() {
    let (base_url, _requests) = serve(vec![Reply::events(&[
        "data: {\"progress\": 1}\n\n",
        "data: {\"progress\": 2}",
    ])])
    .await;

    let mut stream = client(&base_url)
        .detection_stream(&SessionId::from("abc"))
        .await
        .unwrap();
    assert_eq!(stream.next_event().await.unwrap().unwrap().progress, Some(1.0));
    assert_eq!(stream.next_event().await.unwrap().unwrap().progress, Some(2.0));
    assert!(stream.next_event().await.is_none());
    assert!(stream.next_event().await.is_none());
}

#[tokio::test]
async fn test_detection_stream_reports_bad_event() {
    let (base_url, _requests) = serve(vec![Reply::events(&[
        "data: not json\n\n",
        "data: {\"status\": \"completed\"}\n\n",
    ])])
    .await;

    let mut stream = client(&base_url)
        .detection_stream(&SessionId::from("abc"))
        .await
        .unwrap();
    assert!(matches!(
        stream.next_event().await,
        Some(Err(RemoteError::Parse(_)))
    ));
    assert!(stream.next_event().await.unwrap().unwrap().is_completed());
    assert!(stream.next_event().await.is_none());
}

#[tokio::test]
async fn test_identify_wildlife() {
    let (base_url, mut requests) = serve(vec![Reply::json(
        200,
        serde_json::json!({
            "species": "Red Fox",
            "confidence": 0.9,
            "information": "Omnivore\nSolitary hunter\n",
            "source": "gemini",
        }),
    )])
    .await;

    let identification = client(&base_url)
        .identify_wildlife(image::PNG_MIME, &[7, 7, 7])
        .await
        .unwrap();
    assert_eq!(identification.species, "Red Fox");
    assert!(!identification.is_fallback());
    assert_eq!(
        identification.facts().collect::<Vec<_>>(),
        vec!["Omnivore", "Solitary hunter"]
    );

    let request = requests.recv().await.unwrap();
    assert!(request.request_line().starts_with("POST /api/identify-wildlife "));
    assert_eq!(
        request.json()["image"],
        image::to_data_url(image::PNG_MIME, &[7, 7, 7])
    );
}

#[tokio::test]
async fn test_video_details() {
    let (base_url, mut requests) = serve(vec![
        Reply::json(
            200,
            serde_json::json!({
                "id": 4,
                "session_id": "abc",
                "original_video_path": "uploads/x.mp4",
                "processed_video_path": "processed/output_x.mp4",
                "status": "completed",
                "detected_classes": "deer, fox",
                "created_at": "2024-05-01 10:00:00",
            }),
        ),
        Reply::json(404, serde_json::json!({"error": "Session not found"})),
    ])
    .await;
    let client = client(&base_url);

    let details = client.video_details(&SessionId::from("abc")).await.unwrap();
    assert!(details.is_completed());
    assert_eq!(details.detected_classes(), vec!["deer", "fox"]);
    assert!(
        requests
            .recv()
            .await
            .unwrap()
            .request_line()
            .starts_with("GET /video-details/abc ")
    );

    match client.video_details(&SessionId::from("nope")).await {
        Err(RemoteError::Server { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Session not found");
        }
        other => panic!("Expected RemoteError::Server, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_writes_file() {
    let clip: Vec<u8> = (0..=255).collect();
    let (base_url, mut requests) = serve(vec![Reply {
        status: 200,
        content_type: "video/mp4",
        chunks: vec![clip[..100].to_vec(), clip[100..].to_vec()],
    }])
    .await;
    let dest = temp_path("download.mp4");

    let written = client(&base_url)
        .download("/processed/clip.mp4", &dest)
        .await
        .unwrap();
    assert_eq!(written, 256);
    assert_eq!(tokio::fs::read(&dest).await.unwrap(), clip);
    assert!(
        requests
            .recv()
            .await
            .unwrap()
            .request_line()
            .starts_with("GET /processed/clip.mp4 ")
    );

    tokio::fs::remove_file(&dest).await.ok();
}

#[tokio::test]
async fn test_hung_backend_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _request = read_request(&mut stream).await;
        sleep(Duration::from_secs(10)).await;
    });

    let client = Client::new(
        RemoteConfig::default()
            .with_base_url(format!("http://{}", addr))
            .with_timeout(Duration::from_millis(200)),
    )
    .unwrap();
    let error = client.annotate_frame(&[0]).await.unwrap_err();
    assert!(matches!(error, RemoteError::Timeout), "got {:?}", error);
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_refused_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let error = client(&format!("http://{}", addr))
        .annotate_frame(&[0])
        .await
        .unwrap_err();
    assert!(matches!(error, RemoteError::Connection(_)), "got {:?}", error);
    assert!(error.is_transient());
}
