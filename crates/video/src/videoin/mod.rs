use {
    crate::*,
    base::Vec2,
    image::{Image, PixelFormat},
    std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, Ordering},
        },
        time::{Duration, Instant},
    },
    tokio::{
        sync::{oneshot, watch},
        task::{JoinHandle, spawn_blocking},
    },
};

// delay before reconnecting after failure
const WAIT_BEFORE_RECONNECT_MS: u64 = 100;

#[derive(Debug, Clone)]
pub enum VideoInConfig {
    #[cfg(feature = "v4l2")]
    V4l2(v4l2::V4l2Config),
    Pattern(pattern::PatternConfig),
}

/// What the device actually agreed to deliver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub size: Vec2<usize>,
    pub format: PixelFormat,
    pub frame_rate: f32,
}

pub(crate) trait VideoInDevice: Send {
    fn open(&mut self, config: &VideoInConfig) -> Result<StreamInfo, VideoError>;
    fn close(&mut self);
    fn blocking_capture(&mut self) -> Result<Image, VideoError>;
}

// set when the worker gave up because the camera refused access
type Denied = Arc<Mutex<Option<String>>>;

struct Worker {
    receiver: watch::Receiver<Option<VideoFrame>>,
    cancel: Arc<AtomicBool>,
    denied: Denied,
    join_handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn stop(&mut self) -> Option<JoinHandle<()>> {
        self.cancel.store(true, Ordering::Relaxed);
        self.join_handle.take()
    }
}

/// Camera input. Only the newest frame is kept: a slow reader skips frames
/// instead of falling behind the camera.
pub struct VideoIn {
    worker: Worker,
    info: StreamInfo,
}

fn give_up(device: &mut dyn VideoInDevice, denied: &Denied, error: VideoError) {
    log::error!("video worker: giving up: {}", error);
    *denied.lock().unwrap_or_else(|e| e.into_inner()) = Some(error.to_string());
    device.close();
}

fn run_worker(
    mut device: Box<dyn VideoInDevice>,
    config: VideoInConfig,
    sender: watch::Sender<Option<VideoFrame>>,
    cancel: Arc<AtomicBool>,
    denied: Denied,
) {
    let mut sequence = 0u64;
    while !cancel.load(Ordering::Relaxed) {
        log::info!("video worker: starting capture loop");
        while !cancel.load(Ordering::Relaxed) {
            match device.blocking_capture() {
                Ok(image) => {
                    if sender.is_closed() {
                        log::debug!("video worker: receiver gone, stopping");
                        device.close();
                        return;
                    }
                    sequence += 1;
                    sender.send_replace(Some(VideoFrame {
                        color: image,
                        sequence,
                        captured_at: Instant::now(),
                    }));
                }
                Err(error) if error.is_permission() => {
                    give_up(&mut *device, &denied, error);
                    return;
                }
                Err(error) => {
                    log::error!("video worker: capture failed: {}", error);
                    break;
                }
            }
        }

        // close, wait, and reopen the device
        while !cancel.load(Ordering::Relaxed) {
            log::info!("video worker: reconnecting...");
            device.close();
            std::thread::sleep(Duration::from_millis(WAIT_BEFORE_RECONNECT_MS));
            match device.open(&config) {
                Ok(_) => break,
                Err(error) if error.is_permission() => {
                    give_up(&mut *device, &denied, error);
                    return;
                }
                Err(error) => log::warn!("video worker: reopen failed: {}", error),
            }
        }
    }
    device.close();
}

impl VideoIn {
    fn create_device(config: &VideoInConfig) -> Box<dyn VideoInDevice> {
        match config {
            #[cfg(feature = "v4l2")]
            VideoInConfig::V4l2(_) => Box::new(v4l2::V4l2::new()),
            VideoInConfig::Pattern(_) => Box::new(pattern::Pattern::new()),
        }
    }

    fn default_config() -> VideoInConfig {
        #[cfg(feature = "v4l2")]
        let config = VideoInConfig::V4l2(v4l2::V4l2Config::default());
        #[cfg(not(feature = "v4l2"))]
        let config = VideoInConfig::Pattern(pattern::PatternConfig::default());
        config
    }

    async fn spawn_worker(
        mut device: Box<dyn VideoInDevice>,
        config: VideoInConfig,
    ) -> Result<(Worker, StreamInfo), VideoError> {
        let (sender, receiver) = watch::channel(None);
        let cancel = Arc::new(AtomicBool::new(false));
        let denied = Denied::default();

        // open() has to run on the capture thread, some drivers are thread affine
        let (init_tx, init_rx) = oneshot::channel::<Result<StreamInfo, VideoError>>();

        let join_handle = spawn_blocking({
            let cancel = Arc::clone(&cancel);
            let denied = Arc::clone(&denied);
            move || {
                match device.open(&config) {
                    Ok(info) => {
                        let _ = init_tx.send(Ok(info));
                    }
                    Err(error) => {
                        let _ = init_tx.send(Err(error));
                        return;
                    }
                }
                run_worker(device, config, sender, cancel, denied);
            }
        });

        let info = init_rx
            .await
            .map_err(|_| VideoError::Device("Worker thread died during init".to_string()))??;

        Ok((
            Worker {
                receiver,
                cancel,
                denied,
                join_handle: Some(join_handle),
            },
            info,
        ))
    }

    async fn start(
        device: Box<dyn VideoInDevice>,
        config: VideoInConfig,
    ) -> Result<Self, VideoError> {
        let (worker, info) = Self::spawn_worker(device, config).await?;
        log::info!(
            "video input open: {} {:?} at {:.1} fps",
            info.size,
            info.format,
            info.frame_rate
        );
        Ok(Self { worker, info })
    }

    /// Open a capture device. `None` picks the platform default.
    pub async fn open(config: Option<VideoInConfig>) -> Result<Self, VideoError> {
        let config = config.unwrap_or_else(Self::default_config);
        Self::start(Self::create_device(&config), config).await
    }

    pub fn info(&self) -> StreamInfo {
        self.info
    }

    pub fn size(&self) -> Vec2<usize> {
        self.info.size
    }

    pub fn format(&self) -> PixelFormat {
        self.info.format
    }

    pub fn frame_rate(&self) -> f32 {
        self.info.frame_rate
    }

    /// Switch to another device or configuration.
    pub async fn select(&mut self, config: VideoInConfig) -> Result<(), VideoError> {
        if let Some(handle) = self.worker.stop() {
            handle
                .await
                .map_err(|e| VideoError::Device(format!("video worker panicked: {e}")))?;
        }
        let (worker, info) = Self::spawn_worker(Self::create_device(&config), config).await?;
        self.worker = worker;
        self.info = info;
        Ok(())
    }

    /// Wait for a frame newer than the last one returned. Frames produced in
    /// between are skipped.
    pub async fn capture(&mut self) -> Result<VideoFrame, VideoError> {
        if self.worker.receiver.changed().await.is_err() {
            let denied = self
                .worker
                .denied
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            return Err(match denied {
                Some(message) => VideoError::Permission(message),
                None => VideoError::Channel("Video input closed".to_string()),
            });
        }
        self.worker
            .receiver
            .borrow_and_update()
            .clone()
            .ok_or_else(|| VideoError::Channel("Video input produced no frame".to_string()))
    }
}

impl Drop for VideoIn {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.stop() {
            handle.abort();
        }
    }
}

pub mod pattern;
pub use pattern::PatternConfig;

#[cfg(feature = "v4l2")]
pub mod v4l2;
#[cfg(feature = "v4l2")]
pub use v4l2::V4l2Config;

#[cfg(test)]
mod tests {
    use {super::*, tokio::time::timeout};

    // delivers `frames` frames, then loses the camera and is refused on reopen
    struct Revoked {
        frames: usize,
        opened: usize,
    }

    impl VideoInDevice for Revoked {
        fn open(&mut self, _config: &VideoInConfig) -> Result<StreamInfo, VideoError> {
            self.opened += 1;
            if self.opened > 1 {
                return Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied).into());
            }
            Ok(StreamInfo {
                size: Vec2::new(4, 2),
                format: PixelFormat::Rgb8,
                frame_rate: 100.0,
            })
        }

        fn close(&mut self) {}

        fn blocking_capture(&mut self) -> Result<Image, VideoError> {
            std::thread::sleep(Duration::from_millis(10));
            if self.frames == 0 {
                return Err(VideoError::Stream("device unplugged".to_string()));
            }
            self.frames -= 1;
            Ok(Image::new(Vec2::new(4, 2), vec![0; 24], PixelFormat::Rgb8))
        }
    }

    #[tokio::test]
    async fn test_revoked_camera_ends_capture_with_permission_error() {
        let device = Box::new(Revoked {
            frames: 2,
            opened: 0,
        });
        let mut videoin = VideoIn::start(device, VideoInConfig::Pattern(Default::default()))
            .await
            .unwrap();

        let error = loop {
            match timeout(Duration::from_secs(5), videoin.capture())
                .await
                .expect("capture hung after the camera went away")
            {
                Ok(_) => continue,
                Err(error) => break error,
            }
        };
        assert!(error.is_permission(), "{error}");

        // stays failed, never blocks
        let again = timeout(Duration::from_secs(1), videoin.capture())
            .await
            .expect("capture hung");
        assert!(again.unwrap_err().is_permission());
    }
}
