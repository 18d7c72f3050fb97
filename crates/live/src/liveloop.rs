use {
    crate::*,
    base::Epoch,
    image::Image,
    std::{
        fmt,
        sync::{
            Arc, Mutex as SyncMutex,
            atomic::{AtomicBool, Ordering},
        },
    },
    tokio::{
        sync::{Mutex, Notify},
        task::JoinHandle,
        time::{sleep, timeout},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Stopped => write!(f, "stopped"),
            LoopState::Running => write!(f, "running"),
        }
    }
}

/// Counters over the lifetime of a `LiveLoop`, across start/stop.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoopStats {
    /// Cycles begun.
    pub cycles: u64,
    /// Cycles that ended with a rendered frame.
    pub rendered: u64,
    pub failures: u64,
    /// Failures since the last rendered frame.
    pub consecutive_failures: u64,
    /// Detections in the last rendered frame.
    pub last_detections: usize,
    pub last_error: Option<String>,
    /// The source refused camera access. Retries continue, but will not help.
    pub permission_denied: bool,
}

struct Parts<S, A, D> {
    source: S,
    annotator: A,
    surface: D,
}

struct Shared {
    running: AtomicBool,
    wake: Notify,
    stats: SyncMutex<LoopStats>,
    last_frame: SyncMutex<Option<Image>>,
}

impl Shared {
    fn stats(&self) -> std::sync::MutexGuard<'_, LoopStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn last_frame(&self) -> std::sync::MutexGuard<'_, Option<Image>> {
        self.last_frame.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Capture -> annotate -> render, repeated while running.
pub struct LiveLoop<S, A, D> {
    parts: Arc<Mutex<Parts<S, A, D>>>,
    shared: Arc<Shared>,
    epoch: Epoch,
    config: LiveConfig,
    worker: Option<JoinHandle<()>>,
}

impl<S: FrameSource, A: Annotator, D: Surface> LiveLoop<S, A, D> {
    pub fn new(source: S, annotator: A, surface: D, config: LiveConfig) -> Self {
        Self {
            parts: Arc::new(Mutex::new(Parts {
                source,
                annotator,
                surface,
            })),
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                wake: Notify::new(),
                stats: SyncMutex::new(LoopStats::default()),
                last_frame: SyncMutex::new(None),
            }),
            epoch: Epoch::new(),
            config,
            worker: None,
        }
    }

    pub fn config(&self) -> &LiveConfig {
        &self.config
    }

    pub fn state(&self) -> LoopState {
        if self.is_running() {
            LoopState::Running
        } else {
            LoopState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> LoopStats {
        self.shared.stats().clone()
    }

    /// The most recent raw frame taken from the source.
    pub fn last_frame(&self) -> Option<Image> {
        self.shared.last_frame().clone()
    }

    /// Begin cycling. Must be called inside a tokio runtime. Does nothing when
    /// already running.
    pub fn start(&mut self) {
        if self.shared.running.swap(true, Ordering::AcqRel) {
            log::debug!("live loop already running");
            return;
        }
        let epoch = self.epoch.advance();
        log::info!("live loop starting (run {})", epoch);
        self.worker = Some(tokio::spawn(run(
            Arc::clone(&self.parts),
            Arc::clone(&self.shared),
            self.epoch.clone(),
            epoch,
            self.config.clone(),
        )));
    }

    /// Stop cycling. An exchange already in flight still completes and renders,
    /// but no new cycle begins. Does nothing when already stopped.
    pub fn stop(&mut self) {
        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.epoch.advance();
        self.shared.wake.notify_waiters();
        log::info!("live loop stopping");
    }

    /// Wait for the worker of the latest run to exit. Only returns after
    /// `stop()`.
    pub async fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Err(error) = worker.await {
                log::error!("live loop worker failed: {}", error);
            }
        }
    }
}

impl<S, A, D> Drop for LiveLoop<S, A, D> {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        self.epoch.advance();
        self.shared.wake.notify_waiters();
    }
}

async fn run<S: FrameSource, A: Annotator, D: Surface>(
    parts: Arc<Mutex<Parts<S, A, D>>>,
    shared: Arc<Shared>,
    epoch: Epoch,
    run_epoch: u64,
    config: LiveConfig,
) {
    // a previous run may still be finishing its last exchange
    let mut parts = parts.lock().await;

    while epoch.is_current(run_epoch) {
        shared.stats().cycles += 1;
        let delay = match cycle(&mut parts, &shared, &config).await {
            Ok(detections) => {
                let mut stats = shared.stats();
                stats.rendered += 1;
                stats.consecutive_failures = 0;
                stats.last_detections = detections;
                config.success_delay()
            }
            Err(error) => {
                let mut stats = shared.stats();
                stats.failures += 1;
                stats.consecutive_failures += 1;
                stats.last_error = Some(error.to_string());
                stats.permission_denied |= error.is_permission();
                log::error!(
                    "live loop: {} ({} in a row, retrying in {} ms)",
                    error,
                    stats.consecutive_failures,
                    config.failure_delay().as_millis()
                );
                config.failure_delay()
            }
        };

        // register for the wake-up before the check, stop() may land in between
        let woken = shared.wake.notified();
        tokio::pin!(woken);
        woken.as_mut().enable();
        if !epoch.is_current(run_epoch) {
            break;
        }
        tokio::select! {
            _ = sleep(delay) => {}
            _ = woken => {}
        }
    }
    log::info!("live loop stopped (run {})", run_epoch);
}

async fn cycle<S: FrameSource, A: Annotator, D: Surface>(
    parts: &mut Parts<S, A, D>,
    shared: &Shared,
    config: &LiveConfig,
) -> Result<usize, LiveError> {
    let frame = timeout(config.capture_timeout(), parts.source.capture())
        .await
        .map_err(|_| LiveError::Stalled(config.capture_timeout()))??;
    *shared.last_frame() = Some(frame.clone());

    let jpeg = image::encode_jpeg(frame, config.jpeg_quality())
        .await
        .map_err(LiveError::Encode)?;

    let annotation = timeout(config.exchange_timeout(), parts.annotator.annotate(jpeg))
        .await
        .map_err(|_| LiveError::Timeout(config.exchange_timeout()))??;

    let annotated = image::decode_image(&annotation.frame)
        .await
        .map_err(LiveError::Decode)?;
    parts.surface.draw(&annotated)?;
    parts.surface.show_detections(&annotation.detections);
    Ok(annotation.detections.len())
}
