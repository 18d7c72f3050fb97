use std::time::Duration;

/// Timing and encoding of the capture loop.
#[derive(Clone, Debug)]
pub struct LiveConfig {
    success_delay: Duration,
    failure_delay: Duration,
    exchange_timeout: Duration,
    capture_timeout: Duration,
    jpeg_quality: u8,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            success_delay: Duration::from_millis(50),
            failure_delay: Duration::from_millis(1000),
            exchange_timeout: Duration::from_secs(10),
            capture_timeout: Duration::from_secs(5),
            jpeg_quality: 80,
        }
    }
}

impl LiveConfig {
    /// Pause after a rendered frame before the next capture.
    pub fn with_success_delay(mut self, delay: Duration) -> Self {
        self.success_delay = delay;
        self
    }

    /// Pause after any failed cycle before trying again.
    pub fn with_failure_delay(mut self, delay: Duration) -> Self {
        self.failure_delay = delay;
        self
    }

    /// Longest time one annotator exchange may take.
    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    /// Longest wait for the source to hand over a frame.
    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    /// JPEG quality of submitted frames, clamped to 1..=100.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn success_delay(&self) -> Duration {
        self.success_delay
    }

    pub fn failure_delay(&self) -> Duration {
        self.failure_delay
    }

    pub fn exchange_timeout(&self) -> Duration {
        self.exchange_timeout
    }

    pub fn capture_timeout(&self) -> Duration {
        self.capture_timeout
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }
}
