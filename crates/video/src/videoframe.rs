use {image::Image, std::time::Instant};

#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub color: Image,
    pub sequence: u64,
    pub captured_at: Instant,
}
