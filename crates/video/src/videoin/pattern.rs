//! Synthetic moving color bars, for running without a camera.

use {
    crate::*,
    base::Vec2,
    image::{Image, PixelFormat},
    std::time::Duration,
};

#[derive(Debug, Clone)]
pub struct PatternConfig {
    pub size: Vec2<usize>,
    pub format: PixelFormat,
    pub frame_rate: f32,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            size: Vec2::new(640, 480),
            format: PixelFormat::Rgb8,
            frame_rate: 30.0,
        }
    }
}

const BARS: [(u8, u8, u8); 7] = [
    (192, 192, 192),
    (192, 192, 0),
    (0, 192, 192),
    (0, 192, 0),
    (192, 0, 192),
    (192, 0, 0),
    (0, 0, 192),
];

pub(crate) struct Pattern {
    config: Option<PatternConfig>,
    tick: usize,
}

impl Pattern {
    pub fn new() -> Self {
        Self {
            config: None,
            tick: 0,
        }
    }
}

fn bar_at(x: usize, width: usize, shift: usize) -> (u8, u8, u8) {
    let column = (x + shift) % width.max(1);
    BARS[column * BARS.len() / width.max(1)]
}

fn render_rgb(size: Vec2<usize>, shift: usize) -> Vec<u8> {
    let mut row = Vec::with_capacity(size.x * 3);
    for x in 0..size.x {
        let (r, g, b) = bar_at(x, size.x, shift);
        row.extend_from_slice(&[r, g, b]);
    }
    row.repeat(size.y)
}

// luma-only bars, chroma neutral
fn render_yuyv(size: Vec2<usize>, shift: usize) -> Vec<u8> {
    let mut row = Vec::with_capacity(size.x * 2);
    for x in 0..size.x {
        let (r, g, b) = bar_at(x, size.x, shift);
        let y = ((77 * r as u32 + 150 * g as u32 + 29 * b as u32) >> 8) as u8;
        row.extend_from_slice(&[y, 128]);
    }
    row.repeat(size.y)
}

impl VideoInDevice for Pattern {
    fn open(&mut self, config: &VideoInConfig) -> Result<StreamInfo, VideoError> {
        #[allow(irrefutable_let_patterns)]
        let VideoInConfig::Pattern(config) = config else {
            return Err(VideoError::Device(
                "Pattern::open should be called with VideoInConfig::Pattern".to_string(),
            ));
        };
        if config.size.is_empty() || config.size.x % 2 != 0 {
            return Err(VideoError::Device(format!(
                "unusable pattern size {}",
                config.size
            )));
        }
        match config.format {
            PixelFormat::Rgb8 | PixelFormat::Yuyv => {}
            other => {
                return Err(VideoError::Device(format!(
                    "pattern cannot produce {:?}",
                    other
                )));
            }
        }
        let frame_rate = if config.frame_rate > 0.0 {
            config.frame_rate
        } else {
            30.0
        };
        self.config = Some(PatternConfig {
            frame_rate,
            ..config.clone()
        });
        Ok(StreamInfo {
            size: config.size,
            format: config.format,
            frame_rate,
        })
    }

    fn close(&mut self) {
        self.config = None;
    }

    fn blocking_capture(&mut self) -> Result<Image, VideoError> {
        let Some(config) = &self.config else {
            return Err(VideoError::Stream("No stream".to_string()));
        };
        std::thread::sleep(Duration::from_secs_f32(1.0 / config.frame_rate));
        self.tick = self.tick.wrapping_add(4);
        let data = match config.format {
            PixelFormat::Yuyv => render_yuyv(config.size, self.tick),
            _ => render_rgb(config.size, self.tick),
        };
        Ok(Image::new(config.size, data, config.format))
    }
}
