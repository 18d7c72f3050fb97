//! Bridge from the capture loop to a window owned by the main thread.

use {
    base::{Vec2, log},
    image::Image,
    live::{Detection, LiveError, Surface, report},
    tokio::sync::watch,
};

/// Latest annotated frame, packed for minifb.
#[derive(Clone, Debug, Default)]
pub struct Shown {
    pub size: Vec2<usize>,
    pub pixels: Vec<u32>,
    pub detections: Vec<String>,
    pub frames: u64,
}

pub struct WindowFeed {
    sender: watch::Sender<Shown>,
    pending: Option<(Vec2<usize>, Vec<u32>)>,
    last_labels: Vec<String>,
}

pub fn window_feed() -> (WindowFeed, watch::Receiver<Shown>) {
    let (sender, receiver) = watch::channel(Shown::default());
    (
        WindowFeed {
            sender,
            pending: None,
            last_labels: Vec::new(),
        },
        receiver,
    )
}

impl Surface for WindowFeed {
    fn draw(&mut self, frame: &Image) -> Result<(), LiveError> {
        let packed = image::to_u32(frame).map_err(LiveError::Decode)?;
        self.pending = Some(packed);
        Ok(())
    }

    fn show_detections(&mut self, detections: &[Detection]) {
        let labels: Vec<String> = detections.iter().map(|d| d.label.clone()).collect();
        if labels != self.last_labels {
            for detection in detections {
                log::info!("{}", report::describe_detection(detection));
            }
            self.last_labels = labels;
        }
        let lines = report::describe_detections(detections);
        let pending = self.pending.take();
        self.sender.send_modify(|shown| {
            if let Some((size, pixels)) = pending {
                shown.size = size;
                shown.pixels = pixels;
            }
            shown.detections = lines;
            shown.frames += 1;
        });
    }
}
