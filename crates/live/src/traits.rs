use {
    crate::*,
    image::Image,
    remote::{Annotation, Client, Detection},
    std::future::Future,
    video::VideoIn,
};

/// Where frames come from.
pub trait FrameSource: Send + 'static {
    /// Wait for the next frame.
    fn capture(&mut self) -> impl Future<Output = Result<Image, LiveError>> + Send;
}

/// Turns one JPEG frame into an annotated frame plus detections.
pub trait Annotator: Send + 'static {
    fn annotate(
        &mut self,
        jpeg: Vec<u8>,
    ) -> impl Future<Output = Result<Annotation, LiveError>> + Send;
}

/// Where annotated frames go.
pub trait Surface: Send + 'static {
    /// Replace the displayed frame. `frame` is RGB.
    fn draw(&mut self, frame: &Image) -> Result<(), LiveError>;

    /// Replace the displayed detection list.
    fn show_detections(&mut self, detections: &[Detection]);
}

impl FrameSource for VideoIn {
    async fn capture(&mut self) -> Result<Image, LiveError> {
        let frame = VideoIn::capture(self).await?;
        Ok(frame.color)
    }
}

impl Annotator for Client {
    async fn annotate(&mut self, jpeg: Vec<u8>) -> Result<Annotation, LiveError> {
        Ok(self.annotate_frame(&jpeg).await?)
    }
}
