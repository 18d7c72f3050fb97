use {
    crate::*,
    base::Vec2,
    image::{Image, PixelFormat},
    std::path::PathBuf,
    v4l::{
        Device, Format, FourCC, buffer::Type, io::mmap::Stream as MmapStream,
        io::traits::CaptureStream, video::Capture,
    },
};

// mmap buffers queued with the driver
const BUFFER_COUNT: u32 = 4;

#[derive(Debug, Clone)]
pub struct V4l2Config {
    pub path: Option<PathBuf>,
    pub size: Option<Vec2<usize>>,
    pub format: Option<PixelFormat>,
    pub frame_rate: Option<f32>,
}

impl Default for V4l2Config {
    /// First camera, asking for 640x480.
    fn default() -> Self {
        Self {
            path: None,
            size: Some(Vec2::new(640, 480)),
            format: None,
            frame_rate: None,
        }
    }
}

pub(crate) struct V4l2 {
    stream: Option<MmapStream<'static>>,
    size: Vec2<usize>,
    format: PixelFormat,
}

impl V4l2 {
    pub fn new() -> Self {
        Self {
            stream: None,
            size: Vec2::new(0, 0),
            format: PixelFormat::Yuyv,
        }
    }
}

impl VideoInDevice for V4l2 {
    fn open(&mut self, config: &VideoInConfig) -> Result<StreamInfo, VideoError> {
        self.stream.take();

        #[allow(irrefutable_let_patterns)]
        let VideoInConfig::V4l2(config) = config else {
            return Err(VideoError::Device(
                "V4l2::open should be called with VideoInConfig::V4l2".to_string(),
            ));
        };

        let device = match &config.path {
            Some(path) => Device::with_path(path)?,
            None => Device::new(0)?,
        };
        let device_format = Capture::format(&device)?;

        // size and fourcc: requested, or whatever the device is set to
        let desired_size = config.size.unwrap_or(Vec2::new(
            device_format.width as usize,
            device_format.height as usize,
        ));
        let desired_fourcc = match config.format {
            Some(format @ (PixelFormat::Yuyv | PixelFormat::Jpeg)) => {
                FourCC::new(&format.as_fourcc().to_le_bytes())
            }
            Some(other) => {
                return Err(VideoError::Device(format!(
                    "V4L2 capture does not support {:?}",
                    other
                )));
            }
            None => device_format.fourcc,
        };

        // drivers round to the nearest supported mode, so read it back
        let actual_format = Capture::set_format(
            &device,
            &Format::new(desired_size.x as u32, desired_size.y as u32, desired_fourcc),
        )?;
        self.size = Vec2::new(actual_format.width as usize, actual_format.height as usize);
        let fourcc = u32::from_le_bytes(actual_format.fourcc.repr);
        self.format = match PixelFormat::from_fourcc(fourcc) {
            Some(format @ (PixelFormat::Yuyv | PixelFormat::Jpeg)) => format,
            _ => {
                return Err(VideoError::Device(format!(
                    "Unsupported pixel format: {}",
                    image::fourcc_to_string(fourcc)
                )));
            }
        };

        let desired_frame_rate = match config.frame_rate {
            Some(frame_rate) => frame_rate,
            None => {
                let params = Capture::params(&device)?;
                params.interval.denominator as f32 / params.interval.numerator.max(1) as f32
            }
        };
        let actual_params = Capture::set_params(
            &device,
            &v4l::video::capture::Parameters::with_fps(desired_frame_rate.round() as u32),
        )?;
        let frame_rate = actual_params.interval.denominator as f32
            / actual_params.interval.numerator.max(1) as f32;

        self.stream = Some(
            MmapStream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
                .map_err(|error| VideoError::Stream(error.to_string()))?,
        );

        Ok(StreamInfo {
            size: self.size,
            format: self.format,
            frame_rate,
        })
    }

    fn close(&mut self) {
        self.stream.take();
    }

    fn blocking_capture(&mut self) -> Result<Image, VideoError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(VideoError::Stream("No stream".to_string()));
        };
        let (frame_data, metadata) =
            CaptureStream::next(stream).map_err(|error| VideoError::Stream(error.to_string()))?;

        // MJPG buffers are only partially used; some drivers report 0
        let used = match metadata.bytesused as usize {
            0 => frame_data.len(),
            used => used.min(frame_data.len()),
        };
        let data = match self.format {
            PixelFormat::Jpeg => frame_data[..used].to_vec(),
            _ => frame_data.to_vec(),
        };
        Ok(Image::new(self.size, data, self.format))
    }
}
