//! Live frame capture loop.
//!
//! A `LiveLoop` repeatedly takes one frame from a `FrameSource`, sends it as
//! JPEG to an `Annotator`, and draws the annotated frame it gets back into a
//! `Surface`. Cycles are strictly serial: at most one exchange is in flight.

mod config;
pub use config::*;

mod error;
pub use error::*;

mod liveloop;
pub use liveloop::*;

pub mod report;
pub use report::{describe_detection, format_confidence};

mod traits;
pub use traits::*;

pub use remote::{Annotation, Detection};
