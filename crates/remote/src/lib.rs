//! HTTP client for the WildSense detection backend.

pub mod client;
pub mod config;
pub mod error;
pub mod sse;
pub mod wire;

pub use client::{Client, DetectionStream, video_mime};
pub use config::*;
pub use error::RemoteError;
pub use sse::{MAX_EVENT_BYTES, SseDecoder};
pub use wire::*;
