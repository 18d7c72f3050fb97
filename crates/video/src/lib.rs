//! Camera capture.
//!
//! `VideoIn` runs a capture device on tokio's blocking pool and hands frames
//! to async code through a latest-frame `watch` slot. Backends implement the crate
//! private `VideoInDevice` trait.

mod videoerror;
pub use videoerror::*;

mod videoframe;
pub use videoframe::*;

pub mod videoin;
pub use videoin::*;
