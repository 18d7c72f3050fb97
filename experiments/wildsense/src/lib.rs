pub mod cli;
pub mod feed;

mod snapshot;
pub use snapshot::*;
