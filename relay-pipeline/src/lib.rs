//! Synchronized I420 relay pipeline
//!
//! Binds one producer-owned input region, creates the two output
//! regions, and drives the wait -> snapshot -> transform -> publish ->
//! notify loop until cancelled.

pub mod pipeline;
pub mod sink;

pub use pipeline::*;
pub use sink::*;
