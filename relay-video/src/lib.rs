//! Frame geometry and transform engine for the I420 relay
//!
//! Resolves all buffer dimensions once at startup, then applies
//! crop / 180-degree flip / nearest-neighbor rescale / ARGB conversion
//! to raw I420 frames with no per-frame allocation or validation.

pub mod convert;
pub mod engine;
pub mod geometry;
pub mod types;

pub use convert::*;
pub use engine::*;
pub use geometry::*;
pub use types::*;
