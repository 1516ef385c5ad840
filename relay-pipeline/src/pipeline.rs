//! The synchronized producer-consumer frame loop
//!
//! One long-lived loop: wait for the producer's signal, snapshot the
//! input region, transform into the I420 output, convert into the ARGB
//! output, notify downstream consumers, poll the stop flag, repeat.
//!
//! Ordering guarantee: for a given input frame the I420 output is fully
//! written and stamped before the ARGB region's lock is even acquired,
//! and both outputs carry the same timestamp, so downstream consumers
//! always observe a consistent pairing.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use relay_shm::{CancelToken, Region, RegionError, RegionHub, SharedRegion, WaitOutcome};
use relay_video::{FrameBuffer, Geometry, PixelFormat, TransformEngine};

use crate::sink::PreviewSink;

/// Default suffix appended to the I420 output name for the ARGB region.
pub const ARGB_SUFFIX: &str = ".argb";

/// Names of the one input and two output regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionNames {
    pub input: String,
    pub out_i420: String,
    pub out_argb: String,
}

impl RegionNames {
    /// Build the name set, defaulting the ARGB name to the I420 output
    /// name plus [`ARGB_SUFFIX`].
    pub fn new(input: impl Into<String>, out: impl Into<String>, out_argb: Option<String>) -> Self {
        let out = out.into();
        let out_argb = out_argb.unwrap_or_else(|| format!("{out}{ARGB_SUFFIX}"));
        Self {
            input: input.into(),
            out_i420: out,
            out_argb,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error(
        "input region '{name}' holds {actual} bytes but {expected} are required \
         for a {width}x{height} I420 frame"
    )]
    InputTooSmall {
        name: String,
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },
}

/// Wall clock in microseconds since the Unix epoch; the fallback stamp
/// for producers that do not tag their frames.
fn wall_clock_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}

/// The frame relay: one input region in, two output regions out.
pub struct Pipeline<R: Region = SharedRegion> {
    input: R,
    out_i420: R,
    out_argb: R,
    engine: TransformEngine,
    /// Local copy of the most recent input frame, decoupling the
    /// producer's buffer (which may be overwritten by the next cycle)
    /// from the transform. Allocated once, reused every iteration.
    snapshot: FrameBuffer,
    sink: Option<Box<dyn PreviewSink>>,
}

impl Pipeline<SharedRegion> {
    /// Attach the input region and create both output regions at the
    /// exact byte sizes the geometry derives.
    ///
    /// Attach failure is fatal and creates no output regions; a failed
    /// ARGB allocation rolls the I420 region back so no partial state
    /// outlives the error.
    pub fn bind(hub: &RegionHub, names: &RegionNames, geometry: Geometry) -> Result<Self, BindError> {
        let input = hub.attach(&names.input)?;
        let expected = geometry.input_len();
        if input.len() < expected {
            return Err(BindError::InputTooSmall {
                name: names.input.clone(),
                actual: input.len(),
                expected,
                width: geometry.in_width,
                height: geometry.in_height,
            });
        }

        let out_i420 = hub.create(&names.out_i420, geometry.i420_output_len())?;
        let out_argb = match hub.create(&names.out_argb, geometry.argb_output_len()) {
            Ok(region) => region,
            Err(err) => {
                hub.release(&names.out_i420);
                return Err(err.into());
            }
        };
        log::info!(
            "bound '{}' -> '{}' ({} bytes I420) + '{}' ({} bytes ARGB)",
            names.input,
            names.out_i420,
            geometry.i420_output_len(),
            names.out_argb,
            geometry.argb_output_len()
        );
        Ok(Self::from_regions(geometry, input, out_i420, out_argb))
    }
}

impl<R: Region> Pipeline<R> {
    /// Assemble a pipeline over already-bound regions. The regions must
    /// satisfy the sizes the geometry derives.
    pub fn from_regions(geometry: Geometry, input: R, out_i420: R, out_argb: R) -> Self {
        debug_assert!(input.len() >= geometry.input_len());
        debug_assert_eq!(out_i420.len(), geometry.i420_output_len());
        debug_assert_eq!(out_argb.len(), geometry.argb_output_len());
        Self {
            input,
            out_i420,
            out_argb,
            engine: TransformEngine::new(geometry),
            snapshot: FrameBuffer::new(PixelFormat::I420, geometry.in_width, geometry.in_height),
            sink: None,
        }
    }

    /// Attach the optional preview sink before starting the loop.
    pub fn with_sink(mut self, sink: Box<dyn PreviewSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn geometry(&self) -> &Geometry {
        self.engine.geometry()
    }

    /// Run until the token is cancelled. Returns the number of frames
    /// processed.
    ///
    /// Iterations are strictly sequential; the input wait is the only
    /// suspension point and is itself interruptible by the token.
    pub fn run(&mut self, cancel: &CancelToken) -> u64 {
        let geometry = *self.engine.geometry();
        let snapshot_len = geometry.input_len();
        let mut frames: u64 = 0;
        log::info!(
            "pipeline running: {}x{} in, {}x{} out{}",
            geometry.in_width,
            geometry.in_height,
            geometry.final_width,
            geometry.final_height,
            if geometry.rotate180 { ", flipped" } else { "" }
        );

        while !cancel.is_cancelled() {
            if self.input.wait(cancel) == WaitOutcome::Cancelled {
                break;
            }

            // Snapshot the producer's bytes and timestamp; fall back to
            // the transform-start wall clock for untagged frames.
            let mut timestamp = wall_clock_micros();
            {
                let snapshot = self.snapshot.data_mut();
                self.input.with_lock(|data| {
                    if let Some(tagged) = data.timestamp() {
                        timestamp = tagged;
                    }
                    snapshot.copy_from_slice(&data.bytes()[..snapshot_len]);
                });
            }

            let engine = &mut self.engine;
            let snapshot = self.snapshot.data();
            let out_argb = &self.out_argb;
            let sink = self.sink.as_deref_mut();
            self.out_i420.with_lock(|i420| {
                i420.set_timestamp(timestamp);
                engine.transform(snapshot, i420.bytes_mut());

                // The ARGB lock is acquired only after the I420 output is
                // complete, while the I420 lock is still held.
                out_argb.with_lock(|argb| {
                    argb.set_timestamp(timestamp);
                    engine.to_argb(i420.bytes(), argb.bytes_mut());
                    if let Some(sink) = sink {
                        sink.present(argb.bytes(), geometry.final_width, geometry.final_height);
                    }
                });
            });

            self.out_i420.notify_all();
            self.out_argb.notify_all();

            frames += 1;
            if frames % 100 == 0 {
                log::debug!("processed {frames} frames");
            }
        }

        if let Some(sink) = self.sink.as_mut() {
            sink.close();
        }
        log::info!("pipeline stopped after {frames} frames");
        frames
    }
}
