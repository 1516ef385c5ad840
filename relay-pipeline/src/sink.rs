//! Preview sink capability
//!
//! The pipeline only needs "present a packed-pixel buffer"; the actual
//! windowing collaborator lives outside the core.

/// Receives the final ARGB buffer of each processed frame.
pub trait PreviewSink {
    /// Hand over one frame of packed B-G-R-A pixels, `width * height * 4`
    /// bytes. Called while the ARGB output region is still locked, so
    /// implementations should copy or blit and return quickly.
    fn present(&mut self, argb: &[u8], width: u32, height: u32);

    /// Called once when the pipeline transitions to its stopped state.
    fn close(&mut self) {}
}
