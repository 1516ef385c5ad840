//! ARGB preview window backed by minifb

use std::time::Duration;

use minifb::{Window, WindowOptions};
use relay_pipeline::PreviewSink;

/// Displays the final ARGB buffer of each frame. The window disables
/// itself (rather than failing the pipeline) once the user closes it.
pub struct PreviewWindow {
    window: Option<Window>,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl PreviewWindow {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, minifb::Error> {
        let width = width.max(1) as usize;
        let height = height.max(1) as usize;
        let mut window = Window::new(title, width, height, WindowOptions::default())?;
        window.limit_update_rate(Some(Duration::from_millis(16)));
        Ok(Self {
            window: Some(window),
            buffer: vec![0; width * height],
            width,
            height,
        })
    }
}

impl PreviewSink for PreviewWindow {
    fn present(&mut self, argb: &[u8], width: u32, height: u32) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        if !window.is_open() {
            log::warn!("preview window closed, disabling preview");
            self.window = None;
            return;
        }
        // output dimensions are immutable for the process lifetime
        debug_assert_eq!((width as usize, height as usize), (self.width, self.height));

        // packed B-G-R-A bytes are little-endian 0xAARRGGBB words
        match bytemuck::try_cast_slice::<u8, u32>(argb) {
            Ok(pixels) => self.buffer.copy_from_slice(pixels),
            Err(_) => {
                // unaligned source, repack a pixel at a time
                for (dst, src) in self.buffer.iter_mut().zip(argb.chunks_exact(4)) {
                    *dst = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
                }
            }
        }

        if let Err(err) = window.update_with_buffer(&self.buffer, self.width, self.height) {
            log::warn!("preview update failed: {err}");
            self.window = None;
        }
    }

    fn close(&mut self) {
        self.window = None;
    }
}
