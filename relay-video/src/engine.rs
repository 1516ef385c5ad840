//! Two-branch frame transform engine
//!
//! The branch (direct vs. scale-through-temporary) is selected once from
//! the resolved geometry, never re-evaluated per frame. The temporary
//! buffer for the scale branch is allocated at construction and reused
//! every cycle.

use crate::convert::{crop_flip_i420, i420_to_argb, scale_i420_nearest};
use crate::geometry::Geometry;
use crate::types::{FrameBuffer, PixelFormat};

pub struct TransformEngine {
    geometry: Geometry,
    /// Crop-sized scratch frame, present iff the geometry needs a
    /// scaling pass.
    temp: Option<FrameBuffer>,
}

impl TransformEngine {
    pub fn new(geometry: Geometry) -> Self {
        let temp = geometry
            .temp
            .map(|(width, height)| FrameBuffer::new(PixelFormat::I420, width, height));
        if let Some((width, height)) = geometry.temp {
            log::debug!(
                "transform engine: scale branch, {width}x{height} -> {}x{}",
                geometry.final_width,
                geometry.final_height
            );
        } else {
            log::debug!(
                "transform engine: direct branch, {}x{}",
                geometry.final_width,
                geometry.final_height
            );
        }
        Self { geometry, temp }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Convert+crop+flip a raw input frame into the final I420 buffer,
    /// rescaling through the temporary buffer when the geometry asks for it.
    ///
    /// `src` must hold at least `input_len()` bytes; `i420_out` must be
    /// exactly `i420_output_len()` bytes.
    pub fn transform(&mut self, src: &[u8], i420_out: &mut [u8]) {
        let g = &self.geometry;
        debug_assert!(src.len() >= g.input_len());
        debug_assert_eq!(i420_out.len(), g.i420_output_len());

        match &mut self.temp {
            None => {
                // crop size == final size in this branch
                crop_flip_i420(src, g.in_width, g.in_height, g.crop, g.rotate180, i420_out);
            }
            Some(temp) => {
                crop_flip_i420(
                    src,
                    g.in_width,
                    g.in_height,
                    g.crop,
                    g.rotate180,
                    temp.data_mut(),
                );
                scale_i420_nearest(
                    temp.data(),
                    temp.width(),
                    temp.height(),
                    i420_out,
                    g.final_width,
                    g.final_height,
                );
            }
        }
    }

    /// Convert the final I420 buffer to packed ARGB at identical pixel
    /// dimensions.
    pub fn to_argb(&self, i420: &[u8], argb_out: &mut [u8]) {
        let g = &self.geometry;
        debug_assert!(i420.len() >= g.i420_output_len());
        debug_assert_eq!(argb_out.len(), g.argb_output_len());
        i420_to_argb(i420, g.final_width, g.final_height, argb_out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryConfig;

    fn input_frame(width: u32, height: u32) -> FrameBuffer {
        let mut frame = FrameBuffer::new(PixelFormat::I420, width, height);
        for (i, px) in frame.data_mut().iter_mut().enumerate() {
            *px = (i % 253) as u8;
        }
        frame
    }

    #[test]
    fn test_direct_branch_has_no_temp() {
        let geometry = Geometry::resolve(&GeometryConfig {
            in_width: 32,
            in_height: 16,
            ..Default::default()
        })
        .unwrap();
        let engine = TransformEngine::new(geometry);
        assert!(engine.temp.is_none());
    }

    #[test]
    fn test_direct_branch_matches_kernel() {
        let geometry = Geometry::resolve(&GeometryConfig {
            in_width: 32,
            in_height: 16,
            crop_x: Some(8),
            crop_y: Some(4),
            crop_width: Some(16),
            crop_height: Some(8),
            ..Default::default()
        })
        .unwrap();
        let src = input_frame(32, 16);
        let mut engine = TransformEngine::new(geometry);
        let mut out = vec![0u8; geometry.i420_output_len()];
        engine.transform(src.data(), &mut out);

        let mut expected = vec![0u8; geometry.i420_output_len()];
        crop_flip_i420(src.data(), 32, 16, geometry.crop, false, &mut expected);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_scale_branch_output_dimensions() {
        let geometry = Geometry::resolve(&GeometryConfig {
            in_width: 32,
            in_height: 16,
            scale_width: Some(16),
            scale_height: Some(8),
            ..Default::default()
        })
        .unwrap();
        let src = input_frame(32, 16);
        let mut engine = TransformEngine::new(geometry);
        assert!(engine.temp.is_some());

        let mut out = vec![0u8; geometry.i420_output_len()];
        engine.transform(src.data(), &mut out);
        assert_eq!(out.len(), PixelFormat::I420.buffer_size(16, 8));
        // top-left pixel survives nearest-neighbor downscale
        assert_eq!(out[0], src.data()[0]);
    }

    #[test]
    fn test_flip_twice_restores_frame() {
        let config = GeometryConfig {
            in_width: 32,
            in_height: 16,
            rotate180: true,
            ..Default::default()
        };
        let geometry = Geometry::resolve(&config).unwrap();
        let src = input_frame(32, 16);

        let mut engine = TransformEngine::new(geometry);
        let mut once = vec![0u8; geometry.i420_output_len()];
        engine.transform(src.data(), &mut once);
        let mut twice = vec![0u8; geometry.i420_output_len()];
        engine.transform(&once, &mut twice);
        assert_eq!(twice, src.data());
    }

    #[test]
    fn test_argb_output_size() {
        let geometry = Geometry::resolve(&GeometryConfig {
            in_width: 32,
            in_height: 16,
            ..Default::default()
        })
        .unwrap();
        let src = input_frame(32, 16);
        let mut engine = TransformEngine::new(geometry);
        let mut i420 = vec![0u8; geometry.i420_output_len()];
        engine.transform(src.data(), &mut i420);

        let mut argb = vec![0u8; geometry.argb_output_len()];
        engine.to_argb(&i420, &mut argb);
        assert_eq!(argb.len(), 32 * 16 * 4);
    }
}
