//! Plane-level transform kernels
//!
//! Crop and 180-degree flip are fused into a single pass per plane so the
//! source bytes are touched exactly once. The rescale is a per-plane
//! nearest-neighbor resample (no smoothing filter). The final YUV -> ARGB
//! conversion is delegated to yuvutils-rs (BT.601, limited range).
//!
//! All kernels assume the exact buffer sizes derived by the geometry
//! resolver; sizes are checked with `debug_assert!` only, since validation
//! is front-loaded before the loop starts.

use rayon::prelude::*;
use yuvutils_rs::{yuv420_to_bgra, YuvPlanarImage, YuvRange, YuvStandardMatrix};

use crate::geometry::CropSpec;
use crate::types::{i420_planes, i420_planes_mut, PixelFormat};

/// Extract a sub-rectangle of one plane, optionally rotated by 180 degrees.
///
/// `dst` is tightly packed at `width * height`.
fn extract_plane(
    src: &[u8],
    src_stride: usize,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    rotate180: bool,
    dst: &mut [u8],
) {
    debug_assert!(dst.len() == width * height);
    debug_assert!(src.len() >= (y + height - 1) * src_stride + x + width);

    dst.par_chunks_mut(width).enumerate().for_each(|(row, out)| {
        if rotate180 {
            let src_row = &src[(y + height - 1 - row) * src_stride + x..][..width];
            for (i, px) in out.iter_mut().enumerate() {
                *px = src_row[width - 1 - i];
            }
        } else {
            out.copy_from_slice(&src[(y + row) * src_stride + x..][..width]);
        }
    });
}

/// Crop and optionally flip a raw I420 frame in one pass.
///
/// Reinterprets `src` at `src_width x src_height` granularity, extracts the
/// crop rectangle and writes a tightly packed `crop.width x crop.height`
/// I420 frame into `dst`. Chroma planes are processed at half resolution,
/// which is why the geometry resolver insists on even crop values.
pub fn crop_flip_i420(
    src: &[u8],
    src_width: u32,
    src_height: u32,
    crop: CropSpec,
    rotate180: bool,
    dst: &mut [u8],
) {
    debug_assert!(src.len() >= PixelFormat::I420.buffer_size(src_width, src_height));
    debug_assert!(dst.len() == PixelFormat::I420.buffer_size(crop.width, crop.height));

    let (src_y, src_u, src_v) = i420_planes(src, src_width, src_height);
    let (dst_y, dst_u, dst_v) = i420_planes_mut(dst, crop.width, crop.height);

    extract_plane(
        src_y,
        src_width as usize,
        crop.x as usize,
        crop.y as usize,
        crop.width as usize,
        crop.height as usize,
        rotate180,
        dst_y,
    );

    let chroma_stride = (src_width / 2) as usize;
    let (cx, cy) = ((crop.x / 2) as usize, (crop.y / 2) as usize);
    let (cw, ch) = ((crop.width / 2) as usize, (crop.height / 2) as usize);
    extract_plane(src_u, chroma_stride, cx, cy, cw, ch, rotate180, dst_u);
    extract_plane(src_v, chroma_stride, cx, cy, cw, ch, rotate180, dst_v);
}

/// Nearest-neighbor resample of one tightly packed plane.
fn scale_plane_nearest(
    src: &[u8],
    src_width: usize,
    src_height: usize,
    dst: &mut [u8],
    dst_width: usize,
    dst_height: usize,
) {
    debug_assert!(src.len() >= src_width * src_height);
    debug_assert!(dst.len() == dst_width * dst_height);

    dst.par_chunks_mut(dst_width).enumerate().for_each(|(row, out)| {
        let src_row = &src[(row * src_height / dst_height) * src_width..][..src_width];
        for (x, px) in out.iter_mut().enumerate() {
            *px = src_row[x * src_width / dst_width];
        }
    });
}

/// Resample an I420 frame to new dimensions with no smoothing filter.
pub fn scale_i420_nearest(
    src: &[u8],
    src_width: u32,
    src_height: u32,
    dst: &mut [u8],
    dst_width: u32,
    dst_height: u32,
) {
    debug_assert!(src.len() >= PixelFormat::I420.buffer_size(src_width, src_height));
    debug_assert!(dst.len() == PixelFormat::I420.buffer_size(dst_width, dst_height));

    let (src_y, src_u, src_v) = i420_planes(src, src_width, src_height);
    let (dst_y, dst_u, dst_v) = i420_planes_mut(dst, dst_width, dst_height);

    scale_plane_nearest(
        src_y,
        src_width as usize,
        src_height as usize,
        dst_y,
        dst_width as usize,
        dst_height as usize,
    );
    scale_plane_nearest(
        src_u,
        (src_width / 2) as usize,
        (src_height / 2) as usize,
        dst_u,
        (dst_width / 2) as usize,
        (dst_height / 2) as usize,
    );
    scale_plane_nearest(
        src_v,
        (src_width / 2) as usize,
        (src_height / 2) as usize,
        dst_v,
        (dst_width / 2) as usize,
        (dst_height / 2) as usize,
    );
}

/// Convert an I420 frame to packed 4-byte B-G-R-A pixels (BT.601, limited
/// range), identical pixel dimensions.
///
/// A conversion failure here means a size invariant was violated after
/// startup validation, which is a programming error; it aborts rather than
/// handing downstream consumers a partial frame.
pub fn i420_to_argb(src: &[u8], width: u32, height: u32, dst: &mut [u8]) {
    debug_assert!(src.len() >= PixelFormat::I420.buffer_size(width, height));
    debug_assert!(dst.len() == PixelFormat::Argb.buffer_size(width, height));

    let (y, u, v) = i420_planes(src, width, height);
    let planar = YuvPlanarImage {
        y_plane: y,
        y_stride: width,
        u_plane: u,
        u_stride: width / 2,
        v_plane: v,
        v_stride: width / 2,
        width,
        height,
    };
    yuv420_to_bgra(
        &planar,
        dst,
        width * 4,
        YuvRange::Limited,
        YuvStandardMatrix::Bt601,
    )
    .expect("i420 buffer geometry validated at startup");
}
