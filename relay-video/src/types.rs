//! Pixel formats and frame buffers

/// Pixel format of a frame buffer
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0 — full-resolution luma plane followed by two
    /// quarter-resolution chroma planes (Y, U, V in one allocation)
    I420 = 1,
    /// Packed 4 bytes per pixel, B-G-R-A byte order (little-endian ARGB words)
    Argb = 2,
}

impl PixelFormat {
    /// Returns number of planes for this format
    pub fn plane_count(self) -> usize {
        match self {
            PixelFormat::I420 => 3,
            PixelFormat::Argb => 1,
        }
    }

    /// Returns bytes per pixel for packed formats (0 for planar)
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::I420 => 0,
            PixelFormat::Argb => 4,
        }
    }

    /// Calculate frame size in bytes
    pub fn buffer_size(self, width: u32, height: u32) -> usize {
        match self {
            PixelFormat::I420 => {
                let y_size = (width * height) as usize;
                let uv_size = ((width / 2) * (height / 2)) as usize;
                y_size + uv_size * 2
            }
            PixelFormat::Argb => (width * height * 4) as usize,
        }
    }
}

/// Split a contiguous I420 buffer into its Y, U and V planes.
///
/// Luma stride equals `width`, chroma stride equals `width / 2`.
pub fn i420_planes(buf: &[u8], width: u32, height: u32) -> (&[u8], &[u8], &[u8]) {
    let y_size = (width * height) as usize;
    let uv_size = ((width / 2) * (height / 2)) as usize;
    debug_assert!(buf.len() >= y_size + uv_size * 2);
    let (y, rest) = buf.split_at(y_size);
    let (u, rest) = rest.split_at(uv_size);
    (y, u, &rest[..uv_size])
}

/// Mutable variant of [`i420_planes`].
pub fn i420_planes_mut(buf: &mut [u8], width: u32, height: u32) -> (&mut [u8], &mut [u8], &mut [u8]) {
    let y_size = (width * height) as usize;
    let uv_size = ((width / 2) * (height / 2)) as usize;
    debug_assert!(buf.len() >= y_size + uv_size * 2);
    let (y, rest) = buf.split_at_mut(y_size);
    let (u, rest) = rest.split_at_mut(uv_size);
    (y, u, &mut rest[..uv_size])
}

/// An owned frame allocation with fixed format and dimensions.
///
/// Allocated once, reused every cycle — scratch buffers in the pipeline
/// never allocate per frame.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl FrameBuffer {
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; format.buffer_size(width, height)],
            width,
            height,
            format,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Y, U and V plane views (I420 only)
    pub fn planes(&self) -> (&[u8], &[u8], &[u8]) {
        debug_assert_eq!(self.format, PixelFormat::I420);
        i420_planes(&self.data, self.width, self.height)
    }

    /// Mutable Y, U and V plane views (I420 only)
    pub fn planes_mut(&mut self) -> (&mut [u8], &mut [u8], &mut [u8]) {
        debug_assert_eq!(self.format, PixelFormat::I420);
        i420_planes_mut(&mut self.data, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sizes() {
        assert_eq!(PixelFormat::I420.buffer_size(640, 480), 640 * 480 * 3 / 2);
        assert_eq!(PixelFormat::Argb.buffer_size(640, 480), 640 * 480 * 4);
        assert_eq!(PixelFormat::I420.buffer_size(100, 80), 12000);
        assert_eq!(PixelFormat::Argb.buffer_size(100, 80), 32000);
    }

    #[test]
    fn test_plane_counts() {
        assert_eq!(PixelFormat::I420.plane_count(), 3);
        assert_eq!(PixelFormat::Argb.plane_count(), 1);
        assert_eq!(PixelFormat::Argb.bytes_per_pixel(), 4);
    }

    #[test]
    fn test_plane_offsets() {
        let frame = FrameBuffer::new(PixelFormat::I420, 16, 8);
        let (y, u, v) = frame.planes();
        assert_eq!(y.len(), 16 * 8);
        assert_eq!(u.len(), 8 * 4);
        assert_eq!(v.len(), 8 * 4);
    }

    #[test]
    fn test_planes_are_disjoint() {
        let mut frame = FrameBuffer::new(PixelFormat::I420, 4, 4);
        {
            let (y, u, v) = frame.planes_mut();
            y.fill(1);
            u.fill(2);
            v.fill(3);
        }
        let data = frame.data();
        assert!(data[..16].iter().all(|&b| b == 1));
        assert!(data[16..20].iter().all(|&b| b == 2));
        assert!(data[20..24].iter().all(|&b| b == 3));
    }
}
