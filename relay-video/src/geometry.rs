//! Buffer geometry resolution
//!
//! All output and scratch buffer dimensions are derived here, once, before
//! any region is touched. The transform engine and the pipeline loop trust
//! these numbers unconditionally, so every size invariant is enforced in
//! [`Geometry::resolve`].

use crate::types::PixelFormat;
use thiserror::Error;

/// Sub-rectangle of the input frame to retain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropSpec {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Raw configuration as collected from the outside world.
///
/// Crop fields are only meaningful as a complete group of four, scale
/// fields as a complete pair; partial groups are rejected while a fully
/// absent group falls back to full-frame / no-scale defaults.
#[derive(Debug, Clone, Default)]
pub struct GeometryConfig {
    pub in_width: u32,
    pub in_height: u32,
    pub crop_x: Option<u32>,
    pub crop_y: Option<u32>,
    pub crop_width: Option<u32>,
    pub crop_height: Option<u32>,
    pub scale_width: Option<u32>,
    pub scale_height: Option<u32>,
    pub rotate180: bool,
}

/// Invalid or incomplete geometry configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("input dimensions must be positive, got {width}x{height}")]
    ZeroInput { width: u32, height: u32 },
    #[error("input dimensions must be even for 4:2:0 chroma, got {width}x{height}")]
    OddInput { width: u32, height: u32 },
    #[error("crop requires all of crop.x, crop.y, crop.width and crop.height ({given} of 4 given)")]
    PartialCrop { given: usize },
    #[error("scale requires both scale.width and scale.height ({given} of 2 given)")]
    PartialScale { given: usize },
    #[error("crop area must be positive, got {width}x{height}")]
    ZeroCrop { width: u32, height: u32 },
    #[error("crop values must be even for 4:2:0 chroma, got x={x} y={y} {width}x{height}")]
    OddCrop { x: u32, y: u32, width: u32, height: u32 },
    #[error("crop rectangle x={x} y={y} {width}x{height} exceeds the {in_width}x{in_height} input")]
    CropOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        in_width: u32,
        in_height: u32,
    },
    #[error("scale dimensions must be positive, got {width}x{height}")]
    ZeroScale { width: u32, height: u32 },
    #[error("scale dimensions must be even for 4:2:0 chroma, got {width}x{height}")]
    OddScale { width: u32, height: u32 },
}

/// Resolved buffer geometry, immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub in_width: u32,
    pub in_height: u32,
    pub crop: CropSpec,
    /// Effective output dimensions: the scale target if scaling was
    /// requested, otherwise the crop dimensions.
    pub final_width: u32,
    pub final_height: u32,
    /// Pre-scale working resolution (== crop size), present iff a
    /// scaling pass is needed.
    pub temp: Option<(u32, u32)>,
    pub rotate180: bool,
}

impl Geometry {
    /// Validate a raw configuration and derive all buffer dimensions.
    ///
    /// Pure computation; the configuration never changes at runtime, so
    /// this runs exactly once at startup.
    pub fn resolve(config: &GeometryConfig) -> Result<Self, GeometryError> {
        let (in_width, in_height) = (config.in_width, config.in_height);
        if in_width == 0 || in_height == 0 {
            return Err(GeometryError::ZeroInput {
                width: in_width,
                height: in_height,
            });
        }
        if in_width % 2 != 0 || in_height % 2 != 0 {
            return Err(GeometryError::OddInput {
                width: in_width,
                height: in_height,
            });
        }

        let crop_given = [
            config.crop_x,
            config.crop_y,
            config.crop_width,
            config.crop_height,
        ]
        .iter()
        .filter(|f| f.is_some())
        .count();
        if crop_given != 0 && crop_given != 4 {
            return Err(GeometryError::PartialCrop { given: crop_given });
        }

        let scale_given = [config.scale_width, config.scale_height]
            .iter()
            .filter(|f| f.is_some())
            .count();
        if scale_given != 0 && scale_given != 2 {
            return Err(GeometryError::PartialScale { given: scale_given });
        }

        let crop = CropSpec {
            x: config.crop_x.unwrap_or(0),
            y: config.crop_y.unwrap_or(0),
            width: config.crop_width.unwrap_or(in_width),
            height: config.crop_height.unwrap_or(in_height),
        };
        if crop.width == 0 || crop.height == 0 {
            return Err(GeometryError::ZeroCrop {
                width: crop.width,
                height: crop.height,
            });
        }
        if crop.x % 2 != 0 || crop.y % 2 != 0 || crop.width % 2 != 0 || crop.height % 2 != 0 {
            return Err(GeometryError::OddCrop {
                x: crop.x,
                y: crop.y,
                width: crop.width,
                height: crop.height,
            });
        }
        if crop.x + crop.width > in_width || crop.y + crop.height > in_height {
            return Err(GeometryError::CropOutOfBounds {
                x: crop.x,
                y: crop.y,
                width: crop.width,
                height: crop.height,
                in_width,
                in_height,
            });
        }

        let scale = match (config.scale_width, config.scale_height) {
            (Some(width), Some(height)) => {
                if width == 0 || height == 0 {
                    return Err(GeometryError::ZeroScale { width, height });
                }
                if width % 2 != 0 || height % 2 != 0 {
                    return Err(GeometryError::OddScale { width, height });
                }
                Some((width, height))
            }
            _ => None,
        };

        let (final_width, final_height) = scale.unwrap_or((crop.width, crop.height));
        let temp = scale.map(|_| (crop.width, crop.height));

        Ok(Geometry {
            in_width,
            in_height,
            crop,
            final_width,
            final_height,
            temp,
            rotate180: config.rotate180,
        })
    }

    /// Whether a scaling pass runs between crop/flip and output.
    pub fn needs_scaling(&self) -> bool {
        self.temp.is_some()
    }

    /// Exact byte size of the raw input frame.
    pub fn input_len(&self) -> usize {
        PixelFormat::I420.buffer_size(self.in_width, self.in_height)
    }

    /// Exact byte size of the I420 output region.
    pub fn i420_output_len(&self) -> usize {
        PixelFormat::I420.buffer_size(self.final_width, self.final_height)
    }

    /// Exact byte size of the ARGB output region.
    pub fn argb_output_len(&self) -> usize {
        PixelFormat::Argb.buffer_size(self.final_width, self.final_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(in_width: u32, in_height: u32) -> GeometryConfig {
        GeometryConfig {
            in_width,
            in_height,
            ..Default::default()
        }
    }

    #[test]
    fn test_identity_geometry() {
        let geometry = Geometry::resolve(&base(640, 480)).unwrap();
        assert_eq!(geometry.final_width, 640);
        assert_eq!(geometry.final_height, 480);
        assert_eq!(geometry.crop.x, 0);
        assert_eq!(geometry.crop.width, 640);
        assert!(!geometry.needs_scaling());
        assert_eq!(geometry.temp, None);
    }

    #[test]
    fn test_crop_output_sizes() {
        let mut config = base(640, 480);
        config.crop_x = Some(10);
        config.crop_y = Some(10);
        config.crop_width = Some(100);
        config.crop_height = Some(80);
        let geometry = Geometry::resolve(&config).unwrap();
        assert_eq!(geometry.i420_output_len(), 100 * 80 * 3 / 2);
        assert_eq!(geometry.i420_output_len(), 12000);
        assert_eq!(geometry.argb_output_len(), 100 * 80 * 4);
        assert_eq!(geometry.argb_output_len(), 32000);
    }

    #[test]
    fn test_crop_plus_scale_temp_sizing() {
        let mut config = base(640, 480);
        config.crop_x = Some(10);
        config.crop_y = Some(10);
        config.crop_width = Some(100);
        config.crop_height = Some(80);
        config.scale_width = Some(50);
        config.scale_height = Some(40);
        let geometry = Geometry::resolve(&config).unwrap();
        assert_eq!(geometry.temp, Some((100, 80)));
        assert_eq!(
            PixelFormat::I420.buffer_size(100, 80),
            100 * 80 * 3 / 2,
        );
        assert_eq!(geometry.final_width, 50);
        assert_eq!(geometry.final_height, 40);
        assert_eq!(geometry.i420_output_len(), 50 * 40 * 3 / 2);
        assert_eq!(geometry.argb_output_len(), 50 * 40 * 4);
    }

    #[test]
    fn test_partial_crop_rejected() {
        let fields: [fn(&mut GeometryConfig); 4] = [
            |c| c.crop_x = Some(0),
            |c| c.crop_y = Some(0),
            |c| c.crop_width = Some(100),
            |c| c.crop_height = Some(80),
        ];
        // every strict subset of 1..=3 fields must fail
        for mask in 1u32..15 {
            let mut config = base(640, 480);
            let mut given = 0;
            for (i, set) in fields.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    set(&mut config);
                    given += 1;
                }
            }
            assert_eq!(
                Geometry::resolve(&config),
                Err(GeometryError::PartialCrop { given }),
                "mask {mask:04b} should be rejected"
            );
        }
    }

    #[test]
    fn test_full_crop_accepted() {
        let mut config = base(640, 480);
        config.crop_x = Some(0);
        config.crop_y = Some(0);
        config.crop_width = Some(100);
        config.crop_height = Some(80);
        assert!(Geometry::resolve(&config).is_ok());
    }

    #[test]
    fn test_partial_scale_rejected() {
        let mut config = base(640, 480);
        config.scale_width = Some(320);
        assert_eq!(
            Geometry::resolve(&config),
            Err(GeometryError::PartialScale { given: 1 })
        );

        let mut config = base(640, 480);
        config.scale_height = Some(240);
        assert_eq!(
            Geometry::resolve(&config),
            Err(GeometryError::PartialScale { given: 1 })
        );
    }

    #[test]
    fn test_full_scale_accepted() {
        let mut config = base(640, 480);
        config.scale_width = Some(320);
        config.scale_height = Some(240);
        let geometry = Geometry::resolve(&config).unwrap();
        assert!(geometry.needs_scaling());
        assert_eq!(geometry.temp, Some((640, 480)));
        assert_eq!(geometry.final_width, 320);
    }

    #[test]
    fn test_bad_input_dimensions() {
        assert!(matches!(
            Geometry::resolve(&base(0, 480)),
            Err(GeometryError::ZeroInput { .. })
        ));
        assert!(matches!(
            Geometry::resolve(&base(641, 480)),
            Err(GeometryError::OddInput { .. })
        ));
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let mut config = base(640, 480);
        config.crop_x = Some(600);
        config.crop_y = Some(0);
        config.crop_width = Some(100);
        config.crop_height = Some(80);
        assert!(matches!(
            Geometry::resolve(&config),
            Err(GeometryError::CropOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_odd_crop_rejected() {
        let mut config = base(640, 480);
        config.crop_x = Some(3);
        config.crop_y = Some(0);
        config.crop_width = Some(100);
        config.crop_height = Some(80);
        assert!(matches!(
            Geometry::resolve(&config),
            Err(GeometryError::OddCrop { .. })
        ));
    }

    #[test]
    fn test_odd_scale_rejected() {
        let mut config = base(640, 480);
        config.scale_width = Some(321);
        config.scale_height = Some(240);
        assert!(matches!(
            Geometry::resolve(&config),
            Err(GeometryError::OddScale { .. })
        ));
    }
}
