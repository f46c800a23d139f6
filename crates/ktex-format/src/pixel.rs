//! Enumerations carried in the KTEX header.

use std::fmt;

use crate::{Error, Result};

/// Pixel encoding of a KTEX texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// BC1 block compression, 8 bytes per 4x4 block.
    Dxt1,
    /// BC2 block compression, 16 bytes per 4x4 block.
    Dxt3,
    /// BC3 block compression, 16 bytes per 4x4 block.
    Dxt5,
    /// 32 bits per pixel, stored R, G, B, A in memory.
    Argb,
    /// 24 bits per pixel, stored R, G, B in memory.
    Rgb,
    /// ETC2 RGBA with EAC alpha, 16 bytes per 4x4 block.
    Etc2Eac,
}

impl PixelFormat {
    /// Every format that can be converted from and to.
    pub const ALL: [PixelFormat; 6] = [
        PixelFormat::Dxt1,
        PixelFormat::Dxt3,
        PixelFormat::Dxt5,
        PixelFormat::Argb,
        PixelFormat::Rgb,
        PixelFormat::Etc2Eac,
    ];

    /// The code reserved for "unknown" in the header.
    pub const UNKNOWN_CODE: u32 = 7;

    /// Map a header pixel-format code to a format.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Dxt1),
            1 => Some(Self::Dxt3),
            2 => Some(Self::Dxt5),
            4 => Some(Self::Argb),
            5 => Some(Self::Rgb),
            18 => Some(Self::Etc2Eac),
            _ => None,
        }
    }

    /// The header code of this format.
    pub const fn code(self) -> u32 {
        match self {
            Self::Dxt1 => 0,
            Self::Dxt3 => 1,
            Self::Dxt5 => 2,
            Self::Argb => 4,
            Self::Rgb => 5,
            Self::Etc2Eac => 18,
        }
    }

    /// Whether the format is stored as 4x4 compressed blocks.
    pub const fn is_block_compressed(self) -> bool {
        matches!(self, Self::Dxt1 | Self::Dxt3 | Self::Dxt5 | Self::Etc2Eac)
    }

    /// Bytes per 4x4 block, or per pixel for linear formats.
    pub const fn unit_size(self) -> usize {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt3 | Self::Dxt5 | Self::Etc2Eac => 16,
            Self::Argb => 4,
            Self::Rgb => 3,
        }
    }

    /// Size in bytes of a tightly packed surface of this format.
    pub fn surface_size(self, width: u32, height: u32) -> usize {
        if self.is_block_compressed() {
            let blocks_x = ((width as usize) + 3) / 4;
            let blocks_y = ((height as usize) + 3) / 4;
            blocks_x.max(1) * blocks_y.max(1) * self.unit_size()
        } else {
            width as usize * height as usize * self.unit_size()
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dxt1 => "DXT1",
            Self::Dxt3 => "DXT3",
            Self::Dxt5 => "DXT5",
            Self::Argb => "ARGB",
            Self::Rgb => "RGB",
            Self::Etc2Eac => "ETC2_EAC",
        };
        f.write_str(name)
    }
}

/// Resolve a header pixel-format code into a format the transcoder understands.
pub fn resolve_pixel_format(code: u32) -> Result<PixelFormat> {
    PixelFormat::from_code(code).ok_or(Error::UnsupportedPixelFormat(code))
}

/// Target platform recorded in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Pc,
    Xbox360,
    Ps3,
    Unknown,
}

impl Platform {
    /// Map a raw platform code. Codes outside the known set are `Unknown`.
    pub const fn from_code(code: u32) -> Self {
        match code {
            12 => Self::Pc,
            11 => Self::Xbox360,
            10 => Self::Ps3,
            _ => Self::Unknown,
        }
    }
}

/// Texture dimensionality recorded in the header.
///
/// Only carried through; the mip chain is always treated as flat surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    OneD,
    TwoD,
    ThreeD,
    CubeMap,
}

impl TextureType {
    /// Map a raw texture-type code.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::OneD),
            2 => Some(Self::TwoD),
            3 => Some(Self::ThreeD),
            4 => Some(Self::CubeMap),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for format in PixelFormat::ALL {
            assert_eq!(PixelFormat::from_code(format.code()), Some(format));
        }
    }

    #[test]
    fn test_resolve_rejects_unknown() {
        assert!(matches!(
            resolve_pixel_format(PixelFormat::UNKNOWN_CODE),
            Err(Error::UnsupportedPixelFormat(7))
        ));
        assert!(resolve_pixel_format(3).is_err());
        assert!(resolve_pixel_format(31).is_err());
        assert_eq!(resolve_pixel_format(18).unwrap(), PixelFormat::Etc2Eac);
    }

    #[test]
    fn test_surface_size() {
        // 4x4 block minimum
        assert_eq!(PixelFormat::Dxt1.surface_size(1, 1), 8);
        assert_eq!(PixelFormat::Dxt5.surface_size(1, 1), 16);
        assert_eq!(PixelFormat::Dxt5.surface_size(8, 8), 64);
        assert_eq!(PixelFormat::Etc2Eac.surface_size(6, 5), 64);
        assert_eq!(PixelFormat::Dxt1.surface_size(1024, 1024), 512 * 1024);
        assert_eq!(PixelFormat::Argb.surface_size(3, 2), 24);
        assert_eq!(PixelFormat::Rgb.surface_size(3, 2), 18);
    }

    #[test]
    fn test_platform_and_texture_type() {
        assert_eq!(Platform::from_code(12), Platform::Pc);
        assert_eq!(Platform::from_code(3), Platform::Unknown);
        assert_eq!(TextureType::from_code(4), Some(TextureType::CubeMap));
        assert_eq!(TextureType::from_code(0), None);
    }
}
