//! KTEX header word.
//!
//! The header is a single little-endian `u32` packing several small fields.
//! Field positions are declared once as [`BitField`] constants and every
//! pack/unpack goes through [`BitField::extract`] / [`BitField::insert`].
//!
//! ```text
//!  31          20 19 18 17    13 12     9 8       4 3     0
//! +--------------+-----+--------+--------+---------+-------+
//! |  remainder   |flags|num_mips|tex type| pix fmt |platfrm|
//! +--------------+-----+--------+--------+---------+-------+
//! |        old_remainder (bits 14..=31)  |
//! ```

use std::fmt;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::pixel::{PixelFormat, Platform, TextureType};

/// A field of `width` bits starting at bit `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub offset: u32,
    pub width: u32,
}

impl BitField {
    pub const fn new(offset: u32, width: u32) -> Self {
        Self { offset, width }
    }

    /// Mask of `width` low bits.
    pub const fn mask(self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// Read this field out of `word`.
    pub const fn extract(self, word: u32) -> u32 {
        (word >> self.offset) & self.mask()
    }

    /// Return `word` with this field replaced by `value` (truncated to the field width).
    pub const fn insert(self, word: u32, value: u32) -> u32 {
        let cleared = word & !(self.mask() << self.offset);
        cleared | ((value & self.mask()) << self.offset)
    }
}

/// Header bit positions.
pub mod layout {
    use super::BitField;

    pub const PLATFORM: BitField = BitField::new(0, 4);
    pub const PIXEL_FORMAT: BitField = BitField::new(4, 5);
    pub const TEXTURE_TYPE: BitField = BitField::new(9, 4);
    pub const NUM_MIPS: BitField = BitField::new(13, 5);
    pub const FLAGS: BitField = BitField::new(18, 2);
    pub const REMAINDER: BitField = BitField::new(20, 12);

    /// Remainder slice of the pre-update layout.
    pub const OLD_REMAINDER: BitField = BitField::new(14, 18);

    /// The current layout, in header field order.
    pub const CURRENT: [BitField; 6] = [
        PLATFORM,
        PIXEL_FORMAT,
        TEXTURE_TYPE,
        NUM_MIPS,
        FLAGS,
        REMAINDER,
    ];
}

/// Value of `old_remainder` that marks a pre-update header.
pub const LEGACY_SENTINEL: u32 = 0x3FFFF;

/// Value always written into the remainder slot.
pub const REMAINDER_FILL: u32 = 0xFFF;

/// Decoded KTEX header.
///
/// Fields keep their raw codes so that values outside the known enums are
/// carried through a conversion untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KtexHeader {
    /// Target platform code (see [`Platform`]).
    pub platform: u32,
    /// Pixel format code (see [`PixelFormat`]).
    pub pixel_format: u32,
    /// Texture dimensionality code (see [`TextureType`]).
    pub texture_type: u32,
    /// Number of mip level records that follow the header.
    pub num_mips: u32,
    /// Opaque flag bits, carried through unchanged.
    pub flags: u32,
    /// Remainder bits of the current layout.
    pub remainder: u32,
    /// Remainder bits of the pre-update layout, [`LEGACY_SENTINEL`] for legacy files.
    pub old_remainder: u32,
    /// The raw word this header was decoded from.
    pub origin: u32,
}

impl KtexHeader {
    /// Decode a header word. Every word decodes to some header.
    pub fn decode(word: u32) -> Self {
        let [platform, pixel_format, texture_type, num_mips, flags, remainder] =
            layout::CURRENT.map(|field| field.extract(word));

        Self {
            platform,
            pixel_format,
            texture_type,
            num_mips,
            flags,
            remainder,
            old_remainder: layout::OLD_REMAINDER.extract(word),
            origin: word,
        }
    }

    /// Encode using the current layout with `target` as pixel format.
    ///
    /// The remainder slot is always written as [`REMAINDER_FILL`], so a
    /// legacy header comes out in the current layout.
    pub fn encode(&self, target: PixelFormat) -> u32 {
        let values = [
            self.platform,
            target.code(),
            self.texture_type,
            self.num_mips,
            self.flags,
            REMAINDER_FILL,
        ];

        layout::CURRENT
            .iter()
            .zip(values)
            .fold(0, |word, (field, value)| field.insert(word, value))
    }

    /// Whether this header uses the pre-update layout.
    pub fn is_legacy(&self) -> bool {
        self.old_remainder == LEGACY_SENTINEL
    }

    pub fn platform_kind(&self) -> Platform {
        Platform::from_code(self.platform)
    }

    pub fn texture_type_kind(&self) -> Option<TextureType> {
        TextureType::from_code(self.texture_type)
    }

    /// Read and decode a header word from a stream.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        reader.read_u32::<LittleEndian>().map(Self::decode)
    }

    /// Encode and write a header word to a stream.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W, target: PixelFormat) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.encode(target))
    }
}

impl fmt::Display for KtexHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "plat:{} pixel:{} type:{} mips:{} flags:{} remainder:{} old_remainder:{}",
            self.platform,
            self.pixel_format,
            self.texture_type,
            self.num_mips,
            self.flags,
            self.remainder,
            self.old_remainder
        )
    }
}
