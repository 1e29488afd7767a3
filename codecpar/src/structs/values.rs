//! Opaque enumerated values carried by codec parameters.
//!
//! Each type is a newtype over the native integer, so any value read from a
//! demuxer or context survives unchanged even when it has no name here. No
//! value is ever checked against another (a pixel format is never validated
//! against a codec id).

use std::fmt::{self, Display};
use std::str::FromStr;

use codecpar_macros::{RawValue, named_values};

/// Conversion between a value type and its native integer.
pub trait RawValue: Copy {
    type Raw: Copy;

    fn from_raw(raw: Self::Raw) -> Self;

    fn into_raw(self) -> Self::Raw;
}

/// Lookup of well-known values by name.
pub trait NamedValue: Sized {
    fn name(&self) -> Option<&'static str>;

    fn from_name(name: &str) -> Option<Self>;
}

/// Kind of media carried by a stream.
#[named_values(
    UNKNOWN = -1,
    VIDEO = 0,
    AUDIO = 1,
    DATA = 2,
    SUBTITLE = 3,
    ATTACHMENT = 4
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, RawValue)]
pub struct MediaType(i32);

impl Default for MediaType {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

#[named_values(
    NONE = 0,
    MPEG1VIDEO = 1,
    MPEG2VIDEO = 2,
    H263 = 4,
    MJPEG = 7,
    MPEG4 = 12,
    RAWVIDEO = 13,
    H264 = 27,
    VP8 = 139,
    VP9 = 167,
    HEVC = 173,
    PCM_S16LE = 0x10000,
    PCM_S16BE = 0x10001,
    PCM_F32BE = 0x10014,
    PCM_F32LE = 0x10015,
    MP2 = 0x15000,
    MP3 = 0x15001,
    AAC = 0x15002,
    AC3 = 0x15003,
    DTS = 0x15004,
    VORBIS = 0x15005,
    FLAC = 0x1500C,
    DVD_SUBTITLE = 0x17000,
    DVB_SUBTITLE = 0x17001,
    MOV_TEXT = 0x17005
)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, RawValue)]
pub struct CodecId(u32);

/// Container-level codec identifier, usually a little-endian FourCC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, RawValue)]
pub struct CodecTag(u32);

impl CodecTag {
    pub const fn from_fourcc(fourcc: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(fourcc))
    }

    pub const fn fourcc(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl Display for CodecTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.fourcc();
        if self.0 != 0 && bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            for b in bytes {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            write!(f, "{:#010x}", self.0)
        }
    }
}

#[named_values(
    NONE = -1,
    YUV420P = 0,
    YUYV422 = 1,
    RGB24 = 2,
    BGR24 = 3,
    YUV422P = 4,
    YUV444P = 5,
    YUV410P = 6,
    YUV411P = 7,
    GRAY8 = 8,
    NV12 = 23,
    NV21 = 24,
    ARGB = 25,
    RGBA = 26,
    ABGR = 27,
    BGRA = 28
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, RawValue)]
pub struct PixelFormat(i32);

#[named_values(
    NONE = -1,
    U8 = 0,
    S16 = 1,
    S32 = 2,
    FLT = 3,
    DBL = 4,
    U8P = 5,
    S16P = 6,
    S32P = 7,
    FLTP = 8,
    DBLP = 9,
    S64 = 10,
    S64P = 11
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, RawValue)]
pub struct SampleFormat(i32);

impl SampleFormat {
    /// Bytes per sample for the well-known formats.
    pub const fn bytes_per_sample(self) -> Option<usize> {
        match self.0 {
            0 | 5 => Some(1),
            1 | 6 => Some(2),
            2 | 3 | 7 | 8 => Some(4),
            4 | 9 | 10 | 11 => Some(8),
            _ => None,
        }
    }

    pub const fn is_planar(self) -> bool {
        matches!(self.0, 5..=9 | 11)
    }
}

#[named_values(
    RESERVED0 = 0,
    BT709 = 1,
    UNSPECIFIED = 2,
    RESERVED = 3,
    BT470M = 4,
    BT470BG = 5,
    SMPTE170M = 6,
    SMPTE240M = 7,
    FILM = 8,
    BT2020 = 9,
    SMPTE428 = 10,
    SMPTE431 = 11,
    SMPTE432 = 12,
    EBU3213 = 22
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, RawValue)]
pub struct ColorPrimaries(i32);

#[named_values(
    RESERVED0 = 0,
    BT709 = 1,
    UNSPECIFIED = 2,
    RESERVED = 3,
    GAMMA22 = 4,
    GAMMA28 = 5,
    SMPTE170M = 6,
    SMPTE240M = 7,
    LINEAR = 8,
    LOG = 9,
    LOG_SQRT = 10,
    IEC61966_2_4 = 11,
    BT1361_ECG = 12,
    IEC61966_2_1 = 13,
    BT2020_10 = 14,
    BT2020_12 = 15,
    SMPTE2084 = 16,
    SMPTE428 = 17,
    ARIB_STD_B67 = 18
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, RawValue)]
pub struct ColorTransferCharacteristic(i32);

#[named_values(
    RGB = 0,
    BT709 = 1,
    UNSPECIFIED = 2,
    RESERVED = 3,
    FCC = 4,
    BT470BG = 5,
    SMPTE170M = 6,
    SMPTE240M = 7,
    YCGCO = 8,
    BT2020_NCL = 9,
    BT2020_CL = 10,
    SMPTE2085 = 11,
    CHROMA_DERIVED_NCL = 12,
    CHROMA_DERIVED_CL = 13,
    ICTCP = 14
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, RawValue)]
pub struct ColorSpace(i32);

#[named_values(UNSPECIFIED = 0, MPEG = (1, "tv"), JPEG = (2, "pc"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, RawValue)]
pub struct ColorRange(i32);

#[named_values(
    UNSPECIFIED = 0,
    LEFT = 1,
    CENTER = 2,
    TOPLEFT = 3,
    TOP = 4,
    BOTTOMLEFT = 5,
    BOTTOM = 6
)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, RawValue)]
pub struct ChromaLocation(i32);

#[named_values(UNKNOWN = 0, PROGRESSIVE = 1, TT = 2, BB = 3, TB = 4, BT = 5)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, RawValue)]
pub struct FieldOrder(i32);

/// Codec-specific profile; only the sentinels are named.
#[named_values(UNKNOWN = -99, RESERVED = -100)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, RawValue)]
pub struct Profile(i32);

/// Codec-specific level; only the sentinel is named.
#[named_values(UNKNOWN = -99)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, RawValue)]
pub struct Level(i32);

/// A rational number such as an aspect ratio or frame rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Returns `None` for a zero denominator.
    pub fn to_f64(self) -> Option<f64> {
        (self.den != 0).then(|| f64::from(self.num) / f64::from(self.den))
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for Rational {
    type Err = std::num::ParseIntError;

    /// Accepts `num/den`, `num:den` or a bare integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(['/', ':']) {
            Some((num, den)) => Ok(Self::new(num.trim().parse()?, den.trim().parse()?)),
            None => Ok(Self::new(s.parse()?, 1)),
        }
    }
}
