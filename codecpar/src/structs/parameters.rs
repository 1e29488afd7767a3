//! The codec parameter record.
//!
//! [`CodecParameters`] describes an encoded stream: its identity, geometry,
//! sample format, channel layout and the codec-specific extra data. The
//! record exclusively owns two native sub-resources, the padded extra-data
//! buffer and the channel layout's custom map. Neither is ever handed out by
//! reference to the map nor shared with another record; copies always go
//! through a fresh allocation.

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};

use crate::structs::channel_layout::ChannelLayout;
use crate::structs::values::{
    ChromaLocation, CodecId, CodecTag, ColorPrimaries, ColorRange, ColorSpace,
    ColorTransferCharacteristic, FieldOrder, Level, MediaType, PixelFormat, Profile, Rational,
    SampleFormat,
};
use crate::utils::alloc::{SharedAllocator, system_allocator};
use crate::utils::buffer::{INPUT_BUFFER_PADDING_SIZE, NativeBuffer};
use crate::utils::errors::ParametersError;

/// Scalar fields, copied by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Properties {
    codec_type: MediaType,
    codec_id: CodecId,
    codec_tag: CodecTag,
    format: i32,
    bit_rate: i64,
    bits_per_coded_sample: i32,
    bits_per_raw_sample: i32,
    profile: Profile,
    level: Level,

    width: i32,
    height: i32,
    sample_aspect_ratio: Rational,
    framerate: Rational,
    field_order: FieldOrder,
    color_range: ColorRange,
    color_primaries: ColorPrimaries,
    color_trc: ColorTransferCharacteristic,
    color_space: ColorSpace,
    chroma_location: ChromaLocation,
    video_delay: i32,

    channels: i32,
    sample_rate: i32,
    block_align: i32,
    frame_size: i32,
    initial_padding: i32,
    trailing_padding: i32,
    seek_preroll: i32,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            codec_type: MediaType::UNKNOWN,
            codec_id: CodecId::NONE,
            codec_tag: CodecTag::default(),
            format: -1,
            bit_rate: 0,
            bits_per_coded_sample: 0,
            bits_per_raw_sample: 0,
            profile: Profile::UNKNOWN,
            level: Level::UNKNOWN,
            width: 0,
            height: 0,
            sample_aspect_ratio: Rational::new(0, 1),
            framerate: Rational::new(0, 1),
            field_order: FieldOrder::UNKNOWN,
            color_range: ColorRange::UNSPECIFIED,
            color_primaries: ColorPrimaries::UNSPECIFIED,
            color_trc: ColorTransferCharacteristic::UNSPECIFIED,
            color_space: ColorSpace::UNSPECIFIED,
            chroma_location: ChromaLocation::UNSPECIFIED,
            video_delay: 0,
            channels: 0,
            sample_rate: 0,
            block_align: 0,
            frame_size: 0,
            initial_padding: 0,
            trailing_padding: 0,
            seek_preroll: 0,
        }
    }
}

/// Getter plus range-checked setter for `i32` fields.
macro_rules! int_accessors {
    ($($(#[$meta:meta])* $field:ident => $setter:ident;)*) => {
        $(
            $(#[$meta])*
            pub fn $field(&self) -> i32 {
                self.props.$field
            }

            #[doc = concat!("Sets `", stringify!($field), "`, rejecting values that do not fit in an `i32`.")]
            pub fn $setter(&mut self, value: impl Into<i64>) -> Result<(), ParametersError> {
                let value = value.into();
                self.props.$field = i32::try_from(value).map_err(|_| {
                    ParametersError::OutOfRange {
                        field: stringify!($field),
                        value,
                    }
                })?;
                Ok(())
            }
        )*
    };
}

/// Getter plus setter for value-typed fields.
macro_rules! value_accessors {
    ($($(#[$meta:meta])* $field:ident: $ty:ty => $setter:ident;)*) => {
        $(
            $(#[$meta])*
            pub fn $field(&self) -> $ty {
                self.props.$field
            }

            pub fn $setter(&mut self, value: $ty) {
                self.props.$field = value;
            }
        )*
    };
}

/// Static description of an encoded stream.
///
/// The record is move-only: there is no `Clone`, and the native buffers it
/// owns are released exactly once, when it is dropped or passed to
/// [`release`](Self::release). Use [`try_clone`](Self::try_clone) or
/// [`copy_to`](Self::copy_to) for an independent copy.
pub struct CodecParameters {
    props: Properties,
    extradata: Option<NativeBuffer<u8>>,
    ch_layout: ChannelLayout,
    allocator: SharedAllocator,
}

impl CodecParameters {
    /// A record with every field at its unknown/unset value, allocating from
    /// the system allocator.
    pub fn new() -> Self {
        Self::with_allocator(system_allocator())
    }

    /// Like [`new`](Self::new), with native sub-buffers allocated from
    /// `allocator`.
    pub fn with_allocator(allocator: SharedAllocator) -> Self {
        trace!("Allocating codec parameters");
        Self {
            props: Properties::default(),
            extradata: None,
            ch_layout: ChannelLayout::default(),
            allocator,
        }
    }

    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// Returns every field to its unset value and frees the sub-buffers.
    pub fn reset(&mut self) {
        trace!("Resetting codec parameters");
        self.props = Properties::default();
        self.extradata = None;
        self.ch_layout = ChannelLayout::default();
    }

    /// Consumes the record, releasing its native buffers.
    pub fn release(self) {
        debug!(
            "Releasing codec parameters ({} bytes of extradata, {} channels)",
            self.extradata_size(),
            self.ch_layout.nb_channels()
        );
        drop(self);
    }

    /// Replaces the extra data with a padded copy of `data`.
    ///
    /// An empty `data` is ignored and keeps the current extra data; use
    /// [`clear_extradata`](Self::clear_extradata) to drop it. The old buffer
    /// is released before the new one is allocated, so when allocation fails
    /// the record is left with no extra data at all.
    pub fn set_extradata(&mut self, data: &[u8]) -> Result<(), ParametersError> {
        if data.is_empty() {
            trace!("Ignoring empty extradata");
            return Ok(());
        }

        self.extradata = None;
        let buffer = NativeBuffer::from_slice(&self.allocator, data, INPUT_BUFFER_PADDING_SIZE)?;
        self.extradata = Some(buffer);
        Ok(())
    }

    pub fn clear_extradata(&mut self) {
        self.extradata = None;
    }

    /// The extra data, bounded by its recorded length.
    pub fn extradata(&self) -> Option<&[u8]> {
        self.extradata.as_ref().map(NativeBuffer::as_slice)
    }

    /// The extra data followed by [`INPUT_BUFFER_PADDING_SIZE`] zero bytes.
    pub fn extradata_padded(&self) -> Option<&[u8]> {
        self.extradata.as_ref().map(NativeBuffer::padded)
    }

    pub fn extradata_size(&self) -> usize {
        self.extradata.as_ref().map_or(0, NativeBuffer::len)
    }

    /// A deep copy of the channel layout. Changing it does not affect the
    /// record.
    pub fn channel_layout(&self) -> Result<ChannelLayout, ParametersError> {
        Ok(self.ch_layout.try_clone_in(&self.allocator)?)
    }

    /// Stores a deep copy of `layout`. On failure the current layout is kept.
    pub fn set_channel_layout(&mut self, layout: &ChannelLayout) -> Result<(), ParametersError> {
        layout.copy_into_in(&self.allocator, &mut self.ch_layout)?;
        Ok(())
    }

    /// Copies every field into `dst`, after resetting it.
    ///
    /// Sub-buffers are freshly allocated from `dst`'s allocator. If one of
    /// those allocations fails, `dst` keeps the scalars and whatever was
    /// copied before the failure.
    pub fn copy_to(&self, dst: &mut CodecParameters) -> Result<(), ParametersError> {
        debug!(
            "Copying codec parameters ({}, {} bytes of extradata)",
            self.props.codec_id,
            self.extradata_size()
        );

        dst.reset();
        dst.props = self.props;

        if let Some(extradata) = &self.extradata {
            dst.extradata = Some(NativeBuffer::from_slice(
                &dst.allocator,
                extradata.as_slice(),
                INPUT_BUFFER_PADDING_SIZE,
            )?);
        }
        self.ch_layout.copy_into_in(&dst.allocator, &mut dst.ch_layout)?;

        Ok(())
    }

    /// An independent copy sharing this record's allocator.
    pub fn try_clone(&self) -> Result<Self, ParametersError> {
        let mut copy = Self::with_allocator(Arc::clone(&self.allocator));
        self.copy_to(&mut copy)?;
        Ok(copy)
    }

    value_accessors! {
        codec_type: MediaType => set_codec_type;
        codec_id: CodecId => set_codec_id;
        /// Container-level identifier, usually a FourCC.
        codec_tag: CodecTag => set_codec_tag;
        profile: Profile => set_profile;
        level: Level => set_level;
        sample_aspect_ratio: Rational => set_sample_aspect_ratio;
        /// Frame rate of constant frame rate video; `0/1` when unknown.
        framerate: Rational => set_framerate;
        field_order: FieldOrder => set_field_order;
        color_range: ColorRange => set_color_range;
        color_primaries: ColorPrimaries => set_color_primaries;
        color_trc: ColorTransferCharacteristic => set_color_trc;
        color_space: ColorSpace => set_color_space;
        chroma_location: ChromaLocation => set_chroma_location;
    }

    int_accessors! {
        /// Raw pixel or sample format, see [`pixel_format`](Self::pixel_format)
        /// and [`sample_format`](Self::sample_format).
        format => set_format;
        bits_per_coded_sample => set_bits_per_coded_sample;
        bits_per_raw_sample => set_bits_per_raw_sample;
        width => set_width;
        height => set_height;
        /// Number of frames the decoder delays output by.
        video_delay => set_video_delay;
        /// Legacy channel count; the channel layout supersedes it.
        channels => set_channels;
        sample_rate => set_sample_rate;
        block_align => set_block_align;
        /// Audio samples per packet, when constant.
        frame_size => set_frame_size;
        initial_padding => set_initial_padding;
        trailing_padding => set_trailing_padding;
        seek_preroll => set_seek_preroll;
    }

    /// Average bit rate in bits per second.
    pub fn bit_rate(&self) -> i64 {
        self.props.bit_rate
    }

    pub fn set_bit_rate(&mut self, value: i64) {
        self.props.bit_rate = value;
    }

    pub fn media_type(&self) -> MediaType {
        self.props.codec_type
    }

    pub fn set_media_type(&mut self, value: MediaType) {
        self.props.codec_type = value;
    }

    /// `format` read as a pixel format, whatever the media type.
    pub fn pixel_format(&self) -> PixelFormat {
        PixelFormat::from_raw(self.props.format)
    }

    pub fn set_pixel_format(&mut self, value: PixelFormat) {
        self.props.format = value.into_raw();
    }

    /// `format` read as a sample format, whatever the media type.
    pub fn sample_format(&self) -> SampleFormat {
        SampleFormat::from_raw(self.props.format)
    }

    pub fn set_sample_format(&mut self, value: SampleFormat) {
        self.props.format = value.into_raw();
    }
}

impl Default for CodecParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for CodecParameters {
    fn eq(&self, other: &Self) -> bool {
        self.props == other.props
            && self.extradata() == other.extradata()
            && self.ch_layout == other.ch_layout
    }
}

impl Eq for CodecParameters {}

impl fmt::Debug for CodecParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecParameters")
            .field("props", &self.props)
            .field("extradata", &self.extradata())
            .field("ch_layout", &self.ch_layout)
            .finish_non_exhaustive()
    }
}
