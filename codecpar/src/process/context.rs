//! Field transfer between [`CodecParameters`] and codec contexts.

use log::debug;

use crate::structs::channel_layout::ChannelLayout;
use crate::structs::parameters::CodecParameters;
use crate::structs::values::{
    ChromaLocation, CodecId, CodecTag, ColorPrimaries, ColorRange, ColorSpace,
    ColorTransferCharacteristic, FieldOrder, Level, MediaType, PixelFormat, Profile, Rational,
    SampleFormat,
};
use crate::utils::errors::ContextError;

/// Encoder or decoder state that can describe itself with, or configure
/// itself from, a parameter record.
///
/// Both directions are total transfers of the fields the context knows
/// about. Buffers are always copied; neither side may keep a reference into
/// the other.
pub trait CodecContext {
    type Error;

    /// Writes the context's stream description into `params`.
    ///
    /// `params` has been reset by the caller.
    fn export_parameters(&self, params: &mut CodecParameters) -> Result<(), Self::Error>;

    /// Configures the context from `params`.
    fn import_parameters(&mut self, params: &CodecParameters) -> Result<(), Self::Error>;
}

impl CodecParameters {
    /// Resets the record and fills it from `ctx`.
    pub fn from_context<C: CodecContext + ?Sized>(&mut self, ctx: &C) -> Result<(), C::Error> {
        debug!("Filling codec parameters from context");
        self.reset();
        ctx.export_parameters(self)
    }

    /// Configures `ctx` from this record.
    pub fn to_context<C: CodecContext + ?Sized>(&self, ctx: &mut C) -> Result<(), C::Error> {
        debug!(
            "Applying codec parameters ({}, {}) to context",
            self.codec_type(),
            self.codec_id()
        );
        ctx.import_parameters(self)
    }

    /// A new record describing `ctx`.
    pub fn try_from_context<C: CodecContext + ?Sized>(ctx: &C) -> Result<Self, C::Error> {
        let mut params = Self::new();
        params.from_context(ctx)?;
        Ok(params)
    }
}

/// A minimal in-memory codec context.
///
/// Unlike [`CodecParameters`] it splits the format into `pix_fmt` and
/// `sample_fmt`, keeps a time base, and stores extra data in a plain `Vec`.
#[derive(Debug)]
pub struct BasicCodecContext {
    pub codec_type: MediaType,
    pub codec_id: CodecId,
    pub codec_tag: CodecTag,
    pub bit_rate: i64,
    pub bits_per_coded_sample: i32,
    pub bits_per_raw_sample: i32,
    pub profile: Profile,
    pub level: Level,
    pub extradata: Vec<u8>,
    pub time_base: Rational,

    pub width: i32,
    pub height: i32,
    pub pix_fmt: PixelFormat,
    pub sample_aspect_ratio: Rational,
    pub framerate: Rational,
    pub field_order: FieldOrder,
    pub color_range: ColorRange,
    pub color_primaries: ColorPrimaries,
    pub color_trc: ColorTransferCharacteristic,
    pub colorspace: ColorSpace,
    pub chroma_sample_location: ChromaLocation,
    /// Frames of decoder delay caused by B-frame reordering.
    pub has_b_frames: i32,

    pub sample_fmt: SampleFormat,
    pub sample_rate: i32,
    pub ch_layout: ChannelLayout,
    pub block_align: i32,
    pub frame_size: i32,
    pub initial_padding: i32,
    pub trailing_padding: i32,
    pub seek_preroll: i32,
}

impl Default for BasicCodecContext {
    fn default() -> Self {
        Self {
            codec_type: MediaType::UNKNOWN,
            codec_id: CodecId::NONE,
            codec_tag: CodecTag::default(),
            bit_rate: 0,
            bits_per_coded_sample: 0,
            bits_per_raw_sample: 0,
            profile: Profile::UNKNOWN,
            level: Level::UNKNOWN,
            extradata: Vec::new(),
            time_base: Rational::new(0, 1),
            width: 0,
            height: 0,
            pix_fmt: PixelFormat::NONE,
            sample_aspect_ratio: Rational::new(0, 1),
            framerate: Rational::new(0, 1),
            field_order: FieldOrder::UNKNOWN,
            color_range: ColorRange::UNSPECIFIED,
            color_primaries: ColorPrimaries::UNSPECIFIED,
            color_trc: ColorTransferCharacteristic::UNSPECIFIED,
            colorspace: ColorSpace::UNSPECIFIED,
            chroma_sample_location: ChromaLocation::UNSPECIFIED,
            has_b_frames: 0,
            sample_fmt: SampleFormat::NONE,
            sample_rate: 0,
            ch_layout: ChannelLayout::default(),
            block_align: 0,
            frame_size: 0,
            initial_padding: 0,
            trailing_padding: 0,
            seek_preroll: 0,
        }
    }
}

impl CodecContext for BasicCodecContext {
    type Error = ContextError;

    fn export_parameters(&self, params: &mut CodecParameters) -> Result<(), ContextError> {
        params.set_codec_type(self.codec_type);
        params.set_codec_id(self.codec_id);
        params.set_codec_tag(self.codec_tag);
        params.set_bit_rate(self.bit_rate);
        params.set_bits_per_coded_sample(self.bits_per_coded_sample)?;
        params.set_bits_per_raw_sample(self.bits_per_raw_sample)?;
        params.set_profile(self.profile);
        params.set_level(self.level);

        match self.codec_type {
            MediaType::VIDEO => {
                params.set_pixel_format(self.pix_fmt);
                params.set_width(self.width)?;
                params.set_height(self.height)?;
                params.set_field_order(self.field_order);
                params.set_color_range(self.color_range);
                params.set_color_primaries(self.color_primaries);
                params.set_color_trc(self.color_trc);
                params.set_color_space(self.colorspace);
                params.set_chroma_location(self.chroma_sample_location);
                params.set_sample_aspect_ratio(self.sample_aspect_ratio);
                params.set_video_delay(self.has_b_frames)?;
                params.set_framerate(self.framerate);
            }
            MediaType::AUDIO => {
                params.set_sample_format(self.sample_fmt);
                params.set_channel_layout(&self.ch_layout)?;
                params.set_channels(self.ch_layout.nb_channels())?;
                params.set_sample_rate(self.sample_rate)?;
                params.set_block_align(self.block_align)?;
                params.set_frame_size(self.frame_size)?;
                params.set_initial_padding(self.initial_padding)?;
                params.set_trailing_padding(self.trailing_padding)?;
                params.set_seek_preroll(self.seek_preroll)?;
            }
            MediaType::SUBTITLE => {
                params.set_width(self.width)?;
                params.set_height(self.height)?;
            }
            _ => {}
        }

        params.set_extradata(&self.extradata)?;
        Ok(())
    }

    fn import_parameters(&mut self, params: &CodecParameters) -> Result<(), ContextError> {
        self.codec_type = params.codec_type();
        self.codec_id = params.codec_id();
        self.codec_tag = params.codec_tag();
        self.bit_rate = params.bit_rate();
        self.bits_per_coded_sample = params.bits_per_coded_sample();
        self.bits_per_raw_sample = params.bits_per_raw_sample();
        self.profile = params.profile();
        self.level = params.level();

        match params.codec_type() {
            MediaType::VIDEO => {
                self.pix_fmt = params.pixel_format();
                self.width = params.width();
                self.height = params.height();
                self.field_order = params.field_order();
                self.color_range = params.color_range();
                self.color_primaries = params.color_primaries();
                self.color_trc = params.color_trc();
                self.colorspace = params.color_space();
                self.chroma_sample_location = params.chroma_location();
                self.sample_aspect_ratio = params.sample_aspect_ratio();
                self.has_b_frames = params.video_delay();
                self.framerate = params.framerate();
            }
            MediaType::AUDIO => {
                self.sample_fmt = params.sample_format();
                let layout = params.channel_layout()?;
                self.ch_layout = if layout.is_empty() && params.channels() > 0 {
                    // Only the legacy count is known.
                    ChannelLayout::unspecified(params.channels().unsigned_abs())
                } else {
                    layout
                };
                self.sample_rate = params.sample_rate();
                self.block_align = params.block_align();
                self.frame_size = params.frame_size();
                self.initial_padding = params.initial_padding();
                self.trailing_padding = params.trailing_padding();
                self.seek_preroll = params.seek_preroll();
            }
            MediaType::SUBTITLE => {
                self.width = params.width();
                self.height = params.height();
            }
            _ => {}
        }

        self.extradata = Vec::new();
        if let Some(data) = params.extradata() {
            let mut extradata = Vec::new();
            extradata
                .try_reserve_exact(data.len())
                .map_err(|_| ContextError::Allocation { size: data.len() })?;
            extradata.extend_from_slice(data);
            self.extradata = extradata;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::channel_layout::{Channel, CustomChannel};
    use crate::utils::alloc::TrackingAllocator;
    use crate::utils::errors::ParametersError;

    fn video_context() -> BasicCodecContext {
        BasicCodecContext {
            codec_type: MediaType::VIDEO,
            codec_id: CodecId::H264,
            codec_tag: CodecTag::from_fourcc(*b"avc1"),
            bit_rate: 8_000_000,
            profile: Profile::from_raw(100),
            level: Level::from_raw(41),
            extradata: vec![0x67, 0x64, 0x00, 0x29],
            time_base: Rational::new(1, 90_000),
            width: 1920,
            height: 1080,
            pix_fmt: PixelFormat::YUV420P,
            sample_aspect_ratio: Rational::new(1, 1),
            framerate: Rational::new(30_000, 1001),
            field_order: FieldOrder::PROGRESSIVE,
            color_range: ColorRange::MPEG,
            color_primaries: ColorPrimaries::BT709,
            color_trc: ColorTransferCharacteristic::BT709,
            colorspace: ColorSpace::BT709,
            chroma_sample_location: ChromaLocation::LEFT,
            has_b_frames: 2,
            ..Default::default()
        }
    }

    #[test]
    fn video_round_trip() {
        let ctx = video_context();
        let params = CodecParameters::try_from_context(&ctx).unwrap();

        assert_eq!(params.width(), 1920);
        assert_eq!(params.pixel_format(), PixelFormat::YUV420P);
        assert_eq!(params.video_delay(), 2);
        assert_eq!(params.color_space(), ColorSpace::BT709);
        assert_eq!(params.extradata(), Some(&ctx.extradata[..]));
        assert_ne!(params.extradata().unwrap().as_ptr(), ctx.extradata.as_ptr());

        let mut other = BasicCodecContext::default();
        params.to_context(&mut other).unwrap();
        assert_eq!(other.width, 1920);
        assert_eq!(other.height, 1080);
        assert_eq!(other.framerate, Rational::new(30_000, 1001));
        assert_eq!(other.codec_tag, ctx.codec_tag);
        assert_eq!(other.extradata, ctx.extradata);
        // Context-only state is left alone.
        assert_eq!(other.time_base, Rational::new(0, 1));
        assert_eq!(other.sample_fmt, SampleFormat::NONE);
    }

    #[test]
    fn audio_layout_is_deep_copied() {
        let layout = ChannelLayout::custom(&[
            CustomChannel::new(Channel::FR),
            CustomChannel::new(Channel::FL),
        ])
        .unwrap();
        let mut ctx = BasicCodecContext {
            codec_type: MediaType::AUDIO,
            codec_id: CodecId::AAC,
            sample_fmt: SampleFormat::FLTP,
            sample_rate: 48_000,
            frame_size: 1024,
            initial_padding: 1024,
            ch_layout: layout,
            ..Default::default()
        };

        let params = CodecParameters::try_from_context(&ctx).unwrap();
        assert_eq!(params.sample_format(), SampleFormat::FLTP);
        assert_eq!(params.channels(), 2);
        assert_eq!(params.width(), 0);

        ctx.ch_layout.set_channel(0, Channel::FC).unwrap();
        assert_eq!(params.channel_layout().unwrap().channel(0), Some(Channel::FR));

        let mut other = BasicCodecContext::default();
        params.to_context(&mut other).unwrap();
        assert_eq!(other.ch_layout.channel(0), Some(Channel::FR));
        assert_eq!(other.sample_rate, 48_000);
        assert_eq!(other.pix_fmt, PixelFormat::NONE);
    }

    #[test]
    fn legacy_channel_count_fills_missing_layout() {
        let mut params = CodecParameters::new();
        params.set_codec_type(MediaType::AUDIO);
        params.set_channels(6).unwrap();

        let mut ctx = BasicCodecContext::default();
        params.to_context(&mut ctx).unwrap();
        assert_eq!(ctx.ch_layout, ChannelLayout::unspecified(6));
    }

    #[test]
    fn from_context_resets_first() {
        let mut params = CodecParameters::new();
        params.set_sample_rate(44_100).unwrap();
        params.set_extradata(b"stale").unwrap();

        let ctx = BasicCodecContext {
            codec_type: MediaType::SUBTITLE,
            width: 720,
            height: 576,
            ..Default::default()
        };
        params.from_context(&ctx).unwrap();

        assert_eq!(params.sample_rate(), 0);
        assert_eq!(params.extradata(), None);
        assert_eq!(params.width(), 720);
    }

    #[test]
    fn export_reports_allocation_failure() {
        let tracker = TrackingAllocator::new();
        let mut params = CodecParameters::with_allocator(tracker.clone());
        tracker.fail_next(1);

        let err = params.from_context(&video_context()).unwrap_err();
        assert!(matches!(
            err,
            ContextError::Parameters(ParametersError::Allocation(_))
        ));
        assert_eq!(params.extradata(), None);
    }
}
