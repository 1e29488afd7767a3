//! Serializable form of a codec parameter record.
//!
//! Enumerated fields are written by name when the value is well known and
//! as a raw integer otherwise; both forms are accepted on input.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use codecpar::structs::channel_layout::ChannelLayout;
use codecpar::structs::parameters::CodecParameters;
use codecpar::structs::values::{
    ChromaLocation, CodecId, CodecTag, ColorPrimaries, ColorRange, ColorSpace,
    ColorTransferCharacteristic, FieldOrder, Level, MediaType, NamedValue, PixelFormat, Profile,
    Rational, RawValue, SampleFormat,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Raw(i64),
    Name(String),
}

fn named<T>(value: T) -> FieldValue
where
    T: RawValue + NamedValue,
    T::Raw: Into<i64>,
{
    match value.name() {
        Some(name) => FieldValue::Name(name.to_string()),
        None => FieldValue::Raw(value.into_raw().into()),
    }
}

fn resolve<T>(field: &str, value: &FieldValue) -> Result<T>
where
    T: RawValue + NamedValue,
    T::Raw: TryFrom<i64>,
{
    match value {
        FieldValue::Raw(raw) => <T::Raw as TryFrom<i64>>::try_from(*raw)
            .map(T::from_raw)
            .map_err(|_| anyhow!("{field}: {raw} is out of range")),
        FieldValue::Name(name) => {
            T::from_name(name).ok_or_else(|| anyhow!("{field}: unknown value \"{name}\""))
        }
    }
}

fn codec_tag_value(tag: CodecTag) -> FieldValue {
    let fourcc = tag.fourcc();
    if tag.into_raw() != 0 && fourcc.iter().all(|b| b.is_ascii_alphanumeric() || *b == b' ') {
        FieldValue::Name(fourcc.iter().map(|&b| b as char).collect())
    } else {
        FieldValue::Raw(tag.into_raw().into())
    }
}

fn resolve_codec_tag(value: &FieldValue) -> Result<CodecTag> {
    match value {
        FieldValue::Raw(raw) => u32::try_from(*raw)
            .map(CodecTag::from_raw)
            .map_err(|_| anyhow!("codec_tag: {raw} is out of range")),
        FieldValue::Name(name) => {
            let fourcc: [u8; 4] = name
                .as_bytes()
                .try_into()
                .map_err(|_| anyhow!("codec_tag: \"{name}\" is not a FourCC"))?;
            Ok(CodecTag::from_fourcc(fourcc))
        }
    }
}

fn parse_rational(field: &str, text: &str) -> Result<Rational> {
    text.parse()
        .with_context(|| format!("{field}: \"{text}\" is not a rational"))
}

/// Snapshot of every field of a [`CodecParameters`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub codec_type: FieldValue,
    pub codec_id: FieldValue,
    pub codec_tag: FieldValue,
    /// Pixel format for video, sample format for audio.
    pub format: FieldValue,
    pub bit_rate: i64,
    pub bits_per_coded_sample: i64,
    pub bits_per_raw_sample: i64,
    pub profile: FieldValue,
    pub level: FieldValue,

    pub width: i64,
    pub height: i64,
    pub sample_aspect_ratio: String,
    pub framerate: String,
    pub field_order: FieldValue,
    pub color_range: FieldValue,
    pub color_primaries: FieldValue,
    pub color_trc: FieldValue,
    pub color_space: FieldValue,
    pub chroma_location: FieldValue,
    pub video_delay: i64,

    pub channel_layout: Option<String>,
    pub channels: i64,
    pub sample_rate: i64,
    pub block_align: i64,
    pub frame_size: i64,
    pub initial_padding: i64,
    pub trailing_padding: i64,
    pub seek_preroll: i64,

    /// Hex encoded, without padding.
    pub extradata: Option<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::scalars(&CodecParameters::new())
    }
}

impl Snapshot {
    fn scalars(params: &CodecParameters) -> Self {
        let format = match params.codec_type() {
            MediaType::AUDIO => named(params.sample_format()),
            MediaType::VIDEO => named(params.pixel_format()),
            _ => FieldValue::Raw(params.format().into()),
        };

        Self {
            codec_type: named(params.codec_type()),
            codec_id: named(params.codec_id()),
            codec_tag: codec_tag_value(params.codec_tag()),
            format,
            bit_rate: params.bit_rate(),
            bits_per_coded_sample: params.bits_per_coded_sample().into(),
            bits_per_raw_sample: params.bits_per_raw_sample().into(),
            profile: named(params.profile()),
            level: named(params.level()),
            width: params.width().into(),
            height: params.height().into(),
            sample_aspect_ratio: params.sample_aspect_ratio().to_string(),
            framerate: params.framerate().to_string(),
            field_order: named(params.field_order()),
            color_range: named(params.color_range()),
            color_primaries: named(params.color_primaries()),
            color_trc: named(params.color_trc()),
            color_space: named(params.color_space()),
            chroma_location: named(params.chroma_location()),
            video_delay: params.video_delay().into(),
            channel_layout: None,
            channels: params.channels().into(),
            sample_rate: params.sample_rate().into(),
            block_align: params.block_align().into(),
            frame_size: params.frame_size().into(),
            initial_padding: params.initial_padding().into(),
            trailing_padding: params.trailing_padding().into(),
            seek_preroll: params.seek_preroll().into(),
            extradata: params.extradata().map(hex::encode),
        }
    }

    pub fn from_parameters(params: &CodecParameters) -> Result<Self> {
        let layout = params.channel_layout()?;
        Ok(Self {
            channel_layout: (!layout.is_empty()).then(|| layout.to_string()),
            ..Self::scalars(params)
        })
    }

    pub fn to_parameters(&self) -> Result<CodecParameters> {
        let mut params = CodecParameters::new();

        let codec_type: MediaType = resolve("codec_type", &self.codec_type)?;
        params.set_codec_type(codec_type);
        params.set_codec_id(resolve::<CodecId>("codec_id", &self.codec_id)?);
        params.set_codec_tag(resolve_codec_tag(&self.codec_tag)?);
        match codec_type {
            MediaType::AUDIO => {
                params.set_sample_format(resolve::<SampleFormat>("format", &self.format)?)
            }
            _ => params.set_pixel_format(resolve::<PixelFormat>("format", &self.format)?),
        }
        params.set_bit_rate(self.bit_rate);
        params.set_bits_per_coded_sample(self.bits_per_coded_sample)?;
        params.set_bits_per_raw_sample(self.bits_per_raw_sample)?;
        params.set_profile(resolve::<Profile>("profile", &self.profile)?);
        params.set_level(resolve::<Level>("level", &self.level)?);

        params.set_width(self.width)?;
        params.set_height(self.height)?;
        params.set_sample_aspect_ratio(parse_rational(
            "sample_aspect_ratio",
            &self.sample_aspect_ratio,
        )?);
        params.set_framerate(parse_rational("framerate", &self.framerate)?);
        params.set_field_order(resolve::<FieldOrder>("field_order", &self.field_order)?);
        params.set_color_range(resolve::<ColorRange>("color_range", &self.color_range)?);
        params.set_color_primaries(resolve::<ColorPrimaries>(
            "color_primaries",
            &self.color_primaries,
        )?);
        params.set_color_trc(resolve::<ColorTransferCharacteristic>(
            "color_trc",
            &self.color_trc,
        )?);
        params.set_color_space(resolve::<ColorSpace>("color_space", &self.color_space)?);
        params.set_chroma_location(resolve::<ChromaLocation>(
            "chroma_location",
            &self.chroma_location,
        )?);
        params.set_video_delay(self.video_delay)?;

        if let Some(text) = &self.channel_layout {
            let layout: ChannelLayout = text.parse()?;
            params.set_channel_layout(&layout)?;
        }
        params.set_channels(self.channels)?;
        params.set_sample_rate(self.sample_rate)?;
        params.set_block_align(self.block_align)?;
        params.set_frame_size(self.frame_size)?;
        params.set_initial_padding(self.initial_padding)?;
        params.set_trailing_padding(self.trailing_padding)?;
        params.set_seek_preroll(self.seek_preroll)?;

        if let Some(text) = &self.extradata {
            let data = hex::decode(text.trim()).context("extradata is not valid hex")?;
            params.set_extradata(&data)?;
        }

        Ok(params)
    }

    /// Parses YAML, or JSON.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_yaml_ng::from_slice(data)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO: &str = "
codec_type: video
codec_id: h264
codec_tag: avc1
format: yuv420p
width: 1920
height: 1080
sample_aspect_ratio: 1/1
framerate: 30000/1001
color_range: tv
profile: 100
extradata: 6742001f
";

    #[test]
    fn parses_named_and_raw_values() {
        let snapshot = Snapshot::from_slice(VIDEO.as_bytes()).unwrap();
        let params = snapshot.to_parameters().unwrap();

        assert_eq!(params.codec_type(), MediaType::VIDEO);
        assert_eq!(params.codec_id(), CodecId::H264);
        assert_eq!(params.codec_tag(), CodecTag::from_fourcc(*b"avc1"));
        assert_eq!(params.pixel_format(), PixelFormat::YUV420P);
        assert_eq!(params.profile().into_raw(), 100);
        assert_eq!(params.level(), Level::UNKNOWN);
        assert_eq!(params.color_range(), ColorRange::MPEG);
        assert_eq!(params.framerate(), Rational::new(30_000, 1001));
        assert_eq!(params.extradata(), Some(&[0x67, 0x42, 0x00, 0x1F][..]));
    }

    #[test]
    fn round_trips_through_yaml() {
        let params = Snapshot::from_slice(VIDEO.as_bytes())
            .unwrap()
            .to_parameters()
            .unwrap();
        let yaml = Snapshot::from_parameters(&params).unwrap().to_yaml().unwrap();
        let again = Snapshot::from_slice(yaml.as_bytes())
            .unwrap()
            .to_parameters()
            .unwrap();
        assert_eq!(again, params);
    }

    #[test]
    fn audio_format_and_layout() {
        let json = r#"{"codec_type": "audio", "codec_id": "aac", "format": "fltp",
            "sample_rate": 48000, "channel_layout": "5.1(side)"}"#;
        let params = Snapshot::from_slice(json.as_bytes())
            .unwrap()
            .to_parameters()
            .unwrap();

        assert_eq!(params.sample_format(), SampleFormat::FLTP);
        assert_eq!(params.channel_layout().unwrap().to_string(), "5.1(side)");

        let snapshot = Snapshot::from_parameters(&params).unwrap();
        assert_eq!(snapshot.format, FieldValue::Name("fltp".to_string()));
        assert_eq!(snapshot.channel_layout.as_deref(), Some("5.1(side)"));
    }

    #[test]
    fn rejects_bad_fields() {
        let cases = [
            "width: 4294967296",
            "codec_id: nonsense",
            "codec_tag: toolong",
            "extradata: xyz",
            "channel_layout: FL+??",
            "framerate: fast",
        ];
        for case in cases {
            let snapshot = Snapshot::from_slice(case.as_bytes()).unwrap();
            assert!(snapshot.to_parameters().is_err(), "accepted {case}");
        }
    }

    #[test]
    fn default_snapshot_matches_new_record() {
        let params = Snapshot::default().to_parameters().unwrap();
        assert_eq!(params, CodecParameters::new());
    }
}
