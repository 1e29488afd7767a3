//! Audio channel layouts.
//!
//! A layout is either a bit mask over the native channel order, an ambisonic
//! layout (optionally followed by masked non-diegetic channels), an
//! unspecified channel count, or a custom per-channel map. Only the custom
//! map owns native storage; it is never shared between two layouts, and
//! [`ChannelLayout::try_clone`] is the only way to duplicate one.

use std::fmt::{self, Display};
use std::str::FromStr;

use codecpar_macros::{RawValue, named_values};
use log::trace;

use crate::structs::values::NamedValue;
use crate::utils::alloc::{SharedAllocator, system_allocator};
use crate::utils::buffer::NativeBuffer;
use crate::utils::errors::{AllocError, ChannelLayoutError};

/// A single speaker position or channel role.
#[named_values(
    keep_case,
    no_display,
    NONE = -1,
    FL = 0,
    FR = 1,
    FC = 2,
    LFE = 3,
    BL = 4,
    BR = 5,
    FLC = 6,
    FRC = 7,
    BC = 8,
    SL = 9,
    SR = 10,
    TC = 11,
    TFL = 12,
    TFC = 13,
    TFR = 14,
    TBL = 15,
    TBC = 16,
    TBR = 17,
    DL = 29,
    DR = 30,
    WL = 31,
    WR = 32,
    SDL = 33,
    SDR = 34,
    LFE2 = 35,
    TSL = 36,
    TSR = 37,
    BFC = 38,
    BFL = 39,
    BFR = 40,
    UNUSED = 0x200,
    UNKNOWN = 0x300
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, RawValue)]
pub struct Channel(i32);

impl Channel {
    /// First ambisonic component (ACN 0).
    pub const AMBISONIC_BASE: Self = Self(0x400);
    pub const AMBISONIC_END: Self = Self(0x7FF);

    pub const fn ambisonic(acn: u16) -> Option<Self> {
        let id = Self::AMBISONIC_BASE.0 + acn as i32;
        if id <= Self::AMBISONIC_END.0 {
            Some(Self(id))
        } else {
            None
        }
    }

    pub const fn is_ambisonic(self) -> bool {
        self.0 >= Self::AMBISONIC_BASE.0 && self.0 <= Self::AMBISONIC_END.0
    }

    /// Bit of this channel in a native-order mask.
    pub const fn mask_bit(self) -> Option<u64> {
        if self.0 >= 0 && self.0 < 64 {
            Some(1 << self.0)
        } else {
            None
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        if let Some(ch) = Self::from_name(label) {
            return Some(ch);
        }
        if let Some(acn) = label.strip_prefix("AMBI") {
            return acn.parse().ok().and_then(Self::ambisonic);
        }
        label.strip_prefix("USR").and_then(|id| id.parse().ok()).map(Self)
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ambisonic() {
            return write!(f, "AMBI{}", self.0 - Self::AMBISONIC_BASE.0);
        }
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "USR{}", self.0),
        }
    }
}

const fn bits(channels: &[Channel]) -> u64 {
    let mut mask = 0;
    let mut i = 0;
    while i < channels.len() {
        mask |= 1 << channels[i].0;
        i += 1;
    }
    mask
}

const STEREO: u64 = bits(&[Channel::FL, Channel::FR]);
const SURROUND: u64 = STEREO | bits(&[Channel::FC]);
const FIVE_POINT_ZERO_SIDE: u64 = SURROUND | bits(&[Channel::SL, Channel::SR]);
const FIVE_POINT_ZERO_BACK: u64 = SURROUND | bits(&[Channel::BL, Channel::BR]);

/// Named native layouts. For a given channel count the first entry is the
/// default layout.
const STANDARD_LAYOUTS: &[(&str, u64)] = &[
    ("mono", bits(&[Channel::FC])),
    ("stereo", STEREO),
    ("2.1", STEREO | bits(&[Channel::LFE])),
    ("3.0", SURROUND),
    ("3.0(back)", STEREO | bits(&[Channel::BC])),
    ("4.0", SURROUND | bits(&[Channel::BC])),
    ("quad", STEREO | bits(&[Channel::BL, Channel::BR])),
    ("quad(side)", STEREO | bits(&[Channel::SL, Channel::SR])),
    ("3.1", SURROUND | bits(&[Channel::LFE])),
    ("5.0", FIVE_POINT_ZERO_BACK),
    ("5.0(side)", FIVE_POINT_ZERO_SIDE),
    ("4.1", SURROUND | bits(&[Channel::LFE, Channel::BC])),
    ("5.1", FIVE_POINT_ZERO_BACK | bits(&[Channel::LFE])),
    ("5.1(side)", FIVE_POINT_ZERO_SIDE | bits(&[Channel::LFE])),
    ("6.0", FIVE_POINT_ZERO_SIDE | bits(&[Channel::BC])),
    (
        "6.1",
        FIVE_POINT_ZERO_SIDE | bits(&[Channel::LFE, Channel::BC]),
    ),
    ("7.0", FIVE_POINT_ZERO_SIDE | bits(&[Channel::BL, Channel::BR])),
    (
        "7.1",
        FIVE_POINT_ZERO_SIDE | bits(&[Channel::LFE, Channel::BL, Channel::BR]),
    ),
];

fn standard_name(mask: u64) -> Option<&'static str> {
    STANDARD_LAYOUTS
        .iter()
        .find(|&&(_, m)| m == mask)
        .map(|&(name, _)| name)
}

fn nth_set_bit(mask: u64, n: usize) -> Option<Channel> {
    (0..64)
        .filter(|bit| mask & (1 << bit) != 0)
        .nth(n)
        .map(Channel)
}

const RESERVED_NAME_CHARS: [char; 4] = ['+', '@', '(', ')'];

/// One entry of a custom channel map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CustomChannel {
    pub id: Channel,
    name: [u8; 16],
}

impl CustomChannel {
    pub const fn new(id: Channel) -> Self {
        Self { id, name: [0; 16] }
    }

    pub fn with_name(mut self, name: &str) -> Result<Self, ChannelLayoutError> {
        self.set_name(name)?;
        Ok(self)
    }

    /// Stores a free-form label, truncated to 15 bytes on a char boundary.
    ///
    /// Names may not contain the separators of the text form (`+`, `@`,
    /// `(` and `)`).
    pub fn set_name(&mut self, name: &str) -> Result<(), ChannelLayoutError> {
        if name.contains(RESERVED_NAME_CHARS) {
            return Err(ChannelLayoutError::InvalidName(name.to_string()));
        }

        let mut end = name.len().min(self.name.len() - 1);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        self.name = [0; 16];
        self.name[..end].copy_from_slice(&name.as_bytes()[..end]);
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name.len());
        if end == 0 {
            return None;
        }
        std::str::from_utf8(&self.name[..end]).ok()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    /// Only the channel count is known.
    #[default]
    Unspecified,
    /// Channels in native order, described by the mask.
    Native,
    /// Explicit per-channel map.
    Custom,
    /// Ambisonic components, followed by the masked channels.
    Ambisonic,
}

/// Description of the number and role of audio channels.
#[derive(Debug, Default)]
pub struct ChannelLayout {
    order: ChannelOrder,
    nb_channels: u32,
    mask: u64,
    map: Option<NativeBuffer<CustomChannel>>,
}

impl ChannelLayout {
    pub const MONO: Self = Self::native(bits(&[Channel::FC]));
    pub const STEREO: Self = Self::native(STEREO);
    pub const SURROUND_5_1: Self = Self::native(FIVE_POINT_ZERO_BACK | bits(&[Channel::LFE]));
    pub const SURROUND_7_1: Self =
        Self::native(FIVE_POINT_ZERO_SIDE | bits(&[Channel::LFE, Channel::BL, Channel::BR]));

    const fn native(mask: u64) -> Self {
        Self {
            order: ChannelOrder::Native,
            nb_channels: mask.count_ones(),
            mask,
            map: None,
        }
    }

    /// A layout that only knows its channel count.
    pub const fn unspecified(nb_channels: u32) -> Self {
        Self {
            order: ChannelOrder::Unspecified,
            nb_channels,
            mask: 0,
            map: None,
        }
    }

    /// Native layout of the channels in `mask`. An empty mask gives an
    /// empty unspecified layout.
    pub const fn from_mask(mask: u64) -> Self {
        if mask == 0 {
            Self::unspecified(0)
        } else {
            Self::native(mask)
        }
    }

    /// The standard layout for `nb_channels`, or an unspecified layout when
    /// there is none.
    pub fn default_for_channels(nb_channels: u32) -> Self {
        STANDARD_LAYOUTS
            .iter()
            .find(|&&(_, mask)| mask.count_ones() == nb_channels)
            .map(|&(_, mask)| Self::native(mask))
            .unwrap_or_else(|| Self::unspecified(nb_channels))
    }

    /// Ambisonic layout of the given order, followed by the channels of
    /// `extra_mask` in native order.
    pub fn ambisonic(order: u32, extra_mask: u64) -> Result<Self, ChannelLayoutError> {
        let components = u64::from(order)
            .checked_add(1)
            .and_then(|n| n.checked_pow(2))
            .unwrap_or(u64::MAX);
        let max = (Channel::AMBISONIC_END.0 - Channel::AMBISONIC_BASE.0 + 1) as u64;
        if components > max {
            return Err(ChannelLayoutError::TooManyChannels(components));
        }

        Ok(Self {
            order: ChannelOrder::Ambisonic,
            nb_channels: components as u32 + extra_mask.count_ones(),
            mask: extra_mask,
            map: None,
        })
    }

    /// Custom layout backed by the system allocator.
    pub fn custom(channels: &[CustomChannel]) -> Result<Self, ChannelLayoutError> {
        Self::custom_in(&system_allocator(), channels)
    }

    /// Custom layout whose channel map is allocated from `allocator`.
    pub fn custom_in(
        allocator: &SharedAllocator,
        channels: &[CustomChannel],
    ) -> Result<Self, ChannelLayoutError> {
        if channels.is_empty() {
            return Err(ChannelLayoutError::Empty);
        }
        let nb_channels = i32::try_from(channels.len())
            .map_err(|_| ChannelLayoutError::TooManyChannels(channels.len() as u64))?;

        let map = NativeBuffer::from_slice(allocator, channels, 0)?;

        Ok(Self {
            order: ChannelOrder::Custom,
            nb_channels: nb_channels as u32,
            mask: 0,
            map: Some(map),
        })
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn nb_channels(&self) -> u32 {
        self.nb_channels
    }

    /// Native-order mask. Zero for unspecified and custom layouts.
    pub fn mask(&self) -> u64 {
        self.mask
    }

    pub fn is_empty(&self) -> bool {
        self.nb_channels == 0
    }

    /// The custom channel map, if this is a custom layout.
    pub fn custom_channels(&self) -> Option<&[CustomChannel]> {
        self.map.as_ref().map(NativeBuffer::as_slice)
    }

    fn ambisonic_components(&self) -> usize {
        self.nb_channels.saturating_sub(self.mask.count_ones()) as usize
    }

    /// Channel at `index`, or `None` past the end or for unspecified layouts.
    pub fn channel(&self, index: usize) -> Option<Channel> {
        if index >= self.nb_channels as usize {
            return None;
        }

        match self.order {
            ChannelOrder::Unspecified => None,
            ChannelOrder::Native => nth_set_bit(self.mask, index),
            ChannelOrder::Custom => self.custom_channels()?.get(index).map(|c| c.id),
            ChannelOrder::Ambisonic => {
                let components = self.ambisonic_components();
                if index < components {
                    u16::try_from(index).ok().and_then(Channel::ambisonic)
                } else {
                    nth_set_bit(self.mask, index - components)
                }
            }
        }
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        (0..self.nb_channels as usize).map_while(|i| self.channel(i))
    }

    pub fn index_of(&self, channel: Channel) -> Option<usize> {
        self.channels().position(|c| c == channel)
    }

    /// Replaces the channel at `index` of a custom layout.
    pub fn set_channel(&mut self, index: usize, channel: Channel) -> Result<(), ChannelLayoutError> {
        self.custom_slot(index)?.id = channel;
        Ok(())
    }

    pub fn set_channel_name(&mut self, index: usize, name: &str) -> Result<(), ChannelLayoutError> {
        self.custom_slot(index)?.set_name(name)
    }

    fn custom_slot(&mut self, index: usize) -> Result<&mut CustomChannel, ChannelLayoutError> {
        let len = self.nb_channels as usize;
        let map = self.map.as_mut().ok_or(ChannelLayoutError::NotCustom)?;
        map.as_mut_slice()
            .get_mut(index)
            .ok_or(ChannelLayoutError::IndexOutOfRange { index, len })
    }

    /// Checks that the channel count agrees with the mask or map.
    pub fn is_valid(&self) -> bool {
        if self.nb_channels == 0 {
            return false;
        }

        match self.order {
            ChannelOrder::Unspecified => true,
            ChannelOrder::Native => self.mask.count_ones() == self.nb_channels,
            ChannelOrder::Custom => self.custom_channels().is_some_and(|map| {
                map.len() == self.nb_channels as usize
                    && map.iter().all(|c| c.id != Channel::UNUSED)
            }),
            ChannelOrder::Ambisonic => {
                let Some(components) = self.nb_channels.checked_sub(self.mask.count_ones()) else {
                    return false;
                };
                let root = components.isqrt();
                components > 0 && root * root == components
            }
        }
    }

    /// Deep copy. A custom map is copied into a new allocation from the
    /// same allocator.
    pub fn try_clone(&self) -> Result<Self, AllocError> {
        let map = self.map.as_ref().map(NativeBuffer::try_clone).transpose()?;
        Ok(self.with_map(map))
    }

    /// Deep copy whose custom map, if any, is allocated from `allocator`.
    pub fn try_clone_in(&self, allocator: &SharedAllocator) -> Result<Self, AllocError> {
        let map = self
            .map
            .as_ref()
            .map(|map| NativeBuffer::from_slice(allocator, map.as_slice(), 0))
            .transpose()?;
        Ok(self.with_map(map))
    }

    fn with_map(&self, map: Option<NativeBuffer<CustomChannel>>) -> Self {
        Self {
            order: self.order,
            nb_channels: self.nb_channels,
            mask: self.mask,
            map,
        }
    }

    /// Replaces `slot` with a deep copy of `self`. On failure `slot` is left
    /// untouched.
    pub fn copy_into(&self, slot: &mut ChannelLayout) -> Result<(), AllocError> {
        let copy = self.try_clone()?;
        Self::replace(slot, copy);
        Ok(())
    }

    /// Like [`copy_into`](Self::copy_into), with the custom map of the copy
    /// allocated from `allocator`.
    pub fn copy_into_in(
        &self,
        allocator: &SharedAllocator,
        slot: &mut ChannelLayout,
    ) -> Result<(), AllocError> {
        let copy = self.try_clone_in(allocator)?;
        Self::replace(slot, copy);
        Ok(())
    }

    fn replace(slot: &mut ChannelLayout, copy: ChannelLayout) {
        trace!("Copying channel layout {copy} over {slot}");
        *slot = copy;
    }

    fn from_channel_list(list: &str) -> Result<Self, ChannelLayoutError> {
        let mut channels = Vec::new();
        for part in list.split('+') {
            let (label, name) = match part.split_once('@') {
                Some((label, name)) => (label, Some(name)),
                None => (part, None),
            };
            let id = Channel::from_label(label.trim())
                .ok_or_else(|| ChannelLayoutError::Parse(list.to_string()))?;

            let mut channel = CustomChannel::new(id);
            if let Some(name) = name {
                channel.set_name(name)?;
            }
            channels.push(channel);
        }

        let mut mask = 0u64;
        let mut previous = -1;
        for channel in &channels {
            match channel.id.mask_bit() {
                Some(bit) if channel.id.0 > previous && channel.name().is_none() => {
                    mask |= bit;
                    previous = channel.id.0;
                }
                _ => return Self::custom(&channels),
            }
        }

        Ok(Self::native(mask))
    }

    fn write_channel_list(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.custom_channels() {
            Some(map) => {
                for (i, channel) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str("+")?;
                    }
                    write!(f, "{}", channel.id)?;
                    if let Some(name) = channel.name() {
                        write!(f, "@{name}")?;
                    }
                }
            }
            None => {
                for (i, channel) in self.channels().enumerate() {
                    if i > 0 {
                        f.write_str("+")?;
                    }
                    write!(f, "{channel}")?;
                }
            }
        }
        Ok(())
    }
}

impl PartialEq for ChannelLayout {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
            && self.nb_channels == other.nb_channels
            && self.mask == other.mask
            && self.custom_channels() == other.custom_channels()
    }
}

impl Eq for ChannelLayout {}

impl Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.order {
            ChannelOrder::Unspecified => write!(f, "{} channels", self.nb_channels),
            ChannelOrder::Native => match standard_name(self.mask) {
                Some(name) => f.write_str(name),
                None => {
                    write!(f, "{} channels (", self.nb_channels)?;
                    self.write_channel_list(f)?;
                    f.write_str(")")
                }
            },
            ChannelOrder::Custom => {
                write!(f, "{} channels (", self.nb_channels)?;
                self.write_channel_list(f)?;
                f.write_str(")")
            }
            ChannelOrder::Ambisonic => {
                let order = (self.ambisonic_components() as u32).isqrt().saturating_sub(1);
                write!(f, "ambisonic {order}")?;
                if self.mask != 0 {
                    f.write_str("+")?;
                    match standard_name(self.mask) {
                        Some(name) => f.write_str(name)?,
                        None => write!(f, "{}", Self::native(self.mask).to_channel_list())?,
                    }
                }
                Ok(())
            }
        }
    }
}

impl ChannelLayout {
    fn to_channel_list(&self) -> String {
        struct List<'a>(&'a ChannelLayout);

        impl Display for List<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.write_channel_list(f)
            }
        }

        List(self).to_string()
    }
}

impl FromStr for ChannelLayout {
    type Err = ChannelLayoutError;

    /// Parses standard names (`stereo`, `5.1(side)`), channel counts
    /// (`3 channels`, `6c`), masks (`0x3f`), ambisonic layouts
    /// (`ambisonic 1+stereo`) and channel lists (`FL+FR+LFE`,
    /// `2 channels (FR+FL@left)`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse_error = || ChannelLayoutError::Parse(s.to_string());

        if let Some(&(_, mask)) = STANDARD_LAYOUTS.iter().find(|&&(name, _)| name == s) {
            return Ok(Self::native(mask));
        }

        if let Some(rest) = s.strip_prefix("ambisonic ") {
            let (order, extra) = match rest.split_once('+') {
                Some((order, extra)) => (order, Some(extra)),
                None => (rest, None),
            };
            let order = order.trim().parse().map_err(|_| parse_error())?;
            let mask = match extra {
                Some(extra) => {
                    let extra: ChannelLayout = extra.parse()?;
                    if extra.order != ChannelOrder::Native {
                        return Err(parse_error());
                    }
                    extra.mask
                }
                None => 0,
            };
            return Self::ambisonic(order, mask);
        }

        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            let mask = u64::from_str_radix(hex, 16).map_err(|_| parse_error())?;
            if mask == 0 {
                return Err(parse_error());
            }
            return Ok(Self::native(mask));
        }

        if let Some(count) = s.strip_suffix('c') {
            if let Ok(count) = count.parse::<u32>() {
                if count == 0 {
                    return Err(parse_error());
                }
                return Ok(Self::default_for_channels(count));
            }
        }

        if let Some((count, rest)) = s.split_once(" channels") {
            let count: u32 = count.trim().parse().map_err(|_| parse_error())?;
            let rest = rest.trim();
            if rest.is_empty() {
                return Ok(Self::unspecified(count));
            }

            let list = rest
                .strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
                .ok_or_else(parse_error)?;
            let layout = Self::from_channel_list(list)?;
            if layout.nb_channels != count {
                return Err(parse_error());
            }
            return Ok(layout);
        }

        Self::from_channel_list(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::alloc::TrackingAllocator;

    #[test]
    fn standard_layouts() {
        assert_eq!(ChannelLayout::STEREO.nb_channels(), 2);
        assert_eq!(ChannelLayout::STEREO.to_string(), "stereo");
        assert_eq!(ChannelLayout::SURROUND_5_1.to_string(), "5.1");
        assert_eq!(ChannelLayout::SURROUND_5_1.mask(), 0x3F);
        assert_eq!(ChannelLayout::SURROUND_7_1.mask(), 0x63F);
        assert_eq!(ChannelLayout::default_for_channels(6), ChannelLayout::SURROUND_5_1);
        assert_eq!(ChannelLayout::default_for_channels(3).to_string(), "2.1");
        assert_eq!(ChannelLayout::default_for_channels(7).to_string(), "6.1");
        assert_eq!(
            ChannelLayout::default_for_channels(11),
            ChannelLayout::unspecified(11)
        );
    }

    #[test]
    fn native_channel_lookup() {
        let layout = ChannelLayout::SURROUND_5_1;
        let channels: Vec<_> = layout.channels().collect();
        assert_eq!(
            channels,
            [
                Channel::FL,
                Channel::FR,
                Channel::FC,
                Channel::LFE,
                Channel::BL,
                Channel::BR
            ]
        );
        assert_eq!(layout.index_of(Channel::LFE), Some(3));
        assert_eq!(layout.index_of(Channel::SL), None);
        assert_eq!(layout.channel(6), None);
        assert!(layout.is_valid());
        assert_eq!(ChannelLayout::unspecified(2).channel(0), None);
    }

    #[test]
    fn parse_and_display() {
        let cases = [
            ("stereo", "stereo"),
            ("5.1(side)", "5.1(side)"),
            ("0x3", "stereo"),
            ("6c", "5.1"),
            ("2 channels", "2 channels"),
            ("FL+FR+LFE", "2.1"),
            ("FL+FR+TC", "3 channels (FL+FR+TC)"),
            ("FR+FL", "2 channels (FR+FL)"),
            ("2 channels (FL@left+FR)", "2 channels (FL@left+FR)"),
            ("ambisonic 1", "ambisonic 1"),
            ("ambisonic 1+stereo", "ambisonic 1+stereo"),
            ("AMBI0+AMBI1+AMBI2+AMBI3", "4 channels (AMBI0+AMBI1+AMBI2+AMBI3)"),
        ];

        for (input, expected) in cases {
            let layout: ChannelLayout = input.parse().unwrap();
            assert_eq!(layout.to_string(), expected, "input {input}");
            let reparsed: ChannelLayout = expected.parse().unwrap();
            assert_eq!(reparsed, layout, "input {input}");
        }

        assert!("".parse::<ChannelLayout>().is_err());
        assert!("0x0".parse::<ChannelLayout>().is_err());
        assert!("FL+XX".parse::<ChannelLayout>().is_err());
        assert!("3 channels (FL+FR)".parse::<ChannelLayout>().is_err());
    }

    #[test]
    fn custom_layout_channels() {
        let mut layout = ChannelLayout::custom(&[
            CustomChannel::new(Channel::FR),
            CustomChannel::new(Channel::FL).with_name("left").unwrap(),
        ])
        .unwrap();

        assert_eq!(layout.order(), ChannelOrder::Custom);
        assert_eq!(layout.channel(1), Some(Channel::FL));
        assert_eq!(layout.custom_channels().unwrap()[1].name(), Some("left"));

        layout.set_channel(0, Channel::FC).unwrap();
        assert_eq!(layout.channel(0), Some(Channel::FC));
        assert_eq!(
            layout.set_channel(2, Channel::FC),
            Err(ChannelLayoutError::IndexOutOfRange { index: 2, len: 2 })
        );

        let mut stereo = ChannelLayout::STEREO;
        assert_eq!(
            stereo.set_channel(0, Channel::FC),
            Err(ChannelLayoutError::NotCustom)
        );
        assert_eq!(ChannelLayout::custom(&[]).unwrap_err(), ChannelLayoutError::Empty);
    }

    #[test]
    fn custom_names_are_truncated() {
        let channel = CustomChannel::new(Channel::FL)
            .with_name("a very long channel name")
            .unwrap();
        assert_eq!(channel.name(), Some("a very long cha"));

        let channel = CustomChannel::new(Channel::FL).with_name("ééééééééé").unwrap();
        assert_eq!(channel.name(), Some("ééééééé"));
    }

    #[test]
    fn names_with_separators_are_rejected() {
        for name in ["L+R", "a@b", "(x)"] {
            assert_eq!(
                CustomChannel::new(Channel::FL).with_name(name).unwrap_err(),
                ChannelLayoutError::InvalidName(name.to_string())
            );
        }

        let mut layout = ChannelLayout::custom(&[CustomChannel::new(Channel::FL)]).unwrap();
        assert!(layout.set_channel_name(0, "L+R").is_err());
        assert_eq!(layout.custom_channels().unwrap()[0].name(), None);
    }

    #[test]
    fn named_custom_layout_survives_text_form() {
        let layout = ChannelLayout::custom(&[
            CustomChannel::new(Channel::FR).with_name("right").unwrap(),
            CustomChannel::new(Channel::FL).with_name("left").unwrap(),
        ])
        .unwrap();

        let text = layout.to_string();
        assert_eq!(text, "2 channels (FR@right+FL@left)");
        assert_eq!(text.parse::<ChannelLayout>().unwrap(), layout);
    }

    #[test]
    fn empty_mask_is_unspecified() {
        let layout = ChannelLayout::from_mask(0);
        assert_eq!(layout, ChannelLayout::unspecified(0));
        assert_eq!(layout.to_string(), "0 channels");
        assert_eq!("0 channels".parse::<ChannelLayout>().unwrap(), layout);
        assert_eq!(ChannelLayout::from_mask(STEREO), ChannelLayout::STEREO);
    }

    #[test]
    fn clone_does_not_share_the_map() {
        let tracker = TrackingAllocator::new();
        let alloc: SharedAllocator = tracker.clone();

        let original =
            ChannelLayout::custom_in(&alloc, &[CustomChannel::new(Channel::FL)]).unwrap();
        let mut copy = original.try_clone().unwrap();
        assert_eq!(tracker.live_allocations(), 2);

        copy.set_channel(0, Channel::FR).unwrap();
        assert_eq!(original.channel(0), Some(Channel::FL));

        drop(original);
        assert_eq!(copy.channel(0), Some(Channel::FR));
        drop(copy);
        assert_eq!(tracker.live_allocations(), 0);
    }

    #[test]
    fn failed_copy_leaves_slot_untouched() {
        let tracker = TrackingAllocator::new();
        let alloc: SharedAllocator = tracker.clone();

        let source =
            ChannelLayout::custom_in(&alloc, &[CustomChannel::new(Channel::LFE)]).unwrap();
        let mut slot = ChannelLayout::SURROUND_5_1;

        tracker.fail_next(1);
        assert!(source.copy_into(&mut slot).is_err());
        assert_eq!(slot, ChannelLayout::SURROUND_5_1);

        source.copy_into(&mut slot).unwrap();
        assert_eq!(slot, source);
        assert_eq!(tracker.live_allocations(), 2);
    }

    #[test]
    fn copy_into_uses_the_given_allocator() {
        let source = ChannelLayout::custom(&[CustomChannel::new(Channel::LFE)]).unwrap();
        let tracker = TrackingAllocator::new();
        let alloc: SharedAllocator = tracker.clone();
        let mut slot = ChannelLayout::STEREO;

        tracker.fail_next(1);
        assert!(source.copy_into_in(&alloc, &mut slot).is_err());
        assert_eq!(slot, ChannelLayout::STEREO);

        source.copy_into_in(&alloc, &mut slot).unwrap();
        assert_eq!(slot, source);
        assert_eq!(tracker.live_allocations(), 1);
        drop(slot);
        assert_eq!(tracker.live_allocations(), 0);
    }

    #[test]
    fn validity() {
        assert!(!ChannelLayout::default().is_valid());
        assert!(ChannelLayout::unspecified(3).is_valid());
        assert!(ChannelLayout::ambisonic(2, 0).unwrap().is_valid());
        assert_eq!(ChannelLayout::ambisonic(2, STEREO).unwrap().nb_channels(), 11);
        assert!(ChannelLayout::ambisonic(32, 0).is_err());
        assert_eq!(
            ChannelLayout::ambisonic(u32::MAX, 0).unwrap_err(),
            ChannelLayoutError::TooManyChannels(u64::MAX)
        );
        assert!("ambisonic 4294967295".parse::<ChannelLayout>().is_err());

        let ambi = ChannelLayout::ambisonic(1, STEREO).unwrap();
        assert_eq!(ambi.channel(0), Channel::ambisonic(0));
        assert_eq!(ambi.channel(4), Some(Channel::FL));
        assert_eq!(ambi.channel(5), Some(Channel::FR));
    }
}
