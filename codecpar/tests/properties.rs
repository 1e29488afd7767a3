//! Ownership properties of codec parameter records, checked with an
//! instrumented allocator.

use std::sync::Arc;

use codecpar::structs::channel_layout::{Channel, ChannelLayout, CustomChannel};
use codecpar::structs::parameters::CodecParameters;
use codecpar::structs::values::{CodecId, MediaType, PixelFormat};
use codecpar::utils::alloc::{SharedAllocator, TrackingAllocator};
use codecpar::utils::buffer::INPUT_BUFFER_PADDING_SIZE;
use codecpar::utils::errors::ParametersError;
use proptest::prelude::*;

fn tracked() -> (Arc<TrackingAllocator>, CodecParameters) {
    let tracker = TrackingAllocator::new();
    let params = CodecParameters::with_allocator(tracker.clone());
    (tracker, params)
}

proptest! {
    #[test]
    fn extradata_round_trips(data in prop::collection::vec(any::<u8>(), 1..4096)) {
        let mut params = CodecParameters::new();
        params.set_extradata(&data).unwrap();

        prop_assert_eq!(params.extradata(), Some(&data[..]));
        prop_assert_eq!(params.extradata_size(), data.len());

        let padded = params.extradata_padded().unwrap();
        prop_assert_eq!(padded.len(), data.len() + INPUT_BUFFER_PADDING_SIZE);
        prop_assert!(padded[data.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn replacements_keep_one_live_buffer(
        sizes in prop::collection::vec(1usize..512, 1..16)
    ) {
        let (tracker, mut params) = tracked();
        for &size in &sizes {
            params.set_extradata(&vec![0xAB; size]).unwrap();
            prop_assert_eq!(tracker.live_allocations(), 1);
        }

        let last = *sizes.last().unwrap();
        prop_assert_eq!(tracker.live_bytes(), last + INPUT_BUFFER_PADDING_SIZE);
        drop(params);
        prop_assert_eq!(tracker.live_allocations(), 0);
    }
}

#[test]
fn empty_extradata_is_a_no_op() {
    let (tracker, mut params) = tracked();
    params.set_extradata(&[]).unwrap();
    assert_eq!(params.extradata(), None);
    assert_eq!(tracker.total_allocations(), 0);

    params.set_extradata(&[9, 9]).unwrap();
    params.set_extradata(&[]).unwrap();
    assert_eq!(params.extradata(), Some(&[9, 9][..]));
}

#[test]
fn second_set_frees_the_first_buffer() {
    let (tracker, mut params) = tracked();
    params.set_extradata(&[1, 2, 3]).unwrap();
    params.set_extradata(&[4, 5]).unwrap();

    assert_eq!(tracker.live_allocations(), 1);
    assert_eq!(tracker.total_allocations(), 2);
    assert_eq!(params.extradata(), Some(&[4, 5][..]));
}

#[test]
fn channel_layout_reads_are_independent() {
    let mut params = CodecParameters::new();
    let custom = ChannelLayout::custom(&[
        CustomChannel::new(Channel::FL),
        CustomChannel::new(Channel::FR),
        CustomChannel::new(Channel::LFE),
    ])
    .unwrap();
    params.set_channel_layout(&custom).unwrap();

    let mut read = params.channel_layout().unwrap();
    read.set_channel(2, Channel::FC).unwrap();
    read.set_channel_name(0, "left").unwrap();

    let again = params.channel_layout().unwrap();
    assert_eq!(again, custom);
    assert_eq!(again.channel(2), Some(Channel::LFE));
    assert_eq!(again.custom_channels().unwrap()[0].name(), None);
}

#[test]
fn copy_survives_dropping_the_source() {
    let tracker = TrackingAllocator::new();
    let alloc: SharedAllocator = tracker.clone();
    let mut src = CodecParameters::with_allocator(alloc.clone());
    src.set_extradata(b"prelude").unwrap();
    let layout = ChannelLayout::custom_in(&alloc, &[CustomChannel::new(Channel::FC)]).unwrap();
    src.set_channel_layout(&layout).unwrap();
    drop(layout);

    let copy = src.try_clone().unwrap();
    src.release();

    assert_eq!(copy.extradata(), Some(&b"prelude"[..]));
    assert_eq!(copy.channel_layout().unwrap().channel(0), Some(Channel::FC));

    drop(copy);
    assert_eq!(tracker.live_allocations(), 0);
}

#[test]
fn injected_failure_leaves_no_extradata() {
    let (tracker, mut params) = tracked();
    params.set_extradata(&[1; 32]).unwrap();

    tracker.fail_next(1);
    let err = params.set_extradata(&[2; 32]).unwrap_err();

    assert!(matches!(err, ParametersError::Allocation(_)));
    assert_eq!(params.extradata(), None);
    assert_eq!(params.extradata_size(), 0);
    assert_eq!(tracker.live_allocations(), 0);
    assert_eq!(tracker.failed_allocations(), 1);

    // The record stays usable.
    params.set_extradata(&[3; 4]).unwrap();
    assert_eq!(params.extradata(), Some(&[3; 4][..]));
}

#[test]
fn sps_prelude_round_trip() {
    let (tracker, mut params) = tracked();
    params.set_extradata(&[0x67, 0x42, 0x00, 0x1F]).unwrap();

    assert_eq!(params.extradata_size(), 4);
    assert_eq!(params.extradata(), Some(&[0x67, 0x42, 0x00, 0x1F][..]));

    params.release();
    assert_eq!(tracker.live_allocations(), 0);
}

#[test]
fn video_copy_is_unaffected_by_later_edits() {
    let mut src = CodecParameters::new();
    src.set_codec_type(MediaType::VIDEO);
    src.set_codec_id(CodecId::H264);
    src.set_pixel_format(PixelFormat::YUV420P);
    src.set_width(1920).unwrap();
    src.set_height(1080).unwrap();
    src.set_extradata(&[0x67, 0x42, 0x00, 0x1F]).unwrap();

    let mut dst = CodecParameters::new();
    src.copy_to(&mut dst).unwrap();

    src.set_width(3840).unwrap();
    src.set_height(2160).unwrap();
    src.set_extradata(&[0x68, 0xCE]).unwrap();

    assert_eq!(dst.width(), 1920);
    assert_eq!(dst.height(), 1080);
    assert_eq!(dst.codec_id(), CodecId::H264);
    assert_eq!(dst.extradata(), Some(&[0x67, 0x42, 0x00, 0x1F][..]));
}

#[test]
fn records_move_across_threads() {
    let mut params = CodecParameters::new();
    params.set_extradata(b"thread").unwrap();
    let copy = params.try_clone().unwrap();

    let handle = std::thread::spawn(move || {
        params.set_width(320).unwrap();
        params
    });
    let params = handle.join().unwrap();

    assert_eq!(params.width(), 320);
    assert_eq!(copy.width(), 0);
    assert_eq!(params.extradata(), copy.extradata());
}
