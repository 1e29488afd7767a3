//! Conversion between parameter records and codec contexts.
//!
//! A context is whatever encoder or decoder state a caller owns. The
//! [`context::CodecContext`] trait moves the stream description into and out
//! of such state; [`context::BasicCodecContext`] is an in-memory
//! implementation.

pub mod context;
