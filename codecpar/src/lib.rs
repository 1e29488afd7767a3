#![doc = include_str!("../README.md")]
//!
//! ## Ownership Model
//!
//! A record owns at most two native buffers: the padded extra data and the
//! custom channel map of its layout. Each buffer has a single owner and is
//! returned to its allocator exactly once, when the owner is dropped.
//!
//! - Reading the channel layout returns a clone; writing it stores a clone.
//! - [`structs::parameters::CodecParameters::copy_to`] allocates fresh buffers for the
//!   destination, so the two records never share storage.
//! - [`structs::parameters::CodecParameters::release`] consumes the record, making any
//!   later use a compile error. Records kept behind integer handles can use
//!   [`utils::pool::ParametersPool`], which reports stale handles at run time.
//!
//! ## Allocation
//!
//! Native buffers are obtained through [`utils::alloc::BufferAllocator`].
//! The default forwards to the global allocator;
//! [`utils::alloc::TrackingAllocator`] counts allocations and can be told
//! to fail, which is how the exactly-once release and the failure paths are
//! tested.

/// Conversion between parameter records and codec contexts.
///
/// - **Context trait** ([`process::context::CodecContext`]): export/import of
///   a stream description
/// - **Reference context** ([`process::context::BasicCodecContext`])
pub mod process;

/// Data structures describing an encoded stream.
///
/// - **Parameter record** ([`structs::parameters`])
/// - **Channel layouts** ([`structs::channel_layout`])
/// - **Enumerated values** ([`structs::values`]): codec ids, formats, color
///   metadata
pub mod structs;

/// Supporting infrastructure.
///
/// - **Allocators** ([`utils::alloc`]): native memory seam
/// - **Buffers** ([`utils::buffer`]): padded, exclusively owned storage
/// - **Handle pool** ([`utils::pool`]): generation-checked record storage
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
