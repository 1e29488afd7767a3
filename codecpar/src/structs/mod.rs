//! Data structures describing an encoded stream.
//!
//! Contains the parameter record itself, the channel layout value it embeds
//! and the opaque enumerated values (codec ids, formats, color metadata)
//! carried by both.

pub mod channel_layout;
pub mod parameters;
pub mod values;
