//! Supporting infrastructure.
//!
//! Provides the allocator seam, the padded native buffer type shared by
//! extra data and channel maps, the handle pool and the error types.

pub mod alloc;
pub mod buffer;
pub mod errors;
pub mod pool;
