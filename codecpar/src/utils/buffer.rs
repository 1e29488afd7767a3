//! Exclusively owned native buffers with an optional zeroed padding tail.

use std::alloc::Layout;
use std::fmt;
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;
use std::sync::Arc;

use log::{trace, warn};

use crate::utils::alloc::SharedAllocator;
use crate::utils::errors::AllocError;

/// Bytes of zeroed slack kept after extra data, so bitstream readers may
/// over-read by a bounded amount without leaving the allocation.
pub const INPUT_BUFFER_PADDING_SIZE: usize = 64;

/// A run of `len` elements followed by `padding` zero bytes, allocated from
/// a [`BufferAllocator`](crate::utils::alloc::BufferAllocator) and returned to
/// it exactly once on drop.
///
/// There is no `Clone`; [`try_clone`](Self::try_clone) always produces a new
/// allocation, so two buffers never share storage.
pub struct NativeBuffer<T: Copy> {
    ptr: NonNull<T>,
    len: usize,
    padding: usize,
    layout: Layout,
    allocator: SharedAllocator,
}

// SAFETY: the buffer exclusively owns its block; access follows normal borrow rules.
unsafe impl<T: Copy + Send> Send for NativeBuffer<T> {}
unsafe impl<T: Copy + Sync> Sync for NativeBuffer<T> {}

impl<T: Copy> NativeBuffer<T> {
    /// Allocates a fresh block and copies `data` into it.
    pub fn from_slice(
        allocator: &SharedAllocator,
        data: &[T],
        padding: usize,
    ) -> Result<Self, AllocError> {
        let layout = Self::layout_for(data.len(), padding)?;

        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            match allocator.allocate_zeroed(layout) {
                Some(ptr) => ptr.cast::<T>(),
                None => {
                    warn!("Native allocation of {} bytes failed", layout.size());
                    return Err(AllocError::Exhausted {
                        size: layout.size(),
                    });
                }
            }
        };

        // SAFETY: the block holds at least `data.len()` elements and is freshly
        // allocated, so it cannot overlap `data`.
        unsafe { ptr::copy_nonoverlapping(data.as_ptr(), ptr.as_ptr(), data.len()) };

        trace!(
            "Allocated native buffer: {} elements, {} padding bytes",
            data.len(),
            padding
        );

        Ok(Self {
            ptr,
            len: data.len(),
            padding,
            layout,
            allocator: Arc::clone(allocator),
        })
    }

    fn layout_for(len: usize, padding: usize) -> Result<Layout, AllocError> {
        let size = mem::size_of::<T>()
            .checked_mul(len)
            .and_then(|size| size.checked_add(padding))
            .ok_or(AllocError::CapacityOverflow { len })?;

        Layout::from_size_align(size, mem::align_of::<T>())
            .map_err(|_| AllocError::CapacityOverflow { len })
    }

    /// Deep copy into a new block from the same allocator.
    pub fn try_clone(&self) -> Result<Self, AllocError> {
        Self::from_slice(&self.allocator, self.as_slice(), self.padding)
    }

    /// Number of payload elements; padding is never counted.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Total size of the underlying block in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.layout.size()
    }

    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `ptr` is valid and initialized for `len` elements.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl NativeBuffer<u8> {
    /// Payload followed by the zeroed padding tail.
    pub fn padded(&self) -> &[u8] {
        // SAFETY: the block is `len + padding` bytes, all initialized (payload
        // copied in, padding zero-filled by the allocator).
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl<T: Copy> Drop for NativeBuffer<T> {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            trace!("Releasing native buffer of {} bytes", self.layout.size());
            // SAFETY: the block came from this allocator with this layout and
            // `drop` runs once.
            unsafe { self.allocator.deallocate(self.ptr.cast(), self.layout) };
        }
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for NativeBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBuffer")
            .field("data", &self.as_slice())
            .field("padding", &self.padding)
            .finish()
    }
}
