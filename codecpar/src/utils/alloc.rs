//! Allocator seam for the native buffers owned by codec parameters.
//!
//! Extra data and custom channel maps are allocated through a
//! [`BufferAllocator`] rather than through `Vec`, so the exact capacity
//! (payload plus padding) is under our control and tests can observe or
//! sabotage every allocation with a [`TrackingAllocator`].

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Source of zero-filled native memory.
///
/// # Safety
///
/// `allocate_zeroed` must return either `None` or a block that is valid for
/// `layout` and entirely zero-filled. `deallocate` must accept every block
/// previously returned by the same allocator with the same layout.
pub unsafe trait BufferAllocator: Send + Sync + fmt::Debug {
    /// Allocates a zero-filled block. `layout` never has a zero size.
    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Returns a block to the allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`allocate_zeroed`](Self::allocate_zeroed)
    /// on this allocator with the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

pub type SharedAllocator = Arc<dyn BufferAllocator>;

/// Process-wide handle to [`SystemAllocator`].
pub fn system_allocator() -> SharedAllocator {
    static SYSTEM: OnceLock<SharedAllocator> = OnceLock::new();
    Arc::clone(SYSTEM.get_or_init(|| Arc::new(SystemAllocator)))
}

/// Forwards to the global Rust allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

unsafe impl BufferAllocator for SystemAllocator {
    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() != 0);
        // SAFETY: the trait contract rules out zero-sized layouts.
        NonNull::new(unsafe { alloc::alloc_zeroed(layout) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded caller contract.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

#[derive(Debug, Default)]
struct FailurePlan {
    skip: usize,
    remaining: usize,
}

/// Instrumented allocator that counts allocations and can inject failures.
///
/// Counters are atomic, so one tracker can be shared between records that
/// live on different threads.
#[derive(Debug, Default)]
pub struct TrackingAllocator {
    live_allocations: AtomicUsize,
    total_allocations: AtomicUsize,
    failed_allocations: AtomicUsize,
    live_bytes: AtomicUsize,
    plan: Mutex<FailurePlan>,
}

impl TrackingAllocator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes the next `count` allocations fail.
    pub fn fail_next(&self, count: usize) {
        self.fail_after(0, count);
    }

    /// Lets `skip` allocations succeed, then fails the following `count`.
    pub fn fail_after(&self, skip: usize, count: usize) {
        let mut plan = self.plan.lock().unwrap_or_else(PoisonError::into_inner);
        plan.skip = skip;
        plan.remaining = count;
    }

    /// Number of blocks handed out and not yet returned.
    pub fn live_allocations(&self) -> usize {
        self.live_allocations.load(Ordering::SeqCst)
    }

    /// Number of successful allocations since creation.
    pub fn total_allocations(&self) -> usize {
        self.total_allocations.load(Ordering::SeqCst)
    }

    pub fn failed_allocations(&self) -> usize {
        self.failed_allocations.load(Ordering::SeqCst)
    }

    /// Bytes currently held by live blocks, padding included.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::SeqCst)
    }

    fn should_fail(&self) -> bool {
        let mut plan = self.plan.lock().unwrap_or_else(PoisonError::into_inner);
        if plan.remaining == 0 {
            return false;
        }
        if plan.skip > 0 {
            plan.skip -= 1;
            return false;
        }
        plan.remaining -= 1;
        true
    }
}

unsafe impl BufferAllocator for TrackingAllocator {
    fn allocate_zeroed(&self, layout: Layout) -> Option<NonNull<u8>> {
        if self.should_fail() {
            self.failed_allocations.fetch_add(1, Ordering::SeqCst);
            return None;
        }

        let ptr = SystemAllocator.allocate_zeroed(layout)?;
        self.live_allocations.fetch_add(1, Ordering::SeqCst);
        self.total_allocations.fetch_add(1, Ordering::SeqCst);
        self.live_bytes.fetch_add(layout.size(), Ordering::SeqCst);
        Some(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.live_allocations.fetch_sub(1, Ordering::SeqCst);
        self.live_bytes.fetch_sub(layout.size(), Ordering::SeqCst);
        // SAFETY: every block we hand out comes from SystemAllocator.
        unsafe { SystemAllocator.deallocate(ptr, layout) }
    }
}
