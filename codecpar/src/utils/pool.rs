//! Generation-checked storage for parameter records.
//!
//! Code that has to refer to records through copyable identifiers (for
//! example a stream table indexed by an integer id) can keep them in a
//! [`ParametersPool`]. A released handle is detected and reported instead of
//! reaching a freed or reused record.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::structs::parameters::CodecParameters;
use crate::utils::alloc::{SharedAllocator, system_allocator};
use crate::utils::errors::PoolError;

/// Copyable reference to a record in a [`ParametersPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParametersHandle {
    index: u32,
    generation: u32,
}

impl ParametersHandle {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    params: Option<CodecParameters>,
}

#[derive(Debug)]
pub struct ParametersPool {
    slots: Vec<Slot>,
    free: VecDeque<u32>,
    allocator: SharedAllocator,
    live: usize,
}

impl ParametersPool {
    pub fn new() -> Self {
        Self::with_allocator(system_allocator())
    }

    /// A pool whose [`allocate`](Self::allocate) creates records backed by
    /// `allocator`.
    pub fn with_allocator(allocator: SharedAllocator) -> Self {
        Self {
            slots: Vec::new(),
            free: VecDeque::new(),
            allocator,
            live: 0,
        }
    }

    /// Stores a fresh record and returns its handle.
    pub fn allocate(&mut self) -> Result<ParametersHandle, PoolError> {
        let params = CodecParameters::with_allocator(self.allocator.clone());
        self.insert(params)
    }

    /// Takes ownership of `params` and returns its handle. Released slots
    /// are reused with a bumped generation.
    pub fn insert(&mut self, params: CodecParameters) -> Result<ParametersHandle, PoolError> {
        if let Some(index) = self.free.pop_front() {
            let slot = &mut self.slots[index as usize];
            slot.params = Some(params);
            self.live += 1;
            trace!("Reusing parameter slot {index} (generation {})", slot.generation);
            return Ok(ParametersHandle {
                index,
                generation: slot.generation,
            });
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| PoolError::Exhausted)?;
        self.slots.push(Slot {
            generation: 0,
            params: Some(params),
        });
        self.live += 1;
        trace!("Allocated parameter slot {index}");
        Ok(ParametersHandle {
            index,
            generation: 0,
        })
    }

    fn slot(&self, handle: ParametersHandle) -> Result<&Slot, PoolError> {
        let slot = self
            .slots
            .get(handle.index as usize)
            .ok_or(PoolError::InvalidHandle {
                index: handle.index,
            })?;
        if slot.generation != handle.generation || slot.params.is_none() {
            return Err(PoolError::UseAfterRelease {
                index: handle.index,
                generation: handle.generation,
            });
        }
        Ok(slot)
    }

    fn slot_mut(&mut self, handle: ParametersHandle) -> Result<&mut Slot, PoolError> {
        self.slot(handle)?;
        Ok(&mut self.slots[handle.index as usize])
    }

    pub fn get(&self, handle: ParametersHandle) -> Result<&CodecParameters, PoolError> {
        self.slot(handle)?
            .params
            .as_ref()
            .ok_or(PoolError::UseAfterRelease {
                index: handle.index,
                generation: handle.generation,
            })
    }

    pub fn get_mut(&mut self, handle: ParametersHandle) -> Result<&mut CodecParameters, PoolError> {
        self.slot_mut(handle)?
            .params
            .as_mut()
            .ok_or(PoolError::UseAfterRelease {
                index: handle.index,
                generation: handle.generation,
            })
    }

    /// Releases the record behind `handle`. Any later use of the handle,
    /// including a second release, returns [`PoolError::UseAfterRelease`].
    ///
    /// A slot whose generation counter is used up is retired and never
    /// handed out again.
    pub fn release(&mut self, handle: ParametersHandle) -> Result<(), PoolError> {
        let slot = self.slot_mut(handle)?;
        let params = slot.params.take();
        let next = slot.generation.checked_add(1);
        if let Some(generation) = next {
            slot.generation = generation;
        }

        if let Some(params) = params {
            params.release();
        }
        self.live -= 1;
        match next {
            Some(_) => {
                self.free.push_back(handle.index);
                debug!("Released parameter slot {}", handle.index);
            }
            None => debug!("Retired parameter slot {}", handle.index),
        }
        Ok(())
    }

    /// Copies the record behind `src` into the one behind `dst`, as
    /// [`CodecParameters::copy_to`] does.
    pub fn copy(&mut self, src: ParametersHandle, dst: ParametersHandle) -> Result<(), PoolError> {
        self.slot(src)?;
        self.slot(dst)?;
        if src.index == dst.index {
            return Ok(());
        }

        let (src_slot, dst_slot) = if src.index < dst.index {
            let (head, tail) = self.slots.split_at_mut(dst.index as usize);
            (&head[src.index as usize], &mut tail[0])
        } else {
            let (head, tail) = self.slots.split_at_mut(src.index as usize);
            (&tail[0], &mut head[dst.index as usize])
        };

        match (&src_slot.params, &mut dst_slot.params) {
            (Some(src_params), Some(dst_params)) => Ok(src_params.copy_to(dst_params)?),
            _ => Err(PoolError::UseAfterRelease {
                index: dst.index,
                generation: dst.generation,
            }),
        }
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

impl Default for ParametersPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::values::CodecId;
    use crate::utils::alloc::TrackingAllocator;

    #[test]
    fn released_handles_are_rejected() {
        let mut pool = ParametersPool::new();
        let handle = pool.allocate().unwrap();
        pool.get_mut(handle).unwrap().set_width(640).unwrap();
        assert_eq!(pool.get(handle).unwrap().width(), 640);

        pool.release(handle).unwrap();
        let stale = PoolError::UseAfterRelease {
            index: 0,
            generation: 0,
        };
        assert_eq!(pool.get(handle).unwrap_err(), stale);
        assert_eq!(pool.release(handle).unwrap_err(), stale);
        assert!(pool.is_empty());
    }

    #[test]
    fn slots_are_reused_with_new_generation() {
        let mut pool = ParametersPool::new();
        let first = pool.allocate().unwrap();
        pool.release(first).unwrap();

        let second = pool.allocate().unwrap();
        assert_eq!(second.index(), first.index());
        assert_eq!(second.generation(), 1);
        assert!(pool.get(first).is_err());
        assert!(pool.get(second).is_ok());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn exhausted_generation_retires_the_slot() {
        let mut pool = ParametersPool::new();
        let first = pool.allocate().unwrap();
        pool.slots[0].generation = u32::MAX;
        let last = ParametersHandle {
            index: first.index(),
            generation: u32::MAX,
        };

        pool.release(last).unwrap();
        assert!(pool.is_empty());
        assert_eq!(
            pool.get(last).unwrap_err(),
            PoolError::UseAfterRelease {
                index: 0,
                generation: u32::MAX,
            }
        );
        assert!(pool.get(first).is_err());

        let next = pool.allocate().unwrap();
        assert_eq!(next.index(), 1);
        assert_eq!(next.generation(), 0);
        assert!(pool.get(last).is_err());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn insert_takes_ownership() {
        let mut pool = ParametersPool::new();
        let mut params = CodecParameters::new();
        params.set_codec_id(CodecId::VP9);

        let handle = pool.insert(params).unwrap();
        assert_eq!(pool.get(handle).unwrap().codec_id(), CodecId::VP9);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn unknown_handles_are_invalid() {
        let mut other = ParametersPool::new();
        other.allocate().unwrap();
        let foreign = other.allocate().unwrap();

        let pool = ParametersPool::new();
        assert_eq!(
            pool.get(foreign).unwrap_err(),
            PoolError::InvalidHandle { index: 1 }
        );
    }

    #[test]
    fn copy_between_slots() {
        let tracker = TrackingAllocator::new();
        let mut pool = ParametersPool::with_allocator(tracker.clone());
        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();

        let params = pool.get_mut(b).unwrap();
        params.set_codec_id(CodecId::VP9);
        params.set_extradata(&[1, 2, 3]).unwrap();

        pool.copy(b, a).unwrap();
        assert_eq!(pool.get(a).unwrap(), pool.get(b).unwrap());
        assert_eq!(tracker.live_allocations(), 2);

        pool.release(b).unwrap();
        assert_eq!(pool.get(a).unwrap().extradata(), Some(&[1, 2, 3][..]));
        assert_eq!(tracker.live_allocations(), 1);
        assert!(pool.copy(b, a).is_err());
    }
}
