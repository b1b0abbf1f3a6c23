//! Array heap
//!
//! An arena of platter arrays addressed by 32-bit handles. Slot 0 always holds
//! the code array. Freed slots are emptied and their handles pushed onto a
//! free-list, so a handle is either active (slot holds an array) or inactive
//! (slot is empty or out of range). Every access checks that state first.

use log::debug;
use crate::constants::CODE_HANDLE;
use crate::error::{Fault, VmError, VmResult};

#[derive(Debug, Clone)]
pub struct ArrayHeap {
    slots: Vec<Option<Vec<u32>>>,
    free_handles: Vec<u32>,
    active: usize,
    // Platters held by every active array, array 0 included
    live_platters: usize,
    platter_limit: Option<usize>,
}

impl ArrayHeap {
    /// Create a heap whose array 0 holds `program`
    pub fn new(program: Vec<u32>) -> Self {
        Self::with_limit(program, None)
    }

    /// Create a heap that refuses ALLOC once the active arrays would hold
    /// more than `platter_limit` platters
    pub fn with_limit(program: Vec<u32>, platter_limit: Option<usize>) -> Self {
        Self {
            live_platters: program.len(),
            slots: vec![Some(program)],
            free_handles: Vec::new(),
            active: 1,
            platter_limit,
        }
    }

    /// Allocate a zero-filled array of `length` platters. The returned handle
    /// is never 0 and never equal to another active handle.
    ///
    /// Fails with `HeapExhausted` when the platter limit would be exceeded,
    /// the host cannot provide the memory, or no handle remains. The heap is
    /// unchanged on failure.
    pub fn allocate(&mut self, length: u32) -> VmResult<u32> {
        let length = length as usize;
        let live = self.live_platters.saturating_add(length);
        if self.platter_limit.is_some_and(|limit| live > limit) {
            debug!("alloc: {length} platters would exceed the heap limit");
            return Err(VmError::HeapExhausted);
        }

        let mut array = Vec::new();
        array
            .try_reserve_exact(length)
            .map_err(|_| VmError::HeapExhausted)?;
        array.resize(length, 0);

        let handle = match self.free_handles.pop() {
            Some(handle) => {
                self.slots[handle as usize] = Some(array);
                handle
            }
            None => {
                let handle = u32::try_from(self.slots.len()).map_err(|_| VmError::HeapExhausted)?;
                self.slots.push(Some(array));
                handle
            }
        };
        self.active += 1;
        self.live_platters = live;
        debug!("alloc: array {handle} with {length} platters ({} active)", self.active);
        Ok(handle)
    }

    pub fn free(&mut self, handle: u32) -> Result<(), Fault> {
        if handle == CODE_HANDLE {
            return Err(Fault::FreeZero);
        }
        let slot = self
            .slots
            .get_mut(handle as usize)
            .filter(|slot| slot.is_some())
            .ok_or(Fault::DoubleFree { handle })?;
        if let Some(array) = slot.take() {
            self.live_platters -= array.len();
        }
        self.free_handles.push(handle);
        self.active -= 1;
        debug!("free: array {handle} ({} active)", self.active);
        Ok(())
    }

    #[inline]
    pub fn read(&self, handle: u32, index: u32) -> Result<u32, Fault> {
        self.array(handle)
            .and_then(|array| array.get(index as usize))
            .copied()
            .ok_or(Fault::InactiveArrayAccess { handle, index })
    }

    #[inline]
    pub fn write(&mut self, handle: u32, index: u32, value: u32) -> Result<(), Fault> {
        let word = self
            .slots
            .get_mut(handle as usize)
            .and_then(|slot| slot.as_mut())
            .and_then(|array| array.get_mut(index as usize))
            .ok_or(Fault::InactiveArrayAccess { handle, index })?;
        *word = value;
        Ok(())
    }

    /// Independent copy of an active array's contents
    pub fn duplicate(&self, handle: u32) -> Result<Vec<u32>, Fault> {
        self.array(handle)
            .map(|array| array.to_vec())
            .ok_or(Fault::CallInactive { handle })
    }

    /// Install new code. The previous array 0 is dropped.
    pub fn replace_array_zero(&mut self, contents: Vec<u32>) {
        let new_len = contents.len();
        let slot = &mut self.slots[CODE_HANDLE as usize];
        let old_len = slot.replace(contents).map_or(0, |old| old.len());
        self.live_platters = self.live_platters - old_len + new_len;
    }

    /// The array currently serving as code
    #[inline]
    pub fn code(&self) -> &[u32] {
        self.array(CODE_HANDLE).unwrap_or(&[])
    }

    /// Borrow an active array
    pub fn array(&self, handle: u32) -> Option<&[u32]> {
        self.slots
            .get(handle as usize)
            .and_then(|slot| slot.as_deref())
    }

    pub fn is_active(&self, handle: u32) -> bool {
        self.array(handle).is_some()
    }

    /// Number of active arrays, array 0 included
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Total platters held by active arrays
    pub fn live_platters(&self) -> usize {
        self.live_platters
    }

    /// Active handles with their lengths, in handle order
    pub fn active_arrays(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(handle, slot)| slot.as_ref().map(|array| (handle as u32, array.len())))
    }
}
