//! Bump arena for transient allocations during tree construction
//!
//! Values are appended to fixed-capacity blocks and addressed by dense
//! [`Handle`] indices. Nothing is freed until the arena is dropped;
//! [`Arena::reset`] recycles blocks so repeated builds reuse capacity
//! instead of churning the allocator.

/// Default backing block size in bytes (256 kB)
pub const DEFAULT_BLOCK_SIZE: usize = 262_144;

/// Index of a value stored in an [`Arena`]
///
/// Handles are dense: the n-th allocation gets handle n. They stay valid
/// until the arena is reset or dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handle(u32);

impl Handle {
    /// Raw index of this handle
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Chunked bump allocator
///
/// Blocks never reallocate once created, so a handle's block/slot position
/// is fixed for the lifetime of the allocation.
pub struct Arena<T> {
    /// Elements per block, derived from the byte block size
    block_capacity: usize,
    /// Block currently being filled (unallocated until first use)
    current: Vec<T>,
    /// Retired full blocks, in allocation order
    used: Vec<Vec<T>>,
    /// Cleared blocks awaiting reuse after a reset
    available: Vec<Vec<T>>,
}

impl<T> Arena<T> {
    /// Create an arena with the default block size
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Create an arena whose blocks hold `block_size` bytes of `T` storage
    pub fn with_block_size(block_size: usize) -> Self {
        let elem_size = std::mem::size_of::<T>().max(1);
        Self {
            block_capacity: (block_size / elem_size).max(1),
            current: Vec::new(),
            used: Vec::new(),
            available: Vec::new(),
        }
    }

    /// Store a value and return its handle
    pub fn alloc(&mut self, value: T) -> Handle {
        if self.current.capacity() == 0 {
            self.current = self.take_block();
        } else if self.current.len() == self.block_capacity {
            let fresh = self.take_block();
            let full = std::mem::replace(&mut self.current, fresh);
            self.used.push(full);
        }

        let index = self.used.len() * self.block_capacity + self.current.len();
        self.current.push(value);
        Handle(index as u32)
    }

    /// Get a value by handle
    pub fn get(&self, handle: Handle) -> &T {
        let (block, slot) = self.locate(handle);
        if block == self.used.len() {
            &self.current[slot]
        } else {
            &self.used[block][slot]
        }
    }

    /// Get a mutable value by handle
    pub fn get_mut(&mut self, handle: Handle) -> &mut T {
        let (block, slot) = self.locate(handle);
        if block == self.used.len() {
            &mut self.current[slot]
        } else {
            &mut self.used[block][slot]
        }
    }

    /// Number of live allocations
    pub fn len(&self) -> usize {
        self.used.len() * self.block_capacity + self.current.len()
    }

    /// Check if the arena holds no live allocations
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total backing storage held by the arena, in bytes
    pub fn allocated_bytes(&self) -> usize {
        let blocks = self
            .used
            .iter()
            .chain(self.available.iter())
            .chain(std::iter::once(&self.current));
        blocks.map(|b| b.capacity() * std::mem::size_of::<T>()).sum()
    }

    /// Drop all values and recycle every block without releasing memory
    ///
    /// Handles issued before the reset are invalidated.
    pub fn reset(&mut self) {
        self.current.clear();
        for mut block in self.used.drain(..) {
            block.clear();
            self.available.push(block);
        }
    }

    /// Pop a recycled block, or allocate a fresh one
    fn take_block(&mut self) -> Vec<T> {
        self.available
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.block_capacity))
    }

    fn locate(&self, handle: Handle) -> (usize, usize) {
        let index = handle.index();
        (index / self.block_capacity, index % self.block_capacity)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
