//! Bump-allocated storage for syntax tree nodes
//!
//! Every node the parser builds lives in one [`NodeArena`] and is reached
//! through plain references for the rest of the pipeline. Nothing is freed
//! individually; the whole tree goes away when the arena is dropped.

use bumpalo::Bump;

/// Initial capacity of the backing storage.
const ARENA_CAPACITY: usize = 4 * 1024 * 1024;

/// Arena owning every syntax tree node for one parse.
///
/// Allocations never move once placed, so references handed out by
/// [`alloc`](NodeArena::alloc) stay valid for the arena's entire lifetime.
pub struct NodeArena {
    bump: Bump,
}

impl NodeArena {
    /// Create an arena with the standard initial capacity.
    pub fn new() -> Self {
        Self {
            bump: Bump::with_capacity(ARENA_CAPACITY),
        }
    }

    /// Allocate a node and return a reference tied to the arena.
    pub fn alloc<T>(&self, node: T) -> &T {
        self.bump.alloc(node)
    }

    /// Allocate a slice by copying `values` into the arena.
    pub fn alloc_slice<T: Copy>(&self, values: &[T]) -> &[T] {
        self.bump.alloc_slice_copy(values)
    }

    /// Bytes of backing storage the arena has reserved. This counts
    /// whole chunks, not individual allocations, so it starts at the
    /// initial capacity and only moves when the arena grows a chunk.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}
