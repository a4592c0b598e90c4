//! Stable handles for runtime objects.
//!
//! Every runtime object gets an [`ObjectId`] when it is created. The id is
//! never reused while the owning table lives, so it can safely key external
//! structures (notably the timed event queue's hash index) without tying
//! their lifetime to the object's storage location.

use serde::{Deserialize, Serialize};

/// A stable, process-unique handle for a runtime object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Returns the raw id value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic allocator for [`ObjectId`]s.
///
/// Ids start at 1 and are handed out in creation order; an allocator is
/// owned by the runtime table so two tables never share an id space.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Creates a new allocator.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocates the next id.
    pub fn allocate(&mut self) -> ObjectId {
        self.next += 1;
        ObjectId(self.next)
    }
}
