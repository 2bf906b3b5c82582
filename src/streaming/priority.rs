//! Load order for pending chunks
//!
//! Pending chunks load farthest first by `|dx| + |dz|` from the viewer's chunk,
//! so the outer ring fills in before the inner one. Equal distances fall back
//! to coordinate order to keep the sequence deterministic.

use crate::voxel::chunk::ChunkCoord;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Priority information for a chunk
#[derive(Clone, Copy, Debug)]
pub struct ChunkPriority {
    pub coord: ChunkCoord,
    pub distance: u32, // Manhattan distance in chunks from the viewer
}

impl ChunkPriority {
    pub fn calculate(coord: ChunkCoord, viewer: ChunkCoord) -> Self {
        Self {
            coord,
            distance: coord.manhattan_distance(viewer),
        }
    }
}

// Implement Ord/PartialOrd for BinaryHeap (max-heap by default)
impl Eq for ChunkPriority {}

impl PartialEq for ChunkPriority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for ChunkPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        // Farther first; on ties the smaller coordinate wins
        self.distance
            .cmp(&other.distance)
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

impl PartialOrd for ChunkPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue for chunk loading
#[derive(Default)]
pub struct ChunkPriorityQueue {
    heap: BinaryHeap<ChunkPriority>,
}

impl ChunkPriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all queued chunks
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Add a chunk to the queue
    pub fn push(&mut self, priority: ChunkPriority) {
        self.heap.push(priority);
    }

    /// Get the highest priority chunk
    pub fn pop(&mut self) -> Option<ChunkPriority> {
        self.heap.pop()
    }

    pub fn peek(&self) -> Option<&ChunkPriority> {
        self.heap.peek()
    }

    /// Get the number of queued chunks
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Rebuild the queue from the desired set, skipping chunks that are
    /// already resident
    pub fn update<'a, I, F>(&mut self, viewer: ChunkCoord, desired: I, is_resident: F)
    where
        I: IntoIterator<Item = &'a ChunkCoord>,
        F: Fn(ChunkCoord) -> bool,
    {
        self.clear();
        for &coord in desired {
            if !is_resident(coord) {
                self.push(ChunkPriority::calculate(coord, viewer));
            }
        }
    }
}
