//! Canopy overhang buffers
//!
//! A tree near a chunk edge can grow leaves into columns of a chunk that does
//! not exist yet. Those cells are parked here, keyed by the chunk that will
//! own them, and consumed when that chunk is generated.

use std::collections::{BTreeSet, HashMap};

use crate::voxel::chunk::ChunkCoord;

/// Leaf cells for one chunk: a set of Y levels per local `(x, z)` column
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LeafData {
    columns: HashMap<(i32, i32), BTreeSet<i32>>,
}

impl LeafData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a leaf at local coordinates
    pub fn mark(&mut self, x: i32, y: i32, z: i32) {
        self.columns.entry((x, z)).or_default().insert(y);
    }

    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.columns.get(&(x, z)).is_some_and(|ys| ys.contains(&y))
    }

    /// Y levels marked in one column, ascending
    pub fn column(&self, x: i32, z: i32) -> impl Iterator<Item = i32> + '_ {
        self.columns.get(&(x, z)).into_iter().flatten().copied()
    }

    /// Number of marked cells
    pub fn len(&self) -> usize {
        self.columns.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Pending leaf spill, keyed by the owning chunk
#[derive(Debug, Default)]
pub struct LeafStore {
    pending: HashMap<ChunkCoord, LeafData>,
}

impl LeafStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaf data for a chunk, created on demand
    pub fn entry(&mut self, coord: ChunkCoord) -> &mut LeafData {
        self.pending.entry(coord).or_default()
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&LeafData> {
        self.pending.get(&coord)
    }

    /// Remove and return a chunk's leaf data
    pub fn take(&mut self, coord: ChunkCoord) -> Option<LeafData> {
        self.pending.remove(&coord)
    }

    /// Drop a chunk's leaf data. Returns true if there was any.
    pub fn discard(&mut self, coord: ChunkCoord) -> bool {
        self.pending.remove(&coord).is_some()
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.pending.contains_key(&coord)
    }

    /// Keep only entries for which `keep` returns true
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(ChunkCoord) -> bool,
    {
        self.pending.retain(|coord, _| keep(*coord));
    }

    /// Number of chunks with pending leaves
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.pending.keys().copied()
    }
}
