//! LRU save cache for evicted chunks
//!
//! Holds the compressed block volumes of chunks that left the resident set so
//! they can come back without regeneration. When the cache is full, the least
//! recently stored entry is dropped and that chunk will be regenerated on its
//! next load.

use crate::voxel::chunk::ChunkCoord;
use std::collections::HashMap;

/// LRU cache of serialized chunks
///
/// Entries are consumed on load, so "recently used" means recently stored.
pub struct SaveCache {
    /// Map of chunk coordinates to compressed volumes
    entries: HashMap<ChunkCoord, Vec<u8>>,
    /// Store order: oldest first, newest last
    access_order: Vec<ChunkCoord>,
    /// Maximum number of entries to keep
    max_entries: usize,
}

impl SaveCache {
    /// Create a new save cache with the given capacity
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of evicted chunks to keep in memory
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            access_order: Vec::new(),
            max_entries,
        }
    }

    /// Store a chunk's serialized volume
    ///
    /// If the cache is at capacity, the oldest entry is dropped first.
    /// An existing entry for the same coordinate is replaced.
    ///
    /// # Arguments
    /// * `coord` - Chunk coordinate
    /// * `bytes` - Compressed volume
    ///
    /// # Returns
    /// The coordinate and bytes of the entry dropped to make room, if any
    pub fn insert(&mut self, coord: ChunkCoord, bytes: Vec<u8>) -> Option<(ChunkCoord, Vec<u8>)> {
        if self.max_entries == 0 {
            return Some((coord, bytes));
        }

        let evicted = if self.entries.contains_key(&coord) {
            self.remove_from_access_order(coord);
            None
        } else if self.entries.len() >= self.max_entries {
            self.evict_oldest()
        } else {
            None
        };

        self.entries.insert(coord, bytes);
        self.access_order.push(coord);

        evicted
    }

    /// Remove and return an entry
    ///
    /// # Arguments
    /// * `coord` - Chunk coordinate
    ///
    /// # Returns
    /// The compressed volume if it was cached
    pub fn take(&mut self, coord: ChunkCoord) -> Option<Vec<u8>> {
        let bytes = self.entries.remove(&coord)?;
        self.remove_from_access_order(coord);
        Some(bytes)
    }

    /// Check if the cache holds a chunk
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.entries.contains_key(&coord)
    }

    /// Get the number of cached chunks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Total size of all cached volumes in bytes
    pub fn total_bytes(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Drop the oldest entry
    ///
    /// # Returns
    /// The dropped coordinate and bytes if any existed
    pub fn evict_oldest(&mut self) -> Option<(ChunkCoord, Vec<u8>)> {
        let coord = self.access_order.first().copied()?;
        self.take(coord).map(|bytes| (coord, bytes))
    }

    /// Get an iterator over all cached coordinates
    pub fn coords(&self) -> impl Iterator<Item = &ChunkCoord> {
        self.entries.keys()
    }

    /// Remove a coordinate from the access order
    fn remove_from_access_order(&mut self, coord: ChunkCoord) {
        if let Some(pos) = self.access_order.iter().position(|&c| c == coord) {
            self.access_order.remove(pos);
        }
    }
}
