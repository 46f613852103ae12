//! Kernel column cache
//!
//! Fixed-capacity LRU store of Q-matrix column buffers. Nodes live in an
//! arena addressed by row index; the slot after the last row is the
//! sentinel head of a circular doubly-linked LRU ring. `sentinel.next` is
//! the least recently used column and `sentinel.prev` the most recent.
//!
//! The cache hands out buffers, not values: whatever a caller finds in a
//! buffer it receives is stale, and the caller recomputes the column into it
//! every time. Only the allocation is reused across requests.

/// Link value for a node that is not in the LRU ring
const UNLINKED: usize = usize::MAX;

/// Bytes per cached column entry
const ENTRY_BYTES: usize = std::mem::size_of::<f64>();

#[derive(Debug, Clone)]
struct CacheNode {
    data: Vec<f64>,
    prev: usize,
    next: usize,
}

impl CacheNode {
    fn unlinked() -> Self {
        Self {
            data: Vec::new(),
            prev: UNLINKED,
            next: UNLINKED,
        }
    }
}

/// LRU cache of column buffers, one slot per row of the Q matrix
#[derive(Debug)]
pub struct ColumnCache {
    nodes: Vec<CacheNode>,
    col_size: usize,
    capacity: usize,
    available: usize,
    hits: u64,
    misses: u64,
}

impl ColumnCache {
    /// Create a cache for `l` rows holding at most `capacity` columns of
    /// `col_size` entries
    ///
    /// The capacity is raised to two, since every solver iteration keeps two
    /// columns live at once.
    pub fn new(l: usize, col_size: usize, capacity: usize) -> Self {
        let capacity = capacity.max(2);
        let mut nodes = vec![CacheNode::unlinked(); l + 1];
        // empty ring: the sentinel points at itself
        nodes[l].prev = l;
        nodes[l].next = l;

        Self {
            nodes,
            col_size,
            capacity,
            available: capacity,
            hits: 0,
            misses: 0,
        }
    }

    /// Create a cache whose capacity is derived from a budget in megabytes
    pub fn with_memory_limit(l: usize, col_size: usize, megabytes: f64) -> Self {
        let bytes = (megabytes * 1024.0 * 1024.0).max(0.0) as usize;
        let capacity = bytes / (col_size.max(1) * ENTRY_BYTES);
        Self::new(l, col_size, capacity)
    }

    fn sentinel(&self) -> usize {
        self.nodes.len() - 1
    }

    fn is_resident(&self, i: usize) -> bool {
        self.nodes[i].prev != UNLINKED
    }

    fn lru_delete(&mut self, i: usize) {
        let (prev, next) = (self.nodes[i].prev, self.nodes[i].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[i].prev = UNLINKED;
        self.nodes[i].next = UNLINKED;
    }

    /// Link `i` at the most-recently-used end of the ring
    fn lru_insert(&mut self, i: usize) {
        let head = self.sentinel();
        let tail = self.nodes[head].prev;
        self.nodes[i].next = head;
        self.nodes[i].prev = tail;
        self.nodes[tail].next = i;
        self.nodes[head].prev = i;
    }

    /// Make column `i` resident and most recently used
    fn touch(&mut self, i: usize) {
        assert!(i < self.sentinel(), "column index {i} out of range");

        if self.is_resident(i) {
            self.hits += 1;
            self.lru_delete(i);
        } else {
            self.misses += 1;
            if self.available == 0 {
                let oldest = self.nodes[self.sentinel()].next;
                debug_assert_ne!(oldest, self.sentinel());
                self.nodes[oldest].data = Vec::new();
                self.lru_delete(oldest);
                self.available += 1;
            }
            self.nodes[i].data = vec![0.0; self.col_size];
            self.available -= 1;
        }

        self.lru_insert(i);
    }

    /// Get the buffer for column `i`, allocating or evicting as needed
    pub fn get_column(&mut self, i: usize) -> &mut [f64] {
        self.touch(i);
        &mut self.nodes[i].data
    }

    /// Get buffers for two distinct columns at once
    ///
    /// `j` is touched after `i`, so with a capacity of at least two the
    /// request for `j` can never evict `i`.
    pub fn get_column_pair(&mut self, i: usize, j: usize) -> (&mut [f64], &mut [f64]) {
        assert_ne!(i, j, "column pair must name two distinct columns");
        self.touch(i);
        self.touch(j);

        if i < j {
            let (low, high) = self.nodes.split_at_mut(j);
            (&mut low[i].data, &mut high[0].data)
        } else {
            let (low, high) = self.nodes.split_at_mut(i);
            (&mut high[0].data, &mut low[j].data)
        }
    }

    /// Number of resident columns
    pub fn len(&self) -> usize {
        self.capacity - self.available
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resident columns from least to most recently used
    pub fn resident(&self) -> Vec<usize> {
        let head = self.sentinel();
        let mut order = Vec::with_capacity(self.len());
        let mut cursor = self.nodes[head].next;
        while cursor != head {
            order.push(cursor);
            cursor = self.nodes[cursor].next;
        }
        order
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.capacity,
            size: self.len(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}

impl CacheStats {
    /// Fraction of requests served by a resident buffer
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_has_requested_length() {
        let mut cache = ColumnCache::new(5, 7, 3);
        assert_eq!(cache.get_column(2).len(), 7);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut cache = ColumnCache::new(20, 4, 3);
        let requests = [0, 5, 7, 5, 9, 11, 0, 3, 3, 19, 2, 7, 8, 1];
        for &i in &requests {
            cache.get_column(i);
            assert!(cache.len() <= cache.capacity());
            assert_eq!(cache.resident().len(), cache.len());
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_lru_resident_set() {
        let mut cache = ColumnCache::new(10, 2, 3);
        for i in [1, 2, 3, 4, 5] {
            cache.get_column(i);
        }
        assert_eq!(cache.resident(), vec![3, 4, 5]);

        // touching 3 moves it to the most-recently-used end
        cache.get_column(3);
        assert_eq!(cache.resident(), vec![4, 5, 3]);

        cache.get_column(6);
        assert_eq!(cache.resident(), vec![5, 3, 6]);
    }

    #[test]
    fn test_hit_keeps_buffer() {
        let mut cache = ColumnCache::new(4, 3, 2);
        cache.get_column(1).copy_from_slice(&[1.0, 2.0, 3.0]);
        cache.get_column(2);

        let column = cache.get_column(1);
        assert_eq!(column, &[1.0, 2.0, 3.0]);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_evicted_column_is_reallocated() {
        let mut cache = ColumnCache::new(4, 2, 2);
        cache.get_column(0).copy_from_slice(&[5.0, 5.0]);
        cache.get_column(1);
        cache.get_column(2); // evicts 0

        assert_eq!(cache.resident(), vec![1, 2]);
        assert_eq!(cache.get_column(0), &[0.0, 0.0]);
        assert_eq!(cache.stats().misses, 4);
    }

    #[test]
    fn test_pair_never_evicts_first_column() {
        let mut cache = ColumnCache::new(6, 2, 2);
        cache.get_column(4);
        cache.get_column(5);

        let (a, b) = cache.get_column_pair(0, 1);
        a[0] = 1.0;
        b[0] = 2.0;
        assert_eq!(cache.resident(), vec![0, 1]);

        let (b, a) = cache.get_column_pair(1, 0);
        assert_eq!((a[0], b[0]), (1.0, 2.0));
    }

    #[test]
    fn test_capacity_floor_and_memory_limit() {
        assert_eq!(ColumnCache::new(10, 10, 0).capacity(), 2);

        // 1 MB of 1024-entry columns holds 128 of them
        let cache = ColumnCache::with_memory_limit(1024, 1024, 1.0);
        assert_eq!(cache.capacity(), 128);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hit_rate() {
        let mut cache = ColumnCache::new(3, 1, 2);
        assert_eq!(cache.stats().hit_rate(), 0.0);
        cache.get_column(0);
        cache.get_column(0);
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }
}
