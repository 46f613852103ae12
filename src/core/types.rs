//! Core type definitions for SVM

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Index value marking the end of a sparse row
pub const SENTINEL_INDEX: i32 = -1;

/// One (index, value) entry of a sparse row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvmNode {
    pub index: i32,
    pub value: f64,
}

impl SvmNode {
    pub fn new(index: i32, value: f64) -> Self {
        Self { index, value }
    }

    /// The terminator entry that closes every row
    pub fn terminator() -> Self {
        Self {
            index: SENTINEL_INDEX,
            value: 0.0,
        }
    }

    pub fn is_terminator(&self) -> bool {
        self.index == SENTINEL_INDEX
    }
}

/// Iterate the entries of a sentinel-terminated row, stopping at the terminator
pub fn row_entries(row: &[SvmNode]) -> impl Iterator<Item = &SvmNode> {
    row.iter().take_while(|node| !node.is_terminator())
}

/// Sparse vector representation with sorted indices
///
/// The backing storage always ends with a terminator node, so
/// [`SparseVector::nodes`] can be handed directly to the kernel routines.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector {
    nodes: Vec<SvmNode>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<i32>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );
        Self::from_pairs(indices.into_iter().zip(values))
    }

    /// Build from (index, value) pairs in any order
    pub fn from_pairs<I: IntoIterator<Item = (i32, f64)>>(pairs: I) -> Self {
        let mut pairs: Vec<(i32, f64)> = pairs.into_iter().collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        assert!(
            pairs.windows(2).all(|w| w[0].0 != w[1].0),
            "Sparse vector indices must be unique"
        );
        assert!(
            pairs.iter().all(|&(idx, _)| idx >= 0),
            "Sparse vector indices must be non-negative"
        );

        let mut nodes: Vec<SvmNode> = pairs
            .into_iter()
            .map(|(index, value)| SvmNode::new(index, value))
            .collect();
        nodes.push(SvmNode::terminator());
        Self { nodes }
    }

    /// Build from a dense slice, using 1-based indices and skipping zeros
    pub fn from_dense(values: &[f64]) -> Self {
        Self::from_pairs(
            values
                .iter()
                .enumerate()
                .filter(|(_, &v)| v != 0.0)
                .map(|(i, &v)| (i as i32 + 1, v)),
        )
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            nodes: vec![SvmNode::terminator()],
        }
    }

    /// Entries including the trailing terminator
    pub fn nodes(&self) -> &[SvmNode] {
        &self.nodes
    }

    /// Entries without the trailing terminator
    pub fn entries(&self) -> &[SvmNode] {
        &self.nodes[..self.nodes.len() - 1]
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: i32) -> f64 {
        match self.entries().binary_search_by_key(&index, |n| n.index) {
            Ok(pos) => self.nodes[pos].value,
            Err(_) => 0.0,
        }
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.entries().iter().map(|n| n.value * n.value).sum()
    }

    /// Largest feature index, 0 for an empty vector
    pub fn max_index(&self) -> i32 {
        self.entries().last().map_or(0, |n| n.index)
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.nnz() == 0
    }
}

impl From<&[SvmNode]> for SparseVector {
    /// Copy a sentinel-terminated row out of an arena
    fn from(row: &[SvmNode]) -> Self {
        let mut nodes: Vec<SvmNode> = row_entries(row).copied().collect();
        nodes.push(SvmNode::terminator());
        Self { nodes }
    }
}

/// Training set: labels plus row offsets into a shared node arena
///
/// Sub-problems built by the one-vs-one decomposition share the arena of
/// the full problem and only carry their own `y` and `x` arrays.
#[derive(Debug, Clone, Default)]
pub struct Problem {
    /// Label (classification) or target (regression) per row
    pub y: Vec<f64>,
    /// Start offset of each row inside `x_space`
    pub x: Vec<usize>,
    /// Node arena, every row closed by a terminator
    pub x_space: Arc<Vec<SvmNode>>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a problem from labels and rows
    pub fn from_rows(labels: &[f64], rows: &[SparseVector]) -> Self {
        assert_eq!(
            labels.len(),
            rows.len(),
            "Labels and rows must have same length"
        );
        let mut problem = Self::new();
        for (&label, row) in labels.iter().zip(rows) {
            problem.push(label, row);
        }
        problem
    }

    /// Append one row to the problem
    pub fn push(&mut self, label: f64, row: &SparseVector) {
        let space = Arc::make_mut(&mut self.x_space);
        self.x.push(space.len());
        self.y.push(label);
        space.extend_from_slice(row.nodes());
    }

    /// Number of rows (`l`)
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Sentinel-terminated slice for row `i`
    pub fn row(&self, i: usize) -> &[SvmNode] {
        &self.x_space[self.x[i]..]
    }

    /// Largest feature index over all rows
    pub fn max_index(&self) -> i32 {
        self.x_space
            .iter()
            .filter(|n| !n.is_terminator())
            .map(|n| n.index)
            .max()
            .unwrap_or(0)
    }

    /// A problem over selected rows sharing this problem's arena
    pub fn subset(&self, rows: &[usize], labels: Vec<f64>) -> Self {
        debug_assert_eq!(rows.len(), labels.len());
        Self {
            y: labels,
            x: rows.iter().map(|&r| self.x[r]).collect(),
            x_space: Arc::clone(&self.x_space),
        }
    }
}
