//! Precomputed kernel pass-through
//!
//! Each row stores its serial number as `0:ID` followed by the kernel values
//! against every training row, so `K(i, j)` is the value at position `ID(j)`
//! of row `i`.

use crate::core::{row_entries, Problem, Result, SVMError, SvmNode};
use crate::kernel::Kernel;

#[derive(Debug, Clone)]
pub struct PrecomputedKernel<'a> {
    problem: &'a Problem,
    ids: Vec<usize>,
}

impl<'a> PrecomputedKernel<'a> {
    /// Validate the rows and capture their serial numbers
    pub fn new(problem: &'a Problem) -> Result<Self> {
        let ids = (0..problem.len())
            .map(|i| serial_number(problem.row(i)))
            .collect::<Result<Vec<_>>>()?;

        let max_id = ids.iter().copied().max().unwrap_or(0);
        for i in 0..problem.len() {
            let width = row_entries(problem.row(i)).count();
            if width <= max_id {
                return Err(SVMError::InvalidDataset(format!(
                    "precomputed row {} has {} kernel values, serial number {} needs at least {}",
                    i + 1,
                    width.saturating_sub(1),
                    max_id,
                    max_id
                )));
            }
        }

        Ok(Self { problem, ids })
    }
}

impl Kernel for PrecomputedKernel<'_> {
    fn compute(&self, i: usize, j: usize) -> f64 {
        self.problem.row(i)[self.ids[j]].value
    }
}

/// Read the `0:ID` entry that leads a precomputed row
pub fn serial_number(row: &[SvmNode]) -> Result<usize> {
    match row.first() {
        Some(node) if node.index == 0 && node.value >= 1.0 && node.value.fract() == 0.0 => {
            Ok(node.value as usize)
        }
        _ => Err(SVMError::InvalidDataset(
            "precomputed kernel rows must start with 0:serial_number".to_string(),
        )),
    }
}
