//! LibSVM format dataset reader
//!
//! Supports loading datasets in the libsvm format:
//! label index:value index:value ...
//!
//! Example:
//! +1 1:0.5 3:1.2 7:0.8
//! -1 2:0.3 5:2.1
//!
//! Indices are kept as written. Index 0 is only meaningful for the
//! precomputed kernel, where it carries the row's serial number.

use crate::core::{Problem, Result, SVMError, SparseVector};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Training or test set loaded from a LibSVM format source
#[derive(Debug, Clone)]
pub struct LibSVMDataset {
    problem: Problem,
    max_index: i32,
}

impl LibSVMDataset {
    /// Load a dataset from a LibSVM format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a dataset from a reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut problem = Problem::new();
        let mut max_index = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (label, row) = Self::parse_line(line).map_err(|message| SVMError::ParseError {
                line: line_num + 1,
                message,
            })?;
            max_index = max_index.max(row.max_index());
            problem.push(label, &row);
        }

        if problem.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        Ok(Self { problem, max_index })
    }

    /// Parse a single line in libsvm format
    fn parse_line(line: &str) -> std::result::Result<(f64, SparseVector), String> {
        let mut parts = line.split_whitespace();

        let label_str = parts.next().ok_or_else(|| "empty line".to_string())?;
        let label = label_str
            .parse::<f64>()
            .map_err(|_| format!("invalid label: {}", label_str))?;

        let mut pairs = Vec::new();
        let mut last_index = -1;

        for feature_str in parts {
            let (index_str, value_str) = feature_str
                .split_once(':')
                .ok_or_else(|| format!("invalid feature format: {}", feature_str))?;

            let index = index_str
                .parse::<i32>()
                .map_err(|_| format!("invalid feature index: {}", index_str))?;
            let value = value_str
                .parse::<f64>()
                .map_err(|_| format!("invalid feature value: {}", value_str))?;

            if index <= last_index {
                return Err(format!(
                    "feature indices must be non-negative and ascending, got {} after {}",
                    index, last_index
                ));
            }
            last_index = index;
            pairs.push((index, value));
        }

        Ok((label, SparseVector::from_pairs(pairs)))
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.problem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problem.is_empty()
    }

    /// Largest feature index seen in the file
    pub fn max_index(&self) -> i32 {
        self.max_index
    }

    pub fn labels(&self) -> &[f64] {
        &self.problem.y
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn into_problem(self) -> Problem {
        self.problem
    }
}
