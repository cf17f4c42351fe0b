//! Partition boundary tables for total-order sorting.
//!
//! A table of `n` strictly ascending splitters `s_0 < s_1 < ... < s_{n-1}` induces the `n + 1`
//! half-open ranges `(-inf, s_0), [s_0, s_1), ..., [s_{n-1}, +inf)`. A key equal to a splitter
//! belongs to the range that splitter opens. Routing each key to the index of its range and
//! sorting within each partition yields partitions whose concatenation is globally sorted.
//!
//! Tables are computed once, persisted, and then shared read-only by every worker of the sort.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Strictly ascending splitters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryTable<K> {
    splitters: Vec<K>,
}

impl<K: Ord> BoundaryTable<K> {
    /// Validates and wraps `splitters`.
    pub fn new(splitters: Vec<K>) -> Result<Self> {
        if let Some(position) = splitters.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(Error::InvalidBoundaryTable(format!(
                "splitters {} and {} are not strictly ascending", position, position + 1,
            )));
        }
        Ok(BoundaryTable { splitters })
    }

    /// The splitters, in ascending order.
    pub fn splitters(&self) -> &[K] {
        &self.splitters
    }

    /// Number of ranges the table induces.
    pub fn partitions(&self) -> usize {
        self.splitters.len() + 1
    }

    /// The index of the range containing `key`: the number of splitters less or equal to it.
    #[inline]
    pub fn partition_of(&self, key: &K) -> usize {
        self.splitters.partition_point(|splitter| splitter <= key)
    }

    /// Checks that the table addresses no more than `partitions` ranges.
    pub fn check_partitions(&self, partitions: usize) -> Result<()> {
        if self.partitions() > partitions {
            return Err(Error::InvalidBoundaryTable(format!(
                "{} splitters need {} partitions, job has {}", self.splitters.len(), self.partitions(), partitions,
            )));
        }
        Ok(())
    }
}

impl<K: Ord + Serialize> BoundaryTable<K> {
    /// Writes the table as JSON to `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Writes the table as JSON to the file at `path`.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl<K: Ord + DeserializeOwned> BoundaryTable<K> {
    /// Reads a table from JSON, re-validating its splitters.
    pub fn read_from<R: std::io::Read>(reader: R) -> Result<Self> {
        let table: BoundaryTable<K> = serde_json::from_reader(reader)?;
        Self::new(table.splitters)
    }

    /// Reads a table from the file at `path`.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::read_from(BufReader::new(File::open(path)?))
    }
}
