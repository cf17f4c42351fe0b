//! Job configuration: the functions and counts that parameterize a shuffle.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::hashable::Hashable;
use crate::order::{GroupFn, OrderFn};
use crate::partition::{self, PartitionFn};

/// Everything the shuffle needs to know about a job's keys.
///
/// The three functions must be mutually consistent: keys that group together compare
/// contiguously under `order`, and are routed to the same partition by `partition`.
pub struct JobConfig<K> {
    /// Routes keys to partitions.
    pub partition: PartitionFn<K>,
    /// Sorts records within a partition.
    pub order: OrderFn<K>,
    /// Decides group boundaries within a sorted partition.
    pub grouping: GroupFn<K>,
    /// Number of partitions, and so of reducer instances.
    pub partitions: usize,
}

impl<K> Clone for JobConfig<K> {
    fn clone(&self) -> Self {
        JobConfig {
            partition: Arc::clone(&self.partition),
            order: Arc::clone(&self.order),
            grouping: Arc::clone(&self.grouping),
            partitions: self.partitions,
        }
    }
}

impl<K> std::fmt::Debug for JobConfig<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobConfig").field("partitions", &self.partitions).finish_non_exhaustive()
    }
}

impl<K: Hashable + Ord + 'static> JobConfig<K> {
    /// A job hashing whole keys, sorting them naturally, and grouping equal keys.
    pub fn new(partitions: usize) -> Self {
        JobConfig {
            partition: Arc::new(partition::hashed::<K>),
            order: Arc::new(|k1: &K, k2: &K| k1.cmp(k2)),
            grouping: Arc::new(|k1: &K, k2: &K| k1 == k2),
            partitions,
        }
    }
}

impl<K> JobConfig<K> {
    /// Replaces the partition function.
    pub fn with_partition<F>(mut self, partition: F) -> Self
    where
        F: Fn(&K, usize) -> usize + Send + Sync + 'static,
    {
        self.partition = Arc::new(partition);
        self
    }

    /// Replaces the partition function with an already shared one.
    pub fn with_partition_fn(mut self, partition: PartitionFn<K>) -> Self {
        self.partition = partition;
        self
    }

    /// Replaces the order function.
    pub fn with_order<F>(mut self, order: F) -> Self
    where
        F: Fn(&K, &K) -> Ordering + Send + Sync + 'static,
    {
        self.order = Arc::new(order);
        self
    }

    /// Replaces the grouping function.
    pub fn with_grouping<F>(mut self, grouping: F) -> Self
    where
        F: Fn(&K, &K) -> bool + Send + Sync + 'static,
    {
        self.grouping = Arc::new(grouping);
        self
    }

    /// Rejects jobs without partitions.
    pub fn validate(&self) -> Result<()> {
        if self.partitions == 0 {
            return Err(Error::InvalidConfig("a job needs at least one partition".to_string()));
        }
        Ok(())
    }

    /// The partition of `key`, checked to be in range.
    #[inline]
    pub fn partition_of(&self, key: &K) -> Result<usize> {
        let index = (self.partition)(key, self.partitions);
        if index >= self.partitions {
            return Err(Error::Execution(format!("partition {} out of range for {} partitions", index, self.partitions)));
        }
        Ok(index)
    }
}
