//! Partition functions: routing keys to workers.
//!
//! A partition function maps a key and a partition count `n > 0` to an index in `[0, n)`. For
//! the merge reducers to see whole groups, the function must depend only on the part of the key
//! that the grouping function inspects: every key of a group must land on the same worker.
//!
//! Partition functions are plain function values. Jobs carry them as [`PartitionFn`] so that the
//! same value can be shared by every worker of the timely substrate.

use std::sync::Arc;

use crate::boundary::BoundaryTable;
use crate::hashable::Hashable;
use crate::key::CompositeKey;

/// A shareable partition function.
pub type PartitionFn<K> = Arc<dyn Fn(&K, usize) -> usize + Send + Sync>;

/// Odd multiplier spreading small, sequential group identifiers across partitions.
pub const GROUP_MULTIPLIER: i32 = 127;

/// Routes a composite key by its grouping field alone, ignoring the tag.
///
/// Computes `|group * 127| mod partitions`, with wrapping multiplication so that extreme group
/// values cannot overflow into a negative index.
#[inline]
pub fn first_field(key: &CompositeKey, partitions: usize) -> usize {
    let spread = key.group.wrapping_mul(GROUP_MULTIPLIER).unsigned_abs() as usize;
    spread % partitions
}

/// Routes any hashable key by its FNV hash.
#[inline]
pub fn hashed<K: Hashable>(key: &K, partitions: usize) -> usize {
    (key.hashed() % partitions as u64) as usize
}

/// Routes keys by the range of a boundary table they fall into.
///
/// Partition 0 receives the smallest keys, partition 1 the next range, and so on. A table with
/// more splitters than partitions folds its trailing ranges into the last partition, which keeps
/// the concatenation of partitions sorted.
pub fn by_range<K>(table: Arc<BoundaryTable<K>>) -> PartitionFn<K>
where
    K: Ord + Send + Sync + 'static,
{
    Arc::new(move |key: &K, partitions: usize| table.partition_of(key).min(partitions - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_field_ignores_tag() {
        for group in -300 .. 300 {
            for partitions in 1 .. 9 {
                let expected = first_field(&CompositeKey::dimension(group), partitions);
                assert!(expected < partitions);
                for tag in -3 .. 4 {
                    assert_eq!(first_field(&CompositeKey::new(group, tag), partitions), expected);
                }
            }
        }
    }

    #[test]
    fn first_field_extremes() {
        for group in [i32::MIN, i32::MIN + 1, i32::MAX, 0] {
            assert!(first_field(&CompositeKey::new(group, 0), 7) < 7);
        }
    }

    #[test]
    fn sequential_groups_spread() {
        let mut used = [false; 4];
        for group in 0 .. 4 {
            used[first_field(&CompositeKey::fact(group), 4)] = true;
        }
        assert!(used.iter().all(|x| *x));
    }

    #[test]
    fn range_routing() {
        let table = Arc::new(BoundaryTable::new(vec![10, 20]).unwrap());
        let route = by_range(table);
        assert_eq!(route(&-5, 3), 0);
        assert_eq!(route(&9, 3), 0);
        assert_eq!(route(&10, 3), 1);
        assert_eq!(route(&19, 3), 1);
        assert_eq!(route(&20, 3), 2);
        assert_eq!(route(&99, 3), 2);
        assert_eq!(route(&99, 2), 1);
    }

    #[test]
    fn hashed_in_range() {
        for key in 0 .. 100u32 {
            assert!(hashed(&key, 5) < 5);
        }
    }
}
