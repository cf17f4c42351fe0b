//! Reducers: algorithms that consume one group at a time.
//!
//! Every reducer sees the groups of a sorted run one after the other. Within a call to
//! [`Reducer::reduce`] it consumes the group as a single forward pass and pushes any results to
//! `output`. Nothing is carried from one group to the next; a reducer that accumulates must
//! start afresh in each call.

pub mod aggregate;
pub mod join;
pub mod reorder;

pub use self::aggregate::{average, Average, Sum};
pub use self::join::{concat_csv, merge_join, BroadcastJoin, CoGroup, SideTable, TaggedJoin};
pub use self::reorder::{Reorder, SortWithin};

use crate::group::{groups, Group};

/// Logic applied to each group of a sorted run.
pub trait Reducer<K, V> {
    /// The type of produced records.
    type Output;
    /// Consumes one group, pushing results to `output`.
    fn reduce(&mut self, group: Group<'_, K, V>, output: &mut Vec<Self::Output>);
}

/// Delivers each group of a sorted run to `reducer`, in run order.
///
/// Returns the number of groups delivered.
pub fn reduce_run<K, V, F, R>(run: &[(K, V)], grouping: F, reducer: &mut R, output: &mut Vec<R::Output>) -> usize
where
    F: Fn(&K, &K) -> bool,
    R: Reducer<K, V>,
{
    let mut delivered = 0;
    for group in groups(run, grouping) {
        reducer.reduce(group, output);
        delivered += 1;
    }
    delivered
}
