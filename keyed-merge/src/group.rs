//! Groups: the unit of delivery into a reducer.
//!
//! After a worker has received all records for a timestamp, it sorts them with the job's order
//! function into a *run*. [`groups`] then cuts the run into maximal stretches of keys that the
//! grouping function considers equal, each presented as a [`Group`].
//!
//! A `Group` is a by-value, forward-only iterator over `(&key, &value)` pairs in delivered order.
//! Reducers that need to retain values past the current step must clone them out.

use std::cmp::Ordering;

/// Sorts a run of records by their keys, retaining arrival order among equal keys.
pub fn sort_run<K, V, F>(run: &mut [(K, V)], order: F)
where
    F: Fn(&K, &K) -> Ordering,
{
    run.sort_by(|x, y| order(&x.0, &y.0));
}

/// Reports the number of elements satisfying the predicate.
///
/// This method *relies strongly* on the assumption that the predicate stays false once it becomes
/// false, a joint property of the predicate and the slice. This allows `advance` to use
/// exponential search to count the number of elements in time logarithmic in the result.
#[inline]
pub fn advance<T, F: Fn(&T) -> bool>(slice: &[T], function: F) -> usize {

    // start with no advance
    let mut index = 0;
    if index < slice.len() && function(&slice[index]) {

        // advance in exponentially growing steps.
        let mut step = 1;
        while index + step < slice.len() && function(&slice[index + step]) {
            index += step;
            step <<= 1;
        }

        // advance in exponentially shrinking steps.
        step >>= 1;
        while step > 0 {
            if index + step < slice.len() && function(&slice[index + step]) {
                index += step;
            }
            step >>= 1;
        }

        index += 1;
    }

    index
}

/// The records of one group, in delivered order.
pub struct Group<'a, K, V> {
    key: &'a K,
    records: std::slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Group<'a, K, V> {
    /// Presents a slice of records as a single group.
    ///
    /// The caller asserts that the slice is non-empty and that its records group together.
    pub fn new(records: &'a [(K, V)]) -> Option<Self> {
        records.first().map(|(key, _)| Group { key, records: records.iter() })
    }

    /// The key of the first record of the group.
    ///
    /// Under secondary sort this is the smallest full key of the group, e.g. the dimension key
    /// when dimension records carry the smallest tag.
    pub fn key(&self) -> &'a K {
        self.key
    }

    /// The remaining values, without their keys.
    pub fn values(self) -> impl Iterator<Item = &'a V> {
        self.records.map(|(_, value)| value)
    }
}

impl<'a, K, V> Iterator for Group<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|(key, value)| (key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Group<'_, K, V> { }

/// Iterator over the groups of a sorted run.
pub struct Groups<'a, K, V, F> {
    run: &'a [(K, V)],
    grouping: F,
}

/// Cuts a run sorted by a compatible order into groups.
pub fn groups<K, V, F>(run: &[(K, V)], grouping: F) -> Groups<'_, K, V, F>
where
    F: Fn(&K, &K) -> bool,
{
    Groups { run, grouping }
}

impl<'a, K, V, F> Iterator for Groups<'a, K, V, F>
where
    F: Fn(&K, &K) -> bool,
{
    type Item = Group<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let (first, _) = self.run.first()?;
        let grouping = &self.grouping;
        let length = advance(self.run, |(key, _)| grouping(first, key));
        let (group, rest) = self.run.split_at(length);
        self.run = rest;
        Group::new(group)
    }
}
