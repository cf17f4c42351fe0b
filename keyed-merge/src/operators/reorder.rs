//! Reducers that re-emit a group in some order.
//!
//! [`Reorder`] trusts the delivered order, which under secondary sort is already sorted by the
//! full key. [`SortWithin`] is the alternative that does not rely on the shuffle: it buffers each
//! group and sorts it with a comparator over values.

use std::cmp::Ordering;

use crate::group::Group;
use crate::operators::Reducer;

/// Re-emits every record of a group in delivered order.
#[derive(Debug, Default, Clone, Copy)]
pub struct Reorder;

impl<K: Clone, V: Clone> Reducer<K, V> for Reorder {
    type Output = (K, V);
    fn reduce(&mut self, group: Group<'_, K, V>, output: &mut Vec<(K, V)>) {
        output.extend(group.map(|(key, value)| (key.clone(), value.clone())));
    }
}

/// Buffers each group and emits it sorted by `compare`, keyed by the group's key.
///
/// The sort is stable, so values that compare equal keep their delivered order.
pub struct SortWithin<F> {
    compare: F,
}

impl<F> SortWithin<F> {
    /// Sorts groups with `compare`.
    pub fn new(compare: F) -> Self {
        SortWithin { compare }
    }
}

impl<K, V, F> Reducer<K, V> for SortWithin<F>
where
    K: Clone,
    V: Clone,
    F: FnMut(&V, &V) -> Ordering,
{
    type Output = (K, V);
    fn reduce(&mut self, group: Group<'_, K, V>, output: &mut Vec<(K, V)>) {
        let key = group.key().clone();
        let mut values: Vec<V> = group.values().cloned().collect();
        values.sort_by(&mut self.compare);
        output.extend(values.into_iter().map(|value| (key.clone(), value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{compare, CompositeKey};
    use crate::group::sort_run;
    use crate::operators::reduce_run;
    use crate::order::same_group;

    #[test]
    fn reorder_keeps_delivered_order() {
        let mut run = vec![
            (CompositeKey::new(2, 40), "d"),
            (CompositeKey::new(1, 30), "b"),
            (CompositeKey::new(1, 20), "a"),
            (CompositeKey::new(1, 50), "c"),
        ];
        sort_run(&mut run, compare);
        let mut output = Vec::new();
        assert_eq!(reduce_run(&run, same_group, &mut Reorder, &mut output), 2);
        let values: Vec<&str> = output.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn sort_within_orders_by_value() {
        let run = vec![(7, (3, "x")), (7, (1, "y")), (7, (2, "z")), (7, (1, "w")), (8, (0, "v"))];
        let mut reducer = SortWithin::new(|a: &(i32, &str), b: &(i32, &str)| a.0.cmp(&b.0));
        let mut output = Vec::new();
        reduce_run(&run, |a: &i32, b: &i32| a == b, &mut reducer, &mut output);
        assert_eq!(output, vec![
            (7, (1, "y")), (7, (1, "w")), (7, (2, "z")), (7, (3, "x")), (8, (0, "v")),
        ]);
    }
}
