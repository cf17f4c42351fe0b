//! Ordering and grouping functions.
//!
//! A job supplies two separate functions over keys. The *order* function sorts every record a
//! worker receives; the *grouping* function decides where one group ends and the next begins.
//! Secondary sort is the case where the order function inspects more of the key than the
//! grouping function does: records of one group stay together, but arrive sorted by the rest of
//! the key.
//!
//! The grouping function must agree with the order function, in that keys which group together
//! are contiguous once sorted. Any grouping on a prefix of the ordered fields satisfies this.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::key::CompositeKey;

/// A shareable total order over keys.
pub type OrderFn<K> = Arc<dyn Fn(&K, &K) -> Ordering + Send + Sync>;

/// A shareable grouping predicate over keys.
pub type GroupFn<K> = Arc<dyn Fn(&K, &K) -> bool + Send + Sync>;

/// The key type's own order.
#[inline]
pub fn natural<K: Ord>(k1: &K, k2: &K) -> Ordering {
    k1.cmp(k2)
}

/// The reverse of the key type's own order.
#[inline]
pub fn descending<K: Ord>(k1: &K, k2: &K) -> Ordering {
    k2.cmp(k1)
}

/// Groups composite keys by their grouping field, ignoring the tag.
#[inline]
pub fn same_group(k1: &CompositeKey, k2: &CompositeKey) -> bool {
    k1.group == k2.group
}

/// Groups keys only when they are entirely equal.
#[inline]
pub fn whole_key<K: Eq>(k1: &K, k2: &K) -> bool {
    k1 == k2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::compare;

    #[test]
    fn grouping_is_coarser_than_order() {
        let a = CompositeKey::dimension(10);
        let b = CompositeKey::fact(10);
        assert!(same_group(&a, &b));
        assert_ne!(compare(&a, &b), Ordering::Equal);
        assert!(!whole_key(&a, &b));
        assert!(!same_group(&a, &CompositeKey::dimension(11)));
    }

    #[test]
    fn descending_reverses() {
        let mut values = vec![3, 1, 2];
        values.sort_by(descending);
        assert_eq!(values, vec![3, 2, 1]);
        values.sort_by(natural);
        assert_eq!(values, vec![1, 2, 3]);
    }
}
