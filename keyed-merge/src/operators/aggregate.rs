//! Streaming aggregates over a group.

use log::warn;

use crate::error::{Error, Result};
use crate::group::Group;
use crate::operators::Reducer;

/// Running count and sum of a group.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Accumulator {
    /// Number of values seen.
    pub count: u64,
    /// Sum of values seen.
    pub sum: i64,
}

impl Accumulator {
    /// Adds one value.
    #[inline]
    pub fn push(&mut self, value: i64) {
        self.count += 1;
        self.sum += value;
    }

    /// The mean of the values seen, or [`Error::EmptyGroup`] if there were none.
    pub fn average(&self) -> Result<f64> {
        if self.count == 0 {
            return Err(Error::EmptyGroup);
        }
        Ok(self.sum as f64 / self.count as f64)
    }
}

/// The mean of `values`.
pub fn average<I: IntoIterator<Item = i64>>(values: I) -> Result<f64> {
    let mut accumulator = Accumulator::default();
    for value in values {
        accumulator.push(value);
    }
    accumulator.average()
}

/// Emits `(key, mean)` for each group, where `extract` selects the averaged attribute.
pub struct Average<F> {
    extract: F,
}

impl<F> Average<F> {
    /// Averages the attribute selected by `extract`.
    pub fn new(extract: F) -> Self {
        Average { extract }
    }
}

impl<K, V, F> Reducer<K, V> for Average<F>
where
    K: Clone,
    F: FnMut(&V) -> i64,
{
    type Output = (K, f64);
    fn reduce(&mut self, group: Group<'_, K, V>, output: &mut Vec<(K, f64)>) {
        let key = group.key().clone();
        let mut accumulator = Accumulator::default();
        for value in group.values() {
            accumulator.push((self.extract)(value));
        }
        match accumulator.average() {
            Ok(mean) => output.push((key, mean)),
            Err(error) => warn!("dropping group: {}", error),
        }
    }
}

/// Emits `(key, sum)` for each group of integer values.
///
/// Input and output share a shape, so `Sum` may also run as a combiner ahead of the shuffle.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sum;

impl<K: Clone> Reducer<K, i64> for Sum {
    type Output = (K, i64);
    fn reduce(&mut self, group: Group<'_, K, i64>, output: &mut Vec<(K, i64)>) {
        let key = group.key().clone();
        output.push((key, group.values().sum()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::reduce_run;

    #[test]
    fn averages() {
        assert_eq!(average(vec![30, 40, 50]).unwrap(), 40.0);
        assert_eq!(average(vec![25]).unwrap(), 25.0);
        assert_eq!(average(vec![1, 2]).unwrap(), 1.5);
        assert!(matches!(average(Vec::new()), Err(Error::EmptyGroup)));
    }

    #[test]
    fn average_per_group() {
        let run: Vec<(i32, i64)> = vec![(1, 30), (1, 40), (1, 50), (2, 25)];
        let mut output = Vec::new();
        reduce_run(&run, |x: &i32, y: &i32| x == y, &mut Average::new(|age: &i64| *age), &mut output);
        assert_eq!(output, vec![(1, 40.0), (2, 25.0)]);
    }

    #[test]
    fn sums_reset_between_groups() {
        let run: Vec<(&str, i64)> = vec![("a", 1), ("a", 2), ("b", 5), ("c", 1), ("c", 1)];
        let mut output = Vec::new();
        reduce_run(&run, |x: &&str, y: &&str| x == y, &mut Sum, &mut output);
        assert_eq!(output, vec![("a", 3), ("b", 5), ("c", 2)]);
    }
}
