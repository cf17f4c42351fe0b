//! An in-process shuffle: route, sort, group, reduce.
//!
//! [`Shuffle`] is the single-threaded counterpart of the timely operator in [`crate::dataflow`].
//! Records are routed to per-partition buffers as they are emitted. Once all sources are done,
//! each buffer is stably sorted by the job's order function, cut into groups by its grouping
//! function, and delivered to a fresh reducer for that partition.
//!
//! The shuffle is deterministic: partition `i` of the result is exactly what a reducer for
//! partition `i` produced, and records with equal order keys reach it in emission order.

use log::{debug, trace};

use crate::config::JobConfig;
use crate::error::Result;
use crate::group::{groups, sort_run};
use crate::operators::{reduce_run, Reducer};

/// Per-partition buffers of emitted records.
pub struct Shuffle<K, V> {
    config: JobConfig<K>,
    buffers: Vec<Vec<(K, V)>>,
}

impl<K, V> Shuffle<K, V> {
    /// An empty shuffle for `config`.
    pub fn new(config: JobConfig<K>) -> Result<Self> {
        config.validate()?;
        let buffers = (0 .. config.partitions).map(|_| Vec::new()).collect();
        Ok(Shuffle { config, buffers })
    }

    /// Routes one record to its partition.
    pub fn emit(&mut self, key: K, value: V) -> Result<()> {
        let index = self.config.partition_of(&key)?;
        self.buffers[index].push((key, value));
        Ok(())
    }

    /// Routes every record of `records`.
    pub fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, records: I) -> Result<()> {
        for (key, value) in records {
            self.emit(key, value)?;
        }
        Ok(())
    }

    /// Number of records buffered for each partition.
    pub fn loads(&self) -> Vec<usize> {
        self.buffers.iter().map(Vec::len).collect()
    }

    /// Sorts and groups each partition, reducing it with the reducer `logic` builds for it.
    pub fn finish<R, L>(self, mut logic: L) -> Vec<Vec<R::Output>>
    where
        R: Reducer<K, V>,
        L: FnMut(usize) -> R,
    {
        let Shuffle { config, buffers } = self;
        let mut results = Vec::with_capacity(buffers.len());
        for (index, mut run) in buffers.into_iter().enumerate() {
            sort_run(&mut run, &*config.order);
            let mut reducer = logic(index);
            let mut output = Vec::new();
            let delivered = reduce_run(&run, &*config.grouping, &mut reducer, &mut output);
            debug!("partition {}: {} records in {} groups produced {} outputs", index, run.len(), delivered, output.len());
            results.push(output);
        }
        results
    }
}

/// Shuffles `sources` under `config` and reduces each partition.
pub fn run<K, V, R, L>(config: &JobConfig<K>, sources: Vec<Vec<(K, V)>>, logic: L) -> Result<Vec<Vec<R::Output>>>
where
    R: Reducer<K, V>,
    L: FnMut(usize) -> R,
{
    let mut shuffle = Shuffle::new(config.clone())?;
    for source in sources {
        shuffle.extend(source)?;
    }
    trace!("partition loads: {:?}", shuffle.loads());
    Ok(shuffle.finish(logic))
}

/// As [`run`], but first reduces each source split locally with `combiner`.
///
/// The combiner sees only its own split's records, grouped as the reducer would group them, and
/// its output is shuffled in their place. It must therefore be safe to apply zero or more times.
pub fn run_with_combiner<K, V, C, R, L>(
    config: &JobConfig<K>,
    sources: Vec<Vec<(K, V)>>,
    mut combiner: C,
    logic: L,
) -> Result<Vec<Vec<R::Output>>>
where
    C: Reducer<K, V, Output = (K, V)>,
    R: Reducer<K, V>,
    L: FnMut(usize) -> R,
{
    let mut shuffle = Shuffle::new(config.clone())?;
    for mut source in sources {
        let before = source.len();
        sort_run(&mut source, &*config.order);
        let mut combined = Vec::new();
        reduce_run(&source, &*config.grouping, &mut combiner, &mut combined);
        trace!("combined {} records into {}", before, combined.len());
        shuffle.extend(combined)?;
    }
    Ok(shuffle.finish(logic))
}

/// Shuffles `sources` and visits each group's records, in order, with `visit`.
///
/// `visit` receives the partition index, the group's first key, and the group's values.
pub fn for_each_group<K, V, F>(config: &JobConfig<K>, sources: Vec<Vec<(K, V)>>, mut visit: F) -> Result<()>
where
    F: FnMut(usize, &K, &[&V]),
{
    let mut shuffle = Shuffle::new(config.clone())?;
    for source in sources {
        shuffle.extend(source)?;
    }
    let Shuffle { config: job, buffers } = shuffle;
    for (index, mut run) in buffers.into_iter().enumerate() {
        sort_run(&mut run, &*job.order);
        for group in groups(&run, &*job.grouping) {
            let key = group.key();
            let values: Vec<&V> = group.values().collect();
            visit(index, key, &values);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{compare, CompositeKey};
    use crate::operators::{Reorder, Sum};
    use crate::order::same_group;
    use crate::partition::first_field;

    fn tagged_config(partitions: usize) -> JobConfig<CompositeKey> {
        JobConfig::new(partitions)
            .with_partition(first_field)
            .with_order(compare)
            .with_grouping(same_group)
    }

    #[test]
    fn groups_are_whole_within_partitions() {
        let sources = vec![
            vec![(CompositeKey::fact(1), 'a'), (CompositeKey::fact(2), 'b')],
            vec![(CompositeKey::dimension(2), 'X'), (CompositeKey::dimension(1), 'Y'), (CompositeKey::fact(1), 'c')],
        ];
        let mut seen = Vec::new();
        for_each_group(&tagged_config(3), sources, |index, key, values| {
            seen.push((index, key.group, values.iter().map(|v| **v).collect::<String>()));
        }).unwrap();
        seen.sort();
        let expect_1 = first_field(&CompositeKey::fact(1), 3);
        let expect_2 = first_field(&CompositeKey::fact(2), 3);
        let mut expected = vec![(expect_1, 1, "Yac".to_string()), (expect_2, 2, "Xb".to_string())];
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn every_record_is_delivered_once() {
        let sources: Vec<Vec<(u32, u32)>> = (0 .. 4).map(|s| (0 .. 25).map(|x| (x % 7, s * 100 + x)).collect()).collect();
        let results = run(&JobConfig::new(3), sources, |_| Reorder).unwrap();
        assert_eq!(results.len(), 3);
        let mut values: Vec<u32> = results.into_iter().flatten().map(|(_, v)| v).collect();
        values.sort();
        let mut expected: Vec<u32> = (0 .. 4).flat_map(|s| (0 .. 25).map(move |x| s * 100 + x)).collect();
        expected.sort();
        assert_eq!(values, expected);
    }

    #[test]
    fn combiner_preserves_sums() {
        let sources: Vec<Vec<(&str, i64)>> = vec![
            vec![("a", 1), ("b", 1), ("a", 1)],
            vec![("a", 1), ("c", 1)],
        ];
        let config = JobConfig::new(2);
        let plain = run(&config, sources.clone(), |_| Sum).unwrap();
        let combined = run_with_combiner(&config, sources, Sum, |_| Sum).unwrap();
        assert_eq!(plain, combined);
        let mut totals: Vec<(&str, i64)> = combined.into_iter().flatten().collect();
        totals.sort();
        assert_eq!(totals, vec![("a", 3), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn zero_partitions_rejected() {
        assert!(run(&JobConfig::<u32>::new(0), vec![vec![(1u32, ())]], |_| Reorder).is_err());
    }
}
