//! Shuffle and reduce on timely dataflow workers.
//!
//! [`ShuffleReduce`] extends timely streams of `(key, value)` pairs with an operator that routes
//! each record to the worker its partition function names, waits until the input frontier has
//! passed a timestamp, and then sorts, groups, and reduces everything received for it. Each
//! worker owns one reducer, which sees the groups of every timestamp in turn.
//!
//! [`execute`] wraps the operator in a complete computation with one worker per partition, so that
//! partition `i` of a job is reduced by worker `i`.

use std::sync::{mpsc, Arc};

use log::{info, trace};
use timely::container::CapacityContainerBuilder;
use timely::dataflow::channels::pact::{Exchange, ParallelizationContract, Pipeline};
use timely::dataflow::operators::capture::{Capture, Event};
use timely::dataflow::operators::vec::Map;
use timely::dataflow::operators::{Capability, Operator, ToStream};
use timely::dataflow::{Scope, StreamVec};
use timely::ExchangeData;

use crate::config::JobConfig;
use crate::error::{Error, Result};
use crate::group::sort_run;
use crate::operators::{reduce_run, Reducer, Reorder};
use crate::order::{GroupFn, OrderFn};

/// Extension trait for shuffling and reducing keyed streams.
pub trait ShuffleReduce<G: Scope, K, V> {
    /// Routes records by `config.partition` and reduces each worker's share with the reducer
    /// `logic` builds for that worker's index.
    ///
    /// Partition `p` is delivered to worker `p % peers`, so every group lands whole on one worker.
    fn shuffle_reduce<R, L>(self, config: &JobConfig<K>, logic: L) -> StreamVec<G, R::Output>
    where
        R: Reducer<K, V> + 'static,
        R::Output: 'static,
        L: FnOnce(usize) -> R;

    /// Reduces each worker's records in place, without routing them, with `combiner`.
    fn combine<C>(self, config: &JobConfig<K>, combiner: C) -> StreamVec<G, (K, V)>
    where
        C: Reducer<K, V, Output = (K, V)> + 'static;
}

impl<G, K, V> ShuffleReduce<G, K, V> for StreamVec<G, (K, V)>
where
    G: Scope,
    K: ExchangeData,
    V: ExchangeData,
{
    fn shuffle_reduce<R, L>(self, config: &JobConfig<K>, logic: L) -> StreamVec<G, R::Output>
    where
        R: Reducer<K, V> + 'static,
        R::Output: 'static,
        L: FnOnce(usize) -> R,
    {
        let partition = Arc::clone(&config.partition);
        let partitions = config.partitions;
        let reducer = logic(self.scope().index());
        reduce_at_frontier(
            self,
            Exchange::new(move |(key, _): &(K, V)| partition(key, partitions) as u64),
            "ShuffleReduce",
            &config.order,
            &config.grouping,
            reducer,
        )
    }

    fn combine<C>(self, config: &JobConfig<K>, combiner: C) -> StreamVec<G, (K, V)>
    where
        C: Reducer<K, V, Output = (K, V)> + 'static,
    {
        reduce_at_frontier(self, Pipeline, "Combine", &config.order, &config.grouping, combiner)
    }
}

/// Stashes records by timestamp and reduces each timestamp once the frontier has passed it.
fn reduce_at_frontier<G, K, V, P, R>(
    stream: StreamVec<G, (K, V)>,
    pact: P,
    name: &str,
    order: &OrderFn<K>,
    grouping: &GroupFn<K>,
    mut reducer: R,
) -> StreamVec<G, R::Output>
where
    G: Scope,
    K: 'static,
    V: 'static,
    P: ParallelizationContract<G::Timestamp, Vec<(K, V)>>,
    R: Reducer<K, V> + 'static,
    R::Output: 'static,
{
    let order = Arc::clone(order);
    let grouping = Arc::clone(grouping);
    let label = name.to_string();

    stream.unary_frontier::<CapacityContainerBuilder<Vec<R::Output>>, _, _, _>(pact, name, move |_capability, info| {

        let mut stash: Vec<(Capability<G::Timestamp>, Vec<(K, V)>)> = Vec::new();
        let worker = info.global_id;

        move |(input, frontier), output| {

            let port = output.output_index();
            input.for_each(|capability, data| {
                match stash.iter().position(|(held, _)| held.time() == capability.time()) {
                    Some(position) => stash[position].1.append(data),
                    None => stash.push((capability.retain(port), std::mem::take(data))),
                }
            });

            // reduce every timestamp the input can no longer produce.
            let mut position = 0;
            while position < stash.len() {
                if !frontier.less_equal(stash[position].0.time()) {
                    let (capability, mut run) = stash.swap_remove(position);
                    sort_run(&mut run, &*order);
                    let mut produced = Vec::new();
                    let delivered = reduce_run(&run, &*grouping, &mut reducer, &mut produced);
                    trace!("{} (operator {}): {} records, {} groups, {} outputs", label, worker, run.len(), delivered, produced.len());
                    output.session(&capability).give_iterator(produced.into_iter());
                }
                else {
                    position += 1;
                }
            }
        }
    })
}

/// Runs a job on one timely worker per partition and collects each partition's outputs.
///
/// Worker `i` reads the sources at indices congruent to `i`, so sources are spread across workers
/// before the shuffle. The result holds one vector per partition, in partition order.
pub fn execute<K, V, R, L>(config: &JobConfig<K>, sources: Vec<Vec<(K, V)>>, logic: L) -> Result<Vec<Vec<R::Output>>>
where
    K: ExchangeData + Clone + Sync,
    V: ExchangeData + Clone + Sync,
    R: Reducer<K, V> + 'static,
    R::Output: Send + 'static,
    L: Fn(usize) -> R + Send + Sync + 'static,
{
    execute_inner(config, sources, None::<Reorder>, logic)
}

/// As [`execute`], but each worker first combines its own records with a clone of `combiner`.
pub fn execute_with_combiner<K, V, C, R, L>(
    config: &JobConfig<K>,
    sources: Vec<Vec<(K, V)>>,
    combiner: C,
    logic: L,
) -> Result<Vec<Vec<R::Output>>>
where
    K: ExchangeData + Clone + Sync,
    V: ExchangeData + Clone + Sync,
    C: Reducer<K, V, Output = (K, V)> + Clone + Send + Sync + 'static,
    R: Reducer<K, V> + 'static,
    R::Output: Send + 'static,
    L: Fn(usize) -> R + Send + Sync + 'static,
{
    execute_inner(config, sources, Some(combiner), logic)
}

fn execute_inner<K, V, C, R, L>(
    config: &JobConfig<K>,
    sources: Vec<Vec<(K, V)>>,
    combiner: Option<C>,
    logic: L,
) -> Result<Vec<Vec<R::Output>>>
where
    K: ExchangeData + Clone + Sync,
    V: ExchangeData + Clone + Sync,
    C: Reducer<K, V, Output = (K, V)> + Clone + Send + Sync + 'static,
    R: Reducer<K, V> + 'static,
    R::Output: Send + 'static,
    L: Fn(usize) -> R + Send + Sync + 'static,
{
    config.validate()?;
    let partitions = config.partitions;
    let records: usize = sources.iter().map(Vec::len).sum();
    info!("executing job: {} records in {} sources over {} workers", records, sources.len(), partitions);

    let sources = Arc::new(sources);
    let config = config.clone();
    let (sender, receiver) = mpsc::channel();

    let guards = timely::execute(timely::Config::process(partitions), move |worker| {
        let index = worker.index();
        let peers = worker.peers();
        let sender = sender.clone();
        let mine: Vec<(K, V)> = sources
            .iter()
            .skip(index)
            .step_by(peers)
            .flat_map(|source| source.iter().cloned())
            .collect();

        worker.dataflow::<u64, _, _>(|scope| {
            let mut stream: StreamVec<_, (K, V)> = mine.to_stream(scope);
            if let Some(combiner) = &combiner {
                stream = stream.combine(&config, combiner.clone());
            }
            stream
                .shuffle_reduce(&config, &logic)
                .map(move |produced| (index, produced))
                .capture_into(sender);
        });
    }).map_err(Error::Execution)?;

    for result in guards.join() {
        result.map_err(Error::Execution)?;
    }

    let mut results: Vec<Vec<R::Output>> = (0 .. partitions).map(|_| Vec::new()).collect();
    for event in receiver.try_iter() {
        if let Event::Messages(_time, data) = event {
            for (index, produced) in data {
                results[index].push(produced);
            }
        }
    }
    info!("job complete: {} outputs", results.iter().map(Vec::len).sum::<usize>());
    Ok(results)
}
