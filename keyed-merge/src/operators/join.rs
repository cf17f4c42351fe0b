//! Joins of a dimension source against a fact source.
//!
//! Three strategies produce the same inner join of departments against employees:
//!
//! * [`TaggedJoin`] is the reduce-side join. Both sources are keyed by a [`CompositeKey`] whose
//!   tag places the dimension record first in its group; the reducer reads that record and
//!   prefixes it to every following fact record.
//! * [`BroadcastJoin`] and [`SideTable::join`] assume the dimension table is small enough to be
//!   loaded whole by every worker, and look each fact up in it.
//! * [`merge_join`] takes both sources already sorted by the grouping field and merges them with
//!   galloping cursors, with no tags and no grouping.
//!
//! All three are inner joins: a group without a dimension record, or a dimension record without
//! facts, produces nothing. When a dimension key repeats, every strategy joins against the least
//! of its values, whatever order the records arrived in.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::fmt::Display;
use std::marker::PhantomData;
use std::path::Path;

use fnv::FnvHashMap;
use log::{debug, info};

use crate::error::Result;
use crate::group::{advance, Group};
use crate::key::CompositeKey;
use crate::operators::Reducer;
use crate::record::{parse, Department, Employee};

/// Prefixes a dimension value to a fact value, separated by a comma.
pub fn concat_csv<D: Display, F: Display>(group: i32, dimension: &D, fact: &F) -> (i32, String) {
    (group, format!("{},{}", dimension, fact))
}

/// Reduce-side join over tagged composite keys.
///
/// `merge` receives the group's field, the dimension value, and one fact value.
pub struct TaggedJoin<F, O> {
    merge: F,
    phantom: PhantomData<fn() -> O>,
}

impl<F, O> TaggedJoin<F, O> {
    /// Joins with `merge`.
    pub fn new(merge: F) -> Self {
        TaggedJoin { merge, phantom: PhantomData }
    }
}

impl<V, F, O> Reducer<CompositeKey, V> for TaggedJoin<F, O>
where
    V: Ord,
    F: FnMut(i32, &V, &V) -> O,
{
    type Output = O;
    fn reduce(&mut self, group: Group<'_, CompositeKey, V>, output: &mut Vec<O>) {
        let size = group.len();
        // dimension records sort ahead of every fact in the group.
        let mut dimension: Option<&V> = None;
        for (key, value) in group {
            if key.is_dimension() {
                if dimension.is_some() {
                    debug!("group {}: repeated dimension record", key.group);
                }
                dimension = Some(dimension.map_or(value, |held| held.min(value)));
            }
            else {
                match dimension {
                    Some(dimension) => output.push((self.merge)(key.group, dimension, value)),
                    None => {
                        debug!("group {}: no dimension record; skipping {} facts", key.group, size);
                        return;
                    },
                }
            }
        }
    }
}

/// A dimension table held in memory by every worker.
#[derive(Debug, Clone, Default)]
pub struct SideTable {
    names: FnvHashMap<i32, String>,
}

impl SideTable {
    /// Builds the table from department lines, skipping invalid ones.
    ///
    /// A repeated department id keeps the least of its names.
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut names = FnvHashMap::default();
        for line in lines {
            if let Some(Department { id, name }) = parse::<Department>(line.as_ref()).valid() {
                match names.entry(id) {
                    Entry::Occupied(mut held) => {
                        debug!("department {}: repeated in side table", id);
                        if &name < held.get() {
                            held.insert(name);
                        }
                    },
                    Entry::Vacant(slot) => {
                        slot.insert(name);
                    },
                }
            }
        }
        SideTable { names }
    }

    /// Loads the table from a locally available department file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let table = Self::from_lines(text.lines());
        info!("loaded {} departments from {}", table.len(), path.as_ref().display());
        Ok(table)
    }

    /// The department name for `id`.
    pub fn get(&self, id: i32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Number of departments.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if the table holds no departments.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Joins a single employee without any shuffle.
    pub fn join(&self, employee: &Employee) -> Option<(i32, String)> {
        self.get(employee.department_id)
            .map(|name| concat_csv(employee.department_id, &name, employee))
    }
}

/// Reducer joining groups keyed by department id against a [`SideTable`].
pub struct BroadcastJoin {
    table: SideTable,
}

impl BroadcastJoin {
    /// Joins against `table`.
    pub fn new(table: SideTable) -> Self {
        BroadcastJoin { table }
    }
}

impl<V: Display> Reducer<i32, V> for BroadcastJoin {
    type Output = (i32, String);
    fn reduce(&mut self, group: Group<'_, i32, V>, output: &mut Vec<(i32, String)>) {
        let group_id = *group.key();
        match self.table.get(group_id) {
            Some(name) => output.extend(group.values().map(|fact| concat_csv(group_id, &name, fact))),
            None => debug!("department {}: not in side table; skipping {} facts", group_id, group.len()),
        }
    }
}

/// Collects each group's values into a single record.
///
/// This is the co-group of several sources mapped to a common key: every value routed to the
/// group, whatever its source, arrives in one output.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoGroup;

impl<K: Clone, V: Clone> Reducer<K, V> for CoGroup {
    type Output = (K, Vec<V>);
    fn reduce(&mut self, group: Group<'_, K, V>, output: &mut Vec<(K, Vec<V>)>) {
        let key = group.key().clone();
        output.push((key, group.values().cloned().collect()));
    }
}

/// Joins two sources sorted by key, calling `logic` for each fact with the least dimension
/// record of equal key.
///
/// Neither input is tagged or grouped. Runs of keys present in only one input are skipped with
/// exponential search.
pub fn merge_join<K, D, F, O, L>(dimensions: &[(K, D)], facts: &[(K, F)], mut logic: L, output: &mut Vec<O>)
where
    K: Ord,
    D: Ord,
    L: FnMut(&K, &D, &F) -> O,
{
    let mut dimensions = dimensions;
    let mut facts = facts;

    while let (Some((dim_key, _)), Some((fact_key, _))) = (dimensions.first(), facts.first()) {
        match dim_key.cmp(fact_key) {
            Ordering::Less => {
                let step = advance(dimensions, |(key, _)| key < fact_key);
                dimensions = &dimensions[step ..];
            },
            Ordering::Greater => {
                let step = advance(facts, |(key, _)| key < dim_key);
                facts = &facts[step ..];
            },
            Ordering::Equal => {
                let dim_len = advance(dimensions, |(key, _)| key == dim_key);
                let fact_len = advance(facts, |(key, _)| key == fact_key);
                let least = dimensions[.. dim_len].iter().map(|(_, dimension)| dimension).min();
                if let Some(dimension) = least {
                    for (_, fact) in &facts[.. fact_len] {
                        output.push(logic(dim_key, dimension, fact));
                    }
                }
                dimensions = &dimensions[dim_len ..];
                facts = &facts[fact_len ..];
            },
        }
    }
}
