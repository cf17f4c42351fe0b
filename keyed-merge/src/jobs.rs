//! Complete jobs over employee and department lines.
//!
//! Each job parses its input splits, keys the records, and runs one shuffle on the chosen
//! [`Engine`]. Results are returned per partition wherever the partitioning is part of what the
//! job demonstrates, and flattened otherwise.
//!
//! | job | key | partition | order | grouping | reducer |
//! |---|---|---|---|---|---|
//! | [`sort_by_department_and_age`] | `(department, age)` | first field | full key | first field | [`Reorder`] |
//! | [`sort_within_department`] | department | hash | natural | whole key | [`SortWithin`] |
//! | [`reduce_side_join`] | `(department, tag)` | first field | full key | first field | [`TaggedJoin`] |
//! | [`map_side_join`] | department | hash | natural | whole key | [`BroadcastJoin`] |
//! | [`sorted_merge_join`] | department | hash | natural | whole key | [`Reorder`], twice, then [`merge_join`] |
//! | [`merge_by_department`] | department | hash | natural | whole key | [`CoGroup`] |
//! | [`average_age`] | constant | single | natural | whole key | [`Average`] |
//! | [`partial_sort_by_age`] | age | hash | natural | whole key | [`Reorder`] |
//! | [`total_order_sort_by_age`] | age | range | natural | whole key | [`Reorder`] |
//! | [`word_count`] | word | hash | natural | whole key | [`Sum`] |

use std::cmp::Ordering;
use std::sync::Arc;

use log::info;

use crate::boundary::BoundaryTable;
use crate::config::JobConfig;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::key::{compare, CompositeKey};
use crate::operators::{concat_csv, merge_join, Average, BroadcastJoin, CoGroup, Reorder, SideTable, SortWithin, Sum, TaggedJoin};
use crate::order::{descending, same_group};
use crate::partition::{by_range, first_field};
use crate::record::{parse_valid, Department, Employee};
use crate::sample::{sample, SamplerConfig};

/// Parses each split of employee lines.
pub fn employees<S: AsRef<str>>(splits: &[Vec<S>]) -> Vec<Vec<Employee>> {
    splits.iter().map(|split| parse_valid::<Employee, _>(split).collect()).collect()
}

/// Parses each split of department lines.
pub fn departments<S: AsRef<str>>(splits: &[Vec<S>]) -> Vec<Vec<Department>> {
    splits.iter().map(|split| parse_valid::<Department, _>(split).collect()).collect()
}

fn keyed<T, K, V, F>(splits: Vec<Vec<T>>, logic: F) -> Vec<Vec<(K, V)>>
where
    F: Fn(T) -> (K, V),
{
    splits.into_iter().map(|split| split.into_iter().map(&logic).collect()).collect()
}

fn values<K, V>(partitions: Vec<Vec<(K, V)>>) -> Vec<Vec<V>> {
    partitions.into_iter().map(|part| part.into_iter().map(|(_, value)| value).collect()).collect()
}

/// Secondary sort: employees grouped by department, arriving sorted by age within each group.
///
/// Partitions list departments in ascending order, and each department's employees by
/// ascending age.
pub fn sort_by_department_and_age<S: AsRef<str>>(engine: Engine, partitions: usize, splits: &[Vec<S>]) -> Result<Vec<Vec<Employee>>> {
    let config = JobConfig::new(partitions)
        .with_partition(first_field)
        .with_order(compare)
        .with_grouping(same_group);
    let sources = keyed(employees(splits), |e| (CompositeKey::new(e.department_id, e.age), e));
    Ok(values(engine.run(&config, sources, |_| Reorder)?))
}

/// Employees grouped by department and sorted by age inside the reducer.
pub fn sort_within_department<S: AsRef<str>>(engine: Engine, partitions: usize, splits: &[Vec<S>]) -> Result<Vec<Vec<Employee>>> {
    let config = JobConfig::new(partitions);
    let sources = keyed(employees(splits), |e| (e.department_id, e));
    let by_age = |e1: &Employee, e2: &Employee| e1.age.cmp(&e2.age);
    Ok(values(engine.run(&config, sources, move |_| SortWithin::new(by_age))?))
}

/// Reduce-side inner join of departments against employees: `(department, "name,employee")`.
pub fn reduce_side_join<S: AsRef<str>>(
    engine: Engine,
    partitions: usize,
    department_splits: &[Vec<S>],
    employee_splits: &[Vec<S>],
) -> Result<Vec<Vec<(i32, String)>>> {
    let config = JobConfig::new(partitions)
        .with_partition(first_field)
        .with_order(compare)
        .with_grouping(same_group);
    let mut sources = keyed(departments(department_splits), |d| (CompositeKey::dimension(d.id), d.name));
    sources.extend(keyed(employees(employee_splits), |e| (CompositeKey::fact(e.department_id), e.to_string())));
    engine.run(&config, sources, |_| TaggedJoin::new(concat_csv::<String, String>))
}

/// Map-side inner join: every worker holds `table` and looks each employee up in it.
pub fn map_side_join<S: AsRef<str>>(
    engine: Engine,
    partitions: usize,
    table: &SideTable,
    employee_splits: &[Vec<S>],
) -> Result<Vec<Vec<(i32, String)>>> {
    let config = JobConfig::new(partitions);
    let sources = keyed(employees(employee_splits), |e| (e.department_id, e));
    let table = table.clone();
    engine.run(&config, sources, move |_| BroadcastJoin::new(table.clone()))
}

/// Map-only inner join against a side table, with no shuffle at all.
pub fn side_table_join<S: AsRef<str>>(table: &SideTable, employee_splits: &[Vec<S>]) -> Vec<(i32, String)> {
    employees(employee_splits)
        .iter()
        .flatten()
        .filter_map(|employee| table.join(employee))
        .collect()
}

/// Inner join of pre-sorted sources: each source is sorted on its own by a shuffle, and the
/// matching partitions of the two are merged without tags.
///
/// Both shuffles share one partitioner, so partition `i` of each source holds the same
/// department ids, sorted.
pub fn sorted_merge_join<S: AsRef<str>>(
    engine: Engine,
    partitions: usize,
    department_splits: &[Vec<S>],
    employee_splits: &[Vec<S>],
) -> Result<Vec<Vec<(i32, String)>>> {
    let config = JobConfig::new(partitions);
    let dims = engine.run(&config, keyed(departments(department_splits), |d| (d.id, d.name)), |_| Reorder)?;
    let facts = engine.run(&config, keyed(employees(employee_splits), |e| (e.department_id, e)), |_| Reorder)?;
    Ok(dims
        .iter()
        .zip(facts.iter())
        .map(|(dims, facts)| {
            let mut output = Vec::new();
            merge_join(dims, facts, |id, name, employee| concat_csv(*id, name, employee), &mut output);
            output
        })
        .collect())
}

/// Co-groups departments and employees by department id, each rendered as a CSV line.
pub fn merge_by_department<S: AsRef<str>>(
    engine: Engine,
    partitions: usize,
    department_splits: &[Vec<S>],
    employee_splits: &[Vec<S>],
) -> Result<Vec<(i32, Vec<String>)>> {
    let config = JobConfig::new(partitions);
    let mut sources = keyed(departments(department_splits), |d| (d.id, d.to_string()));
    sources.extend(keyed(employees(employee_splits), |e| (e.department_id, e.to_string())));
    let mut merged: Vec<(i32, Vec<String>)> = engine.run(&config, sources, |_| CoGroup)?.into_iter().flatten().collect();
    merged.sort_by_key(|(id, _)| *id);
    Ok(merged)
}

/// Average age over every valid employee, as one synthetic group.
pub fn average_age<S: AsRef<str>>(engine: Engine, splits: &[Vec<S>]) -> Result<f64> {
    let config = JobConfig::new(1);
    let sources = keyed(employees(splits), |e| ((), e));
    let averages = engine.run(&config, sources, |_| Average::new(|e: &Employee| i64::from(e.age)))?;
    averages.into_iter().flatten().map(|(_, mean)| mean).next().ok_or(Error::EmptyGroup)
}

/// Average age per department, in ascending department order.
pub fn average_age_by_department<S: AsRef<str>>(engine: Engine, partitions: usize, splits: &[Vec<S>]) -> Result<Vec<(i32, f64)>> {
    let config = JobConfig::new(partitions);
    let sources = keyed(employees(splits), |e| (e.department_id, i64::from(e.age)));
    let mut averages: Vec<(i32, f64)> = engine.run(&config, sources, |_| Average::new(|age: &i64| *age))?.into_iter().flatten().collect();
    averages.sort_by_key(|(id, _)| *id);
    Ok(averages)
}

/// Sorts employees by age within hash partitions. Each partition is sorted; their
/// concatenation in general is not.
pub fn partial_sort_by_age<S: AsRef<str>>(engine: Engine, partitions: usize, splits: &[Vec<S>]) -> Result<Vec<Vec<Employee>>> {
    let config = JobConfig::new(partitions);
    let sources = keyed(employees(splits), |e| (e.age, e));
    Ok(values(engine.run(&config, sources, |_| Reorder)?))
}

/// Sorts employees by descending age within hash partitions.
pub fn descending_sort_by_age<S: AsRef<str>>(engine: Engine, partitions: usize, splits: &[Vec<S>]) -> Result<Vec<Vec<Employee>>> {
    let config = JobConfig::new(partitions).with_order(descending::<i32>);
    let sources = keyed(employees(splits), |e| (e.age, e));
    Ok(values(engine.run(&config, sources, |_| Reorder)?))
}

/// Globally sorts employees by age across `partitions` range partitions.
///
/// Runs in three passes: re-keys each split by age, samples the ages into a boundary table, and
/// sorts with the range partitioner the table defines. Returns the table and the partitions,
/// whose concatenation is sorted by age.
pub fn total_order_sort_by_age<S: AsRef<str>>(
    engine: Engine,
    partitions: usize,
    sampler: &SamplerConfig,
    splits: &[Vec<S>],
) -> Result<(BoundaryTable<i32>, Vec<Vec<Employee>>)> {
    let sources = keyed(employees(splits), |e| (e.age, e));
    let keys: Vec<Vec<i32>> = sources.iter().map(|split| split.iter().map(|(age, _)| *age).collect()).collect();

    let table = sample(&keys, sampler, partitions)?;
    table.check_partitions(partitions)?;
    info!("boundary table for {} partitions: {:?}", partitions, table.splitters());

    let config = JobConfig::new(partitions).with_partition_fn(by_range(Arc::new(table.clone())));
    let sorted = values(engine.run(&config, sources, |_| Reorder)?);
    Ok((table, sorted))
}

/// Counts words across lines, summing partial counts per split before the shuffle.
pub fn word_count<S: AsRef<str>>(engine: Engine, partitions: usize, splits: &[Vec<S>]) -> Result<Vec<(String, i64)>> {
    let config = JobConfig::new(partitions);
    let sources: Vec<Vec<(String, i64)>> = splits
        .iter()
        .map(|split| {
            split.iter()
                .flat_map(|line| line.as_ref().split_whitespace().map(|word| (word.to_string(), 1)).collect::<Vec<_>>())
                .collect()
        })
        .collect();
    let mut counts: Vec<(String, i64)> = engine.run_with_combiner(&config, sources, Sum, |_| Sum)?.into_iter().flatten().collect();
    counts.sort_by(|(w1, c1), (w2, c2)| c2.cmp(c1).then_with(|| w1.cmp(w2)));
    Ok(counts)
}

/// Orders employees as the secondary sort delivers them.
pub fn by_department_then_age(e1: &Employee, e2: &Employee) -> Ordering {
    compare(&CompositeKey::new(e1.department_id, e1.age), &CompositeKey::new(e2.department_id, e2.age))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::hashed;

    fn staff() -> Vec<Vec<&'static str>> {
        vec![
            vec!["1,Alice,30,50000,10", "2,Bob,45,60000,20", "garbage", "3,Carol,25,55000,10"],
            vec!["4,Dan,50,70000,10", "5,Eve,35,65000,30", "6,Frank,bad,1,10"],
        ]
    }

    fn depts() -> Vec<Vec<&'static str>> {
        vec![vec!["10,Sales", "20,Research"], vec!["40,Legal"]]
    }

    #[test]
    fn secondary_sort() {
        let sorted = sort_by_department_and_age(Engine::Local, 1, &staff()).unwrap();
        let ids: Vec<i32> = sorted[0].iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1, 4, 2, 5]);
    }

    #[test]
    fn reduce_side_join_is_inner() {
        let joined: Vec<(i32, String)> = reduce_side_join(Engine::Local, 2, &depts(), &staff()).unwrap().into_iter().flatten().collect();
        let mut lines: Vec<&str> = joined.iter().map(|(_, line)| line.as_str()).collect();
        lines.sort();
        assert_eq!(lines, vec![
            "Research,2,Bob,45,60000,20",
            "Sales,1,Alice,30,50000,10",
            "Sales,3,Carol,25,55000,10",
            "Sales,4,Dan,50,70000,10",
        ]);
    }

    fn all_strategies(depts: &[Vec<&str>], staff: &[Vec<&str>]) -> [Vec<(i32, String)>; 4] {
        let table = SideTable::from_lines(depts.concat());
        let mut joins = [
            reduce_side_join(Engine::Local, 3, depts, staff).unwrap().concat(),
            map_side_join(Engine::Local, 3, &table, staff).unwrap().concat(),
            side_table_join(&table, staff),
            sorted_merge_join(Engine::Local, 3, depts, staff).unwrap().concat(),
        ];
        for joined in joins.iter_mut() {
            joined.sort();
        }
        joins
    }

    #[test]
    fn join_strategies_agree() {
        let [tagged, broadcast, map_only, merged] = all_strategies(&depts(), &staff());
        assert_eq!(tagged.len(), 4);
        assert_eq!(tagged, broadcast);
        assert_eq!(tagged, map_only);
        assert_eq!(tagged, merged);
    }

    #[test]
    fn repeated_department_joins_least_name() {
        let depts = vec![vec!["10,Sales"], vec!["10,Marketing", "20,Research"]];
        let staff = vec![vec!["1,Alice,30,50000,10"]];
        for joined in all_strategies(&depts, &staff) {
            assert_eq!(joined, vec![(10, "Marketing,1,Alice,30,50000,10".to_string())]);
        }
        let reversed: Vec<Vec<&str>> = depts.iter().rev().cloned().collect();
        for joined in all_strategies(&reversed, &staff) {
            assert_eq!(joined, vec![(10, "Marketing,1,Alice,30,50000,10".to_string())]);
        }
    }

    #[test]
    fn merge_join_partitions_align() {
        let joined = sorted_merge_join(Engine::Local, 4, &depts(), &staff()).unwrap();
        assert_eq!(joined.len(), 4);
        for (index, partition) in joined.iter().enumerate() {
            for (id, _) in partition {
                assert_eq!(hashed(id, 4), index);
            }
        }
    }

    #[test]
    fn averages() {
        assert_eq!(average_age(Engine::Local, &staff()).unwrap(), 37.0);
        assert_eq!(average_age_by_department(Engine::Local, 2, &staff()).unwrap(), vec![(10, 35.0), (20, 45.0), (30, 35.0)]);
        let nobody: Vec<Vec<&str>> = vec![vec!["junk"]];
        assert!(matches!(average_age(Engine::Local, &nobody), Err(Error::EmptyGroup)));
    }

    #[test]
    fn merge_collects_both_sources() {
        let merged = merge_by_department(Engine::Local, 2, &depts(), &staff()).unwrap();
        let sizes: Vec<(i32, usize)> = merged.iter().map(|(id, group)| (*id, group.len())).collect();
        assert_eq!(sizes, vec![(10, 4), (20, 2), (30, 1), (40, 1)]);
        assert_eq!(merged[0].1[0], "10,Sales");
    }

    #[test]
    fn descending_within_partition() {
        let sorted = descending_sort_by_age(Engine::Local, 1, &staff()).unwrap();
        let ages: Vec<i32> = sorted[0].iter().map(|e| e.age).collect();
        assert_eq!(ages, vec![50, 45, 35, 30, 25]);
    }

    #[test]
    fn words() {
        let lines = vec![vec!["a b a", "c"], vec!["b a"]];
        let counts = word_count(Engine::Local, 2, &lines).unwrap();
        assert_eq!(counts, vec![("a".to_string(), 3), ("b".to_string(), 2), ("c".to_string(), 1)]);
    }
}
