extern crate itertools;
extern crate keyed_merge;
extern crate rand;

use std::cmp::Ordering;

use itertools::Itertools;
use rand::{Rng, SeedableRng, StdRng};

use keyed_merge::key::{compare, CompositeKey, DIMENSION_TAG, FACT_TAG};
use keyed_merge::order::same_group;
use keyed_merge::partition::first_field;
use keyed_merge::record::{Employee, Parsed};
use keyed_merge::shuffle::for_each_group;
use keyed_merge::JobConfig;

fn tagged_config(partitions: usize) -> JobConfig<CompositeKey> {
    JobConfig::new(partitions)
        .with_partition(first_field)
        .with_order(compare)
        .with_grouping(same_group)
}

#[test]
fn co_location() {
    let seed: &[_] = &[1, 2, 3, 4];
    let mut rng: StdRng = SeedableRng::from_seed(seed);
    for _ in 0 .. 10_000 {
        let group: i32 = rng.gen();
        let (tag1, tag2): (i32, i32) = (rng.gen(), rng.gen());
        let partitions = rng.gen_range(1, 64);
        let k1 = CompositeKey::new(group, tag1);
        let k2 = CompositeKey::new(group, tag2);
        assert_eq!(first_field(&k1, partitions), first_field(&k2, partitions));
        assert!(first_field(&k1, partitions) < partitions);
    }
}

#[test]
fn groups_arrive_whole_and_ordered() {
    let seed: &[_] = &[5, 6, 7, 8];
    let mut rng: StdRng = SeedableRng::from_seed(seed);
    let sources: Vec<Vec<(CompositeKey, u32)>> = (0 .. 6)
        .map(|_| {
            (0 .. 200)
                .map(|value| {
                    let tag = if rng.gen_range(0, 10) == 0 { DIMENSION_TAG } else { FACT_TAG };
                    (CompositeKey::new(rng.gen_range(-20, 20), tag), value)
                })
                .collect()
        })
        .collect();

    let mut seen_groups = Vec::new();
    let mut partition_keys: Vec<Vec<i32>> = vec![Vec::new(); 4];
    for_each_group(&tagged_config(4), sources.clone(), |partition, key, values| {
        seen_groups.push((key.group, values.len()));
        partition_keys[partition].push(key.group);
    }).unwrap();

    // a group appears once, with every record carrying its field.
    let expected: Vec<(i32, usize)> = sources
        .iter()
        .flatten()
        .map(|(key, _)| key.group)
        .sorted()
        .dedup_with_count()
        .map(|(count, group)| (group, count))
        .collect();
    assert_eq!(seen_groups.into_iter().sorted().collect::<Vec<_>>(), expected);

    // groups are visited in ascending order within each partition.
    for keys in partition_keys {
        assert!(keys.iter().tuple_windows().all(|(a, b)| a < b));
    }
}

#[test]
fn dimension_leads_its_group() {
    let sources = vec![
        vec![(CompositeKey::fact(3), "f1"), (CompositeKey::fact(4), "f2")],
        vec![(CompositeKey::dimension(4), "d4"), (CompositeKey::fact(3), "f3"), (CompositeKey::dimension(3), "d3")],
    ];
    let mut firsts = Vec::new();
    for_each_group(&tagged_config(2), sources, |_, key, values| {
        assert!(key.is_dimension());
        firsts.push(*values[0]);
    }).unwrap();
    firsts.sort();
    assert_eq!(firsts, vec!["d3", "d4"]);
}

#[test]
fn order_and_grouping_agree() {
    let keys: Vec<CompositeKey> = (-5 .. 5).flat_map(|g| (0 .. 3).map(move |t| CompositeKey::new(g, t))).collect();
    for (k1, k2) in keys.iter().tuple_combinations() {
        if compare(k1, k2) == Ordering::Equal {
            assert!(same_group(k1, k2));
        }
        // between two keys of one group, no key of another group may sort.
        if same_group(k1, k2) {
            let (low, high) = if compare(k1, k2) == Ordering::Less { (k1, k2) } else { (k2, k1) };
            for k3 in keys.iter().filter(|k| !same_group(k, k1)) {
                assert!(!(compare(low, k3) == Ordering::Less && compare(k3, high) == Ordering::Less));
            }
        }
    }
}

#[test]
fn parsing_is_idempotent() {
    let lines = [
        "1,Alice,30,50000,2",
        "1,Alice,bad,50000,2",
        "7,Bob,41,1,3,",
        "",
        ",,,,",
        "9,Zed,20,1,2,extra",
    ];
    for line in lines.iter() {
        match Employee::parse(line) {
            Parsed::Valid(employee) => {
                let rendered = employee.to_string();
                assert_eq!(Employee::parse(&rendered), Parsed::Valid(employee.clone()));
                assert_eq!(Employee::parse(&rendered).valid().map(|e| e.to_string()), Some(rendered));
            }
            Parsed::Invalid => { }
        }
    }
    assert_eq!(
        Employee::parse("1,Alice,30,50000,2"),
        Parsed::Valid(Employee { id: 1, name: "Alice".to_string(), age: 30, salary: 50000, department_id: 2 })
    );
    assert!(!Employee::parse("1,Alice,bad,50000,2").is_valid());
}

#[test]
fn partitioning_is_stable() {
    for group in -1000 .. 1000 {
        let key = CompositeKey::fact(group);
        assert_eq!(first_field(&key, 13), first_field(&key, 13));
        assert_eq!(compare(&key, &key), Ordering::Equal);
    }
}
