//! Runs every job over a generated employee table.
//!
//! Usage: `employees [local|timely] [partitions] [employees]`.

use keyed_merge::jobs;
use keyed_merge::operators::SideTable;
use keyed_merge::sample::SamplerConfig;
use keyed_merge::{Engine, Result};

fn main() -> Result<()> {
    env_logger::init();

    let engine: Engine = std::env::args().nth(1).unwrap_or_else(|| "local".to_string()).parse()?;
    let partitions: usize = std::env::args().nth(2).and_then(|x| x.parse().ok()).unwrap_or(4);
    let count: usize = std::env::args().nth(3).and_then(|x| x.parse().ok()).unwrap_or(1000);

    let names = ["Sales", "Research", "Legal", "Support", "Ops"];
    let departments: Vec<Vec<String>> = vec![
        names.iter().enumerate().map(|(index, name)| format!("{},{}", 10 * (index + 1), name)).collect(),
    ];
    let employees: Vec<Vec<String>> = (0 .. 8)
        .map(|split| {
            (split * count / 8 .. (split + 1) * count / 8)
                .map(|id| format!("{},emp{},{},{},{}", id, id, 20 + (id * 13) % 47, 30_000 + id, 10 * (1 + id % 6)))
                .collect()
        })
        .collect();

    let timer = std::time::Instant::now();

    let sorted = jobs::sort_by_department_and_age(engine, partitions, &employees)?;
    println!("secondary sort: {:?}", sorted.iter().map(Vec::len).collect::<Vec<_>>());

    let joined = jobs::reduce_side_join(engine, partitions, &departments, &employees)?;
    println!("reduce-side join: {} rows", joined.iter().map(Vec::len).sum::<usize>());

    let table = SideTable::from_lines(departments.concat());
    let joined = jobs::map_side_join(engine, partitions, &table, &employees)?;
    println!("map-side join: {} rows", joined.iter().map(Vec::len).sum::<usize>());

    for (department, mean) in jobs::average_age_by_department(engine, partitions, &employees)? {
        println!("department {}: average age {:.2}", department, mean);
    }
    println!("average age: {:.2}", jobs::average_age(engine, &employees)?);

    let (table, sorted) = jobs::total_order_sort_by_age(engine, partitions, &SamplerConfig::default(), &employees)?;
    println!("total order: splitters {:?}, partitions {:?}", table.splitters(), sorted.iter().map(Vec::len).collect::<Vec<_>>());

    println!("{:?}\tcomplete on {} engine", timer.elapsed(), engine);
    Ok(())
}
