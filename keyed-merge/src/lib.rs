//! Keyed merges is a small algebra of keys, partitioners, and group reducers for shuffle-and-sort
//! engines.
//!
//! A shuffle-and-sort engine offers one primitive: records with the same partition are routed to
//! the same worker, and each worker visits its records in sorted order, cut into groups. This
//! crate layers the classic batch patterns on top of that primitive:
//!
//! * *secondary sort*, where a [`CompositeKey`](key::CompositeKey) is ordered by all of its
//!   fields but partitioned and grouped by its first field only;
//! * *joins*, where tagging places a single dimension record at the head of each group of fact
//!   records, or where a small dimension table is held by every worker;
//! * *aggregation*, over each group or over the whole input as one group;
//! * *total-order sort*, where a sampled [`BoundaryTable`](boundary::BoundaryTable) replaces
//!   hashing with range partitioning, so that the concatenation of partitions is sorted.
//!
//! The partition, order, and grouping functions are plain function values collected in a
//! [`JobConfig`](config::JobConfig). Group logic implements [`Reducer`](operators::Reducer).
//! Jobs run either on the in-process [`shuffle`] or on timely dataflow workers via [`dataflow`].
//!
//! # Examples
//!
//! ```
//! use keyed_merge::config::JobConfig;
//! use keyed_merge::key::{compare, CompositeKey};
//! use keyed_merge::operators::{concat_csv, TaggedJoin};
//! use keyed_merge::order::same_group;
//! use keyed_merge::partition::first_field;
//! use keyed_merge::shuffle;
//!
//! let config = JobConfig::new(2)
//!     .with_partition(first_field)
//!     .with_order(compare)
//!     .with_grouping(same_group);
//!
//! let departments = vec![(CompositeKey::dimension(10), "Sales".to_string())];
//! let employees = vec![
//!     (CompositeKey::fact(10), "emp1".to_string()),
//!     (CompositeKey::fact(10), "emp2".to_string()),
//! ];
//!
//! let joined = shuffle::run(&config, vec![employees, departments], |_| {
//!     TaggedJoin::new(concat_csv::<String, String>)
//! }).unwrap();
//!
//! let joined: Vec<(i32, String)> = joined.into_iter().flatten().collect();
//! assert_eq!(joined, vec![(10, "Sales,emp1".to_string()), (10, "Sales,emp2".to_string())]);
//! ```

#![forbid(missing_docs)]

pub mod boundary;
pub mod config;
pub mod dataflow;
pub mod engine;
pub mod error;
pub mod group;
pub mod hashable;
pub mod jobs;
pub mod key;
pub mod operators;
pub mod order;
pub mod partition;
pub mod record;
pub mod sample;
pub mod shuffle;

pub use crate::config::JobConfig;
pub use crate::engine::Engine;
pub use crate::error::{Error, Result};
pub use crate::hashable::Hashable;
pub use crate::key::CompositeKey;
