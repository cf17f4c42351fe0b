//! Selection between the in-process and timely shuffle substrates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use timely::ExchangeData;

use crate::config::JobConfig;
use crate::dataflow;
use crate::error::{Error, Result};
use crate::operators::Reducer;
use crate::shuffle;

/// The substrate a job runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// A single thread, with deterministic delivery order.
    #[default]
    Local,
    /// One timely worker thread per partition.
    Timely,
}

impl Engine {
    /// Shuffles `sources` and reduces each partition with the reducer `logic` builds for it.
    pub fn run<K, V, R, L>(self, config: &JobConfig<K>, sources: Vec<Vec<(K, V)>>, logic: L) -> Result<Vec<Vec<R::Output>>>
    where
        K: ExchangeData + Clone + Sync,
        V: ExchangeData + Clone + Sync,
        R: Reducer<K, V> + 'static,
        R::Output: Send + 'static,
        L: Fn(usize) -> R + Send + Sync + 'static,
    {
        match self {
            Engine::Local => shuffle::run(config, sources, logic),
            Engine::Timely => dataflow::execute(config, sources, logic),
        }
    }

    /// As [`Engine::run`], combining records before the shuffle.
    pub fn run_with_combiner<K, V, C, R, L>(
        self,
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
        match self {
            Engine::Local => shuffle::run_with_combiner(config, sources, combiner, logic),
            Engine::Timely => dataflow::execute_with_combiner(config, sources, combiner, logic),
        }
    }
}

impl FromStr for Engine {
    type Err = Error;
    fn from_str(name: &str) -> Result<Self> {
        match name {
            "local" => Ok(Engine::Local),
            "timely" => Ok(Engine::Timely),
            other => Err(Error::InvalidConfig(format!("unknown engine: {:?}", other))),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Local => write!(f, "local"),
            Engine::Timely => write!(f, "timely"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        for engine in [Engine::Local, Engine::Timely] {
            assert_eq!(engine.to_string().parse::<Engine>().unwrap(), engine);
        }
        assert!("spark".parse::<Engine>().is_err());
        assert_eq!(serde_json::from_str::<Engine>("\"timely\"").unwrap(), Engine::Timely);
    }
}
