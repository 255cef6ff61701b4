//! In-memory reference store. Graphs live in a `parking_lot`-guarded map;
//! each graph keeps its triples in a BTreeMap keyed by the canonical triple
//! text, so streams come out in a deterministic order for a given state.
//! Snapshots are taken under the read lock and sent after it is released, so
//! producers never hold a lock across an await point.

use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::graph::Triple;
use crate::storage::{Graph, Lookup, Store};

#[derive(Default)]
pub struct MemoryStore {
    graphs: RwLock<HashMap<String, Arc<MemoryGraph>>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryStore::default())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn graph(&self, id: &str) -> Result<Arc<dyn Graph>> {
        match self.graphs.read().get(id) {
            Some(g) => Ok(g.clone() as Arc<dyn Graph>),
            None => bail!("graph '{}' does not exist", id),
        }
    }

    async fn new_graph(&self, id: &str) -> Result<Arc<dyn Graph>> {
        let mut graphs = self.graphs.write();
        if graphs.contains_key(id) {
            bail!("graph '{}' already exists", id);
        }
        debug!("[MEMORY] creating graph {}", id);
        let graph = Arc::new(MemoryGraph { id: id.to_string(), triples: RwLock::new(BTreeMap::new()) });
        graphs.insert(id.to_string(), graph.clone());
        Ok(graph as Arc<dyn Graph>)
    }

    async fn delete_graph(&self, id: &str) -> Result<()> {
        if self.graphs.write().remove(id).is_none() {
            bail!("graph '{}' does not exist", id);
        }
        debug!("[MEMORY] dropped graph {}", id);
        Ok(())
    }

    async fn graph_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.graphs.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

pub struct MemoryGraph {
    id: String,
    triples: RwLock<BTreeMap<String, Triple>>,
}

#[async_trait]
impl Graph for MemoryGraph {
    fn id(&self) -> &str {
        &self.id
    }

    async fn add_triples(&self, triples: &[Triple]) -> Result<()> {
        let mut guard = self.triples.write();
        for triple in triples {
            guard.insert(triple.to_string(), triple.clone());
        }
        Ok(())
    }

    async fn remove_triples(&self, triples: &[Triple]) -> Result<()> {
        let mut guard = self.triples.write();
        for triple in triples {
            guard.remove(&triple.to_string());
        }
        Ok(())
    }

    async fn triples(&self, lookup: Lookup, tx: mpsc::Sender<Triple>) -> Result<()> {
        let snapshot: Vec<Triple> = {
            let guard = self.triples.read();
            guard.values().filter(|t| lookup.matches(t)).cloned().collect()
        };
        let mut sent = 0usize;
        for triple in snapshot {
            if let Some(max) = lookup.max_elements {
                if sent >= max {
                    break;
                }
            }
            // A closed receiver means the consumer is done; not an error.
            if tx.send(triple).await.is_err() {
                break;
            }
            sent += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
