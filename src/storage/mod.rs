//!
//! chronotope storage contracts
//! ----------------------------
//! The planner talks to triple stores through the traits here; any backend
//! that can stream triples for a declarative lookup can serve queries. A
//! store manages named graphs; a graph adds/removes triple slices with bulk
//! semantics and streams matching triples into a bounded channel, giving the
//! consumer backpressure and a natural cancellation path (drop the receiver
//! and the producer stops on its next send).
//!
//! Everything here returns `anyhow::Result`: backends fail in their own ways,
//! and the planner annotates surfaced errors with the operation that hit
//! them. The in-memory reference store lives in [`memory`] and backs the
//! executor test suites.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::graph::{Node, Object, Predicate, Triple};

pub mod memory;

/// Declarative triple lookup. Concrete fields narrow the stream; anchor
/// bounds apply to temporal predicate anchors only (immutable facts are
/// timeless and pass through); `max_elements` caps the stream length.
#[derive(Debug, Clone, Default)]
pub struct Lookup {
    pub subject: Option<Node>,
    pub predicate: Option<Predicate>,
    pub predicate_id: Option<String>,
    pub object: Option<Object>,
    pub lower_anchor: Option<DateTime<Utc>>,
    pub upper_anchor: Option<DateTime<Utc>>,
    pub max_elements: Option<usize>,
}

impl Lookup {
    /// Does `triple` satisfy every constraint of this lookup?
    pub fn matches(&self, triple: &Triple) -> bool {
        if let Some(s) = &self.subject {
            if triple.subject() != s {
                return false;
            }
        }
        if let Some(p) = &self.predicate {
            if triple.predicate() != p {
                return false;
            }
        }
        if let Some(id) = &self.predicate_id {
            if triple.predicate().id() != id {
                return false;
            }
        }
        if let Some(o) = &self.object {
            if triple.object() != o {
                return false;
            }
        }
        if let Some(anchor) = triple.predicate().anchor() {
            if let Some(lower) = self.lower_anchor {
                if anchor < lower {
                    return false;
                }
            }
            if let Some(upper) = self.upper_anchor {
                if anchor > upper {
                    return false;
                }
            }
        }
        true
    }
}

/// A named graph holding triples.
#[async_trait]
pub trait Graph: Send + Sync {
    /// The graph name, as given on creation.
    fn id(&self) -> &str;

    /// Add a slice of triples. Bulk semantics: the whole slice lands or the
    /// call fails; callers split large inserts into bulks themselves.
    async fn add_triples(&self, triples: &[Triple]) -> Result<()>;

    /// Remove a slice of triples; absent triples are not an error.
    async fn remove_triples(&self, triples: &[Triple]) -> Result<()>;

    /// Stream every triple matching `lookup` into `tx`, in a deterministic
    /// order for a given graph state. The stream is finite and
    /// non-restartable; a closed receiver stops the producer without error.
    async fn triples(&self, lookup: Lookup, tx: mpsc::Sender<Triple>) -> Result<()>;
}

/// A collection of named graphs.
#[async_trait]
pub trait Store: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Fetch an existing graph; missing graphs are an error.
    async fn graph(&self, id: &str) -> Result<Arc<dyn Graph>>;

    /// Create a fresh graph; duplicates are an error.
    async fn new_graph(&self, id: &str) -> Result<Arc<dyn Graph>>;

    /// Drop a graph and its triples; missing graphs are an error.
    async fn delete_graph(&self, id: &str) -> Result<()>;

    /// Names of every graph, sorted.
    async fn graph_names(&self) -> Result<Vec<String>>;
}

/// Shared handle the planner and executors pass around.
pub type SharedStore = Arc<dyn Store>;
