//! Nodes are the identities of the graph: a slash-prefixed type path plus an
//! opaque id, written `/type/path<id>`. Blank nodes are minted with a fresh
//! uuid under the reserved `/_` type; the `_:label` surface form only ever
//! appears inside CONSTRUCT templates and never in stored data.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::{Error, Result};

/// Reserved type path for blank nodes.
pub const BLANK_NODE_TYPE: &str = "/_";

static NODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/[A-Za-z0-9_]+(?:/[A-Za-z0-9_]+)*)<([^<>\t]+)>$").unwrap());

static TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/[A-Za-z0-9_]+(?:/[A-Za-z0-9_]+)*$").unwrap());

/// A graph identity. Two nodes are the same identity iff both the type path
/// and the id match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node {
    t: String,
    id: String,
}

impl Node {
    /// Build a node from an already-validated type path and an opaque id.
    pub fn new(t: &str, id: &str) -> Result<Self> {
        if !TYPE_RE.is_match(t) {
            return Err(Error::primitive(format!("invalid node type '{}'", t)));
        }
        if id.is_empty() || id.contains('<') || id.contains('>') || id.contains('\t') {
            return Err(Error::primitive(format!("invalid node id '{}'", id)));
        }
        Ok(Node { t: t.to_string(), id: id.to_string() })
    }

    /// Parse the canonical text form `/type/path<id>`.
    pub fn parse(s: &str) -> Result<Self> {
        let caps = NODE_RE
            .captures(s.trim())
            .ok_or_else(|| Error::primitive(format!("cannot parse node '{}'", s)))?;
        Ok(Node { t: caps[1].to_string(), id: caps[2].to_string() })
    }

    /// Mint a blank node with a fresh uuid id under the reserved `/_` type.
    pub fn new_blank_node() -> Self {
        Node { t: BLANK_NODE_TYPE.to_string(), id: uuid::Uuid::new_v4().to_string() }
    }

    pub fn node_type(&self) -> &str {
        &self.t
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_blank(&self) -> bool {
        self.t == BLANK_NODE_TYPE
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}<{}>", self.t, self.id)
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod node_tests;
