//! Triples and the object union. A triple is an immutable
//! (subject, predicate, object) fact; its text form is TAB-separated so the
//! three component grammars never collide.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::{Error, Result};
use crate::graph::literal::{Builder, Literal};
use crate::graph::node::Node;
use crate::graph::predicate::Predicate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
    Node(Node),
    Predicate(Predicate),
    Literal(Literal),
}

impl Object {
    /// Parse an object from its text form, dispatching on the leading shape:
    /// nodes start with `/`, predicates and literals with `"` and split on the
    /// `^^type:` marker.
    pub fn parse(s: &str, builder: &Builder) -> Result<Self> {
        let text = s.trim();
        if text.starts_with('/') {
            return Node::parse(text).map(Object::Node);
        }
        if text.starts_with('"') {
            if text.contains("^^type:") {
                return builder.parse(text).map(Object::Literal);
            }
            return Predicate::parse(text).map(Object::Predicate);
        }
        Err(Error::primitive(format!("cannot parse object '{}'", s)))
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Object::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_predicate(&self) -> Option<&Predicate> {
        match self {
            Object::Predicate(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Object::Literal(l) => Some(l),
            _ => None,
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Node(n) => n.fmt(f),
            Object::Predicate(p) => p.fmt(f),
            Object::Literal(l) => l.fmt(f),
        }
    }
}

impl From<Node> for Object {
    fn from(n: Node) -> Self {
        Object::Node(n)
    }
}

impl From<Predicate> for Object {
    fn from(p: Predicate) -> Self {
        Object::Predicate(p)
    }
}

impl From<Literal> for Object {
    fn from(l: Literal) -> Self {
        Object::Literal(l)
    }
}

/// A stored fact. All three components exist by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    s: Node,
    p: Predicate,
    o: Object,
}

impl Triple {
    pub fn new(s: Node, p: Predicate, o: Object) -> Self {
        Triple { s, p, o }
    }

    /// Parse the TAB-separated text form `S\tP\tO`; exact inverse of Display.
    pub fn parse(line: &str, builder: &Builder) -> Result<Self> {
        let mut parts = line.split('\t');
        let (s, p, o) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(s), Some(p), Some(o), None) => (s, p, o),
            _ => {
                return Err(Error::primitive(format!(
                    "triple text must have exactly three TAB-separated components: '{}'",
                    line
                )))
            }
        };
        Ok(Triple {
            s: Node::parse(s)?,
            p: Predicate::parse(p)?,
            o: Object::parse(o, builder)?,
        })
    }

    pub fn subject(&self) -> &Node {
        &self.s
    }

    pub fn predicate(&self) -> &Predicate {
        &self.p
    }

    pub fn object(&self) -> &Object {
        &self.o
    }
}

impl Display for Triple {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}\t{}", self.s, self.p, self.o)
    }
}

#[cfg(test)]
#[path = "triple_tests.rs"]
mod triple_tests;
