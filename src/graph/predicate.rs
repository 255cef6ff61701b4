//! Edge labels. A predicate is either immutable (`"id"@[]`) or temporal
//! (`"id"@[RFC3339Nano]`); the anchor is a nanosecond-precision UTC timestamp.
//! The two-anchor bound form `"id"@[lower,upper]` belongs to the query surface
//! only and is handled by the where-clause hooks, never stored here.

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::{Error, Result};

static PREDICATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^"([^"\t]+)"@\[([^\]]*)\]$"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateKind {
    Immutable,
    Temporal,
}

impl Display for PredicateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PredicateKind::Immutable => write!(f, "immutable"),
            PredicateKind::Temporal => write!(f, "temporal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predicate {
    id: String,
    anchor: Option<DateTime<Utc>>,
}

impl Predicate {
    pub fn new_immutable(id: &str) -> Result<Self> {
        validate_id(id)?;
        Ok(Predicate { id: id.to_string(), anchor: None })
    }

    pub fn new_temporal(id: &str, anchor: DateTime<Utc>) -> Result<Self> {
        validate_id(id)?;
        Ok(Predicate { id: id.to_string(), anchor: Some(anchor) })
    }

    /// Parse the canonical text form; the kind falls out of the anchor slot
    /// being empty or carrying an RFC 3339 timestamp.
    pub fn parse(s: &str) -> Result<Self> {
        let caps = PREDICATE_RE
            .captures(s.trim())
            .ok_or_else(|| Error::primitive(format!("cannot parse predicate '{}'", s)))?;
        let id = caps[1].to_string();
        let anchor_text = caps[2].trim();
        if anchor_text.is_empty() {
            return Ok(Predicate { id, anchor: None });
        }
        let anchor = parse_time(anchor_text)?;
        Ok(Predicate { id, anchor: Some(anchor) })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> PredicateKind {
        if self.anchor.is_some() { PredicateKind::Temporal } else { PredicateKind::Immutable }
    }

    /// Time anchor; `None` on immutable predicates.
    pub fn anchor(&self) -> Option<DateTime<Utc>> {
        self.anchor
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.anchor {
            None => write!(f, "\"{}\"@[]", self.id),
            Some(t) => write!(f, "\"{}\"@[{}]", self.id, format_time(&t)),
        }
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains('"') || id.contains('\t') {
        return Err(Error::primitive(format!("invalid predicate id '{}'", id)));
    }
    Ok(())
}

/// Parse an RFC 3339 timestamp (nanosecond precision, any offset) into UTC.
pub fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::primitive(format!("cannot parse time '{}': {}", s, e)))
}

/// Canonical nanosecond RFC 3339 rendering used by every text form.
pub fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[cfg(test)]
#[path = "predicate_tests.rs"]
mod predicate_tests;
