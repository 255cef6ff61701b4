//! Typed scalar values, written `"value"^^type:<kind>`. Construction flows
//! through a [`Builder`] so the per-literal text length stays bounded; the
//! process-wide default builder is lazily initialized once and tests swap in
//! their own bounded builders. Blob values travel as base64 text.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::{Error, Result};

/// Default cap on the value text of a single literal.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 1024;

static LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)^"(.*)"\^\^type:(bool|int64|float64|text|blob)$"#).unwrap());

static DEFAULT_BUILDER: Lazy<Builder> = Lazy::new(|| Builder::bounded(DEFAULT_MAX_TEXT_LENGTH));

/// Process-wide bounded literal builder.
pub fn default_literal_builder() -> &'static Builder {
    &DEFAULT_BUILDER
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Bool(_) => "bool",
            Literal::Int64(_) => "int64",
            Literal::Float64(_) => "float64",
            Literal::Text(_) => "text",
            Literal::Blob(_) => "blob",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Literal::Int64(_) | Literal::Float64(_))
    }

    /// Numeric value widened to f64; `None` on non-numeric kinds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Int64(v) => Some(*v as f64),
            Literal::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Canonical comparable form. Lexicographic order of these strings matches
    /// the natural order of the values within one literal kind: int64 is a
    /// sign-biased zero-padded decimal, float64 a monotone bit encoding, and
    /// the remaining kinds carry their text form.
    pub fn comparable_string(&self) -> String {
        match self {
            Literal::Int64(v) => format!("{:020}", (*v as i128) + (1i128 << 63)),
            Literal::Float64(v) => format!("{:016x}", sortable_f64_bits(*v)),
            _ => self.to_string(),
        }
    }

    fn value_text(&self) -> String {
        match self {
            Literal::Bool(v) => v.to_string(),
            Literal::Int64(v) => v.to_string(),
            Literal::Float64(v) => v.to_string(),
            Literal::Text(v) => v.clone(),
            Literal::Blob(v) => BASE64.encode(v),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"^^type:{}", self.value_text(), self.type_name())
    }
}

/// Maps f64 onto u64 so unsigned order matches numeric order (NaN sorts high).
fn sortable_f64_bits(v: f64) -> u64 {
    let bits = v.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits ^ (1u64 << 63)
    }
}

/// Bounded literal factory. The bound applies to the value text as written,
/// including base64 blob payloads.
#[derive(Debug, Clone)]
pub struct Builder {
    max_text_len: usize,
}

impl Builder {
    pub fn bounded(max_text_len: usize) -> Self {
        Builder { max_text_len }
    }

    pub fn max_text_len(&self) -> usize {
        self.max_text_len
    }

    pub fn build_bool(&self, v: bool) -> Literal {
        Literal::Bool(v)
    }

    pub fn build_int64(&self, v: i64) -> Literal {
        Literal::Int64(v)
    }

    pub fn build_float64(&self, v: f64) -> Literal {
        Literal::Float64(v)
    }

    pub fn build_text(&self, v: &str) -> Result<Literal> {
        self.check_len(v)?;
        Ok(Literal::Text(v.to_string()))
    }

    pub fn build_blob(&self, v: &[u8]) -> Result<Literal> {
        let encoded = BASE64.encode(v);
        self.check_len(&encoded)?;
        Ok(Literal::Blob(v.to_vec()))
    }

    /// Parse the full text form `"value"^^type:<kind>`.
    pub fn parse(&self, s: &str) -> Result<Literal> {
        let caps = LITERAL_RE
            .captures(s.trim())
            .ok_or_else(|| Error::primitive(format!("cannot parse literal '{}'", s)))?;
        let value = &caps[1];
        match &caps[2] {
            "bool" => match value {
                "true" => Ok(Literal::Bool(true)),
                "false" => Ok(Literal::Bool(false)),
                _ => Err(Error::primitive(format!("invalid bool literal '{}'", value))),
            },
            "int64" => value
                .parse::<i64>()
                .map(Literal::Int64)
                .map_err(|e| Error::primitive(format!("invalid int64 literal '{}': {}", value, e))),
            "float64" => value
                .parse::<f64>()
                .map(Literal::Float64)
                .map_err(|e| Error::primitive(format!("invalid float64 literal '{}': {}", value, e))),
            "text" => self.build_text(value),
            "blob" => {
                self.check_len(value)?;
                let bytes = BASE64
                    .decode(value.as_bytes())
                    .map_err(|e| Error::primitive(format!("invalid blob literal '{}': {}", value, e)))?;
                Ok(Literal::Blob(bytes))
            }
            kind => Err(Error::primitive(format!("unknown literal kind '{}'", kind))),
        }
    }

    fn check_len(&self, text: &str) -> Result<()> {
        if text.len() > self.max_text_len {
            return Err(Error::primitive(format!(
                "literal text length {} exceeds the builder bound {}",
                text.len(),
                self.max_text_len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "literal_tests.rs"]
mod literal_tests;
