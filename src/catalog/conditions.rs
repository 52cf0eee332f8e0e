//! Conditions that decide whether a requested feature applies, given the
//! caller's constraints.
//!
//! ```yaml
//! conditions:
//!   or:
//!     - jsonPointer: /region
//!       equals: eu-west
//!     - not:
//!         jsonPointer: /client
//!         matches: "^legacy-"
//! ```

use std::fmt;

use regex::Regex;
use serde::de::{self, Deserialize, Deserializer};

use crate::value::ConfigValue;

/// A boolean expression over the constraints document.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum Condition {
    All { and: Vec<Condition> },
    Any { or: Vec<Condition> },
    Not { not: Box<Condition> },
    Test(Predicate),
}

/// Tests the constraint value found at `json_pointer`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Predicate {
    pub json_pointer: String,
    #[serde(flatten)]
    pub operator: Operator,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum Operator {
    Equals { equals: ConfigValue },
    /// Only matches string values.
    Matches { matches: Pattern },
}

/// A compiled regular expression, compared by its source text.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Pattern)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(de::Error::custom)
    }
}

impl Condition {
    /// Evaluates against `constraints`. A pointer that resolves to nothing
    /// never satisfies a predicate.
    pub fn evaluate(&self, constraints: &ConfigValue) -> bool {
        match self {
            Condition::All { and } => and.iter().all(|c| c.evaluate(constraints)),
            Condition::Any { or } => or.iter().any(|c| c.evaluate(constraints)),
            Condition::Not { not } => !not.evaluate(constraints),
            Condition::Test(predicate) => predicate.evaluate(constraints),
        }
    }
}

impl Predicate {
    pub fn evaluate(&self, constraints: &ConfigValue) -> bool {
        let Some(value) = constraints.pointer(&self.json_pointer) else {
            return false;
        };
        match &self.operator {
            Operator::Equals { equals } => value == equals,
            Operator::Matches { matches } => value.as_str().is_some_and(|s| matches.is_match(s)),
        }
    }
}
