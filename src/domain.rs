//! Variable domains and possible worlds.
//!
//! A `VariableDomain` is the universe of values each tracked variable may
//! take. A `World` is one weighted hypothesis about the true situation, as
//! enumerated by the external reasoner.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ClarifyError, ClarifyResult, ConfigurationError};

/// Ordered mapping from variable name to its allowed values.
///
/// Order is significant: it fixes the order of polar questions and of the
/// value observations in the synthesized model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableDomain(Vec<(String, Vec<String>)>);

impl VariableDomain {
    /// Creates a validated domain.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::EmptyDomain` when there are no variables
    /// and `ConfigurationError::EmptyVariable` when a variable has no values.
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Result<Self, ConfigurationError> {
        if entries.is_empty() {
            return Err(ConfigurationError::EmptyDomain);
        }
        if let Some((variable, _)) = entries.iter().find(|(_, values)| values.is_empty()) {
            return Err(ConfigurationError::EmptyVariable {
                variable: variable.clone(),
            });
        }
        Ok(Self(entries))
    }

    /// Parses a domain file body: one `name:v1,v2,...` line per variable.
    ///
    /// Blank lines are skipped. Values are trimmed; empty values are dropped.
    /// Names and values end up as whitespace-delimited solver tokens, so
    /// inner whitespace or a second `:` makes the line invalid.
    pub fn parse(text: &str) -> Result<Self, ConfigurationError> {
        let mut entries = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let invalid = || ConfigurationError::InvalidDomainLine {
                line: idx + 1,
                content: line.to_string(),
            };
            let (name, values) = line.split_once(':').ok_or_else(invalid)?;
            let name = name.trim();
            if !is_token(name) {
                return Err(invalid());
            }
            let values: Vec<String> = values
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if !values.iter().all(|v| is_token(v)) {
                return Err(invalid());
            }
            entries.push((name.to_string(), values));
        }
        Self::new(entries)
    }

    /// Reads and parses a domain file.
    pub fn from_file(path: &Path) -> ClarifyResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClarifyError::io_at("read domain file", path, e))?;
        Ok(Self::parse(&text)?)
    }

    /// Returns the allowed values of `variable`, if defined.
    #[must_use]
    pub fn values(&self, variable: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, values)| values.as_slice())
    }

    /// Iterates `(variable, values)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated domain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One fully specified assignment of values, with an unnormalized weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// One value per tracked world variable, in world-variable order.
    pub values: Vec<String>,

    /// Unnormalized non-negative weight.
    pub weight: f64,
}

impl World {
    /// Creates a world from its values and weight.
    pub fn new<I, S>(values: I, weight: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            weight,
        }
    }

    /// State name for this world: its values joined by `_`.
    #[must_use]
    pub fn state_name(&self) -> String {
        self.values.join("_")
    }

    /// Parses one `(v1,...,vn,weight)` tuple body (parentheses optional).
    pub fn parse_tuple(text: &str) -> Result<Self, ConfigurationError> {
        let body = text.trim().trim_start_matches('(').trim_end_matches(')');
        let invalid = |reason: &str| ConfigurationError::InvalidWorld {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        let Some((values, weight)) = body.rsplit_once(',') else {
            return Err(invalid("expected at least one value and a weight"));
        };
        let weight: f64 = weight
            .trim()
            .parse()
            .map_err(|_| invalid("weight is not a number"))?;
        let values: Vec<String> = values.split(',').map(|v| v.trim().to_string()).collect();
        if values.iter().any(String::is_empty) {
            return Err(invalid("empty value"));
        }
        Ok(Self { values, weight })
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.values.join(","), self.weight)
    }
}

fn is_token(text: &str) -> bool {
    !text.is_empty() && !text.contains(|c: char| c.is_whitespace() || c == ':')
}

static WORLD_TUPLE: OnceLock<Regex> = OnceLock::new();

fn world_tuple_regex() -> Result<&'static Regex, ConfigurationError> {
    if let Some(re) = WORLD_TUPLE.get() {
        return Ok(re);
    }
    let compiled = Regex::new(r"\(([^()]*)\)").map_err(|e| ConfigurationError::InvalidWorld {
        text: String::new(),
        reason: format!("tuple pattern: {e}"),
    })?;
    Ok(WORLD_TUPLE.get_or_init(|| compiled))
}

/// Extracts the world list from reasoner output.
///
/// The list is the text between the first `[` and the following `]`; every
/// parenthesized group inside it is one world. Returns `None` when the output
/// has no bracketed list at all. An empty list yields `Some(vec![])`.
pub fn parse_world_list(output: &str) -> Option<Result<Vec<World>, ConfigurationError>> {
    let start = output.find('[')?;
    let end = output[start..].find(']')? + start;
    let list = &output[start + 1..end];

    let re = match world_tuple_regex() {
        Ok(re) => re,
        Err(e) => return Some(Err(e)),
    };
    Some(
        re.captures_iter(list)
            .map(|cap| World::parse_tuple(&cap[1]))
            .collect(),
    )
}
