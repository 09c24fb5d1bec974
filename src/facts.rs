//! Reasoner input: the derived fact base.
//!
//! The fact base is the domain (one `var(value)` fact per value), the
//! user-supplied initial facts, and the situational facts gathered by
//! asking the user a few questions before planning starts.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::VariableDomain;
use crate::error::{ClarifyError, ClarifyResult};

/// A single reasoner fact, `name(arg1,arg2,...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact(String);

impl Fact {
    /// Builds `name(params...)`.
    pub fn new<S: AsRef<str>>(name: &str, params: &[S]) -> Self {
        let args: Vec<&str> = params.iter().map(AsRef::as_ref).collect();
        Self(format!("{name}({})", args.join(",")))
    }

    /// Wraps a fact line verbatim (trailing `.` stripped).
    pub fn raw(text: &str) -> Self {
        Self(text.trim().trim_end_matches('.').to_string())
    }

    /// Returns the fact text without the terminating period.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered collection of facts handed to the reasoner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactBase {
    facts: Vec<Fact>,
}

impl FactBase {
    /// Creates an empty fact base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a fact base with one `var(value)` fact per domain value.
    #[must_use]
    pub fn from_domain(domain: &VariableDomain) -> Self {
        let mut base = Self::new();
        for (variable, values) in domain.iter() {
            for value in values {
                base.push(Fact::new(variable, &[value]));
            }
        }
        base
    }

    /// Appends one fact.
    pub fn push(&mut self, fact: Fact) {
        self.facts.push(fact);
    }

    /// Appends every non-blank line of an initial-facts body.
    pub fn extend_from_text(&mut self, text: &str) {
        self.facts.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(Fact::raw),
        );
    }

    /// Reads an initial-facts file and appends its lines.
    pub fn extend_from_file(&mut self, path: &Path) -> ClarifyResult<()> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClarifyError::io_at("read facts file", path, e))?;
        self.extend_from_text(&text);
        Ok(())
    }

    /// Facts in insertion order.
    #[must_use]
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Number of facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// True when there are no facts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Renders the reasoner's input format: facts joined by `".\n"`, ending in `"."`.
    #[must_use]
    pub fn render(&self) -> String {
        let lines: Vec<&str> = self.facts.iter().map(Fact::as_str).collect();
        format!("{}.", lines.join(".\n"))
    }

    /// Writes the rendered fact base to `path`.
    pub fn write_to(&self, path: &Path) -> ClarifyResult<()> {
        std::fs::write(path, self.render())
            .map_err(|e| ClarifyError::io_at("write fact base", path, e))
    }
}

/// A question asked before planning whose answer becomes a fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationalPrompt {
    /// Text shown to the user.
    pub question: String,

    /// Predicate name of the resulting fact.
    pub predicate: String,

    /// Accepted answers. Empty means any answer is accepted.
    #[serde(default)]
    pub allowed: Vec<String>,
}

impl SituationalPrompt {
    /// Normalizes a raw answer into an atom-safe token.
    #[must_use]
    pub fn normalize(answer: &str) -> String {
        answer.trim().replace(' ', "_")
    }

    /// Returns the fact for an answer, or `None` if the answer is not allowed.
    #[must_use]
    pub fn accept(&self, answer: &str) -> Option<Fact> {
        let value = Self::normalize(answer);
        if value.is_empty() {
            return None;
        }
        if !self.allowed.is_empty() && !self.allowed.contains(&value) {
            return None;
        }
        Some(Fact::new(&self.predicate, &[value]))
    }
}
