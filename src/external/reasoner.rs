//! Possible-world enumeration through a logic reasoner.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{parse_world_list, World};
use crate::error::{ClarifyError, ClarifyResult, ExternalError};
use crate::facts::FactBase;

/// Produces the weighted possible worlds implied by a fact base.
pub trait WorldEnumerator {
    /// Enumerates worlds for `facts`. An empty vector means the facts admit
    /// no world.
    fn enumerate(&self, facts: &FactBase) -> ClarifyResult<Vec<World>>;
}

/// Parses a reasoner transcript into worlds.
///
/// # Errors
///
/// `NoWorldList` when the transcript has no `[...]` list, or a
/// configuration error for a malformed world tuple.
pub fn worlds_from_output(output: &str) -> ClarifyResult<Vec<World>> {
    let worlds = parse_world_list(output).ok_or(ExternalError::NoWorldList)??;
    Ok(worlds)
}

/// Runs the XSB Prolog reasoner over a written defaults file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XsbReasoner {
    /// Reasoner executable.
    pub binary: String,

    /// Program consulted before the query.
    pub program: String,

    /// Predicate queried as `<predicate>('<defaults>',W).`.
    pub predicate: String,

    /// File the fact base is written to.
    pub defaults_file: PathBuf,
}

impl XsbReasoner {
    /// Query text written to the reasoner's stdin.
    #[must_use]
    pub fn query(&self) -> String {
        format!(
            "[{}].\n{}('{}',W).\n",
            self.program,
            self.predicate,
            self.defaults_file.display()
        )
    }
}

impl WorldEnumerator for XsbReasoner {
    fn enumerate(&self, facts: &FactBase) -> ClarifyResult<Vec<World>> {
        facts.write_to(&self.defaults_file)?;
        debug!(path = %self.defaults_file.display(), facts = facts.len(), "wrote defaults");

        let spawn_err = |source| ExternalError::Spawn {
            program: self.binary.clone(),
            source,
        };
        let mut child = Command::new(&self.binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_err)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(self.query().as_bytes())
                .map_err(|e| ClarifyError::io("write reasoner query", e))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| ClarifyError::io("read reasoner output", e))?;
        if !output.status.success() {
            return Err(ExternalError::ProcessFailed {
                program: self.binary.clone(),
                status: output.status.to_string(),
            }
            .into());
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let worlds = worlds_from_output(&text)?;
        info!(worlds = worlds.len(), "reasoner enumerated worlds");
        Ok(worlds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_consults_program_then_asks_predicate() {
        let reasoner = XsbReasoner {
            binary: "xsb".to_string(),
            program: "shopping_requests".to_string(),
            predicate: "getTasks".to_string(),
            defaults_file: PathBuf::from("defaults.txt"),
        };
        assert_eq!(
            reasoner.query(),
            "[shopping_requests].\ngetTasks('defaults.txt',W).\n"
        );
    }

    #[test]
    fn transcript_without_list_is_unusable() {
        let err = worlds_from_output("XSB Version 4.0\nyes\n").unwrap_err();
        assert!(err.is_unusable_input());
    }

    #[test]
    fn transcript_worlds() {
        let out = "W = [task(cup,office,alice,3),task(book,kitchen,bob,1)]\nyes\n";
        let worlds = worlds_from_output(out).unwrap();
        assert_eq!(worlds.len(), 2);
        assert_eq!(worlds[1].state_name(), "book_kitchen_bob");
        assert!((worlds[0].weight - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let reasoner = XsbReasoner {
            binary: dir.path().join("no-such-xsb").display().to_string(),
            program: "p".to_string(),
            predicate: "q".to_string(),
            defaults_file: dir.path().join("defaults.txt"),
        };
        let err = reasoner.enumerate(&FactBase::new()).unwrap_err();
        assert!(matches!(err, ClarifyError::External(ExternalError::Spawn { .. })));
        assert!(dir.path().join("defaults.txt").exists());
    }
}
