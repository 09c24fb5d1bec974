//! Solver input format.
//!
//! The layout is fixed: header sections separated by blank lines, then the
//! `T:`, `O:` and `R:` blocks. Matrix rows are whitespace-separated floats,
//! one row per line.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::{ClarifyError, ClarifyResult};
use crate::model::types::{ModelSpec, ObservationSpec, TransitionSpec};

/// Extension of model files.
pub const MODEL_EXTENSION: &str = "POMDP";

/// Renders the model in the solver's input format.
#[must_use]
pub fn to_solver_format(model: &ModelSpec) -> String {
    let mut out = String::new();

    // writing into a String is infallible
    let _ = writeln!(out, "discount: {}\n", model.discount);
    let _ = writeln!(out, "values: {}\n", model.objective);
    let _ = writeln!(
        out,
        "states: {}\n",
        join_names(model.states.iter().map(|s| s.name.as_str()))
    );
    let _ = writeln!(
        out,
        "actions: {}\n",
        join_names(model.actions.iter().map(|a| a.name.as_str()))
    );
    let _ = writeln!(
        out,
        "observations: {}\n",
        join_names(model.observations.iter().map(String::as_str))
    );
    let start: Vec<String> = model
        .states
        .iter()
        .map(|s| s.probability.to_string())
        .collect();
    let _ = writeln!(out, "start: {}\n", start.join(" "));

    for t in &model.transitions {
        match &t.spec {
            TransitionSpec::Identity => {
                let _ = writeln!(out, "T: {} identity", t.action);
            }
            TransitionSpec::Uniform => {
                let _ = writeln!(out, "T: {} uniform", t.action);
            }
            TransitionSpec::Entry {
                start,
                end,
                probability,
            } => {
                let _ = writeln!(
                    out,
                    "T: {} : {start} : {end} {}",
                    t.action,
                    format_probability(*probability)
                );
            }
        }
    }
    out.push('\n');

    for o in &model.observation_fn {
        match &o.spec {
            ObservationSpec::Uniform => {
                let _ = writeln!(out, "O: {} uniform", o.action);
            }
            ObservationSpec::Matrix { rows } => {
                let _ = writeln!(out, "O: {}", o.action);
                for row in rows {
                    let cells: Vec<String> = row.iter().map(|p| format_probability(*p)).collect();
                    let _ = writeln!(out, "{}", cells.join(" "));
                }
            }
        }
    }
    out.push('\n');

    for r in &model.rewards {
        let _ = writeln!(
            out,
            "R: {} : {} : {} : {} {}",
            r.action, r.start, r.end, r.observation, r.value
        );
    }

    out
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(" ")
}

/// Formats a matrix probability: `1.0`, `0.0`, `0.25`.
fn format_probability(p: f64) -> String {
    if p.fract() == 0.0 {
        format!("{p:.1}")
    } else {
        format!("{p}")
    }
}

impl ModelSpec {
    /// Stable content digest of the solver-format text (16 hex digits).
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(to_solver_format(self).as_bytes());
        hash.to_hex()[..16].to_string()
    }

    /// File stem for this model: `<name>-<fingerprint>`.
    #[must_use]
    pub fn file_stem(&self, name: &str) -> String {
        format!("{name}-{}", self.fingerprint())
    }
}

/// Writes the model into `dir` as `<name>-<fingerprint>.POMDP`.
///
/// Returns the path written.
pub fn write_model_file(model: &ModelSpec, dir: &Path, name: &str) -> ClarifyResult<PathBuf> {
    let text = to_solver_format(model);
    let path = dir.join(format!("{}.{MODEL_EXTENSION}", model.file_stem(name)));
    std::fs::write(&path, text).map_err(|e| ClarifyError::io_at("write model file", &path, e))?;
    Ok(path)
}
