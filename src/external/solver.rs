//! Policy solving through an external POMDP solver.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ClarifyError, ClarifyResult, ExternalError};

/// Default solver convergence parameter.
pub const DEFAULT_EPSILON: u32 = 50;

/// Extension of the policy-graph artifact.
pub const GRAPH_EXTENSION: &str = "pg";

/// Extension of the alpha-vector artifact.
pub const ALPHA_EXTENSION: &str = "alpha";

/// Paths of the two files a solver run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverArtifacts {
    /// Policy-graph file.
    pub graph: PathBuf,
    /// Alpha-vector file.
    pub alpha: PathBuf,
}

impl SolverArtifacts {
    /// Finds `<stem>*.pg` and `<stem>*.alpha` in `dir`.
    ///
    /// When several files match, the lexicographically first is used.
    ///
    /// # Errors
    ///
    /// `MissingArtifact` when either file is absent.
    pub fn locate(dir: &Path, stem: &str) -> ClarifyResult<Self> {
        let mut graphs = Vec::new();
        let mut alphas = Vec::new();
        let entries =
            std::fs::read_dir(dir).map_err(|e| ClarifyError::io_at("list", dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| ClarifyError::io_at("list", dir, e))?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(stem) {
                continue;
            }
            match path.extension().and_then(|e| e.to_str()) {
                Some(GRAPH_EXTENSION) => graphs.push(path),
                Some(ALPHA_EXTENSION) => alphas.push(path),
                _ => {}
            }
        }
        graphs.sort();
        alphas.sort();

        let missing = |kind| ExternalError::MissingArtifact {
            kind,
            stem: stem.to_string(),
        };
        let graph = graphs.into_iter().next().ok_or_else(|| missing("policy graph"))?;
        let alpha = alphas.into_iter().next().ok_or_else(|| missing("alpha vector"))?;
        Ok(Self { graph, alpha })
    }

    /// Deletes both files so a later run cannot pick them up.
    pub fn remove(&self) -> ClarifyResult<()> {
        for path in [&self.graph, &self.alpha] {
            std::fs::remove_file(path).map_err(|e| ClarifyError::io_at("remove", path, e))?;
        }
        debug!(graph = %self.graph.display(), "removed solver artifacts");
        Ok(())
    }
}

/// Solves a written model file into a policy graph and alpha vectors.
pub trait PolicySolver {
    /// Solves the model at `model_path`.
    fn solve(&self, model_path: &Path) -> ClarifyResult<SolverArtifacts>;
}

/// Runs `pomdp-solve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomdpSolve {
    /// Solver executable.
    pub binary: String,

    /// Convergence parameter passed as `-epsilon`.
    pub epsilon: u32,

    /// Let the solver write to the terminal.
    pub verbose_solver: bool,

    /// Directory the solver runs in and writes its artifacts to.
    pub work_dir: PathBuf,
}

impl PomdpSolve {
    /// Arguments for solving `model_path` with output prefix `stem`.
    #[must_use]
    pub fn args(&self, model_path: &Path, stem: &str) -> Vec<String> {
        vec![
            "-pomdp".to_string(),
            model_path.display().to_string(),
            "-epsilon".to_string(),
            self.epsilon.to_string(),
            "-o".to_string(),
            stem.to_string(),
        ]
    }
}

impl PolicySolver for PomdpSolve {
    fn solve(&self, model_path: &Path) -> ClarifyResult<SolverArtifacts> {
        let stem = model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let model_path = model_path
            .canonicalize()
            .map_err(|e| ClarifyError::io_at("resolve", model_path, e))?;

        let (stdout, stderr) = if self.verbose_solver {
            (Stdio::inherit(), Stdio::inherit())
        } else {
            (Stdio::null(), Stdio::null())
        };

        info!(model = %model_path.display(), epsilon = self.epsilon, "running solver");
        let started = Instant::now();
        let status = Command::new(&self.binary)
            .args(self.args(&model_path, &stem))
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(|source| ExternalError::Spawn {
                program: self.binary.clone(),
                source,
            })?;
        let elapsed = started.elapsed();

        if !status.success() {
            warn!(%status, "solver exited unsuccessfully");
            return Err(ExternalError::ProcessFailed {
                program: self.binary.clone(),
                status: status.to_string(),
            }
            .into());
        }
        info!(elapsed_secs = elapsed.as_secs_f64(), "solver finished");

        SolverArtifacts::locate(&self.work_dir, &stem)
    }
}
