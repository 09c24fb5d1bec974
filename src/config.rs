//! Planner configuration.
//!
//! Every field has a default, so a JSON file only needs to name what it
//! changes. Command-line flags are applied on top of the loaded value.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ClarifyError, ClarifyResult, ConfigurationError};
use crate::execution::DEFAULT_MAX_ANSWER_ATTEMPTS;
use crate::external::{PomdpSolve, XsbReasoner, DEFAULT_EPSILON};
use crate::facts::SituationalPrompt;
use crate::model::RewardParams;

/// How the reasoner is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Reasoner executable.
    pub binary: String,
    /// Program consulted before the query.
    pub program: String,
    /// Predicate that yields the world list.
    pub predicate: String,
    /// Fact-base file handed to the predicate, relative to the working directory.
    pub defaults_file: PathBuf,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            binary: "xsb".to_string(),
            program: "shopping_requests".to_string(),
            predicate: "getTasks".to_string(),
            defaults_file: PathBuf::from("defaults.txt"),
        }
    }
}

/// How the solver is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Solver executable.
    pub binary: String,
    /// Convergence parameter.
    pub epsilon: u32,
    /// Let the solver write to the terminal.
    pub verbose: bool,
    /// Leave the policy-graph and alpha files behind after loading them.
    pub keep_artifacts: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            binary: "pomdp-solve".to_string(),
            epsilon: DEFAULT_EPSILON,
            verbose: false,
            keep_artifacts: false,
        }
    }
}

/// Full planner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Reasoner invocation.
    pub reasoner: ReasonerConfig,

    /// Solver invocation.
    pub solver: SolverConfig,

    /// Variable domain file.
    pub domain_file: PathBuf,

    /// Initial facts file, one fact per line.
    pub facts_file: PathBuf,

    /// Variables that make up a world, in tuple order.
    pub world_variables: Vec<String>,

    /// Stem of the model file name.
    pub model_name: String,

    /// Reward shaping.
    pub rewards: RewardParams,

    /// Times a question is asked before the episode is abandoned.
    pub max_answer_attempts: usize,

    /// Optional cap on questions per episode.
    pub max_steps: Option<usize>,

    /// Directory for the defaults file, the model file and solver artifacts.
    pub work_dir: PathBuf,

    /// Questions asked before planning; each answer becomes a fact.
    pub situational_prompts: Vec<SituationalPrompt>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            reasoner: ReasonerConfig::default(),
            solver: SolverConfig::default(),
            domain_file: PathBuf::from("domain_1.txt"),
            facts_file: PathBuf::from("initial_facts_1.txt"),
            world_variables: ["item", "room", "person"].map(String::from).to_vec(),
            model_name: "shopping_requests".to_string(),
            rewards: RewardParams::default(),
            max_answer_attempts: DEFAULT_MAX_ANSWER_ATTEMPTS,
            max_steps: None,
            work_dir: PathBuf::from("."),
            situational_prompts: vec![
                SituationalPrompt {
                    question: "What is the time of day (morning, noon, or night)?".to_string(),
                    predicate: "currentTime".to_string(),
                    allowed: ["morning", "noon", "night"].map(String::from).to_vec(),
                },
                SituationalPrompt {
                    question: "Who am I speaking with?".to_string(),
                    predicate: "currentPerson".to_string(),
                    allowed: Vec::new(),
                },
            ],
        }
    }
}

impl PlannerConfig {
    /// Loads a JSON configuration file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> ClarifyResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClarifyError::io_at("read config", path, e))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            ConfigurationError::InvalidConfig {
                field: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(config.validate()?)
    }

    /// Checks values the planner cannot work with.
    pub fn validate(self) -> Result<Self, ConfigurationError> {
        let invalid = |field: &str, reason: &str| ConfigurationError::InvalidConfig {
            field: field.to_string(),
            reason: reason.to_string(),
        };
        if self.world_variables.is_empty() {
            return Err(invalid("world_variables", "must name at least one variable"));
        }
        if self.solver.epsilon == 0 {
            return Err(invalid("solver.epsilon", "must be positive"));
        }
        if self.max_answer_attempts == 0 {
            return Err(invalid("max_answer_attempts", "must be at least 1"));
        }
        if self.max_steps == Some(0) {
            return Err(invalid("max_steps", "must be at least 1 when set"));
        }
        if self.model_name.trim().is_empty() {
            return Err(invalid("model_name", "must not be empty"));
        }
        Ok(self)
    }

    /// Path of the defaults file inside the working directory.
    #[must_use]
    pub fn defaults_path(&self) -> PathBuf {
        self.work_dir.join(&self.reasoner.defaults_file)
    }

    /// Reasoner adapter for this configuration.
    #[must_use]
    pub fn reasoner(&self) -> XsbReasoner {
        XsbReasoner {
            binary: self.reasoner.binary.clone(),
            program: self.reasoner.program.clone(),
            predicate: self.reasoner.predicate.clone(),
            defaults_file: self.defaults_path(),
        }
    }

    /// Solver adapter for this configuration.
    #[must_use]
    pub fn solver(&self) -> PomdpSolve {
        PomdpSolve {
            binary: self.solver.binary.clone(),
            epsilon: self.solver.epsilon,
            verbose_solver: self.solver.verbose,
            work_dir: self.work_dir.clone(),
        }
    }
}
