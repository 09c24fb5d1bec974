//! End-to-end orchestration.
//!
//! ```text
//! domain + facts + prompt answers -> reasoner -> worlds
//! worlds -> model file -> solver -> policy graph + alpha vectors
//! policy -> execution loop -> delivery
//! ```
//!
//! Each stage is a separate method so callers (and the CLI's `model`
//! subcommand) can stop early or substitute their own inputs.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::domain::{VariableDomain, World};
use crate::error::{ClarifyResult, ConfigurationError};
use crate::execution::{ask_until_accepted, AnswerSource, Delivery, ExecutionLoop, Question};
use crate::external::{PolicySolver, WorldEnumerator};
use crate::facts::FactBase;
use crate::model::{build_model, write_model_file, ModelSpec};
use crate::policy::{Policy, PolicyShape};

/// A synthesized model and the file it was written to.
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// The model.
    pub model: ModelSpec,
    /// Path of the solver-format file.
    pub path: PathBuf,
}

/// Everything needed to run episodes.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Domain the questions draw their accepted answers from.
    pub domain: VariableDomain,
    /// The synthesized model.
    pub synthesis: Synthesis,
    /// The solved policy.
    pub policy: Policy,
}

impl Plan {
    /// Execution loop over this plan.
    #[must_use]
    pub fn execution(&self) -> ExecutionLoop<'_> {
        ExecutionLoop::new(&self.synthesis.model, &self.domain, &self.policy)
    }
}

/// Runs the planning pipeline with pluggable reasoner and solver.
#[derive(Debug, Clone)]
pub struct Planner<E, S> {
    config: PlannerConfig,
    enumerator: E,
    solver: S,
}

impl<E: WorldEnumerator, S: PolicySolver> Planner<E, S> {
    /// Creates a planner.
    pub const fn new(config: PlannerConfig, enumerator: E, solver: S) -> Self {
        Self {
            config,
            enumerator,
            solver,
        }
    }

    /// The configuration in use.
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Reads the configured domain file.
    pub fn load_domain(&self) -> ClarifyResult<VariableDomain> {
        let domain = VariableDomain::from_file(&self.config.domain_file)?;
        for (variable, values) in domain.iter() {
            debug!(variable, values = %values.join(","), "domain");
        }
        Ok(domain)
    }

    /// Builds the fact base: domain facts, initial facts, then one fact per
    /// situational prompt answered through `source`.
    pub fn gather_facts(
        &self,
        domain: &VariableDomain,
        source: &mut dyn AnswerSource,
    ) -> ClarifyResult<FactBase> {
        let mut facts = FactBase::from_domain(domain);
        facts.extend_from_file(&self.config.facts_file)?;
        for prompt in &self.config.situational_prompts {
            let question = Question::for_prompt(prompt);
            let answer = ask_until_accepted(source, &question, self.config.max_answer_attempts)?;
            if let Some(fact) = prompt.accept(&answer) {
                facts.push(fact);
            }
        }
        info!(facts = facts.len(), "gathered fact base");
        debug!(facts = %facts.render(), "fact base");
        Ok(facts)
    }

    /// Asks the reasoner for the possible worlds.
    ///
    /// # Errors
    ///
    /// `NoWorlds` when the reasoner returns an empty list.
    pub fn enumerate_worlds(&self, facts: &FactBase) -> ClarifyResult<Vec<World>> {
        let worlds = self.enumerator.enumerate(facts)?;
        if worlds.is_empty() {
            warn!("reasoner returned no possible worlds");
            return Err(ConfigurationError::NoWorlds.into());
        }
        info!(worlds = worlds.len(), "enumerated possible worlds");
        for world in &worlds {
            debug!(%world, "possible world");
        }
        Ok(worlds)
    }

    /// Builds the model for `worlds` and writes it to the working directory.
    pub fn synthesize(
        &self,
        domain: &VariableDomain,
        worlds: &[World],
    ) -> ClarifyResult<Synthesis> {
        let model = build_model(
            domain,
            &self.config.world_variables,
            worlds,
            &self.config.rewards,
        )?;
        let path = write_model_file(&model, &self.config.work_dir, &self.config.model_name)?;
        info!(
            path = %path.display(),
            states = model.states.len(),
            actions = model.actions.len(),
            observations = model.observations.len(),
            "wrote model"
        );
        Ok(Synthesis { model, path })
    }

    /// Solves a written model and loads the resulting policy.
    ///
    /// Solver artifacts are removed afterwards, whether or not they loaded,
    /// unless the configuration keeps them. A load failure is reported in
    /// preference to a cleanup failure.
    pub fn solve(&self, synthesis: &Synthesis) -> ClarifyResult<Policy> {
        let artifacts = self.solver.solve(&synthesis.path)?;
        let loaded = Policy::load(
            &artifacts.graph,
            &artifacts.alpha,
            &synthesis.model.belief(),
            PolicyShape::from(&synthesis.model),
        );
        let cleanup = if self.config.solver.keep_artifacts {
            Ok(())
        } else {
            artifacts.remove()
        };

        let policy = match (loaded, cleanup) {
            (Ok(policy), Ok(())) => policy,
            (Ok(_), Err(cleanup)) => return Err(cleanup),
            (Err(load), cleanup) => {
                if let Err(err) = cleanup {
                    warn!(error = %err, "could not remove solver artifacts");
                }
                return Err(load);
            }
        };
        info!(nodes = policy.nodes().len(), start = policy.start(), "policy ready");
        debug!(nodes = ?policy.nodes(), "policy graph");
        Ok(policy)
    }

    /// Runs every stage up to a solved policy.
    pub fn plan(&self, source: &mut dyn AnswerSource) -> ClarifyResult<Plan> {
        let domain = self.load_domain()?;
        let facts = self.gather_facts(&domain, source)?;
        let worlds = self.enumerate_worlds(&facts)?;
        let synthesis = self.synthesize(&domain, &worlds)?;
        let policy = self.solve(&synthesis)?;
        Ok(Plan {
            domain,
            synthesis,
            policy,
        })
    }

    /// Plans, then runs one episode against `source`.
    pub fn run(&self, source: &mut dyn AnswerSource) -> ClarifyResult<Delivery> {
        let plan = self.plan(source)?;
        plan.execution()
            .max_answer_attempts(self.config.max_answer_attempts)
            .max_steps(self.config.max_steps)
            .run(source)
    }
}
