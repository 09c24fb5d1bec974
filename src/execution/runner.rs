//! The question-asking loop.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::VariableDomain;
use crate::error::{ClarifyResult, MalformedArtifactError, NavigationError};
use crate::execution::answer::{ask_until_accepted, AnswerSource};
use crate::execution::question::Question;
use crate::model::{ActionKind, ModelSpec};
use crate::policy::Policy;

/// Default bound on re-asking a question after an unusable answer.
pub const DEFAULT_MAX_ANSWER_ATTEMPTS: usize = 5;

/// One question/answer step of an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// Policy node the question was asked from.
    pub node: usize,
    /// Solver-visible name of the question action.
    pub action: String,
    /// Question text.
    pub question: String,
    /// Normalized accepted answer.
    pub answer: String,
    /// Observation index the answer mapped to.
    pub observation: usize,
}

/// Outcome of an episode: the delivery the policy committed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Index of the delivery action.
    pub action_index: usize,
    /// Solver-visible name of the delivery action.
    pub action_name: String,
    /// Name of the state being delivered to.
    pub target_state: String,
    /// Number of questions answered on the way.
    pub steps: usize,
    /// Every exchange, in order.
    pub transcript: Vec<Exchange>,
}

/// Walks a policy from its start node until a delivery node is reached.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionLoop<'a> {
    model: &'a ModelSpec,
    domain: &'a VariableDomain,
    policy: &'a Policy,
    max_answer_attempts: usize,
    max_steps: Option<usize>,
}

impl<'a> ExecutionLoop<'a> {
    /// Creates a loop over `policy`, which must have been solved for `model`.
    #[must_use]
    pub const fn new(model: &'a ModelSpec, domain: &'a VariableDomain, policy: &'a Policy) -> Self {
        Self {
            model,
            domain,
            policy,
            max_answer_attempts: DEFAULT_MAX_ANSWER_ATTEMPTS,
            max_steps: None,
        }
    }

    /// Sets how many times a question is asked before giving up.
    #[must_use]
    pub const fn max_answer_attempts(mut self, attempts: usize) -> Self {
        self.max_answer_attempts = attempts;
        self
    }

    /// Caps the number of questions per episode.
    #[must_use]
    pub const fn max_steps(mut self, steps: Option<usize>) -> Self {
        self.max_steps = steps;
        self
    }

    /// Runs one episode against `source`.
    ///
    /// # Errors
    ///
    /// Navigation errors end the episode: a missing edge, an answer source
    /// that closed or kept giving unusable answers, or the step cap. A
    /// policy node naming an action the model does not have is a malformed
    /// artifact.
    pub fn run(&self, source: &mut dyn AnswerSource) -> ClarifyResult<Delivery> {
        let mut node = self.policy.start();
        let mut transcript = Vec::new();
        info!(start = node, "starting episode");

        loop {
            let action = self
                .policy
                .action_at(node)
                .and_then(|a| self.model.action(a))
                .ok_or_else(|| MalformedArtifactError::InvalidActionIndex {
                    artifact: "policy graph".to_string(),
                    line: node + 1,
                    token: self
                        .policy
                        .action_at(node)
                        .map_or_else(String::new, |a| a.to_string()),
                })?;

            let Some(question) = Question::for_action(&action.kind, self.domain) else {
                let target_state = match &action.kind {
                    ActionKind::Delivery { target, .. } => target.clone(),
                    _ => action.name.clone(),
                };
                info!(action = %action.name, steps = transcript.len(), "delivery reached");
                return Ok(Delivery {
                    action_index: action.index,
                    action_name: action.name.clone(),
                    target_state,
                    steps: transcript.len(),
                    transcript,
                });
            };

            if let Some(limit) = self.max_steps {
                if transcript.len() >= limit {
                    return Err(NavigationError::StepLimitReached { steps: limit }.into());
                }
            }
            let answer = ask_until_accepted(source, &question, self.max_answer_attempts)?;
            let observation = self.model.observation_index(&answer).ok_or_else(|| {
                NavigationError::UnrecognizedAnswer {
                    answer: answer.clone(),
                    expected: self.model.observations.join(", "),
                }
            })?;
            let next = self.policy.step(node, observation)?;
            debug!(node, action = %action.name, %answer, observation, next, "step");

            transcript.push(Exchange {
                node,
                action: action.name.clone(),
                question: question.text,
                answer,
                observation,
            });
            node = next;
        }
    }
}
