//! Model synthesis.
//!
//! `build_model` turns a domain, the tracked world variables and the
//! reasoner's weighted worlds into a `ModelSpec`:
//! - questions never change the state (identity transitions);
//! - every delivery moves every state to `term` with probability 1;
//! - which-questions reveal the variable's value, polar questions answer
//!   yes/no, deliveries observe uniformly;
//! - questions cost a fixed reward, deliveries pay off only when the target
//!   matches the true state.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::{VariableDomain, World};
use crate::error::ConfigurationError;
use crate::model::normalize::normalize_weights;
use crate::model::types::{
    Action, ActionKind, ModelSpec, ObservationEntry, ObservationSpec, RewardEntry, RewardParams,
    Selector, State, TransitionEntry, TransitionSpec, DISCOUNT, FIXED_OBSERVATIONS, OBJECTIVE,
    OBS_NO, OBS_NONE, OBS_YES, TERMINAL_STATE,
};

/// Builds a complete planning model.
///
/// # Errors
///
/// Returns a `ConfigurationError` when the world variables are empty or
/// undefined, when an observation token or action name would be ambiguous,
/// or when the
/// worlds are empty, mis-sized, outside the domain, duplicated, or carry
/// unusable weights.
pub fn build_model(
    domain: &VariableDomain,
    world_variables: &[String],
    worlds: &[World],
    rewards: &RewardParams,
) -> Result<ModelSpec, ConfigurationError> {
    let tracked = tracked_variables(domain, world_variables)?;
    let observations = observation_tokens(&tracked)?;
    validate_worlds(&tracked, worlds)?;

    let weights: Vec<f64> = worlds.iter().map(|w| w.weight).collect();
    let start = normalize_weights(&weights)?;

    let mut states = Vec::with_capacity(worlds.len() + 1);
    states.push(State {
        name: TERMINAL_STATE.to_string(),
        values: Vec::new(),
        probability: start.terminal,
    });
    for (world, probability) in worlds.iter().zip(start.worlds) {
        states.push(State {
            name: world.state_name(),
            values: world.values.clone(),
            probability,
        });
    }

    let actions = enumerate_actions(&tracked, &states)?;
    let question_count = actions.iter().filter(|a| !a.kind.is_delivery()).count();

    let obs_index: HashMap<&str, usize> = observations
        .iter()
        .enumerate()
        .map(|(i, o)| (o.as_str(), i))
        .collect();
    let position: HashMap<&str, usize> = tracked
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (*name, i))
        .collect();

    let mut transitions = Vec::with_capacity(actions.len());
    let mut observation_fn = Vec::with_capacity(actions.len());
    let mut reward_entries = Vec::new();

    for action in &actions {
        match &action.kind {
            ActionKind::WhichQuestion { variable } => {
                let d = position[variable.as_str()];
                transitions.push(identity(&action.name));
                let rows = states
                    .iter()
                    .map(|s| {
                        let hit = if s.is_terminal() {
                            obs_index[OBS_NONE]
                        } else {
                            obs_index[s.values[d].as_str()]
                        };
                        one_hot(observations.len(), hit)
                    })
                    .collect();
                observation_fn.push(ObservationEntry {
                    action: action.name.clone(),
                    spec: ObservationSpec::Matrix { rows },
                });
                reward_entries.push(flat_reward(&action.name, rewards.which_question));
            }
            ActionKind::PolarQuestion { variable, value } => {
                let d = position[variable.as_str()];
                transitions.push(identity(&action.name));
                let rows = states
                    .iter()
                    .map(|s| {
                        let hit = if s.is_terminal() {
                            obs_index[OBS_NONE]
                        } else if &s.values[d] == value {
                            obs_index[OBS_YES]
                        } else {
                            obs_index[OBS_NO]
                        };
                        one_hot(observations.len(), hit)
                    })
                    .collect();
                observation_fn.push(ObservationEntry {
                    action: action.name.clone(),
                    spec: ObservationSpec::Matrix { rows },
                });
                reward_entries.push(flat_reward(&action.name, rewards.polar_question));
            }
            ActionKind::Delivery { target, .. } => {
                transitions.push(TransitionEntry {
                    action: action.name.clone(),
                    spec: TransitionSpec::Entry {
                        start: Selector::Any,
                        end: Selector::Named(TERMINAL_STATE.to_string()),
                        probability: 1.0,
                    },
                });
                observation_fn.push(ObservationEntry {
                    action: action.name.clone(),
                    spec: ObservationSpec::Uniform,
                });
                for s in states.iter().filter(|s| !s.is_terminal()) {
                    let value = if &s.name == target {
                        rewards.correct_delivery
                    } else {
                        rewards.incorrect_delivery
                    };
                    reward_entries.push(RewardEntry {
                        action: action.name.clone(),
                        start: Selector::Named(s.name.clone()),
                        end: Selector::Named(TERMINAL_STATE.to_string()),
                        observation: Selector::Any,
                        value,
                    });
                }
            }
        }
    }

    debug!(
        states = states.len(),
        actions = actions.len(),
        observations = observations.len(),
        "built model"
    );

    Ok(ModelSpec {
        discount: DISCOUNT,
        objective: OBJECTIVE.to_string(),
        states,
        actions,
        observations,
        transitions,
        observation_fn,
        rewards: reward_entries,
        question_count,
    })
}

/// Fluent wrapper around `build_model`.
///
/// # Example
/// ```rust,ignore
/// let model = ModelBuilder::new(domain)
///     .world_variables(["item", "room"])
///     .worlds(worlds)
///     .rewards(RewardParams::default())
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    domain: VariableDomain,
    world_variables: Option<Vec<String>>,
    worlds: Vec<World>,
    rewards: RewardParams,
}

impl ModelBuilder {
    /// Starts a builder over `domain`.
    #[must_use]
    pub fn new(domain: VariableDomain) -> Self {
        Self {
            domain,
            world_variables: None,
            worlds: Vec::new(),
            rewards: RewardParams::default(),
        }
    }

    /// Sets the tracked variables (default: every domain variable, in order).
    #[must_use]
    pub fn world_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.world_variables = Some(variables.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the weighted worlds.
    #[must_use]
    pub fn worlds(mut self, worlds: Vec<World>) -> Self {
        self.worlds = worlds;
        self
    }

    /// Adds one world.
    #[must_use]
    pub fn world(mut self, world: World) -> Self {
        self.worlds.push(world);
        self
    }

    /// Sets the reward parameters (default: `RewardParams::default()`).
    #[must_use]
    pub fn rewards(mut self, rewards: RewardParams) -> Self {
        self.rewards = rewards;
        self
    }

    /// Builds the model.
    pub fn build(self) -> Result<ModelSpec, ConfigurationError> {
        let variables = self.world_variables.unwrap_or_else(|| {
            self.domain.iter().map(|(name, _)| name.to_string()).collect()
        });
        build_model(&self.domain, &variables, &self.worlds, &self.rewards)
    }
}

type Tracked<'a> = Vec<(&'a str, &'a [String])>;

fn tracked_variables<'a>(
    domain: &'a VariableDomain,
    world_variables: &'a [String],
) -> Result<Tracked<'a>, ConfigurationError> {
    if domain.is_empty() {
        return Err(ConfigurationError::EmptyDomain);
    }
    if world_variables.is_empty() {
        return Err(ConfigurationError::InvalidConfig {
            field: "world_variables".to_string(),
            reason: "at least one variable must be tracked".to_string(),
        });
    }
    world_variables
        .iter()
        .map(|name| match domain.values(name) {
            Some([]) => Err(ConfigurationError::EmptyVariable {
                variable: name.clone(),
            }),
            Some(values) => Ok((name.as_str(), values)),
            None => Err(ConfigurationError::UnknownWorldVariable {
                variable: name.clone(),
            }),
        })
        .collect()
}

fn observation_tokens(tracked: &Tracked<'_>) -> Result<Vec<String>, ConfigurationError> {
    let mut observations: Vec<String> = [OBS_NONE, OBS_YES, OBS_NO]
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    let mut owner: HashMap<&str, &str> = HashMap::new();

    for (variable, values) in tracked {
        for value in *values {
            if [OBS_NONE, OBS_YES, OBS_NO].contains(&value.as_str()) {
                return Err(ConfigurationError::AmbiguousObservation {
                    token: value.clone(),
                    reason: format!("value of '{variable}' collides with a reserved answer"),
                });
            }
            if let Some(previous) = owner.insert(value.as_str(), *variable) {
                return Err(ConfigurationError::AmbiguousObservation {
                    token: value.clone(),
                    reason: format!("listed under both '{previous}' and '{variable}'"),
                });
            }
            observations.push(value.clone());
        }
    }
    debug_assert!(observations.len() >= FIXED_OBSERVATIONS);
    Ok(observations)
}

fn validate_worlds(tracked: &Tracked<'_>, worlds: &[World]) -> Result<(), ConfigurationError> {
    if worlds.is_empty() {
        return Err(ConfigurationError::NoWorlds);
    }
    let mut names: HashSet<String> = HashSet::with_capacity(worlds.len() + 1);
    names.insert(TERMINAL_STATE.to_string());

    for (index, world) in worlds.iter().enumerate() {
        if world.values.len() != tracked.len() {
            return Err(ConfigurationError::ArityMismatch {
                index,
                actual: world.values.len(),
                expected: tracked.len(),
            });
        }
        for ((variable, allowed), value) in tracked.iter().zip(&world.values) {
            if !allowed.contains(value) {
                return Err(ConfigurationError::ValueOutsideDomain {
                    index,
                    variable: (*variable).to_string(),
                    value: value.clone(),
                });
            }
        }
        let name = world.state_name();
        if !names.insert(name.clone()) {
            return Err(ConfigurationError::InvalidWorld {
                text: name,
                reason: "duplicate state".to_string(),
            });
        }
    }
    Ok(())
}

fn enumerate_actions(
    tracked: &Tracked<'_>,
    states: &[State],
) -> Result<Vec<Action>, ConfigurationError> {
    let which = tracked.iter().map(|(variable, _)| ActionKind::WhichQuestion {
        variable: (*variable).to_string(),
    });
    let polar = tracked.iter().flat_map(|(variable, values)| {
        values.iter().map(move |value| ActionKind::PolarQuestion {
            variable: (*variable).to_string(),
            value: value.clone(),
        })
    });
    let delivery = states
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_terminal())
        .map(|(state_index, s)| ActionKind::Delivery {
            target: s.name.clone(),
            state_index,
        });

    let mut seen: HashMap<String, usize> = HashMap::new();
    which
        .chain(polar)
        .chain(delivery)
        .enumerate()
        .map(|(index, kind)| {
            let name = kind.name();
            // Names are joined with `_`, so `a:b_c` and `a_b:c` meet here.
            if let Some(previous) = seen.insert(name.clone(), index) {
                return Err(ConfigurationError::AmbiguousAction {
                    name,
                    reason: format!("actions {previous} and {index} share it"),
                });
            }
            Ok(Action { index, name, kind })
        })
        .collect()
}

fn identity(action: &str) -> TransitionEntry {
    TransitionEntry {
        action: action.to_string(),
        spec: TransitionSpec::Identity,
    }
}

fn flat_reward(action: &str, value: f64) -> RewardEntry {
    RewardEntry {
        action: action.to_string(),
        start: Selector::Any,
        end: Selector::Any,
        observation: Selector::Any,
        value,
    }
}

fn one_hot(len: usize, hit: usize) -> Vec<f64> {
    (0..len).map(|i| if i == hit { 1.0 } else { 0.0 }).collect()
}
