//! Structured planning model.
//!
//! Everything here is immutable once `build_model` returns. The transition,
//! observation and reward entries are declarative statements that exist to
//! be serialized for the solver.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Discount factor written into every model.
pub const DISCOUNT: f64 = 0.95;

/// Optimization objective written into every model.
pub const OBJECTIVE: &str = "reward";

/// Name of the synthetic terminal state.
pub const TERMINAL_STATE: &str = "term";

/// Observation emitted by the terminal state and by non-informative actions.
pub const OBS_NONE: &str = "none";

/// Affirmative answer to a polar question.
pub const OBS_YES: &str = "yes";

/// Negative answer to a polar question.
pub const OBS_NO: &str = "no";

/// Number of fixed observations preceding the value observations.
pub const FIXED_OBSERVATIONS: usize = 3;

/// A probability held in units of 1/10000.
///
/// The solver reads start probabilities with four decimals, so the model
/// keeps them in that resolution and sums them exactly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Probability(u32);

impl Probability {
    /// Units per 1.0.
    pub const SCALE: u32 = 10_000;

    /// Probability 1.0.
    pub const ONE: Self = Self(Self::SCALE);

    /// Probability 0.0.
    pub const ZERO: Self = Self(0);

    /// Creates a probability from ten-thousandths.
    #[must_use]
    pub const fn from_units(units: u32) -> Self {
        Self(units)
    }

    /// Ten-thousandths.
    #[must_use]
    pub const fn units(self) -> u32 {
        self.0
    }

    /// True when this is the whole probability mass.
    #[must_use]
    pub const fn is_certain(self) -> bool {
        self.0 == Self::SCALE
    }

    /// Value as a float.
    #[must_use]
    pub fn value(self) -> f64 {
        f64::from(self.0) / f64::from(Self::SCALE)
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:04}", self.0 / Self::SCALE, self.0 % Self::SCALE)
    }
}

/// Reward magnitudes used to shape the model.
///
/// Values are signed rewards written verbatim into the `R:` entries, so
/// question costs and the wrong-delivery penalty are normally negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardParams {
    /// Reward for asking a which-question.
    pub which_question: f64,

    /// Reward for asking a polar question.
    pub polar_question: f64,

    /// Reward for delivering to the true state.
    pub correct_delivery: f64,

    /// Reward for delivering to any other state.
    pub incorrect_delivery: f64,
}

impl RewardParams {
    /// Creates reward parameters from the 4-tuple.
    #[must_use]
    pub const fn new(
        which_question: f64,
        polar_question: f64,
        correct_delivery: f64,
        incorrect_delivery: f64,
    ) -> Self {
        Self {
            which_question,
            polar_question,
            correct_delivery,
            incorrect_delivery,
        }
    }
}

impl Default for RewardParams {
    fn default() -> Self {
        Self::new(-10.0, -1.0, 50.0, -100.0)
    }
}

impl FromStr for RewardParams {
    type Err = ConfigurationError;

    /// Parses `which,polar,correct,incorrect`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(ConfigurationError::InvalidRewards {
                reason: format!("expected 4 comma-separated values, got {}", parts.len()),
            });
        }
        let mut values = [0.0_f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            let v: f64 = part.parse().map_err(|_| ConfigurationError::InvalidRewards {
                reason: format!("'{part}' is not a number"),
            })?;
            if !v.is_finite() {
                return Err(ConfigurationError::InvalidRewards {
                    reason: format!("'{part}' is not finite"),
                });
            }
            *slot = v;
        }
        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }
}

/// A model state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Solver-visible name.
    pub name: String,

    /// World assignment; empty for the terminal state.
    pub values: Vec<String>,

    /// Start probability.
    pub probability: Probability,
}

impl State {
    /// True for the synthetic terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.values.is_empty()
    }
}

/// What an action does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    /// Ask for the value of a variable.
    WhichQuestion {
        /// Variable asked about.
        variable: String,
    },

    /// Ask whether a variable has a given value.
    PolarQuestion {
        /// Variable asked about.
        variable: String,
        /// Value proposed.
        value: String,
    },

    /// Commit to a state and end the episode.
    Delivery {
        /// Name of the target state.
        target: String,
        /// Index of the target state in the state list.
        state_index: usize,
    },
}

impl ActionKind {
    /// Solver-visible action name.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::WhichQuestion { variable } => format!("which_{variable}"),
            Self::PolarQuestion { variable, value } => format!("is_{variable}_{value}"),
            Self::Delivery { target, .. } => format!("deliver_{target}"),
        }
    }

    /// True for delivery actions.
    #[must_use]
    pub const fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery { .. })
    }
}

/// An action with its canonical index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Position in the action list; the solver refers to actions by this.
    pub index: usize,

    /// Solver-visible name.
    pub name: String,

    /// Tagged meaning, used at execution time instead of re-parsing `name`.
    pub kind: ActionKind,
}

/// Either a wildcard or a named state/observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// `*`
    Any,
    /// An exact name.
    Named(String),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Body of a `T:` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionSpec {
    /// State never changes.
    Identity,
    /// Every end state equally likely.
    Uniform,
    /// One explicit `start : end prob` entry.
    Entry {
        /// Start state.
        start: Selector,
        /// End state.
        end: Selector,
        /// Probability of the move.
        probability: f64,
    },
}

/// `T: <action> ...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEntry {
    /// Action name.
    pub action: String,
    /// Distribution.
    pub spec: TransitionSpec,
}

/// Body of an `O:` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObservationSpec {
    /// Every observation equally likely.
    Uniform,
    /// One row per end state, one column per observation.
    Matrix {
        /// Observation probabilities per end state.
        rows: Vec<Vec<f64>>,
    },
}

/// `O: <action> ...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationEntry {
    /// Action name.
    pub action: String,
    /// Distribution.
    pub spec: ObservationSpec,
}

/// `R: <action> : <start> : <end> : <obs> <value>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardEntry {
    /// Action name.
    pub action: String,
    /// Start state.
    pub start: Selector,
    /// End state.
    pub end: Selector,
    /// Observation.
    pub observation: Selector,
    /// Reward paid.
    pub value: f64,
}

/// A complete, internally consistent planning model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Discount factor.
    pub discount: f64,

    /// Optimization objective.
    pub objective: String,

    /// Terminal state first, then one state per world in input order.
    pub states: Vec<State>,

    /// Which-questions, polar questions, deliveries, in that order.
    pub actions: Vec<Action>,

    /// `none`, `yes`, `no`, then every value of every world variable.
    pub observations: Vec<String>,

    /// Transition function.
    pub transitions: Vec<TransitionEntry>,

    /// Observation function.
    pub observation_fn: Vec<ObservationEntry>,

    /// Reward function.
    pub rewards: Vec<RewardEntry>,

    /// Number of question actions (which + polar).
    pub question_count: usize,
}

impl ModelSpec {
    /// Start probabilities as floats, indexed like `states`.
    #[must_use]
    pub fn belief(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.probability.value()).collect()
    }

    /// Sum of start probabilities in ten-thousandths.
    #[must_use]
    pub fn belief_units(&self) -> u32 {
        self.states.iter().map(|s| s.probability.units()).sum()
    }

    /// Index range of delivery actions.
    #[must_use]
    pub fn delivery_range(&self) -> Range<usize> {
        self.question_count..self.actions.len()
    }

    /// Returns the action at `index`.
    #[must_use]
    pub fn action(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    /// Index of an observation token.
    #[must_use]
    pub fn observation_index(&self, token: &str) -> Option<usize> {
        self.observations.iter().position(|o| o == token)
    }

    /// Index of a state by name.
    #[must_use]
    pub fn state_index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name == name)
    }

    /// Probability that `action` moves `start` to `end`, as declared.
    #[must_use]
    pub fn transition_probability(&self, action: usize, start: usize, end: usize) -> f64 {
        let Some(action) = self.actions.get(action) else {
            return 0.0;
        };
        let n = self.states.len();
        self.transitions
            .iter()
            .filter(|t| t.action == action.name)
            .map(|t| match &t.spec {
                TransitionSpec::Identity => f64::from(u8::from(start == end)),
                TransitionSpec::Uniform => 1.0 / n as f64,
                TransitionSpec::Entry {
                    start: s,
                    end: e,
                    probability,
                } => {
                    if self.selects(s, start) && self.selects(e, end) {
                        *probability
                    } else {
                        0.0
                    }
                }
            })
            .sum()
    }

    /// Probability of observing `observation` after `action` lands in `end`.
    #[must_use]
    pub fn observation_probability(&self, action: usize, end: usize, observation: usize) -> f64 {
        let Some(action) = self.actions.get(action) else {
            return 0.0;
        };
        let m = self.observations.len();
        self.observation_fn
            .iter()
            .filter(|o| o.action == action.name)
            .map(|o| match &o.spec {
                ObservationSpec::Uniform => 1.0 / m as f64,
                ObservationSpec::Matrix { rows } => rows
                    .get(end)
                    .and_then(|row| row.get(observation))
                    .copied()
                    .unwrap_or(0.0),
            })
            .sum()
    }

    fn selects(&self, selector: &Selector, state: usize) -> bool {
        match selector {
            Selector::Any => true,
            Selector::Named(name) => self.states.get(state).is_some_and(|s| &s.name == name),
        }
    }
}
