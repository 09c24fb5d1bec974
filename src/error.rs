//! Error types for clarify.
//!
//! All errors are strongly typed using thiserror, grouped by the stage
//! that raises them:
//! - model synthesis rejects broken domains and worlds (`ConfigurationError`)
//! - policy loading rejects unparseable solver output (`MalformedArtifactError`)
//! - the execution loop reports dead ends and bad answers (`NavigationError`)
//! - process boundaries report spawn and artifact failures (`ExternalError`)

use std::path::Path;

use thiserror::Error;

/// Errors raised while loading inputs or synthesizing a model.
///
/// These abort synthesis before the solver is ever invoked.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    /// The domain defines no variables.
    #[error("Variable domain is empty")]
    EmptyDomain,

    /// A variable was declared without values.
    #[error("Variable '{variable}' has no values")]
    EmptyVariable {
        /// Name of the variable.
        variable: String,
    },

    /// The reasoner produced no worlds.
    #[error("No possible worlds were supplied")]
    NoWorlds,

    /// Every world weight is zero.
    #[error("World weights sum to zero")]
    ZeroTotalWeight,

    /// A weight is negative, NaN or infinite.
    #[error("World {index} has invalid weight {weight}")]
    NegativeWeight {
        /// Position of the world.
        index: usize,
        /// The rejected weight.
        weight: f64,
    },

    /// A world has the wrong number of values.
    #[error("World {index} has {actual} values, expected {expected}")]
    ArityMismatch {
        /// Position of the world.
        index: usize,
        /// Values the world carries.
        actual: usize,
        /// Number of tracked variables.
        expected: usize,
    },

    /// A tracked variable is missing from the domain.
    #[error("World variable '{variable}' is not defined in the domain")]
    UnknownWorldVariable {
        /// Name of the variable.
        variable: String,
    },

    /// A world assigns a value the domain does not list.
    #[error("World {index} assigns '{value}' to '{variable}', which is outside its domain")]
    ValueOutsideDomain {
        /// Position of the world.
        index: usize,
        /// Variable being assigned.
        variable: String,
        /// The offending value.
        value: String,
    },

    /// Two values would share one observation token.
    #[error("Observation token '{token}' is ambiguous: {reason}")]
    AmbiguousObservation {
        /// The shared token.
        token: String,
        /// Which declarations collide.
        reason: String,
    },

    /// Two questions would be written under the same action name.
    #[error("Action name '{name}' is ambiguous: {reason}")]
    AmbiguousAction {
        /// The shared action name.
        name: String,
        /// Which declarations collide.
        reason: String,
    },

    /// A domain file line could not be parsed.
    #[error("Invalid domain line {line}: '{content}'")]
    InvalidDomainLine {
        /// One-based line number.
        line: usize,
        /// Trimmed line text.
        content: String,
    },

    /// Reward parameters could not be parsed.
    #[error("Invalid reward parameters: {reason}")]
    InvalidRewards {
        /// What was wrong.
        reason: String,
    },

    /// A world could not be parsed or duplicates another.
    #[error("Invalid world '{text}': {reason}")]
    InvalidWorld {
        /// The world text or state name.
        text: String,
        /// What was wrong.
        reason: String,
    },

    /// A configuration field holds an unusable value.
    #[error("Invalid configuration field '{field}': {reason}")]
    InvalidConfig {
        /// Field name.
        field: String,
        /// What was wrong.
        reason: String,
    },
}

/// Errors raised while parsing solver output.
///
/// The solver run is expensive, so these are surfaced and never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedArtifactError {
    /// The artifact holds no entries.
    #[error("Artifact '{artifact}' is empty")]
    Empty {
        /// Artifact kind.
        artifact: String,
    },

    /// A line is too short.
    #[error("{artifact} line {line} has {actual} tokens, expected at least {expected}")]
    MissingTokens {
        /// Artifact kind.
        artifact: String,
        /// One-based line number.
        line: usize,
        /// Tokens found.
        actual: usize,
        /// Minimum tokens required.
        expected: usize,
    },

    /// An action token is not an index into the model's actions.
    #[error("{artifact} line {line}: invalid action index '{token}'")]
    InvalidActionIndex {
        /// Artifact kind.
        artifact: String,
        /// One-based line number.
        line: usize,
        /// The offending token.
        token: String,
    },

    /// A numeric token is unparseable or not finite.
    #[error("{artifact} line {line}: invalid number '{token}'")]
    InvalidNumber {
        /// Artifact kind.
        artifact: String,
        /// One-based line number.
        line: usize,
        /// The offending token.
        token: String,
    },

    /// A node does not list one successor per observation.
    #[error("Node {node} has {actual} successors, expected one per observation ({expected})")]
    SuccessorCountMismatch {
        /// Node position.
        node: usize,
        /// Successors listed.
        actual: usize,
        /// Observation count.
        expected: usize,
    },

    /// A successor points past the end of the graph.
    #[error("Node {node} points to node {target}, but the graph has {node_count} nodes")]
    SuccessorOutOfRange {
        /// Node position.
        node: usize,
        /// The successor index.
        target: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },

    /// An alpha vector and the belief differ in length.
    #[error("Alpha vector {node} has {actual} entries, belief has {expected}")]
    VectorLengthMismatch {
        /// Node position.
        node: usize,
        /// Vector length.
        actual: usize,
        /// Belief length.
        expected: usize,
    },

    /// The alpha file and graph describe different node counts.
    #[error("Alpha file has {alpha_count} vectors but the graph has {node_count} nodes")]
    NodeCountMismatch {
        /// Vectors in the alpha file.
        alpha_count: usize,
        /// Nodes in the graph.
        node_count: usize,
    },

    /// The alpha file ends between an action line and its vector.
    #[error("Alpha file ends with an action line ({line}) that has no vector")]
    DanglingActionLine {
        /// One-based line number of the action line.
        line: usize,
    },
}

/// Errors raised while walking the policy graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// The solver pruned the edge for this observation.
    #[error("Node {node} has no successor for observation {observation}")]
    MissingEdge {
        /// Current node.
        node: usize,
        /// Observation received.
        observation: usize,
    },

    /// The current node is not part of the graph.
    #[error("Node {node} is out of range (graph has {node_count})")]
    UnknownNode {
        /// The requested node.
        node: usize,
        /// Nodes in the graph.
        node_count: usize,
    },

    /// The observation index is outside the model.
    #[error("Observation {observation} is out of range (model has {observation_count})")]
    UnknownObservation {
        /// The requested observation.
        observation: usize,
        /// Observations in the model.
        observation_count: usize,
    },

    /// The answer matches none of the accepted tokens.
    #[error("Answer '{answer}' is not one of: {expected}")]
    UnrecognizedAnswer {
        /// Normalized answer text.
        answer: String,
        /// Accepted answers, comma separated.
        expected: String,
    },

    /// Every allowed attempt produced an unusable answer.
    #[error("No usable answer after {attempts} attempts")]
    RetriesExhausted {
        /// Attempts made.
        attempts: usize,
    },

    /// The answer source can produce no more answers.
    #[error("Answer source closed")]
    AnswerSourceClosed,

    /// The configured step cap was hit.
    #[error("Stopped after {steps} steps without reaching a delivery")]
    StepLimitReached {
        /// Questions asked.
        steps: usize,
    },
}

/// Errors raised at the reasoner/solver process boundary.
#[derive(Debug, Error)]
pub enum ExternalError {
    /// The process could not be started.
    #[error("Failed to launch '{program}'")]
    Spawn {
        /// Executable name.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully.
    #[error("'{program}' exited with status {status}")]
    ProcessFailed {
        /// Executable name.
        program: String,
        /// Rendered exit status.
        status: String,
    },

    /// The solver wrote no file of the expected kind.
    #[error("Solver produced no {kind} file for '{stem}'")]
    MissingArtifact {
        /// Artifact kind.
        kind: &'static str,
        /// Model file stem searched for.
        stem: String,
    },

    /// The reasoner transcript has no bracketed world list.
    #[error("Reasoner output contains no world list")]
    NoWorldList,
}

/// Top-level error type for clarify.
#[derive(Debug, Error)]
pub enum ClarifyError {
    /// Input or synthesis failure.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Unparseable solver output.
    #[error("Malformed solver artifact: {0}")]
    MalformedArtifact(#[from] MalformedArtifactError),

    /// Policy walk failure.
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// Reasoner or solver process failure.
    #[error("External process error: {0}")]
    External(#[from] ExternalError),

    /// Filesystem failure.
    #[error("IO error: {context}")]
    Io {
        /// What was being done, and to which path.
        context: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ClarifyError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error whose context names the offending path.
    pub fn io_at(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::io(format!("{action} {}", path.display()), source)
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true if this is a malformed-artifact error.
    #[must_use]
    pub const fn is_malformed_artifact(&self) -> bool {
        matches!(self, Self::MalformedArtifact(_))
    }

    /// Returns true if this is a navigation error.
    #[must_use]
    pub const fn is_navigation(&self) -> bool {
        matches!(self, Self::Navigation(_))
    }

    /// Returns true when a collaborator produced nothing usable.
    ///
    /// The CLI reports these and exits cleanly instead of failing: an empty
    /// world list, a missing solver output, or an empty solver output.
    #[must_use]
    pub const fn is_unusable_input(&self) -> bool {
        matches!(
            self,
            Self::Configuration(ConfigurationError::NoWorlds)
                | Self::External(ExternalError::MissingArtifact { .. })
                | Self::External(ExternalError::NoWorldList)
                | Self::MalformedArtifact(MalformedArtifactError::Empty { .. })
        )
    }
}

/// Result type alias for clarify operations.
pub type ClarifyResult<T> = Result<T, ClarifyError>;
