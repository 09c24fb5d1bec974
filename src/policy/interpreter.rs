//! Executable policy.
//!
//! A `Policy` is the validated policy graph plus its starting node. Nodes
//! whose action is a delivery are terminal; there is no other termination
//! condition, and a graph that cycles among question nodes is accepted.

use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ClarifyError, ClarifyResult, MalformedArtifactError, NavigationError};
use crate::model::ModelSpec;
use crate::policy::alpha::{parse_alpha_vectors, select_start_node, AlphaVector};
use crate::policy::graph::{parse_policy_graph, PolicyNode, Successor};

/// Index layout a policy graph must agree with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyShape {
    /// Number of question actions; deliveries start here.
    pub question_count: usize,

    /// Total number of actions.
    pub action_count: usize,

    /// Number of observations; every node has one successor per observation.
    pub observation_count: usize,
}

impl PolicyShape {
    /// Index range of delivery actions.
    #[must_use]
    pub const fn delivery_range(&self) -> Range<usize> {
        self.question_count..self.action_count
    }
}

impl From<&ModelSpec> for PolicyShape {
    fn from(model: &ModelSpec) -> Self {
        Self {
            question_count: model.question_count,
            action_count: model.actions.len(),
            observation_count: model.observations.len(),
        }
    }
}

/// A validated policy graph with a selected start node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    nodes: Vec<PolicyNode>,
    start: usize,
    shape: PolicyShape,
}

impl Policy {
    /// Validates `nodes` against `shape` and selects the start node for
    /// `belief` from `alphas`.
    ///
    /// # Errors
    ///
    /// Returns a `MalformedArtifactError` if the graph is empty, a node
    /// names an unknown action, a node's successor list does not have one
    /// entry per observation, a successor points past the graph, or the
    /// alpha vectors do not line up with the nodes or the belief.
    pub fn new(
        nodes: Vec<PolicyNode>,
        alphas: &[AlphaVector],
        belief: &[f64],
        shape: PolicyShape,
    ) -> Result<Self, MalformedArtifactError> {
        if nodes.is_empty() {
            return Err(MalformedArtifactError::Empty {
                artifact: "policy graph".to_string(),
            });
        }
        let node_count = nodes.len();
        for (index, node) in nodes.iter().enumerate() {
            if node.action >= shape.action_count {
                return Err(MalformedArtifactError::InvalidActionIndex {
                    artifact: "policy graph".to_string(),
                    line: index + 1,
                    token: node.action.to_string(),
                });
            }
            if node.transitions.len() != shape.observation_count {
                return Err(MalformedArtifactError::SuccessorCountMismatch {
                    node: index,
                    actual: node.transitions.len(),
                    expected: shape.observation_count,
                });
            }
            if let Some(target) = node
                .transitions
                .iter()
                .filter_map(|s| s.node())
                .find(|&t| t >= node_count)
            {
                return Err(MalformedArtifactError::SuccessorOutOfRange {
                    node: index,
                    target,
                    node_count,
                });
            }
        }

        if alphas.len() != node_count {
            return Err(MalformedArtifactError::NodeCountMismatch {
                alpha_count: alphas.len(),
                node_count,
            });
        }
        for (index, (alpha, node)) in alphas.iter().zip(&nodes).enumerate() {
            if alpha.action != node.action {
                warn!(
                    node = index,
                    graph_action = node.action,
                    alpha_action = alpha.action,
                    "alpha vector action disagrees with policy graph"
                );
            }
        }

        let start = select_start_node(alphas, belief)?;
        debug!(nodes = node_count, start, "loaded policy graph");
        Ok(Self {
            nodes,
            start,
            shape,
        })
    }

    /// Parses both artifact bodies and builds the policy.
    pub fn from_artifacts(
        graph_text: &str,
        alpha_text: &str,
        belief: &[f64],
        shape: PolicyShape,
    ) -> Result<Self, MalformedArtifactError> {
        let nodes = parse_policy_graph(graph_text)?;
        let alphas = parse_alpha_vectors(alpha_text)?;
        Self::new(nodes, &alphas, belief, shape)
    }

    /// Reads both artifact files and builds the policy.
    pub fn load(
        graph_path: &Path,
        alpha_path: &Path,
        belief: &[f64],
        shape: PolicyShape,
    ) -> ClarifyResult<Self> {
        let graph_text = std::fs::read_to_string(graph_path)
            .map_err(|e| ClarifyError::io_at("read policy graph", graph_path, e))?;
        let alpha_text = std::fs::read_to_string(alpha_path)
            .map_err(|e| ClarifyError::io_at("read alpha vectors", alpha_path, e))?;
        Ok(Self::from_artifacts(&graph_text, &alpha_text, belief, shape)?)
    }

    /// Starting node.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// All nodes, indexed by position.
    #[must_use]
    pub fn nodes(&self) -> &[PolicyNode] {
        &self.nodes
    }

    /// Index layout the graph was validated against.
    #[must_use]
    pub const fn shape(&self) -> PolicyShape {
        self.shape
    }

    /// Action taken at `node`.
    #[must_use]
    pub fn action_at(&self, node: usize) -> Option<usize> {
        self.nodes.get(node).map(|n| n.action)
    }

    /// True when `node` takes a delivery action.
    #[must_use]
    pub fn is_terminal(&self, node: usize) -> bool {
        self.action_at(node)
            .is_some_and(|a| self.shape.delivery_range().contains(&a))
    }

    /// Follows the edge of `node` labelled `observation`.
    ///
    /// # Errors
    ///
    /// `UnknownNode` for a node outside the graph, `UnknownObservation` for
    /// an observation outside the model and `MissingEdge` when the solver
    /// left no transition for it.
    pub fn step(&self, node: usize, observation: usize) -> Result<usize, NavigationError> {
        let current = self.nodes.get(node).ok_or(NavigationError::UnknownNode {
            node,
            node_count: self.nodes.len(),
        })?;
        let successor = current
            .successor(observation)
            .ok_or(NavigationError::UnknownObservation {
                observation,
                observation_count: self.shape.observation_count,
            })?;
        match successor {
            Successor::Node(next) => Ok(next),
            Successor::NoTransition => Err(NavigationError::MissingEdge { node, observation }),
        }
    }
}
