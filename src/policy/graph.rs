//! Policy-graph artifact.
//!
//! One node per non-blank line: `<id> <action> <succ_0> <succ_1> ...`.
//! Node identity is the line position; the leading id is ignored. A
//! successor token that is not a node index (the solver writes `-`) means
//! the node has no transition for that observation.

use serde::{Deserialize, Serialize};

use crate::error::MalformedArtifactError;

const ARTIFACT: &str = "policy graph";

/// Where a node goes on a given observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Successor {
    /// Move to this node.
    Node(usize),
    /// The solver pruned this observation branch.
    NoTransition,
}

impl Successor {
    /// Decodes one successor token.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        token.parse().map_or(Self::NoTransition, Self::Node)
    }

    /// The target node, if any.
    #[must_use]
    pub const fn node(self) -> Option<usize> {
        match self {
            Self::Node(n) => Some(n),
            Self::NoTransition => None,
        }
    }
}

/// A policy-graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyNode {
    /// Index of the action taken at this node.
    pub action: usize,

    /// One entry per observation index.
    pub transitions: Vec<Successor>,
}

impl PolicyNode {
    /// Successor for `observation`, or `None` if the index is out of range.
    #[must_use]
    pub fn successor(&self, observation: usize) -> Option<Successor> {
        self.transitions.get(observation).copied()
    }
}

/// Parses a policy-graph file body into nodes, in file order.
///
/// # Errors
///
/// - `Empty` when there are no node lines
/// - `MissingTokens` when a line lacks an id or action
/// - `InvalidActionIndex` when the action is not a non-negative integer
pub fn parse_policy_graph(text: &str) -> Result<Vec<PolicyNode>, MalformedArtifactError> {
    let mut nodes = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() < 2 {
            return Err(MalformedArtifactError::MissingTokens {
                artifact: ARTIFACT.to_string(),
                line: idx + 1,
                actual: tokens.len(),
                expected: 2,
            });
        }
        let action = tokens[1]
            .parse()
            .map_err(|_| MalformedArtifactError::InvalidActionIndex {
                artifact: ARTIFACT.to_string(),
                line: idx + 1,
                token: tokens[1].to_string(),
            })?;
        let transitions = tokens[2..].iter().map(|t| Successor::parse(t)).collect();
        nodes.push(PolicyNode {
            action,
            transitions,
        });
    }

    if nodes.is_empty() {
        return Err(MalformedArtifactError::Empty {
            artifact: ARTIFACT.to_string(),
        });
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nodes_in_file_order() {
        let text = "0 3  1 2 -\n1\t6 - - -\n\n2 7 - - -\n";
        let nodes = parse_policy_graph(text).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].action, 3);
        assert_eq!(
            nodes[0].transitions,
            vec![Successor::Node(1), Successor::Node(2), Successor::NoTransition]
        );
        assert_eq!(nodes[1].action, 6);
        assert_eq!(nodes[2].successor(0), Some(Successor::NoTransition));
        assert_eq!(nodes[2].successor(3), None);
    }

    #[test]
    fn embedded_ids_do_not_define_identity() {
        let nodes = parse_policy_graph("17 1 0\n4 2 0\n").unwrap();
        assert_eq!(nodes[0].action, 1);
        assert_eq!(nodes[1].action, 2);
    }

    #[test]
    fn zero_is_a_real_node_not_a_sentinel() {
        assert_eq!(Successor::parse("0"), Successor::Node(0));
        assert_eq!(Successor::parse("-"), Successor::NoTransition);
        assert_eq!(Successor::parse("-1"), Successor::NoTransition);
        assert_eq!(Successor::Node(0).node(), Some(0));
        assert_eq!(Successor::NoTransition.node(), None);
    }

    #[test]
    fn empty_graph_is_malformed() {
        assert_eq!(
            parse_policy_graph("").unwrap_err(),
            MalformedArtifactError::Empty {
                artifact: "policy graph".to_string()
            }
        );
        assert!(matches!(
            parse_policy_graph("\n  \n").unwrap_err(),
            MalformedArtifactError::Empty { .. }
        ));
    }

    #[test]
    fn short_or_non_numeric_action_lines_are_malformed() {
        assert!(matches!(
            parse_policy_graph("0 1 0\n1\n").unwrap_err(),
            MalformedArtifactError::MissingTokens { line: 2, .. }
        ));
        assert!(matches!(
            parse_policy_graph("0 x 0\n").unwrap_err(),
            MalformedArtifactError::InvalidActionIndex { line: 1, .. }
        ));
    }
}
