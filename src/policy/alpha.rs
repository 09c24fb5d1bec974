//! Alpha-vector artifact and start-node selection.
//!
//! The file holds one block per policy-graph node, in node order: an action
//! line followed by a line of per-state values. Blank separator lines are
//! ignored.

use serde::{Deserialize, Serialize};

use crate::error::MalformedArtifactError;

const ARTIFACT: &str = "alpha vectors";

/// Value vector of one policy-graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaVector {
    /// Action recorded for the node.
    pub action: usize,

    /// One value per state.
    pub values: Vec<f64>,
}

impl AlphaVector {
    /// Inner product with a belief vector of the same length.
    #[must_use]
    pub fn dot(&self, belief: &[f64]) -> f64 {
        self.values.iter().zip(belief).map(|(a, b)| a * b).sum()
    }
}

/// Parses an alpha-vector file body.
///
/// # Errors
///
/// - `Empty` when there are no blocks
/// - `InvalidActionIndex` / `InvalidNumber` for unparseable tokens, and
///   `InvalidNumber` for `nan` or infinite values
/// - `DanglingActionLine` when the last action line has no vector
pub fn parse_alpha_vectors(text: &str) -> Result<Vec<AlphaVector>, MalformedArtifactError> {
    let mut vectors = Vec::new();
    let mut pending: Option<(usize, usize)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let line_no = idx + 1;
        match pending.take() {
            None => {
                let action = line
                    .parse()
                    .map_err(|_| MalformedArtifactError::InvalidActionIndex {
                        artifact: ARTIFACT.to_string(),
                        line: line_no,
                        token: line.to_string(),
                    })?;
                pending = Some((action, line_no));
            }
            Some((action, _)) => {
                let values = line
                    .split_whitespace()
                    .map(|token| {
                        token
                            .parse::<f64>()
                            .ok()
                            .filter(|v| v.is_finite())
                            .ok_or_else(|| MalformedArtifactError::InvalidNumber {
                                artifact: ARTIFACT.to_string(),
                                line: line_no,
                                token: token.to_string(),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                vectors.push(AlphaVector { action, values });
            }
        }
    }

    if let Some((_, line)) = pending {
        return Err(MalformedArtifactError::DanglingActionLine { line });
    }
    if vectors.is_empty() {
        return Err(MalformedArtifactError::Empty {
            artifact: ARTIFACT.to_string(),
        });
    }
    Ok(vectors)
}

/// Picks the node whose alpha vector has the largest inner product with
/// `belief`.
///
/// A node must beat the running best strictly, and the running best starts
/// at node 0 with value 0: ties keep the earliest node and node 0 is
/// returned when no product is positive.
///
/// # Errors
///
/// `Empty` for no vectors, `VectorLengthMismatch` when a vector's length
/// differs from the belief's.
pub fn select_start_node(
    alphas: &[AlphaVector],
    belief: &[f64],
) -> Result<usize, MalformedArtifactError> {
    if alphas.is_empty() {
        return Err(MalformedArtifactError::Empty {
            artifact: ARTIFACT.to_string(),
        });
    }

    let mut best = 0;
    let mut best_value = 0.0;
    for (node, alpha) in alphas.iter().enumerate() {
        if alpha.values.len() != belief.len() {
            return Err(MalformedArtifactError::VectorLengthMismatch {
                node,
                actual: alpha.values.len(),
                expected: belief.len(),
            });
        }
        let value = alpha.dot(belief);
        if value > best_value {
            best_value = value;
            best = node;
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha(action: usize, values: &[f64]) -> AlphaVector {
        AlphaVector {
            action,
            values: values.to_vec(),
        }
    }

    #[test]
    fn parses_blocks_with_blank_separators() {
        let text = "3\n1.5 -2 0.25\n\n6\n10 20 30\n\n";
        let vectors = parse_alpha_vectors(text).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], alpha(3, &[1.5, -2.0, 0.25]));
        assert_eq!(vectors[1].action, 6);
    }

    #[test]
    fn parses_blocks_without_separators() {
        let vectors = parse_alpha_vectors("0\n1 2\n1\n3 4\n").unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[1], alpha(1, &[3.0, 4.0]));
    }

    #[test]
    fn malformed_alpha_files() {
        assert!(matches!(
            parse_alpha_vectors("").unwrap_err(),
            MalformedArtifactError::Empty { .. }
        ));
        assert_eq!(
            parse_alpha_vectors("0\n1 2\n\n4\n").unwrap_err(),
            MalformedArtifactError::DanglingActionLine { line: 4 }
        );
        assert!(matches!(
            parse_alpha_vectors("zero\n1 2\n").unwrap_err(),
            MalformedArtifactError::InvalidActionIndex { line: 1, .. }
        ));
        assert!(matches!(
            parse_alpha_vectors("0\n1 two\n").unwrap_err(),
            MalformedArtifactError::InvalidNumber { line: 2, .. }
        ));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert_eq!(
            parse_alpha_vectors("0\n1 2\n1\n3 nan\n").unwrap_err(),
            MalformedArtifactError::InvalidNumber {
                artifact: ARTIFACT.to_string(),
                line: 4,
                token: "nan".to_string(),
            }
        );
        assert!(matches!(
            parse_alpha_vectors("0\n-inf 1\n").unwrap_err(),
            MalformedArtifactError::InvalidNumber { line: 2, .. }
        ));
    }

    #[test]
    fn picks_highest_inner_product() {
        let alphas = vec![alpha(0, &[1.0, 0.0]), alpha(1, &[0.0, 5.0]), alpha(2, &[2.0, 2.0])];
        assert_eq!(select_start_node(&alphas, &[0.25, 0.75]).unwrap(), 1);
        assert_eq!(select_start_node(&alphas, &[1.0, 0.0]).unwrap(), 2);
    }

    #[test]
    fn ties_keep_the_earliest_node() {
        let alphas = vec![alpha(0, &[-1.0, -1.0]), alpha(1, &[4.0, 0.0]), alpha(2, &[0.0, 4.0])];
        for _ in 0..5 {
            assert_eq!(select_start_node(&alphas, &[0.5, 0.5]).unwrap(), 1);
        }
    }

    #[test]
    fn non_positive_products_default_to_node_zero() {
        let alphas = vec![alpha(0, &[-5.0, -5.0]), alpha(1, &[-1.0, -1.0])];
        assert_eq!(select_start_node(&alphas, &[0.5, 0.5]).unwrap(), 0);
    }

    #[test]
    fn selection_errors() {
        assert!(matches!(
            select_start_node(&[], &[1.0]).unwrap_err(),
            MalformedArtifactError::Empty { .. }
        ));
        assert_eq!(
            select_start_node(&[alpha(0, &[1.0, 2.0, 3.0])], &[0.5, 0.5]).unwrap_err(),
            MalformedArtifactError::VectorLengthMismatch {
                node: 0,
                actual: 3,
                expected: 2
            }
        );
    }
}
