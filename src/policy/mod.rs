//! Solver output interpretation.
//!
//! Parses the policy-graph and alpha-vector artifacts, selects the start
//! node for the initial belief, and provides the traversal step used by the
//! execution loop.

mod alpha;
mod graph;
mod interpreter;

pub use alpha::{parse_alpha_vectors, select_start_node, AlphaVector};
pub use graph::{parse_policy_graph, PolicyNode, Successor};
pub use interpreter::{Policy, PolicyShape};
