//! Adapters for the two external programs: the reasoner that enumerates
//! possible worlds and the solver that turns a model into a policy.

mod reasoner;
mod solver;

pub use reasoner::{worlds_from_output, WorldEnumerator, XsbReasoner};
pub use solver::{
    PolicySolver, PomdpSolve, SolverArtifacts, ALPHA_EXTENSION, DEFAULT_EPSILON, GRAPH_EXTENSION,
};
