//! # clarify - Question-Asking Delivery Planner
//!
//! clarify decides, under uncertainty about what a request means, whether to
//! ask a clarifying question or commit to a delivery. A reasoner enumerates
//! the weighted possible worlds consistent with what is known; clarify turns
//! them into a POMDP model, hands it to an external solver, and walks the
//! resulting policy graph as answers arrive.
//!
//! ## Core Concepts
//!
//! - **World**: one full assignment of the tracked variables, with a weight
//! - **ModelSpec**: states, actions, observations and their distributions,
//!   indexed consistently for the solver
//! - **Policy**: the solved policy graph with the start node picked from the
//!   alpha vectors and the initial belief
//! - **ExecutionLoop**: asks questions through an `AnswerSource` until a
//!   delivery node is reached
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clarify::{build_model, Policy, PolicyShape, RewardParams, VariableDomain, World};
//!
//! let domain = VariableDomain::parse("item:book,cup\nroom:kitchen,office\n")?;
//! let worlds = vec![
//!     World::new(["cup", "office"], 3.0),
//!     World::new(["book", "kitchen"], 1.0),
//! ];
//! let vars = ["item".to_string(), "room".to_string()];
//! let model = build_model(&domain, &vars, &worlds, &RewardParams::default())?;
//!
//! // ... solve the model, then:
//! let policy = Policy::load(&graph, &alpha, &model.belief(), PolicyShape::from(&model))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Inputs
pub mod domain;
pub mod error;
pub mod facts;

// Model synthesis and policy interpretation
pub mod model;
pub mod policy;

// Running episodes
pub mod config;
pub mod execution;
pub mod external;
pub mod planner;

pub use config::{PlannerConfig, ReasonerConfig, SolverConfig};
pub use domain::{parse_world_list, VariableDomain, World};
pub use error::{
    ClarifyError, ClarifyResult, ConfigurationError, ExternalError, MalformedArtifactError,
    NavigationError,
};
pub use execution::{
    AnswerSource, ChannelAnswerSource, ConsoleAnswerSource, Delivery, ExecutionLoop, Question,
    ScriptedAnswerSource,
};
pub use external::{PolicySolver, PomdpSolve, SolverArtifacts, WorldEnumerator, XsbReasoner};
pub use facts::{Fact, FactBase, SituationalPrompt};
pub use model::{
    build_model, normalize_weights, to_solver_format, write_model_file, ActionKind, ModelBuilder,
    ModelSpec, Probability, RewardParams,
};
pub use planner::{Plan, Planner, Synthesis};
pub use policy::{select_start_node, AlphaVector, Policy, PolicyNode, PolicyShape, Successor};
