//! Planning-model synthesis.
//!
//! The model is built as an immutable `ModelSpec` and serialized separately,
//! so its correctness can be checked without looking at solver text.

mod builder;
mod normalize;
mod serialization;
mod types;

pub use builder::{build_model, ModelBuilder};
pub use normalize::{normalize_weights, StartProbabilities};
pub use serialization::{to_solver_format, write_model_file, MODEL_EXTENSION};
pub use types::{
    Action, ActionKind, ModelSpec, ObservationEntry, ObservationSpec, Probability, RewardEntry,
    RewardParams, Selector, State, TransitionEntry, TransitionSpec, DISCOUNT, FIXED_OBSERVATIONS,
    OBJECTIVE, OBS_NO, OBS_NONE, OBS_YES, TERMINAL_STATE,
};
