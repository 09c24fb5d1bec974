//! Interactive execution of a solved policy.
//!
//! The loop starts at the policy's start node, asks the question of each
//! question node through an [`AnswerSource`], maps the answer to an
//! observation index and follows that edge until a delivery node is reached.

mod answer;
mod question;
mod runner;

pub use answer::{
    ask_until_accepted, AnswerChannel, AnswerSource, ChannelAnswerSource, ConsoleAnswerSource,
    ScriptedAnswerSource,
};
pub use question::Question;
pub use runner::{Delivery, Exchange, ExecutionLoop, DEFAULT_MAX_ANSWER_ATTEMPTS};
