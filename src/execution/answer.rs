//! Answer sources.
//!
//! Acquiring an answer is the only blocking operation of the execution
//! loop. It is modelled as a synchronous request/response call; a source
//! that can no longer answer reports `AnswerSourceClosed`, which abandons
//! the loop.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;

use crate::error::NavigationError;
use crate::execution::question::Question;

/// Something that answers questions.
pub trait AnswerSource {
    /// Poses `question` and blocks until a raw answer arrives.
    fn ask(&mut self, question: &Question) -> Result<String, NavigationError>;

    /// Called when an answer was rejected, before the question is re-asked.
    fn reject(&mut self, _question: &Question, _error: &NavigationError) {}
}

/// Asks `question` until an accepted answer arrives, at most `max_attempts` times.
///
/// # Errors
///
/// `RetriesExhausted` when every attempt was rejected, or whatever the
/// source itself fails with.
pub fn ask_until_accepted(
    source: &mut dyn AnswerSource,
    question: &Question,
    max_attempts: usize,
) -> Result<String, NavigationError> {
    for attempt in 1..=max_attempts {
        let raw = source.ask(question)?;
        match question.check(&raw) {
            Ok(answer) => return Ok(answer),
            Err(err) => {
                debug!(attempt, error = %err, "answer rejected");
                source.reject(question, &err);
            }
        }
    }
    Err(NavigationError::RetriesExhausted {
        attempts: max_attempts,
    })
}

/// Line-based prompt/response over any reader and writer.
#[derive(Debug)]
pub struct ConsoleAnswerSource<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleAnswerSource<R, W> {
    /// Wraps a reader and writer.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Writes one line to the output (greetings, delivery notices).
    pub fn say(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
        let _ = self.output.flush();
    }

    /// Consumes the source, returning the writer.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> AnswerSource for ConsoleAnswerSource<R, W> {
    fn ask(&mut self, question: &Question) -> Result<String, NavigationError> {
        writeln!(self.output, "{}", question.text)
            .and_then(|()| self.output.flush())
            .map_err(|_| NavigationError::AnswerSourceClosed)?;
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => Err(NavigationError::AnswerSourceClosed),
            Ok(_) => Ok(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn reject(&mut self, question: &Question, _error: &NavigationError) {
        self.say(&question.hint);
    }
}

/// Replays canned answers; records every question asked.
#[derive(Debug, Default, Clone)]
pub struct ScriptedAnswerSource {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedAnswerSource {
    /// Creates a source that will give `answers` in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Question texts asked so far.
    #[must_use]
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Answers not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl AnswerSource for ScriptedAnswerSource {
    fn ask(&mut self, question: &Question) -> Result<String, NavigationError> {
        self.asked.push(question.text.clone());
        self.answers
            .pop_front()
            .ok_or(NavigationError::AnswerSourceClosed)
    }
}

/// Answer source backed by a request/response channel pair.
///
/// The loop side sends each `Question` and blocks on the answer; the other
/// side (another thread, a UI, a test) receives questions and replies.
/// Dropping either end closes the conversation.
#[derive(Debug)]
pub struct ChannelAnswerSource {
    questions: Sender<Question>,
    answers: Receiver<String>,
}

/// The answering end of a `ChannelAnswerSource`.
#[derive(Debug)]
pub struct AnswerChannel {
    /// Incoming questions.
    pub questions: Receiver<Question>,
    /// Outgoing answers.
    pub answers: Sender<String>,
}

impl ChannelAnswerSource {
    /// Creates a connected pair with room for one outstanding request.
    #[must_use]
    pub fn pair() -> (Self, AnswerChannel) {
        let (q_tx, q_rx) = bounded(1);
        let (a_tx, a_rx) = bounded(1);
        (
            Self {
                questions: q_tx,
                answers: a_rx,
            },
            AnswerChannel {
                questions: q_rx,
                answers: a_tx,
            },
        )
    }
}

impl AnswerSource for ChannelAnswerSource {
    fn ask(&mut self, question: &Question) -> Result<String, NavigationError> {
        self.questions
            .send(question.clone())
            .map_err(|_| NavigationError::AnswerSourceClosed)?;
        self.answers
            .recv()
            .map_err(|_| NavigationError::AnswerSourceClosed)
    }
}
