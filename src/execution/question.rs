//! Questions put to the answer source.

use serde::{Deserialize, Serialize};

use crate::domain::VariableDomain;
use crate::error::NavigationError;
use crate::facts::SituationalPrompt;
use crate::model::{ActionKind, OBS_NO, OBS_YES};

/// A question and the answers it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Text shown to the user.
    pub text: String,

    /// Accepted answers; empty accepts anything non-blank.
    pub accepted: Vec<String>,

    /// Message shown when an answer is rejected.
    pub hint: String,
}

impl Question {
    /// Builds the question asked by a question action.
    ///
    /// Returns `None` for deliveries, which are never asked.
    #[must_use]
    pub fn for_action(kind: &ActionKind, domain: &VariableDomain) -> Option<Self> {
        match kind {
            ActionKind::WhichQuestion { variable } => {
                let text = if variable == "item" {
                    "Which item should be delivered?".to_string()
                } else {
                    format!("Which {variable} should this item be delivered to?")
                };
                Some(Self {
                    text,
                    accepted: domain.values(variable).map(<[String]>::to_vec).unwrap_or_default(),
                    hint: "Invalid answer".to_string(),
                })
            }
            ActionKind::PolarQuestion { variable, value } => {
                let text = if variable == "item" {
                    format!("Is the item a {value}?")
                } else {
                    format!("Is this delivery for {value}?")
                };
                Some(Self {
                    text,
                    accepted: vec![OBS_YES.to_string(), OBS_NO.to_string()],
                    hint: "Answer must be yes or no".to_string(),
                })
            }
            ActionKind::Delivery { .. } => None,
        }
    }

    /// Builds the question for a situational prompt.
    #[must_use]
    pub fn for_prompt(prompt: &SituationalPrompt) -> Self {
        Self {
            text: prompt.question.clone(),
            accepted: prompt.allowed.clone(),
            hint: "Improper value, please try again".to_string(),
        }
    }

    /// Normalizes `answer` and checks it against the accepted set.
    ///
    /// # Errors
    ///
    /// `UnrecognizedAnswer` when the answer is blank or not accepted.
    pub fn check(&self, answer: &str) -> Result<String, NavigationError> {
        let normalized = SituationalPrompt::normalize(answer);
        let ok = !normalized.is_empty()
            && (self.accepted.is_empty() || self.accepted.contains(&normalized));
        if ok {
            Ok(normalized)
        } else {
            Err(NavigationError::UnrecognizedAnswer {
                answer: answer.trim().to_string(),
                expected: if self.accepted.is_empty() {
                    "any non-empty answer".to_string()
                } else {
                    self.accepted.join(", ")
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> VariableDomain {
        VariableDomain::parse("item:book,cup\nroom:kitchen,office\n").unwrap()
    }

    #[test]
    fn which_questions_accept_domain_values() {
        let q = Question::for_action(
            &ActionKind::WhichQuestion {
                variable: "room".to_string(),
            },
            &domain(),
        )
        .unwrap();
        assert_eq!(q.text, "Which room should this item be delivered to?");
        assert_eq!(q.check(" office ").unwrap(), "office");
        assert!(q.check("garage").is_err());
    }

    #[test]
    fn polar_questions_accept_yes_or_no() {
        let q = Question::for_action(
            &ActionKind::PolarQuestion {
                variable: "item".to_string(),
                value: "cup".to_string(),
            },
            &domain(),
        )
        .unwrap();
        assert_eq!(q.text, "Is the item a cup?");
        assert_eq!(q.check("yes").unwrap(), "yes");
        assert!(matches!(
            q.check("maybe").unwrap_err(),
            NavigationError::UnrecognizedAnswer { .. }
        ));
    }

    #[test]
    fn deliveries_are_not_questions() {
        let kind = ActionKind::Delivery {
            target: "cup_office".to_string(),
            state_index: 2,
        };
        assert!(Question::for_action(&kind, &domain()).is_none());
    }

    #[test]
    fn open_prompt_accepts_any_non_blank_answer() {
        let q = Question::for_prompt(&SituationalPrompt {
            question: "Who am I speaking with?".to_string(),
            predicate: "currentPerson".to_string(),
            allowed: Vec::new(),
        });
        assert_eq!(q.check("Ada Lovelace").unwrap(), "Ada_Lovelace");
        assert!(q.check("  ").is_err());
    }
}
