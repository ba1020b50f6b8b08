// SPDX-License-Identifier: MIT

//! Typed error handling for skiplogic-rs
//!
//! One top-level enum for everything callers see, with the structural
//! publish checks nested as their own type. Every variant maps to a stable
//! machine-readable kind string so an HTTP layer can translate errors
//! without matching on display text.

use crate::survey::model::{ConditionId, ConditionKind, Question, QuestionId};
use thiserror::Error;

/// Top-level error type for skiplogic-rs
#[derive(Debug, Error)]
pub enum SurveyError {
    /// Lookup failed, or the entity is not visible in this context
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// Submission against a survey this user already finished
    #[error("you have already answered this survey")]
    AlreadyCompleted,

    /// An earlier required, visible question has no answer yet
    #[error("question '{title}' must be answered first")]
    RequiredQuestionPending { question: QuestionId, title: String },

    /// The submitted question's own gate evaluates to false
    #[error("the conditions for this question are not satisfied")]
    ConditionNotSatisfied,

    /// Submitted value does not fit the question type
    #[error("invalid answer: {reason}")]
    InvalidAnswer { reason: String },

    /// Asked for the question before the survey's first visible question
    #[error("this is the first question")]
    NoPreviousQuestion,

    /// Structural mutation or publish attempted on a published survey
    #[error("survey is already published")]
    AlreadyPublished,

    /// Options attached to a question that is not option-typed
    #[error("options can only belong to option questions")]
    InvalidQuestionType,

    /// Condition kind incompatible with the source question's type
    #[error("condition kind '{kind}' does not match the source question type")]
    ConditionKindMismatch { kind: ConditionKind },

    /// Condition value has the wrong shape for its kind
    #[error("condition value '{value}' is not valid for the source question")]
    InvalidConditionValue { value: String },

    /// Operator combining a condition with itself
    #[error("an operator must combine two different conditions")]
    OperandsNotDistinct,

    /// Operator over conditions that gate different questions
    #[error("operator conditions must target the same question")]
    TargetMismatch,

    /// Referenced entity belongs to a different survey
    #[error("referenced {entity} does not belong to this survey")]
    OutsideSurvey { entity: &'static str },

    /// Survey definition references an unknown symbolic id
    #[error("unknown ref '{name}' in survey definition")]
    UnknownRef { name: String },

    /// Survey definition declares the same symbolic id twice
    #[error("duplicate ref '{name}' in survey definition")]
    DuplicateRef { name: String },

    /// Structural publish checks
    #[error("survey cannot be published: {0}")]
    Publish(#[from] PublishError),

    /// I/O errors while loading definitions
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Structural problems that keep a draft from being published
#[derive(Debug, Error)]
pub enum PublishError {
    /// Survey has no questions at all
    #[error("survey has no questions")]
    NoQuestions,

    /// Two questions share a priority
    #[error("more than one question has priority {priority}")]
    DuplicatePriority { priority: i32 },

    /// Option question with fewer than two options
    #[error("question '{title}' needs at least two options")]
    InsufficientOptions { question: QuestionId, title: String },

    /// Condition whose source question does not come before its target
    #[error("condition source question {source_question} must come before target question {target_question}")]
    PriorityConflict {
        source_question: QuestionId,
        target_question: QuestionId,
    },

    /// Operators covering the same target question share a priority
    #[error("operators for question {question} share priority {priority}")]
    DuplicateOperatorPriority { question: QuestionId, priority: i32 },

    /// A multi-condition target has a condition no operator combines
    #[error("condition {condition} is combined by no operator")]
    UncoveredCondition { condition: ConditionId },
}

impl SurveyError {
    /// Create a not-found error for the given entity label
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    /// Create an invalid-answer error
    pub fn invalid_answer(reason: impl Into<String>) -> Self {
        Self::InvalidAnswer {
            reason: reason.into(),
        }
    }

    /// Create a required-question-pending error naming the question
    pub fn required_pending(question: &Question) -> Self {
        Self::RequiredQuestionPending {
            question: question.id,
            title: question.title.clone(),
        }
    }

    /// Create an unknown-ref error
    pub fn unknown_ref(name: impl Into<String>) -> Self {
        Self::UnknownRef { name: name.into() }
    }

    /// Create a duplicate-ref error
    pub fn duplicate_ref(name: impl Into<String>) -> Self {
        Self::DuplicateRef { name: name.into() }
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AlreadyCompleted => "already_completed",
            Self::RequiredQuestionPending { .. } => "required_question_pending",
            Self::ConditionNotSatisfied => "condition_not_satisfied",
            Self::InvalidAnswer { .. } => "invalid_answer",
            Self::NoPreviousQuestion => "no_previous_question",
            Self::AlreadyPublished => "already_published",
            Self::InvalidQuestionType => "invalid_question_type",
            Self::ConditionKindMismatch { .. } => "condition_kind_mismatch",
            Self::InvalidConditionValue { .. } => "invalid_condition_value",
            Self::OperandsNotDistinct => "operands_not_distinct",
            Self::TargetMismatch => "target_mismatch",
            Self::OutsideSurvey { .. } => "outside_survey",
            Self::UnknownRef { .. } => "unknown_ref",
            Self::DuplicateRef { .. } => "duplicate_ref",
            Self::Publish(inner) => inner.kind(),
            Self::Io(_) => "io",
            Self::Yaml(_) => "yaml",
        }
    }
}

impl PublishError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoQuestions => "no_questions",
            Self::DuplicatePriority { .. } => "duplicate_priority",
            Self::InsufficientOptions { .. } => "insufficient_options",
            Self::PriorityConflict { .. } => "priority_conflict",
            Self::DuplicateOperatorPriority { .. } => "duplicate_operator_priority",
            Self::UncoveredCondition { .. } => "uncovered_condition",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_conflict_carries_ids_as_data() {
        let err = PublishError::PriorityConflict {
            source_question: QuestionId(4),
            target_question: QuestionId(2),
        };
        assert_eq!(err.kind(), "priority_conflict");
        assert_eq!(
            err.to_string(),
            "condition source question 4 must come before target question 2"
        );
        // the question ids are payload, not a wrapped cause
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_publish_errors_keep_their_kind_when_wrapped() {
        let err = SurveyError::from(PublishError::NoQuestions);
        assert_eq!(err.kind(), "no_questions");
        assert!(std::error::Error::source(&err).is_some());
    }
}
