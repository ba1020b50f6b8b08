// SPDX-License-Identifier: MIT

//! Survey entities, ids and the closed enums
//!
//! Every fixed-choice field is a closed enum so that evaluator and
//! validator dispatch stays exhaustive. Ids are integer newtypes assigned
//! by the store; `option_equal` conditions compare against the `Display`
//! rendering of an option id.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a survey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurveyId(pub u64);

/// Identifies a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(pub u64);

/// Identifies an option of an option question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionId(pub u64);

/// Identifies a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConditionId(pub u64);

/// Identifies an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperatorId(pub u64);

/// Identifies a respondent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for SurveyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a survey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    /// Structurally mutable, not yet answerable
    Draft,
    /// Answerable, structurally frozen
    Published,
}

/// Kind of answer a question accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Single choice among the question's options
    Option,
    /// Free text
    Text,
    /// A number, stored as its textual form
    Numerical,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Option => "option",
            QuestionType::Text => "text",
            QuestionType::Numerical => "numerical",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison a condition applies to the answer of its source question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    OptionEqual,
    OptionNotEqual,
    NumberLt,
    NumberLte,
    NumberGt,
    NumberGte,
    TextContain,
    TextNotContain,
    TextStart,
    TextNotStart,
    TextEnd,
    TextNotEnd,
}

impl ConditionKind {
    /// Kinds that compare against a chosen option id
    pub fn is_option_kind(&self) -> bool {
        matches!(self, ConditionKind::OptionEqual | ConditionKind::OptionNotEqual)
    }

    /// Kinds that compare numerically
    pub fn is_number_kind(&self) -> bool {
        matches!(
            self,
            ConditionKind::NumberLt
                | ConditionKind::NumberLte
                | ConditionKind::NumberGt
                | ConditionKind::NumberGte
        )
    }

    /// Kinds that match against answer text
    pub fn is_text_kind(&self) -> bool {
        matches!(
            self,
            ConditionKind::TextContain
                | ConditionKind::TextNotContain
                | ConditionKind::TextStart
                | ConditionKind::TextNotStart
                | ConditionKind::TextEnd
                | ConditionKind::TextNotEnd
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::OptionEqual => "option_equal",
            ConditionKind::OptionNotEqual => "option_not_equal",
            ConditionKind::NumberLt => "number_lt",
            ConditionKind::NumberLte => "number_lte",
            ConditionKind::NumberGt => "number_gt",
            ConditionKind::NumberGte => "number_gte",
            ConditionKind::TextContain => "text_contain",
            ConditionKind::TextNotContain => "text_not_contain",
            ConditionKind::TextStart => "text_start",
            ConditionKind::TextNotStart => "text_not_start",
            ConditionKind::TextEnd => "text_end",
            ConditionKind::TextNotEnd => "text_not_end",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean connective combining two condition results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperatorKind {
    And,
    Or,
    Xor,
}

impl OperatorKind {
    /// Apply the connective to two evaluated condition results
    pub fn apply(&self, first: bool, second: bool) -> bool {
        match self {
            OperatorKind::And => first && second,
            OperatorKind::Or => first || second,
            OperatorKind::Xor => first ^ second,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorKind::And => "and",
            OperatorKind::Or => "or",
            OperatorKind::Xor => "xor",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A survey: an ordered set of questions plus its gating graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: SurveyId,
    pub title: String,
    pub status: SurveyStatus,
    pub created_at: DateTime<Utc>,
    /// Set once, when the survey leaves draft
    pub published_at: Option<DateTime<Utc>>,
}

/// A single question of a survey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub survey: SurveyId,
    pub title: String,
    pub question_type: QuestionType,
    /// Required questions must be answered before any later question
    pub required: bool,
    /// Position in the survey; unique per survey once published
    pub priority: i32,
}

/// A selectable choice of an option question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionItem {
    pub id: OptionId,
    pub question: QuestionId,
    pub title: String,
    pub priority: Option<i32>,
}

/// A gating condition: compares the answer of `source_question` against
/// `value` and gates the visibility of `target_question`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: ConditionId,
    pub survey: SurveyId,
    pub source_question: QuestionId,
    pub target_question: QuestionId,
    pub kind: ConditionKind,
    /// Comparison operand; an option id, a number or a text fragment
    /// depending on `kind`
    pub value: String,
}

/// Combines the results of two conditions targeting the same question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub survey: SurveyId,
    pub first_condition: ConditionId,
    pub second_condition: ConditionId,
    pub kind: OperatorKind,
    /// When several operators cover the same target, the lowest priority wins
    pub priority: i32,
}

/// A user's current answer to one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub user: UserId,
    pub question: QuestionId,
    /// Set for text and numerical questions
    pub text: Option<String>,
    /// Set for option questions
    pub option: Option<OptionId>,
    pub answered_at: DateTime<Utc>,
}

impl AnswerRecord {
    /// The answer as a string: the recorded text, or the chosen option id.
    /// This is what pre-fill shows and what cascade checks compare.
    pub fn value(&self) -> Option<String> {
        match (&self.text, self.option) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(option)) => Some(option.to_string()),
            (None, None) => None,
        }
    }
}

/// Marks a (user, survey) attempt as finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMarker {
    pub user: UserId,
    pub survey: SurveyId,
    pub completed_at: DateTime<Utc>,
}

/// Fields for creating or replacing a question
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub title: String,
    pub question_type: QuestionType,
    pub required: bool,
    pub priority: i32,
}

/// Fields for creating or replacing an option
#[derive(Debug, Clone)]
pub struct NewOption {
    pub title: String,
    pub priority: Option<i32>,
}

/// Fields for creating or replacing a condition
#[derive(Debug, Clone)]
pub struct NewCondition {
    pub source_question: QuestionId,
    pub target_question: QuestionId,
    pub kind: ConditionKind,
    pub value: String,
}

/// Fields for creating or replacing an operator
#[derive(Debug, Clone)]
pub struct NewOperator {
    pub first_condition: ConditionId,
    pub second_condition: ConditionId,
    pub kind: OperatorKind,
    pub priority: i32,
}
