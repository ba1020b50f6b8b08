// SPDX-License-Identifier: MIT

//! Entity storage
//!
//! `SurveyStore` is the persistence seam: plain CRUD plus the filtered
//! queries the services need. Deletions cascade through owned entities so
//! no method leaves dangling references. Business rules live in the
//! authoring, publish and engine layers, not here.

mod memory;

pub use memory::MemoryStore;

use crate::survey::error::SurveyError;
use crate::survey::model::{
    AnswerRecord, CompletionMarker, Condition, ConditionId, NewCondition, NewOperator, NewOption,
    NewQuestion, Operator, OperatorId, OptionId, OptionItem, Question, QuestionId, Survey,
    SurveyId, UserId,
};
use async_trait::async_trait;

/// Storage for surveys and everything hanging off them
#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Create a draft survey
    async fn insert_survey(&self, title: &str) -> Result<Survey, SurveyError>;

    /// Fetch a survey by id
    async fn survey(&self, id: SurveyId) -> Result<Option<Survey>, SurveyError>;

    /// Replace a survey's title
    async fn update_survey_title(&self, id: SurveyId, title: &str) -> Result<Survey, SurveyError>;

    /// Flip a survey to published and stamp the publication time
    async fn mark_published(&self, id: SurveyId) -> Result<Survey, SurveyError>;

    /// Delete a survey and everything it owns
    async fn delete_survey(&self, id: SurveyId) -> Result<(), SurveyError>;

    /// Create a question under a survey
    async fn insert_question(
        &self,
        survey: SurveyId,
        fields: NewQuestion,
    ) -> Result<Question, SurveyError>;

    /// Fetch a question by id
    async fn question(&self, id: QuestionId) -> Result<Option<Question>, SurveyError>;

    /// Questions of a survey in ascending priority order
    async fn questions_of(&self, survey: SurveyId) -> Result<Vec<Question>, SurveyError>;

    /// Replace a question's fields
    async fn update_question(
        &self,
        id: QuestionId,
        fields: NewQuestion,
    ) -> Result<Question, SurveyError>;

    /// Delete a question, its options, the conditions referencing it on
    /// either side, the operators over those conditions, and its answers
    async fn delete_question(&self, id: QuestionId) -> Result<(), SurveyError>;

    /// Create an option under a question
    async fn insert_option(
        &self,
        question: QuestionId,
        fields: NewOption,
    ) -> Result<OptionItem, SurveyError>;

    /// Fetch an option by id
    async fn option(&self, id: OptionId) -> Result<Option<OptionItem>, SurveyError>;

    /// Options of a question in ascending priority order
    async fn options_of(&self, question: QuestionId) -> Result<Vec<OptionItem>, SurveyError>;

    /// Replace an option's fields
    async fn update_option(
        &self,
        id: OptionId,
        fields: NewOption,
    ) -> Result<OptionItem, SurveyError>;

    /// Delete a single option
    async fn delete_option(&self, id: OptionId) -> Result<(), SurveyError>;

    /// Delete every option of a question
    async fn delete_options_of(&self, question: QuestionId) -> Result<(), SurveyError>;

    /// Create a condition under a survey
    async fn insert_condition(
        &self,
        survey: SurveyId,
        fields: NewCondition,
    ) -> Result<Condition, SurveyError>;

    /// Fetch a condition by id
    async fn condition(&self, id: ConditionId) -> Result<Option<Condition>, SurveyError>;

    /// Conditions of a survey
    async fn conditions_of(&self, survey: SurveyId) -> Result<Vec<Condition>, SurveyError>;

    /// Replace a condition's fields
    async fn update_condition(
        &self,
        id: ConditionId,
        fields: NewCondition,
    ) -> Result<Condition, SurveyError>;

    /// Delete a condition and the operators referencing it
    async fn delete_condition(&self, id: ConditionId) -> Result<(), SurveyError>;

    /// Delete all conditions sourced from the given question, plus the
    /// operators referencing them
    async fn delete_conditions_sourced_from(&self, question: QuestionId)
        -> Result<(), SurveyError>;

    /// Create an operator under a survey
    async fn insert_operator(
        &self,
        survey: SurveyId,
        fields: NewOperator,
    ) -> Result<Operator, SurveyError>;

    /// Fetch an operator by id
    async fn operator(&self, id: OperatorId) -> Result<Option<Operator>, SurveyError>;

    /// Operators of a survey in ascending priority order
    async fn operators_of(&self, survey: SurveyId) -> Result<Vec<Operator>, SurveyError>;

    /// Replace an operator's fields
    async fn update_operator(
        &self,
        id: OperatorId,
        fields: NewOperator,
    ) -> Result<Operator, SurveyError>;

    /// Delete a single operator
    async fn delete_operator(&self, id: OperatorId) -> Result<(), SurveyError>;

    /// The user's current answer to one question
    async fn answer(
        &self,
        user: UserId,
        question: QuestionId,
    ) -> Result<Option<AnswerRecord>, SurveyError>;

    /// All of the user's answers to one survey's questions
    async fn answers_for(
        &self,
        user: UserId,
        survey: SurveyId,
    ) -> Result<Vec<AnswerRecord>, SurveyError>;

    /// Record or replace the user's answer to a question
    async fn upsert_answer(
        &self,
        user: UserId,
        question: QuestionId,
        text: Option<String>,
        option: Option<OptionId>,
    ) -> Result<AnswerRecord, SurveyError>;

    /// Delete the user's answers to every question of the survey whose
    /// priority is at or after the cutoff; returns how many were removed
    async fn delete_answers_from(
        &self,
        user: UserId,
        survey: SurveyId,
        min_priority: i32,
    ) -> Result<usize, SurveyError>;

    /// Whether the user finished the survey
    async fn completion(
        &self,
        user: UserId,
        survey: SurveyId,
    ) -> Result<Option<CompletionMarker>, SurveyError>;

    /// Mark the user's attempt as finished
    async fn insert_completion(
        &self,
        user: UserId,
        survey: SurveyId,
    ) -> Result<CompletionMarker, SurveyError>;
}
