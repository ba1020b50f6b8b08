// SPDX-License-Identifier: MIT

//! Draft-time survey editing.
//!
//! All structural mutations go through [`Authoring`], which enforces that the
//! survey is still a draft and that cross-entity references stay coherent
//! (condition kinds match their source question type, operator operands share
//! a target, and so on). Once a survey is published its structure is frozen.

use crate::survey::error::{PublishError, SurveyError};
use crate::survey::model::{
    Condition, ConditionId, NewCondition, NewOperator, NewOption, NewQuestion, Operator,
    OperatorId, OptionId, OptionItem, Question, QuestionId, QuestionType, Survey, SurveyId,
    SurveyStatus,
};
use crate::survey::store::SurveyStore;
use std::sync::Arc;

/// Editing front-end over a [`SurveyStore`].
pub struct Authoring {
    store: Arc<dyn SurveyStore>,
}

impl Authoring {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self { store }
    }

    pub async fn create_survey(&self, title: &str) -> Result<Survey, SurveyError> {
        self.store.insert_survey(title).await
    }

    pub async fn rename_survey(&self, id: SurveyId, title: &str) -> Result<Survey, SurveyError> {
        self.draft_survey(id).await?;
        self.store.update_survey_title(id, title).await
    }

    /// Removes a draft survey and everything hanging off it. Published
    /// surveys are frozen and cannot be removed either.
    pub async fn delete_survey(&self, id: SurveyId) -> Result<(), SurveyError> {
        self.draft_survey(id).await?;
        self.store.delete_survey(id).await
    }

    pub async fn create_question(
        &self,
        survey: SurveyId,
        fields: NewQuestion,
    ) -> Result<Question, SurveyError> {
        self.draft_survey(survey).await?;
        self.store.insert_question(survey, fields).await
    }

    /// Updates a question in place. Changing the question type drops its
    /// options and every condition sourced from it, since their values no
    /// longer make sense against the new type.
    pub async fn update_question(
        &self,
        id: QuestionId,
        fields: NewQuestion,
    ) -> Result<Question, SurveyError> {
        let existing = self.question(id).await?;
        self.draft_survey(existing.survey).await?;
        if existing.question_type != fields.question_type {
            self.store.delete_options_of(id).await?;
            self.store.delete_conditions_sourced_from(id).await?;
            log::info!(
                "question {} changed type to {}, dropped its options and sourced conditions",
                id,
                fields.question_type
            );
        }
        self.store.update_question(id, fields).await
    }

    pub async fn delete_question(&self, id: QuestionId) -> Result<(), SurveyError> {
        let existing = self.question(id).await?;
        self.draft_survey(existing.survey).await?;
        self.store.delete_question(id).await
    }

    pub async fn create_option(
        &self,
        question: QuestionId,
        fields: NewOption,
    ) -> Result<OptionItem, SurveyError> {
        let question = self.question(question).await?;
        self.draft_survey(question.survey).await?;
        if question.question_type != QuestionType::Option {
            return Err(SurveyError::InvalidQuestionType);
        }
        self.store.insert_option(question.id, fields).await
    }

    pub async fn update_option(
        &self,
        id: OptionId,
        fields: NewOption,
    ) -> Result<OptionItem, SurveyError> {
        let option = self.option(id).await?;
        let question = self.question(option.question).await?;
        self.draft_survey(question.survey).await?;
        self.store.update_option(id, fields).await
    }

    /// Deletes an option together with the conditions that compare against it.
    pub async fn delete_option(&self, id: OptionId) -> Result<(), SurveyError> {
        let option = self.option(id).await?;
        let question = self.question(option.question).await?;
        self.draft_survey(question.survey).await?;
        let value = option.id.to_string();
        for condition in self.store.conditions_of(question.survey).await? {
            if condition.source_question == question.id
                && condition.kind.is_option_kind()
                && condition.value == value
            {
                self.store.delete_condition(condition.id).await?;
            }
        }
        self.store.delete_option(id).await
    }

    pub async fn create_condition(
        &self,
        survey: SurveyId,
        fields: NewCondition,
    ) -> Result<Condition, SurveyError> {
        self.draft_survey(survey).await?;
        self.validate_condition(survey, &fields).await?;
        self.store.insert_condition(survey, fields).await
    }

    pub async fn update_condition(
        &self,
        id: ConditionId,
        fields: NewCondition,
    ) -> Result<Condition, SurveyError> {
        let existing = self.condition(id).await?;
        self.draft_survey(existing.survey).await?;
        self.validate_condition(existing.survey, &fields).await?;
        self.store.update_condition(id, fields).await
    }

    pub async fn delete_condition(&self, id: ConditionId) -> Result<(), SurveyError> {
        let existing = self.condition(id).await?;
        self.draft_survey(existing.survey).await?;
        self.store.delete_condition(id).await
    }

    pub async fn create_operator(
        &self,
        survey: SurveyId,
        fields: NewOperator,
    ) -> Result<Operator, SurveyError> {
        self.draft_survey(survey).await?;
        self.validate_operator(survey, &fields).await?;
        self.store.insert_operator(survey, fields).await
    }

    pub async fn update_operator(
        &self,
        id: OperatorId,
        fields: NewOperator,
    ) -> Result<Operator, SurveyError> {
        let existing = self.operator(id).await?;
        self.draft_survey(existing.survey).await?;
        self.validate_operator(existing.survey, &fields).await?;
        self.store.update_operator(id, fields).await
    }

    pub async fn delete_operator(&self, id: OperatorId) -> Result<(), SurveyError> {
        let existing = self.operator(id).await?;
        self.draft_survey(existing.survey).await?;
        self.store.delete_operator(id).await
    }

    /// A condition must connect two questions of its own survey, run from an
    /// earlier question to a later one, and carry a value its kind can use.
    async fn validate_condition(
        &self,
        survey: SurveyId,
        fields: &NewCondition,
    ) -> Result<(), SurveyError> {
        let source = self.question(fields.source_question).await?;
        let target = self.question(fields.target_question).await?;
        if source.survey != survey || target.survey != survey {
            return Err(SurveyError::OutsideSurvey { entity: "question" });
        }
        if source.priority >= target.priority {
            return Err(PublishError::PriorityConflict {
                source_question: source.id,
                target_question: target.id,
            }
            .into());
        }

        let kind = fields.kind;
        if kind.is_option_kind() {
            if source.question_type != QuestionType::Option {
                return Err(SurveyError::ConditionKindMismatch { kind });
            }
            let option_id = parse_id(&fields.value)
                .map(OptionId)
                .ok_or_else(|| SurveyError::InvalidConditionValue {
                    value: fields.value.clone(),
                })?;
            match self.store.option(option_id).await? {
                Some(option) if option.question == source.id => {}
                _ => {
                    return Err(SurveyError::InvalidConditionValue {
                        value: fields.value.clone(),
                    })
                }
            }
        } else if kind.is_number_kind() {
            if source.question_type != QuestionType::Numerical {
                return Err(SurveyError::ConditionKindMismatch { kind });
            }
            if parse_id(&fields.value).is_none() {
                return Err(SurveyError::InvalidConditionValue {
                    value: fields.value.clone(),
                });
            }
        } else if source.question_type != QuestionType::Text {
            return Err(SurveyError::ConditionKindMismatch { kind });
        }
        Ok(())
    }

    /// An operator joins two distinct conditions of its own survey that gate
    /// the same target question.
    async fn validate_operator(
        &self,
        survey: SurveyId,
        fields: &NewOperator,
    ) -> Result<(), SurveyError> {
        if fields.first_condition == fields.second_condition {
            return Err(SurveyError::OperandsNotDistinct);
        }
        let first = self.condition(fields.first_condition).await?;
        let second = self.condition(fields.second_condition).await?;
        if first.survey != survey || second.survey != survey {
            return Err(SurveyError::OutsideSurvey {
                entity: "condition",
            });
        }
        if first.target_question != second.target_question {
            return Err(SurveyError::TargetMismatch);
        }
        Ok(())
    }

    async fn draft_survey(&self, id: SurveyId) -> Result<Survey, SurveyError> {
        let survey = self
            .store
            .survey(id)
            .await?
            .ok_or_else(|| SurveyError::not_found("survey"))?;
        if survey.status == SurveyStatus::Published {
            return Err(SurveyError::AlreadyPublished);
        }
        Ok(survey)
    }

    async fn question(&self, id: QuestionId) -> Result<Question, SurveyError> {
        self.store
            .question(id)
            .await?
            .ok_or_else(|| SurveyError::not_found("question"))
    }

    async fn option(&self, id: OptionId) -> Result<OptionItem, SurveyError> {
        self.store
            .option(id)
            .await?
            .ok_or_else(|| SurveyError::not_found("option"))
    }

    async fn condition(&self, id: ConditionId) -> Result<Condition, SurveyError> {
        self.store
            .condition(id)
            .await?
            .ok_or_else(|| SurveyError::not_found("condition"))
    }

    async fn operator(&self, id: OperatorId) -> Result<Operator, SurveyError> {
        self.store
            .operator(id)
            .await?
            .ok_or_else(|| SurveyError::not_found("operator"))
    }
}

fn parse_id(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::model::{ConditionKind, OperatorKind};
    use crate::survey::store::MemoryStore;

    fn fixture() -> Authoring {
        Authoring::new(Arc::new(MemoryStore::new()))
    }

    async fn add_question(
        authoring: &Authoring,
        survey: SurveyId,
        question_type: QuestionType,
        priority: i32,
    ) -> Question {
        authoring
            .create_question(
                survey,
                NewQuestion {
                    title: format!("q{}", priority),
                    question_type,
                    required: false,
                    priority,
                },
            )
            .await
            .unwrap()
    }

    async fn add_option(authoring: &Authoring, question: QuestionId, title: &str) -> OptionItem {
        authoring
            .create_option(
                question,
                NewOption {
                    title: title.to_string(),
                    priority: None,
                },
            )
            .await
            .unwrap()
    }

    fn condition_fields(
        source: QuestionId,
        target: QuestionId,
        kind: ConditionKind,
        value: &str,
    ) -> NewCondition {
        NewCondition {
            source_question: source,
            target_question: target,
            kind,
            value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_mutations_rejected_after_publish() {
        let authoring = fixture();
        let survey = authoring.create_survey("Pets").await.unwrap();
        add_question(&authoring, survey.id, QuestionType::Text, 1).await;
        authoring.store.mark_published(survey.id).await.unwrap();

        let err = authoring
            .create_question(
                survey.id,
                NewQuestion {
                    title: "late".to_string(),
                    question_type: QuestionType::Text,
                    required: false,
                    priority: 2,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "already_published");

        let err = authoring.rename_survey(survey.id, "Pets 2").await.unwrap_err();
        assert_eq!(err.kind(), "already_published");

        let err = authoring.delete_survey(survey.id).await.unwrap_err();
        assert_eq!(err.kind(), "already_published");
    }

    #[tokio::test]
    async fn test_option_only_on_option_questions() {
        let authoring = fixture();
        let survey = authoring.create_survey("Pets").await.unwrap();
        let q = add_question(&authoring, survey.id, QuestionType::Text, 1).await;

        let err = authoring
            .create_option(
                q.id,
                NewOption {
                    title: "yes".to_string(),
                    priority: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_question_type");
    }

    #[tokio::test]
    async fn test_condition_kind_must_match_source_type() {
        let authoring = fixture();
        let survey = authoring.create_survey("Pets").await.unwrap();
        let number = add_question(&authoring, survey.id, QuestionType::Numerical, 1).await;
        let text = add_question(&authoring, survey.id, QuestionType::Text, 2).await;
        let later = add_question(&authoring, survey.id, QuestionType::Text, 3).await;

        let err = authoring
            .create_condition(
                survey.id,
                condition_fields(number.id, later.id, ConditionKind::TextContain, "cat"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "condition_kind_mismatch");

        let err = authoring
            .create_condition(
                survey.id,
                condition_fields(text.id, later.id, ConditionKind::NumberGt, "5"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "condition_kind_mismatch");

        authoring
            .create_condition(
                survey.id,
                condition_fields(number.id, later.id, ConditionKind::NumberGt, "5"),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_number_condition_value_must_be_numeric() {
        let authoring = fixture();
        let survey = authoring.create_survey("Pets").await.unwrap();
        let number = add_question(&authoring, survey.id, QuestionType::Numerical, 1).await;
        let later = add_question(&authoring, survey.id, QuestionType::Text, 2).await;

        let err = authoring
            .create_condition(
                survey.id,
                condition_fields(number.id, later.id, ConditionKind::NumberLt, "many"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_condition_value");
    }

    #[tokio::test]
    async fn test_option_condition_value_must_name_a_source_option() {
        let authoring = fixture();
        let survey = authoring.create_survey("Pets").await.unwrap();
        let picker = add_question(&authoring, survey.id, QuestionType::Option, 1).await;
        let other = add_question(&authoring, survey.id, QuestionType::Option, 2).await;
        let later = add_question(&authoring, survey.id, QuestionType::Text, 3).await;
        let mine = add_option(&authoring, picker.id, "cat").await;
        let theirs = add_option(&authoring, other.id, "dog").await;

        authoring
            .create_condition(
                survey.id,
                condition_fields(
                    picker.id,
                    later.id,
                    ConditionKind::OptionEqual,
                    &mine.id.to_string(),
                ),
            )
            .await
            .unwrap();

        let err = authoring
            .create_condition(
                survey.id,
                condition_fields(picker.id, later.id, ConditionKind::OptionEqual, "999"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_condition_value");

        // option belongs to a different question
        let err = authoring
            .create_condition(
                survey.id,
                condition_fields(
                    picker.id,
                    later.id,
                    ConditionKind::OptionEqual,
                    &theirs.id.to_string(),
                ),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_condition_value");
    }

    #[tokio::test]
    async fn test_condition_must_run_forward() {
        let authoring = fixture();
        let survey = authoring.create_survey("Pets").await.unwrap();
        let first = add_question(&authoring, survey.id, QuestionType::Text, 1).await;
        let second = add_question(&authoring, survey.id, QuestionType::Text, 2).await;

        let err = authoring
            .create_condition(
                survey.id,
                condition_fields(second.id, first.id, ConditionKind::TextContain, "x"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "priority_conflict");
    }

    #[tokio::test]
    async fn test_condition_questions_must_share_survey() {
        let authoring = fixture();
        let survey = authoring.create_survey("Pets").await.unwrap();
        let other = authoring.create_survey("Food").await.unwrap();
        let local = add_question(&authoring, survey.id, QuestionType::Text, 1).await;
        let foreign = add_question(&authoring, other.id, QuestionType::Text, 2).await;

        let err = authoring
            .create_condition(
                survey.id,
                condition_fields(local.id, foreign.id, ConditionKind::TextContain, "x"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "outside_survey");
    }

    #[tokio::test]
    async fn test_operator_operands_must_be_distinct_and_share_target() {
        let authoring = fixture();
        let survey = authoring.create_survey("Pets").await.unwrap();
        let q1 = add_question(&authoring, survey.id, QuestionType::Text, 1).await;
        let q2 = add_question(&authoring, survey.id, QuestionType::Text, 2).await;
        let q3 = add_question(&authoring, survey.id, QuestionType::Text, 3).await;
        let c1 = authoring
            .create_condition(
                survey.id,
                condition_fields(q1.id, q2.id, ConditionKind::TextContain, "a"),
            )
            .await
            .unwrap();
        let c2 = authoring
            .create_condition(
                survey.id,
                condition_fields(q1.id, q3.id, ConditionKind::TextContain, "b"),
            )
            .await
            .unwrap();

        let err = authoring
            .create_operator(
                survey.id,
                NewOperator {
                    first_condition: c1.id,
                    second_condition: c1.id,
                    kind: OperatorKind::And,
                    priority: 1,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "operands_not_distinct");

        let err = authoring
            .create_operator(
                survey.id,
                NewOperator {
                    first_condition: c1.id,
                    second_condition: c2.id,
                    kind: OperatorKind::And,
                    priority: 1,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "target_mismatch");
    }

    #[tokio::test]
    async fn test_type_change_drops_options_and_sourced_conditions() {
        let authoring = fixture();
        let survey = authoring.create_survey("Pets").await.unwrap();
        let picker = add_question(&authoring, survey.id, QuestionType::Option, 1).await;
        let later = add_question(&authoring, survey.id, QuestionType::Text, 2).await;
        let option = add_option(&authoring, picker.id, "cat").await;
        let condition = authoring
            .create_condition(
                survey.id,
                condition_fields(
                    picker.id,
                    later.id,
                    ConditionKind::OptionEqual,
                    &option.id.to_string(),
                ),
            )
            .await
            .unwrap();

        authoring
            .update_question(
                picker.id,
                NewQuestion {
                    title: picker.title.clone(),
                    question_type: QuestionType::Text,
                    required: picker.required,
                    priority: picker.priority,
                },
            )
            .await
            .unwrap();

        assert!(authoring.store.option(option.id).await.unwrap().is_none());
        assert!(authoring
            .store
            .condition(condition.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_option_drops_conditions_on_it() {
        let authoring = fixture();
        let survey = authoring.create_survey("Pets").await.unwrap();
        let picker = add_question(&authoring, survey.id, QuestionType::Option, 1).await;
        let later = add_question(&authoring, survey.id, QuestionType::Text, 2).await;
        let kept_option = add_option(&authoring, picker.id, "cat").await;
        let doomed_option = add_option(&authoring, picker.id, "dog").await;
        let kept = authoring
            .create_condition(
                survey.id,
                condition_fields(
                    picker.id,
                    later.id,
                    ConditionKind::OptionEqual,
                    &kept_option.id.to_string(),
                ),
            )
            .await
            .unwrap();
        let doomed = authoring
            .create_condition(
                survey.id,
                condition_fields(
                    picker.id,
                    later.id,
                    ConditionKind::OptionEqual,
                    &doomed_option.id.to_string(),
                ),
            )
            .await
            .unwrap();

        authoring.delete_option(doomed_option.id).await.unwrap();

        assert!(authoring.store.condition(kept.id).await.unwrap().is_some());
        assert!(authoring
            .store
            .condition(doomed.id)
            .await
            .unwrap()
            .is_none());
    }
}
