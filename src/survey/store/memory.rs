// SPDX-License-Identifier: MIT

//! In-memory reference implementation of the entity store

use super::SurveyStore;
use crate::survey::error::SurveyError;
use crate::survey::model::{
    AnswerRecord, CompletionMarker, Condition, ConditionId, NewCondition, NewOperator, NewOption,
    NewQuestion, Operator, OperatorId, OptionId, OptionItem, Question, QuestionId, Survey,
    SurveyId, SurveyStatus, UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Entity store backed by in-process hash maps.
/// Clones are cheap and share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    surveys: HashMap<SurveyId, Survey>,
    questions: HashMap<QuestionId, Question>,
    options: HashMap<OptionId, OptionItem>,
    conditions: HashMap<ConditionId, Condition>,
    operators: HashMap<OperatorId, Operator>,
    answers: HashMap<(UserId, QuestionId), AnswerRecord>,
    completions: HashMap<(UserId, SurveyId), CompletionMarker>,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn remove_operators_over(&mut self, removed: &HashSet<ConditionId>) {
        self.operators.retain(|_, op| {
            !removed.contains(&op.first_condition) && !removed.contains(&op.second_condition)
        });
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SurveyStore for MemoryStore {
    async fn insert_survey(&self, title: &str) -> Result<Survey, SurveyError> {
        let mut inner = self.inner.write().await;
        let id = SurveyId(inner.next_id());
        let survey = Survey {
            id,
            title: title.to_string(),
            status: SurveyStatus::Draft,
            created_at: Utc::now(),
            published_at: None,
        };
        inner.surveys.insert(id, survey.clone());
        Ok(survey)
    }

    async fn survey(&self, id: SurveyId) -> Result<Option<Survey>, SurveyError> {
        let inner = self.inner.read().await;
        Ok(inner.surveys.get(&id).cloned())
    }

    async fn update_survey_title(&self, id: SurveyId, title: &str) -> Result<Survey, SurveyError> {
        let mut inner = self.inner.write().await;
        let survey = inner
            .surveys
            .get_mut(&id)
            .ok_or_else(|| SurveyError::not_found("survey"))?;
        survey.title = title.to_string();
        Ok(survey.clone())
    }

    async fn mark_published(&self, id: SurveyId) -> Result<Survey, SurveyError> {
        let mut inner = self.inner.write().await;
        let survey = inner
            .surveys
            .get_mut(&id)
            .ok_or_else(|| SurveyError::not_found("survey"))?;
        survey.status = SurveyStatus::Published;
        survey.published_at = Some(Utc::now());
        Ok(survey.clone())
    }

    async fn delete_survey(&self, id: SurveyId) -> Result<(), SurveyError> {
        let mut inner = self.inner.write().await;
        if inner.surveys.remove(&id).is_none() {
            return Err(SurveyError::not_found("survey"));
        }
        let questions: HashSet<QuestionId> = inner
            .questions
            .values()
            .filter(|q| q.survey == id)
            .map(|q| q.id)
            .collect();
        inner.questions.retain(|_, q| q.survey != id);
        inner.options.retain(|_, o| !questions.contains(&o.question));
        inner.conditions.retain(|_, c| c.survey != id);
        inner.operators.retain(|_, op| op.survey != id);
        inner.answers.retain(|(_, q), _| !questions.contains(q));
        inner.completions.retain(|(_, s), _| *s != id);
        Ok(())
    }

    async fn insert_question(
        &self,
        survey: SurveyId,
        fields: NewQuestion,
    ) -> Result<Question, SurveyError> {
        let mut inner = self.inner.write().await;
        if !inner.surveys.contains_key(&survey) {
            return Err(SurveyError::not_found("survey"));
        }
        let id = QuestionId(inner.next_id());
        let question = Question {
            id,
            survey,
            title: fields.title,
            question_type: fields.question_type,
            required: fields.required,
            priority: fields.priority,
        };
        inner.questions.insert(id, question.clone());
        Ok(question)
    }

    async fn question(&self, id: QuestionId) -> Result<Option<Question>, SurveyError> {
        let inner = self.inner.read().await;
        Ok(inner.questions.get(&id).cloned())
    }

    async fn questions_of(&self, survey: SurveyId) -> Result<Vec<Question>, SurveyError> {
        let inner = self.inner.read().await;
        let mut questions: Vec<Question> = inner
            .questions
            .values()
            .filter(|q| q.survey == survey)
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.priority, q.id));
        Ok(questions)
    }

    async fn update_question(
        &self,
        id: QuestionId,
        fields: NewQuestion,
    ) -> Result<Question, SurveyError> {
        let mut inner = self.inner.write().await;
        let question = inner
            .questions
            .get_mut(&id)
            .ok_or_else(|| SurveyError::not_found("question"))?;
        question.title = fields.title;
        question.question_type = fields.question_type;
        question.required = fields.required;
        question.priority = fields.priority;
        Ok(question.clone())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), SurveyError> {
        let mut inner = self.inner.write().await;
        if inner.questions.remove(&id).is_none() {
            return Err(SurveyError::not_found("question"));
        }
        inner.options.retain(|_, o| o.question != id);
        let removed: HashSet<ConditionId> = inner
            .conditions
            .values()
            .filter(|c| c.source_question == id || c.target_question == id)
            .map(|c| c.id)
            .collect();
        inner.conditions.retain(|_, c| !removed.contains(&c.id));
        inner.remove_operators_over(&removed);
        inner.answers.retain(|(_, q), _| *q != id);
        Ok(())
    }

    async fn insert_option(
        &self,
        question: QuestionId,
        fields: NewOption,
    ) -> Result<OptionItem, SurveyError> {
        let mut inner = self.inner.write().await;
        if !inner.questions.contains_key(&question) {
            return Err(SurveyError::not_found("question"));
        }
        let id = OptionId(inner.next_id());
        let option = OptionItem {
            id,
            question,
            title: fields.title,
            priority: fields.priority,
        };
        inner.options.insert(id, option.clone());
        Ok(option)
    }

    async fn option(&self, id: OptionId) -> Result<Option<OptionItem>, SurveyError> {
        let inner = self.inner.read().await;
        Ok(inner.options.get(&id).cloned())
    }

    async fn options_of(&self, question: QuestionId) -> Result<Vec<OptionItem>, SurveyError> {
        let inner = self.inner.read().await;
        let mut options: Vec<OptionItem> = inner
            .options
            .values()
            .filter(|o| o.question == question)
            .cloned()
            .collect();
        options.sort_by_key(|o| (o.priority, o.id));
        Ok(options)
    }

    async fn update_option(
        &self,
        id: OptionId,
        fields: NewOption,
    ) -> Result<OptionItem, SurveyError> {
        let mut inner = self.inner.write().await;
        let option = inner
            .options
            .get_mut(&id)
            .ok_or_else(|| SurveyError::not_found("option"))?;
        option.title = fields.title;
        option.priority = fields.priority;
        Ok(option.clone())
    }

    async fn delete_option(&self, id: OptionId) -> Result<(), SurveyError> {
        let mut inner = self.inner.write().await;
        if inner.options.remove(&id).is_none() {
            return Err(SurveyError::not_found("option"));
        }
        Ok(())
    }

    async fn delete_options_of(&self, question: QuestionId) -> Result<(), SurveyError> {
        let mut inner = self.inner.write().await;
        inner.options.retain(|_, o| o.question != question);
        Ok(())
    }

    async fn insert_condition(
        &self,
        survey: SurveyId,
        fields: NewCondition,
    ) -> Result<Condition, SurveyError> {
        let mut inner = self.inner.write().await;
        if !inner.surveys.contains_key(&survey) {
            return Err(SurveyError::not_found("survey"));
        }
        let id = ConditionId(inner.next_id());
        let condition = Condition {
            id,
            survey,
            source_question: fields.source_question,
            target_question: fields.target_question,
            kind: fields.kind,
            value: fields.value,
        };
        inner.conditions.insert(id, condition.clone());
        Ok(condition)
    }

    async fn condition(&self, id: ConditionId) -> Result<Option<Condition>, SurveyError> {
        let inner = self.inner.read().await;
        Ok(inner.conditions.get(&id).cloned())
    }

    async fn conditions_of(&self, survey: SurveyId) -> Result<Vec<Condition>, SurveyError> {
        let inner = self.inner.read().await;
        let mut conditions: Vec<Condition> = inner
            .conditions
            .values()
            .filter(|c| c.survey == survey)
            .cloned()
            .collect();
        conditions.sort_by_key(|c| c.id);
        Ok(conditions)
    }

    async fn update_condition(
        &self,
        id: ConditionId,
        fields: NewCondition,
    ) -> Result<Condition, SurveyError> {
        let mut inner = self.inner.write().await;
        let condition = inner
            .conditions
            .get_mut(&id)
            .ok_or_else(|| SurveyError::not_found("condition"))?;
        condition.source_question = fields.source_question;
        condition.target_question = fields.target_question;
        condition.kind = fields.kind;
        condition.value = fields.value;
        Ok(condition.clone())
    }

    async fn delete_condition(&self, id: ConditionId) -> Result<(), SurveyError> {
        let mut inner = self.inner.write().await;
        if inner.conditions.remove(&id).is_none() {
            return Err(SurveyError::not_found("condition"));
        }
        inner
            .operators
            .retain(|_, op| op.first_condition != id && op.second_condition != id);
        Ok(())
    }

    async fn delete_conditions_sourced_from(
        &self,
        question: QuestionId,
    ) -> Result<(), SurveyError> {
        let mut inner = self.inner.write().await;
        let removed: HashSet<ConditionId> = inner
            .conditions
            .values()
            .filter(|c| c.source_question == question)
            .map(|c| c.id)
            .collect();
        inner.conditions.retain(|_, c| !removed.contains(&c.id));
        inner.remove_operators_over(&removed);
        Ok(())
    }

    async fn insert_operator(
        &self,
        survey: SurveyId,
        fields: NewOperator,
    ) -> Result<Operator, SurveyError> {
        let mut inner = self.inner.write().await;
        if !inner.surveys.contains_key(&survey) {
            return Err(SurveyError::not_found("survey"));
        }
        let id = OperatorId(inner.next_id());
        let operator = Operator {
            id,
            survey,
            first_condition: fields.first_condition,
            second_condition: fields.second_condition,
            kind: fields.kind,
            priority: fields.priority,
        };
        inner.operators.insert(id, operator.clone());
        Ok(operator)
    }

    async fn operator(&self, id: OperatorId) -> Result<Option<Operator>, SurveyError> {
        let inner = self.inner.read().await;
        Ok(inner.operators.get(&id).cloned())
    }

    async fn operators_of(&self, survey: SurveyId) -> Result<Vec<Operator>, SurveyError> {
        let inner = self.inner.read().await;
        let mut operators: Vec<Operator> = inner
            .operators
            .values()
            .filter(|op| op.survey == survey)
            .cloned()
            .collect();
        operators.sort_by_key(|op| (op.priority, op.id));
        Ok(operators)
    }

    async fn update_operator(
        &self,
        id: OperatorId,
        fields: NewOperator,
    ) -> Result<Operator, SurveyError> {
        let mut inner = self.inner.write().await;
        let operator = inner
            .operators
            .get_mut(&id)
            .ok_or_else(|| SurveyError::not_found("operator"))?;
        operator.first_condition = fields.first_condition;
        operator.second_condition = fields.second_condition;
        operator.kind = fields.kind;
        operator.priority = fields.priority;
        Ok(operator.clone())
    }

    async fn delete_operator(&self, id: OperatorId) -> Result<(), SurveyError> {
        let mut inner = self.inner.write().await;
        if inner.operators.remove(&id).is_none() {
            return Err(SurveyError::not_found("operator"));
        }
        Ok(())
    }

    async fn answer(
        &self,
        user: UserId,
        question: QuestionId,
    ) -> Result<Option<AnswerRecord>, SurveyError> {
        let inner = self.inner.read().await;
        Ok(inner.answers.get(&(user, question)).cloned())
    }

    async fn answers_for(
        &self,
        user: UserId,
        survey: SurveyId,
    ) -> Result<Vec<AnswerRecord>, SurveyError> {
        let inner = self.inner.read().await;
        let mut answers: Vec<AnswerRecord> = inner
            .answers
            .values()
            .filter(|a| {
                a.user == user
                    && inner
                        .questions
                        .get(&a.question)
                        .map(|q| q.survey == survey)
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        answers.sort_by_key(|a| a.question);
        Ok(answers)
    }

    async fn upsert_answer(
        &self,
        user: UserId,
        question: QuestionId,
        text: Option<String>,
        option: Option<OptionId>,
    ) -> Result<AnswerRecord, SurveyError> {
        let mut inner = self.inner.write().await;
        if !inner.questions.contains_key(&question) {
            return Err(SurveyError::not_found("question"));
        }
        let answer = AnswerRecord {
            user,
            question,
            text,
            option,
            answered_at: Utc::now(),
        };
        inner.answers.insert((user, question), answer.clone());
        Ok(answer)
    }

    async fn delete_answers_from(
        &self,
        user: UserId,
        survey: SurveyId,
        min_priority: i32,
    ) -> Result<usize, SurveyError> {
        let mut inner = self.inner.write().await;
        let doomed: HashSet<QuestionId> = inner
            .questions
            .values()
            .filter(|q| q.survey == survey && q.priority >= min_priority)
            .map(|q| q.id)
            .collect();
        let before = inner.answers.len();
        inner
            .answers
            .retain(|(u, q), _| *u != user || !doomed.contains(q));
        Ok(before - inner.answers.len())
    }

    async fn completion(
        &self,
        user: UserId,
        survey: SurveyId,
    ) -> Result<Option<CompletionMarker>, SurveyError> {
        let inner = self.inner.read().await;
        Ok(inner.completions.get(&(user, survey)).cloned())
    }

    async fn insert_completion(
        &self,
        user: UserId,
        survey: SurveyId,
    ) -> Result<CompletionMarker, SurveyError> {
        let mut inner = self.inner.write().await;
        if !inner.surveys.contains_key(&survey) {
            return Err(SurveyError::not_found("survey"));
        }
        let marker = CompletionMarker {
            user,
            survey,
            completed_at: Utc::now(),
        };
        inner.completions.insert((user, survey), marker.clone());
        Ok(marker)
    }
}
