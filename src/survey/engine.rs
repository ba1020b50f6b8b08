//! Responder-facing survey flow.
//!
//! [`SurveyEngine`] drives a published survey for one user at a time:
//! answers come in one question per call, gating conditions decide which
//! question is served next, and a completion marker ends the run. Submissions
//! for the same user and survey are serialized through a per-pair lock so a
//! double-click cannot interleave the validate-and-persist steps.

use crate::survey::condition::evaluate_gate;
use crate::survey::error::SurveyError;
use crate::survey::model::{
    AnswerRecord, Condition, OptionId, Question, QuestionId, QuestionType, Survey, SurveyId,
    SurveyStatus, UserId,
};
use crate::survey::publish::validate_structure;
use crate::survey::store::SurveyStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What the responder should see after a submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    /// The next visible question, if any.
    pub next_question: Option<Question>,
    /// The user's existing answer to that question, for revisits.
    pub prefill: Option<String>,
    /// True when the survey has no further visible questions.
    pub finished: bool,
}

impl SubmissionOutcome {
    fn next(question: Question, prefill: Option<String>) -> Self {
        Self {
            next_question: Some(question),
            prefill,
            finished: false,
        }
    }

    fn finished() -> Self {
        Self {
            next_question: None,
            prefill: None,
            finished: true,
        }
    }
}

/// A step backwards through the visible questions.
#[derive(Debug, Clone, Serialize)]
pub struct PreviousOutcome {
    pub question: Question,
    /// The answer already on record for that question.
    pub answer: Option<String>,
}

/// Runtime engine over a [`SurveyStore`].
pub struct SurveyEngine {
    store: Arc<dyn SurveyStore>,
    attempts: Mutex<HashMap<(UserId, SurveyId), Arc<Mutex<()>>>>,
    publish_locks: Mutex<HashMap<SurveyId, Arc<Mutex<()>>>>,
}

impl SurveyEngine {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self {
            store,
            attempts: Mutex::new(HashMap::new()),
            publish_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Records an answer and returns the next visible question.
    ///
    /// `value` is the raw submitted payload; `None` or an empty string skips
    /// the question, which is only allowed when the question is optional or
    /// already answered. Changing an existing answer throws away answers to
    /// later questions that sit behind conditions, since their gates may have
    /// flipped.
    pub async fn submit_answer(
        &self,
        user: UserId,
        survey: SurveyId,
        question: QuestionId,
        value: Option<&str>,
    ) -> Result<SubmissionOutcome, SurveyError> {
        let guard = self.attempt_guard(user, survey).await;
        let _held = guard.lock().await;

        // an empty submission counts as no submission
        let value = value.filter(|v| !v.is_empty());

        self.published_survey(survey).await?;
        let question = self.question_in_survey(question, survey).await?;
        if self.store.completion(user, survey).await?.is_some() {
            return Err(SurveyError::AlreadyCompleted);
        }

        let questions = self.store.questions_of(survey).await?;
        let conditions = self.store.conditions_of(survey).await?;
        let operators = self.store.operators_of(survey).await?;
        let answers = self.store.answers_for(user, survey).await?;

        for earlier in questions.iter().filter(|q| q.priority < question.priority) {
            if earlier.required
                && !answers.iter().any(|a| a.question == earlier.id)
                && evaluate_gate(earlier.id, &conditions, &operators, &answers)
            {
                return Err(SurveyError::required_pending(earlier));
            }
        }

        if !evaluate_gate(question.id, &conditions, &operators, &answers) {
            return Err(SurveyError::ConditionNotSatisfied);
        }

        let payload = self.validate_answer(user, &question, value).await?;

        if let Some(value) = value {
            self.invalidate_downstream(user, survey, &question, &questions, &conditions, &answers, value)
                .await?;
        }

        if let Some((text, option)) = payload {
            self.store
                .upsert_answer(user, question.id, text, option)
                .await?;
        }
        let answers = self.store.answers_for(user, survey).await?;

        for later in questions.iter().filter(|q| q.priority > question.priority) {
            if evaluate_gate(later.id, &conditions, &operators, &answers) {
                let prefill = answers
                    .iter()
                    .find(|a| a.question == later.id)
                    .and_then(|a| a.value());
                return Ok(SubmissionOutcome::next(later.clone(), prefill));
            }
        }

        self.store.insert_completion(user, survey).await?;
        log::info!("user {} completed survey {}", user, survey);
        Ok(SubmissionOutcome::finished())
    }

    /// Walks back to the closest earlier question whose gate is open,
    /// together with the answer already given to it.
    pub async fn previous_question(
        &self,
        user: UserId,
        survey: SurveyId,
        question: QuestionId,
    ) -> Result<PreviousOutcome, SurveyError> {
        let guard = self.attempt_guard(user, survey).await;
        let _held = guard.lock().await;

        self.published_survey(survey).await?;
        let question = self.question_in_survey(question, survey).await?;

        let questions = self.store.questions_of(survey).await?;
        let conditions = self.store.conditions_of(survey).await?;
        let operators = self.store.operators_of(survey).await?;
        let answers = self.store.answers_for(user, survey).await?;

        for earlier in questions
            .iter()
            .rev()
            .filter(|q| q.priority < question.priority)
        {
            if evaluate_gate(earlier.id, &conditions, &operators, &answers) {
                let answer = answers
                    .iter()
                    .find(|a| a.question == earlier.id)
                    .and_then(|a| a.value());
                return Ok(PreviousOutcome {
                    question: earlier.clone(),
                    answer,
                });
            }
        }
        Err(SurveyError::NoPreviousQuestion)
    }

    /// The entry question of a published survey.
    pub async fn first_question(&self, survey: SurveyId) -> Result<Question, SurveyError> {
        self.published_survey(survey).await?;
        let questions = self.store.questions_of(survey).await?;
        questions
            .into_iter()
            .next()
            .ok_or_else(|| SurveyError::not_found("question"))
    }

    /// Runs the structural checks and flips the survey to published.
    pub async fn publish(&self, survey: SurveyId) -> Result<Survey, SurveyError> {
        let guard = self.publish_guard(survey).await;
        let _held = guard.lock().await;

        let row = self
            .store
            .survey(survey)
            .await?
            .ok_or_else(|| SurveyError::not_found("survey"))?;
        if row.status == SurveyStatus::Published {
            return Err(SurveyError::AlreadyPublished);
        }

        let questions = self.store.questions_of(survey).await?;
        let mut options = Vec::new();
        for question in &questions {
            options.extend(self.store.options_of(question.id).await?);
        }
        let conditions = self.store.conditions_of(survey).await?;
        let operators = self.store.operators_of(survey).await?;
        validate_structure(&questions, &options, &conditions, &operators)?;

        let published = self.store.mark_published(survey).await?;
        log::info!("survey {} ('{}') published", published.id, published.title);
        Ok(published)
    }

    /// Drops answers that sit behind a gate downstream of a changed answer.
    ///
    /// Everything from the first condition-gated question at or after the
    /// changed one is removed; ungated questions before that point keep
    /// their answers.
    #[allow(clippy::too_many_arguments)]
    async fn invalidate_downstream(
        &self,
        user: UserId,
        survey: SurveyId,
        question: &Question,
        questions: &[Question],
        conditions: &[Condition],
        answers: &[AnswerRecord],
        new_value: &str,
    ) -> Result<(), SurveyError> {
        let old = match answers.iter().find(|a| a.question == question.id) {
            Some(old) => old,
            None => return Ok(()),
        };
        if old.value().as_deref() == Some(new_value) {
            return Ok(());
        }
        let priority_of = |id: QuestionId| {
            questions
                .iter()
                .find(|q| q.id == id)
                .map(|q| q.priority)
        };
        let has_later = answers.iter().any(|a| {
            priority_of(a.question)
                .map(|p| p > question.priority)
                .unwrap_or(false)
        });
        if !has_later {
            return Ok(());
        }
        let cutoff = conditions
            .iter()
            .filter(|c| {
                priority_of(c.source_question)
                    .map(|p| p >= question.priority)
                    .unwrap_or(false)
            })
            .filter_map(|c| priority_of(c.target_question))
            .min();
        if let Some(cutoff) = cutoff {
            let removed = self.store.delete_answers_from(user, survey, cutoff).await?;
            if removed > 0 {
                log::info!(
                    "user {} changed their answer to question {}, removed {} downstream answers",
                    user,
                    question.id,
                    removed
                );
            }
        }
        Ok(())
    }

    /// Checks the payload against the question type without touching the
    /// store, and returns the fields to persist. `Ok(None)` is an allowed
    /// skip: the question is optional or carries an earlier answer, and
    /// nothing gets written.
    async fn validate_answer(
        &self,
        user: UserId,
        question: &Question,
        value: Option<&str>,
    ) -> Result<Option<(Option<String>, Option<OptionId>)>, SurveyError> {
        let value = match value {
            Some(value) => value,
            None => {
                if question.required
                    && self.store.answer(user, question.id).await?.is_none()
                {
                    return Err(SurveyError::required_pending(question));
                }
                return Ok(None);
            }
        };

        match question.question_type {
            QuestionType::Numerical => {
                if value.trim().parse::<f64>().is_err() {
                    return Err(SurveyError::invalid_answer("expected a number"));
                }
                Ok(Some((Some(value.to_string()), None)))
            }
            QuestionType::Option => {
                let option = self.resolve_option(question, value).await?;
                Ok(Some((None, Some(option))))
            }
            QuestionType::Text => Ok(Some((Some(value.to_string()), None))),
        }
    }

    async fn resolve_option(
        &self,
        question: &Question,
        value: &str,
    ) -> Result<OptionId, SurveyError> {
        let id = value
            .trim()
            .parse::<u64>()
            .map(OptionId)
            .map_err(|_| SurveyError::invalid_answer("expected an option id"))?;
        match self.store.option(id).await? {
            Some(option) if option.question == question.id => Ok(option.id),
            _ => Err(SurveyError::invalid_answer(
                "option does not belong to this question",
            )),
        }
    }

    async fn published_survey(&self, id: SurveyId) -> Result<Survey, SurveyError> {
        match self.store.survey(id).await? {
            Some(survey) if survey.status == SurveyStatus::Published => Ok(survey),
            _ => Err(SurveyError::not_found("survey")),
        }
    }

    async fn question_in_survey(
        &self,
        id: QuestionId,
        survey: SurveyId,
    ) -> Result<Question, SurveyError> {
        match self.store.question(id).await? {
            Some(question) if question.survey == survey => Ok(question),
            _ => Err(SurveyError::not_found("question")),
        }
    }

    async fn attempt_guard(&self, user: UserId, survey: SurveyId) -> Arc<Mutex<()>> {
        let mut attempts = self.attempts.lock().await;
        // a strong count of one means no task holds or awaits the guard
        attempts.retain(|_, guard| Arc::strong_count(guard) > 1);
        attempts.entry((user, survey)).or_default().clone()
    }

    async fn publish_guard(&self, survey: SurveyId) -> Arc<Mutex<()>> {
        let mut locks = self.publish_locks.lock().await;
        locks.retain(|_, guard| Arc::strong_count(guard) > 1);
        locks.entry(survey).or_default().clone()
    }
}
