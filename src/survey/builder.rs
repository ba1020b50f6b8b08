// SPDX-License-Identifier: MIT

//! Materializes parsed survey definitions into stored drafts.

use crate::survey::authoring::Authoring;
use crate::survey::error::SurveyError;
use crate::survey::loader::{SurveyDefinition, SurveyLoader};
use crate::survey::model::{
    ConditionId, NewCondition, NewOperator, NewOption, NewQuestion, OptionId, QuestionId, SurveyId,
};
use crate::survey::store::SurveyStore;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Turns a [`SurveyDefinition`] into a draft survey in the store, resolving
/// the definition's symbolic ids into stored entity ids along the way.
/// The result is a draft; publishing is a separate step.
pub struct SurveyBuilder {
    loader: SurveyLoader,
    authoring: Authoring,
}

impl SurveyBuilder {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self {
            loader: SurveyLoader::new(),
            authoring: Authoring::new(store),
        }
    }

    pub async fn build_from_file<P: AsRef<Path>>(&self, path: P) -> Result<SurveyId, SurveyError> {
        let definition = self.loader.load_survey(path)?;
        self.build(&definition).await
    }

    pub async fn build(&self, definition: &SurveyDefinition) -> Result<SurveyId, SurveyError> {
        let survey = self.authoring.create_survey(&definition.title).await?;

        let mut question_ids: HashMap<&str, QuestionId> = HashMap::new();
        let mut option_ids: HashMap<&str, OptionId> = HashMap::new();
        for question in &definition.questions {
            if question_ids.contains_key(question.id.as_str()) {
                return Err(SurveyError::duplicate_ref(question.id.as_str()));
            }
            let stored = self
                .authoring
                .create_question(
                    survey.id,
                    NewQuestion {
                        title: question.title.clone(),
                        question_type: question.question_type,
                        required: question.required,
                        priority: question.priority,
                    },
                )
                .await?;
            question_ids.insert(question.id.as_str(), stored.id);

            for option in &question.options {
                let stored_option = self
                    .authoring
                    .create_option(
                        stored.id,
                        NewOption {
                            title: option.title.clone(),
                            priority: option.priority,
                        },
                    )
                    .await?;
                if let Some(handle) = &option.id {
                    if option_ids.insert(handle.as_str(), stored_option.id).is_some() {
                        return Err(SurveyError::duplicate_ref(handle.as_str()));
                    }
                }
            }
        }

        let mut condition_ids: HashMap<&str, ConditionId> = HashMap::new();
        for condition in &definition.conditions {
            if condition_ids.contains_key(condition.id.as_str()) {
                return Err(SurveyError::duplicate_ref(condition.id.as_str()));
            }
            let source = *question_ids
                .get(condition.source.as_str())
                .ok_or_else(|| SurveyError::unknown_ref(condition.source.as_str()))?;
            let target = *question_ids
                .get(condition.target.as_str())
                .ok_or_else(|| SurveyError::unknown_ref(condition.target.as_str()))?;
            // option comparisons name an option handle, everything else is a literal
            let value = if condition.kind.is_option_kind() {
                option_ids
                    .get(condition.value.as_str())
                    .ok_or_else(|| SurveyError::unknown_ref(condition.value.as_str()))?
                    .to_string()
            } else {
                condition.value.clone()
            };
            let stored = self
                .authoring
                .create_condition(
                    survey.id,
                    NewCondition {
                        source_question: source,
                        target_question: target,
                        kind: condition.kind,
                        value,
                    },
                )
                .await?;
            condition_ids.insert(condition.id.as_str(), stored.id);
        }

        for operator in &definition.operators {
            let first = *condition_ids
                .get(operator.first.as_str())
                .ok_or_else(|| SurveyError::unknown_ref(operator.first.as_str()))?;
            let second = *condition_ids
                .get(operator.second.as_str())
                .ok_or_else(|| SurveyError::unknown_ref(operator.second.as_str()))?;
            self.authoring
                .create_operator(
                    survey.id,
                    NewOperator {
                        first_condition: first,
                        second_condition: second,
                        kind: operator.kind,
                        priority: operator.priority,
                    },
                )
                .await?;
        }

        log::info!(
            "built survey {} ('{}') with {} questions, {} conditions, {} operators",
            survey.id,
            definition.title,
            definition.questions.len(),
            definition.conditions.len(),
            definition.operators.len()
        );
        Ok(survey.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::model::{ConditionKind, OperatorKind, QuestionType};
    use crate::survey::store::MemoryStore;

    const PET_SURVEY: &str = r#"
title: Pet survey
questions:
  - id: kind
    title: What kind of pet person are you?
    type: option
    required: true
    priority: 1
    options:
      - id: cats
        title: Cats
      - id: dogs
        title: Dogs
  - id: cat_story
    title: Tell us about your cat
    type: text
    priority: 2
  - id: count
    title: How many pets?
    type: numerical
    priority: 3
conditions:
  - id: is_cat_person
    source: kind
    target: cat_story
    kind: option_equal
    value: cats
"#;

    fn fixture() -> (SurveyBuilder, Arc<dyn SurveyStore>) {
        let store: Arc<dyn SurveyStore> = Arc::new(MemoryStore::new());
        (SurveyBuilder::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_build_resolves_refs() {
        let (builder, store) = fixture();
        let definition = SurveyLoader::new().parse_yaml(PET_SURVEY).unwrap();
        let survey = builder.build(&definition).await.unwrap();

        let questions = store.questions_of(survey).await.unwrap();
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0].title, "What kind of pet person are you?");
        assert_eq!(questions[0].question_type, QuestionType::Option);
        assert!(questions[0].required);
        assert_eq!(questions[2].question_type, QuestionType::Numerical);

        let options = store.options_of(questions[0].id).await.unwrap();
        assert_eq!(options.len(), 2);

        let conditions = store.conditions_of(survey).await.unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].kind, ConditionKind::OptionEqual);
        assert_eq!(conditions[0].source_question, questions[0].id);
        assert_eq!(conditions[0].target_question, questions[1].id);
        // the option handle became a stored option id
        assert_eq!(conditions[0].value, options[0].id.to_string());
    }

    #[tokio::test]
    async fn test_operators_resolve_condition_refs() {
        let (builder, store) = fixture();
        let raw = r#"
title: Gated
questions:
  - id: a
    title: A
    type: text
    priority: 1
  - id: b
    title: B
    type: text
    priority: 2
  - id: c
    title: C
    type: text
    priority: 3
conditions:
  - id: first
    source: a
    target: c
    kind: text_contain
    value: x
  - id: second
    source: b
    target: c
    kind: text_contain
    value: y
operators:
  - first: first
    second: second
    operator: xor
    priority: 1
"#;
        let definition = SurveyLoader::new().parse_yaml(raw).unwrap();
        let survey = builder.build(&definition).await.unwrap();

        let conditions = store.conditions_of(survey).await.unwrap();
        let operators = store.operators_of(survey).await.unwrap();
        assert_eq!(operators.len(), 1);
        assert_eq!(operators[0].kind, OperatorKind::Xor);
        assert_eq!(operators[0].first_condition, conditions[0].id);
        assert_eq!(operators[0].second_condition, conditions[1].id);
    }

    #[tokio::test]
    async fn test_unknown_refs_are_rejected() {
        let (builder, _) = fixture();
        let raw = r#"
title: Broken
questions:
  - id: a
    title: A
    type: text
    priority: 1
  - id: b
    title: B
    type: text
    priority: 2
conditions:
  - id: c
    source: a
    target: nowhere
    kind: text_contain
    value: x
"#;
        let definition = SurveyLoader::new().parse_yaml(raw).unwrap();
        let err = builder.build(&definition).await.unwrap_err();
        assert_eq!(err.kind(), "unknown_ref");
    }

    #[tokio::test]
    async fn test_unknown_option_handle_is_rejected() {
        let (builder, _) = fixture();
        let raw = r#"
title: Broken
questions:
  - id: pick
    title: Pick
    type: option
    priority: 1
    options:
      - id: first
        title: First
      - title: Second
  - id: later
    title: Later
    type: text
    priority: 2
conditions:
  - id: c
    source: pick
    target: later
    kind: option_equal
    value: missing
"#;
        let definition = SurveyLoader::new().parse_yaml(raw).unwrap();
        let err = builder.build(&definition).await.unwrap_err();
        assert_eq!(err.kind(), "unknown_ref");
    }

    #[tokio::test]
    async fn test_duplicate_question_ids_are_rejected() {
        let (builder, _) = fixture();
        let raw = r#"
title: Broken
questions:
  - id: twice
    title: A
    type: text
    priority: 1
  - id: twice
    title: B
    type: text
    priority: 2
"#;
        let definition = SurveyLoader::new().parse_yaml(raw).unwrap();
        let err = builder.build(&definition).await.unwrap_err();
        assert_eq!(err.kind(), "duplicate_ref");
    }

    #[tokio::test]
    async fn test_condition_rules_apply_during_build() {
        let (builder, _) = fixture();
        // condition points backwards, authoring must refuse it
        let raw = r#"
title: Backwards
questions:
  - id: a
    title: A
    type: text
    priority: 1
  - id: b
    title: B
    type: text
    priority: 2
conditions:
  - id: c
    source: b
    target: a
    kind: text_contain
    value: x
"#;
        let definition = SurveyLoader::new().parse_yaml(raw).unwrap();
        let err = builder.build(&definition).await.unwrap_err();
        assert_eq!(err.kind(), "priority_conflict");
    }
}
