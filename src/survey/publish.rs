// SPDX-License-Identifier: MIT

//! Structural checks a draft must pass before it can be published.

use crate::survey::error::PublishError;
use crate::survey::model::{
    Condition, ConditionId, Operator, OptionItem, Question, QuestionId, QuestionType,
};
use std::collections::{HashMap, HashSet};

/// Validates the full structure of a draft survey.
///
/// The checks run in a fixed order and the first failure wins:
/// the survey must have at least one question, question priorities must be
/// unique, every option question needs at least two options, every condition
/// must run from an earlier question to a later one, and wherever several
/// conditions gate the same question the operators over them must carry
/// distinct priorities and leave no condition uncombined.
pub fn validate_structure(
    questions: &[Question],
    options: &[OptionItem],
    conditions: &[Condition],
    operators: &[Operator],
) -> Result<(), PublishError> {
    if questions.is_empty() {
        return Err(PublishError::NoQuestions);
    }

    let mut priorities_seen = HashSet::new();
    for question in questions {
        if !priorities_seen.insert(question.priority) {
            return Err(PublishError::DuplicatePriority {
                priority: question.priority,
            });
        }
    }

    for question in questions {
        if question.question_type == QuestionType::Option {
            let count = options.iter().filter(|o| o.question == question.id).count();
            if count < 2 {
                return Err(PublishError::InsufficientOptions {
                    question: question.id,
                    title: question.title.clone(),
                });
            }
        }
    }

    let priority_of: HashMap<QuestionId, i32> =
        questions.iter().map(|q| (q.id, q.priority)).collect();
    for condition in conditions {
        let ordered = match (
            priority_of.get(&condition.source_question),
            priority_of.get(&condition.target_question),
        ) {
            (Some(source), Some(target)) => source < target,
            _ => false,
        };
        if !ordered {
            return Err(PublishError::PriorityConflict {
                source_question: condition.source_question,
                target_question: condition.target_question,
            });
        }
    }

    for question in questions {
        let targeting: Vec<&Condition> = conditions
            .iter()
            .filter(|c| c.target_question == question.id)
            .collect();
        if targeting.len() < 2 {
            continue;
        }
        let ids: HashSet<ConditionId> = targeting.iter().map(|c| c.id).collect();
        let touching: Vec<&Operator> = operators
            .iter()
            .filter(|op| ids.contains(&op.first_condition) || ids.contains(&op.second_condition))
            .collect();

        let mut operator_priorities = HashSet::new();
        for operator in &touching {
            if !operator_priorities.insert(operator.priority) {
                return Err(PublishError::DuplicateOperatorPriority {
                    question: question.id,
                    priority: operator.priority,
                });
            }
        }

        let covered: HashSet<ConditionId> = touching
            .iter()
            .flat_map(|op| [op.first_condition, op.second_condition])
            .collect();
        for condition in &targeting {
            if !covered.contains(&condition.id) {
                return Err(PublishError::UncoveredCondition {
                    condition: condition.id,
                });
            }
        }
    }

    Ok(())
}
