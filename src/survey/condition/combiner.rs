//! Gate resolution for a target question

use super::evaluator::evaluate;
use crate::survey::model::{AnswerRecord, Condition, ConditionId, Operator, QuestionId};
use std::collections::HashSet;

/// Decide whether `target` is visible given the user's answers.
///
/// Collects the conditions gating `target` and evaluates each. No
/// conditions means the question is unconditionally visible, and a single
/// condition decides on its own. With two or more, the lowest-priority
/// operator whose conditions both gate `target` combines its pair of
/// results into the verdict; other conditions and operators are not
/// consulted. A multi-condition target with no covering operator stays
/// hidden, though publish validation rejects such surveys up front.
pub fn evaluate_gate(
    target: QuestionId,
    conditions: &[Condition],
    operators: &[Operator],
    answers: &[AnswerRecord],
) -> bool {
    let gating: Vec<(&Condition, bool)> = conditions
        .iter()
        .filter(|c| c.target_question == target)
        .map(|c| (c, evaluate(c, answers)))
        .collect();

    match gating.as_slice() {
        [] => true,
        [(_, result)] => *result,
        _ => combine(&gating, operators),
    }
}

fn combine(gating: &[(&Condition, bool)], operators: &[Operator]) -> bool {
    let ids: HashSet<ConditionId> = gating.iter().map(|(c, _)| c.id).collect();

    let operator = operators
        .iter()
        .filter(|op| ids.contains(&op.first_condition) && ids.contains(&op.second_condition))
        .min_by_key(|op| (op.priority, op.id));

    let operator = match operator {
        Some(op) => op,
        None => return false,
    };

    operator.kind.apply(
        result_of(gating, operator.first_condition),
        result_of(gating, operator.second_condition),
    )
}

fn result_of(gating: &[(&Condition, bool)], id: ConditionId) -> bool {
    gating
        .iter()
        .find(|(c, _)| c.id == id)
        .map(|(_, result)| *result)
        .unwrap_or(false)
}
