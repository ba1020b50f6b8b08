//! Single condition evaluation

use crate::survey::model::{AnswerRecord, Condition, ConditionKind};

/// Evaluate one condition against a user's recorded answers.
///
/// A condition can only pass when its source question has a recorded
/// answer; a missing answer closes the gate for every kind. Numeric kinds
/// parse both sides as integers and compare with the stored value as the
/// left operand, so `number_lt` is true when the value is less than the
/// answer. A side that fails to parse also closes the gate.
pub fn evaluate(condition: &Condition, answers: &[AnswerRecord]) -> bool {
    let answer = match answers
        .iter()
        .find(|a| a.question == condition.source_question)
    {
        Some(answer) => answer,
        None => return false,
    };

    match condition.kind {
        ConditionKind::OptionEqual => option_matches(answer, &condition.value),
        ConditionKind::OptionNotEqual => !option_matches(answer, &condition.value),
        ConditionKind::NumberLt => compare_numbers(&condition.value, answer, |v, a| v < a),
        ConditionKind::NumberLte => compare_numbers(&condition.value, answer, |v, a| v <= a),
        ConditionKind::NumberGt => compare_numbers(&condition.value, answer, |v, a| v > a),
        ConditionKind::NumberGte => compare_numbers(&condition.value, answer, |v, a| v >= a),
        ConditionKind::TextContain => text_matches(answer, |t| t.contains(&condition.value)),
        ConditionKind::TextNotContain => text_matches(answer, |t| !t.contains(&condition.value)),
        ConditionKind::TextStart => text_matches(answer, |t| t.starts_with(&condition.value)),
        ConditionKind::TextNotStart => text_matches(answer, |t| !t.starts_with(&condition.value)),
        ConditionKind::TextEnd => text_matches(answer, |t| t.ends_with(&condition.value)),
        ConditionKind::TextNotEnd => text_matches(answer, |t| !t.ends_with(&condition.value)),
    }
}

fn option_matches(answer: &AnswerRecord, value: &str) -> bool {
    match answer.option {
        Some(option) => option.to_string() == value,
        None => false,
    }
}

fn compare_numbers<F>(value: &str, answer: &AnswerRecord, cmp: F) -> bool
where
    F: Fn(i64, i64) -> bool,
{
    let value = match value.trim().parse::<i64>() {
        Ok(v) => v,
        Err(_) => return false,
    };
    let answered = match answer.text.as_deref().map(|t| t.trim().parse::<i64>()) {
        Some(Ok(a)) => a,
        _ => return false,
    };
    cmp(value, answered)
}

fn text_matches<F>(answer: &AnswerRecord, test: F) -> bool
where
    F: Fn(&str) -> bool,
{
    match answer.text.as_deref() {
        Some(text) => test(text),
        None => false,
    }
}
