// SPDX-License-Identifier: MIT

//! Gating condition evaluation
//!
//! This module decides whether a question is visible to a user. A single
//! condition compares a recorded answer against a stored value:
//! - `option_equal` - the chosen option is the one named by the value
//! - `number_lt` - the value is numerically less than the answer
//! - `text_contain` - the answer text contains the value
//!
//! When several conditions gate the same question, one and/or/xor operator
//! combines a pair of them into the final verdict.

mod combiner;
mod evaluator;

pub use combiner::evaluate_gate;
pub use evaluator::evaluate;
