// SPDX-License-Identifier: MIT

//! skiplogic-rs - a conditional survey engine
//!
//! Surveys are ordered questions. Each question can be gated by conditions
//! over answers to earlier questions, optionally combined with and/or/xor
//! operators. The engine drives a user through the survey one answer at a
//! time, skipping questions whose gates are closed, and validates the
//! condition graph before a survey can be published.

pub mod survey;
