//! YAML survey definitions.
//!
//! A definition file describes a whole survey in one document, using
//! symbolic string ids so questions, options and conditions can reference
//! each other before any database ids exist. [`SurveyBuilder`] resolves the
//! references when it materializes the definition into a store.
//!
//! [`SurveyBuilder`]: crate::survey::builder::SurveyBuilder

use crate::survey::error::SurveyError;
use crate::survey::model::{ConditionKind, OperatorKind, QuestionType};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A complete survey as described by a definition file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SurveyDefinition {
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionDefinition>,
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
    #[serde(default)]
    pub operators: Vec<OperatorDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QuestionDefinition {
    /// Symbolic id other entries refer to.
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub required: bool,
    pub priority: i32,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OptionDefinition {
    /// Symbolic id, only needed when a condition compares against this option.
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub priority: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConditionDefinition {
    pub id: String,
    /// Symbolic id of the question whose answer is inspected.
    pub source: String,
    /// Symbolic id of the question being gated.
    pub target: String,
    pub kind: ConditionKind,
    /// Comparison value; for option kinds this is an option's symbolic id.
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OperatorDefinition {
    pub first: String,
    pub second: String,
    #[serde(rename = "operator")]
    pub kind: OperatorKind,
    pub priority: i32,
}

/// Reads survey definitions from disk or from raw YAML.
#[derive(Debug, Default)]
pub struct SurveyLoader;

impl SurveyLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load_survey<P: AsRef<Path>>(&self, path: P) -> Result<SurveyDefinition, SurveyError> {
        let raw = fs::read_to_string(path)?;
        self.parse_yaml(&raw)
    }

    pub fn parse_yaml(&self, raw: &str) -> Result<SurveyDefinition, SurveyError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
