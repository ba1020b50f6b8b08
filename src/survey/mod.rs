// SPDX-License-Identifier: MIT

//! Conditional survey engine
//!
//! - `model` - entities, ids and the closed enums
//! - `store` - entity storage trait and the in-memory implementation
//! - `condition` - gating condition evaluation and combination
//! - `authoring` - draft-time structural mutation with validation
//! - `publish` - draft-to-published structural checks
//! - `engine` - answer submission and question navigation
//! - `loader` / `builder` - YAML survey definitions and their materialization

pub mod authoring;
pub mod builder;
pub mod condition;
pub mod engine;
pub mod error;
pub mod loader;
pub mod model;
pub mod publish;
pub mod store;
