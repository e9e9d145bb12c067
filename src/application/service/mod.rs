// src/application/service/mod.rs
// Application services

pub mod impact;
pub mod prompt;

pub use impact::portfolio_impact;
pub use prompt::{DecisionPromptBuilder, DECISION_SCHEMA};
