// src/infrastructure/mod.rs
// Concrete collaborators behind the domain traits

pub mod analysis;
pub mod audit;
pub mod exchange;
pub mod llm;
pub mod risk;
pub mod strategy;
