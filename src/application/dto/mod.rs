// src/application/dto/mod.rs
// Wire-level data transfer objects

pub mod chat;
pub mod okx;
pub mod parser;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat};
pub use okx::OkxEnvelope;
