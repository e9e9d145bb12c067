// src/application/mod.rs
// Application layer: wire DTOs, services and the cycle use cases

pub mod dto;
pub mod service;
pub mod usecase;
