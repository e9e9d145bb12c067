// src/infrastructure/exchange/mod.rs
// Exchange repository implementations

pub mod okx;
pub mod signer;

pub use okx::OkxClient;
pub use signer::RequestSigner;
