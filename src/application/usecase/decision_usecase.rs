// src/application/usecase/decision_usecase.rs
// Consultation of the external decision service

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::application::service::DecisionPromptBuilder;
use crate::domain::errors::{DecisionError, DecisionResult};
use crate::domain::model::{DecisionSource, MarketUniverse, RawAutonomousDecision};
use crate::domain::service::DecisionService;

/// The document to act on and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Consultation {
    pub decision: RawAutonomousDecision,
    pub source: DecisionSource,
}

impl Consultation {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, DecisionSource::Fallback(_))
    }
}

/// Decision consultation use case. Always yields a decision.
#[async_trait]
pub trait DecisionConsultationUseCase: Send + Sync {
    async fn consult(&self, universe: &MarketUniverse) -> Consultation;
}

pub struct DecisionConsultant {
    service: Arc<dyn DecisionService + Send + Sync>,
    prompts: DecisionPromptBuilder,
    timeout: Duration,
}

impl DecisionConsultant {
    pub fn new(service: Arc<dyn DecisionService + Send + Sync>, timeout: Duration) -> Self {
        Self {
            service,
            prompts: DecisionPromptBuilder::new(),
            timeout,
        }
    }

    async fn request(&self, universe: &MarketUniverse) -> DecisionResult<RawAutonomousDecision> {
        let prompt = self.prompts.build(universe);
        log::debug!("Decision: request rendered ({} bytes)", prompt.user.len());

        let content = tokio::time::timeout(self.timeout, self.service.request_decision(&prompt))
            .await
            .map_err(|_| DecisionError::Timeout(self.timeout.as_secs()))??;

        parse_decision(&content)
    }
}

#[async_trait]
impl DecisionConsultationUseCase for DecisionConsultant {
    async fn consult(&self, universe: &MarketUniverse) -> Consultation {
        match self.request(universe).await {
            Ok(decision) => {
                log::info!(
                    "Decision: received {} instrument decisions",
                    decision.trading_decisions.len()
                );
                Consultation {
                    decision,
                    source: DecisionSource::Service,
                }
            }
            Err(e) => {
                log::error!("Decision: consultation failed, using emergency decision: {}", e);
                Consultation {
                    decision: RawAutonomousDecision::emergency(),
                    source: DecisionSource::Fallback(e.to_string()),
                }
            }
        }
    }
}

/// Parse message content into a decision document. Markdown code fences
/// around the object are tolerated.
pub fn parse_decision(content: &str) -> DecisionResult<RawAutonomousDecision> {
    let mut body = content.trim();
    if let Some(stripped) = body.strip_prefix("```") {
        body = stripped.trim_start_matches("json");
        body = body.strip_suffix("```").unwrap_or(body);
    }
    Ok(serde_json::from_str(body.trim())?)
}
