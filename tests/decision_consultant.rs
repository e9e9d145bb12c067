//! Decision consultation: every failure mode of the decision service ends in
//! the same emergency decision, and a well-formed answer is passed through.

mod common;

use common::{universe, validated, Scripted, ScriptedDecisionService};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

use autonomous_trader::application::usecase::{
    DecisionConsultant, DecisionConsultationUseCase, DecisionValidator,
};
use autonomous_trader::domain::model::{Action, DecisionSource, RawAutonomousDecision};

fn consultant(script: Vec<Scripted>, timeout: Duration) -> (Arc<ScriptedDecisionService>, DecisionConsultant) {
    let service = Arc::new(ScriptedDecisionService::new(script));
    (service.clone(), DecisionConsultant::new(service, timeout))
}

#[tokio::test]
async fn test_timeout_yields_emergency_decision() {
    let (_, consultant) = consultant(
        vec![Scripted::Hang(Duration::from_secs(10))],
        Duration::from_millis(50),
    );
    let universe = universe(&["BTC"]).await;

    let consultation = consultant.consult(&universe).await;

    assert!(consultation.is_fallback());
    assert_eq!(consultation.decision, RawAutonomousDecision::emergency());
}

#[tokio::test]
async fn test_transport_and_status_errors_yield_emergency_decision() {
    let (_, consultant) = consultant(
        vec![
            Scripted::TransportError("connection reset".to_string()),
            Scripted::Status(503),
        ],
        Duration::from_secs(5),
    );
    let universe = universe(&["BTC"]).await;

    for _ in 0..2 {
        let consultation = consultant.consult(&universe).await;
        assert!(consultation.is_fallback());
        assert_eq!(consultation.decision, RawAutonomousDecision::emergency());
    }
}

#[tokio::test]
async fn test_malformed_body_falls_back_to_fixed_exposure() {
    let (_, consultant) = consultant(
        vec![Scripted::Content("Sure! Here is my analysis: buy everything".to_string())],
        Duration::from_secs(5),
    );
    let universe = universe(&["BTC", "ETH"]).await;

    let consultation = consultant.consult(&universe).await;
    assert!(matches!(consultation.source, DecisionSource::Fallback(_)));

    let decision = DecisionValidator::new().validate(&consultation.decision);
    assert_eq!(decision.portfolio.overall_exposure, dec!(0.3));
    assert_eq!(decision.decisions.len(), 1);
    assert_eq!(decision.decisions[0].coin, "BTC");
    assert_eq!(decision.decisions[0].decision.action, Action::Hedge);
}

#[tokio::test]
async fn test_well_formed_answer_is_used() {
    let document = r#"{
        "market_analysis": {"regime_identification": "trending"},
        "portfolio_strategy": {"overall_exposure": 0.8},
        "trading_decisions": {"ETH": {"decision": "SHORT", "leverage": 4, "position_size": 0.15}}
    }"#;
    let (service, consultant) = consultant(
        vec![Scripted::Content(format!("```json\n{}\n```", document))],
        Duration::from_secs(5),
    );
    let universe = universe(&["BTC", "ETH"]).await;

    let consultation = consultant.consult(&universe).await;

    assert_eq!(consultation.source, DecisionSource::Service);
    let decision = DecisionValidator::new().validate(&consultation.decision);
    assert_eq!(decision, {
        let mut expected = validated(document);
        expected.source = DecisionSource::Service;
        expected
    });
    assert_eq!(decision.regime_label(), "trending");

    // The request carries both instruments and the schema
    let prompts = service.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].user.contains("ETH-USD-SWAP"));
    assert!(prompts[0].user.contains("BTC-USD-SWAP"));
    assert!(prompts[0].schema.contains("MARKET_MAKE"));
}
