#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use conclave_core::*;

// ---------------------------------------------------------------------------
// 1. Agent card serialization roundtrip with typed metadata
// ---------------------------------------------------------------------------

#[test]
fn test_agent_card_roundtrip_preserves_metadata() {
    let mut scope = Metadata::new();
    scope.insert("write".to_string(), MetaValue::Bool(false));

    let mut creds = Metadata::new();
    creds.insert("token".to_string(), MetaValue::from("t-123"));
    creds.insert("scope".to_string(), MetaValue::Map(scope));

    let card = AgentCard::new("writer-1", "writer")
        .with_display_name("Writer One")
        .with_status(AgentStatus::Active)
        .with_skills(["draft", "edit"])
        .with_capabilities(["content"])
        .with_heartbeat(AgentHealth::Degraded, Utc::now())
        .with_credentials(creds)
        .with_endpoint("rpc", "https://writer.local/rpc");

    let json = serde_json::to_string(&card).unwrap();
    let parsed: AgentCard = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, card);
}

// ---------------------------------------------------------------------------
// 2. Filters over a heterogeneous set of cards
// ---------------------------------------------------------------------------

#[test]
fn test_filter_selects_by_membership_and_scalars() {
    let cards = vec![
        AgentCard::new("a", "analyzer")
            .with_skills(["summarize"])
            .with_status(AgentStatus::Active),
        AgentCard::new("b", "analyzer")
            .with_skills(["classify"])
            .with_status(AgentStatus::Active),
        AgentCard::new("c", "writer")
            .with_skills(["summarize"])
            .with_status(AgentStatus::Retired),
    ];

    let summarizers: Vec<&str> = cards
        .iter()
        .filter(|c| AgentFilter::by_skill("summarize").matches(c))
        .map(|c| c.agent_id.as_str())
        .collect();
    assert_eq!(summarizers, vec!["a", "c"]);

    let active_analyzers = AgentFilter::by_type("analyzer").with_status(AgentStatus::Active);
    assert_eq!(cards.iter().filter(|c| active_analyzers.matches(c)).count(), 2);
}

// ---------------------------------------------------------------------------
// 3. Assignment message payload is a serialized task context
// ---------------------------------------------------------------------------

#[test]
fn test_assignment_message_wraps_task_context() {
    let ctx = TaskContext::new("analysis", "Summarize weekly metrics")
        .with_skills(["summarize", "chart"]);
    let msg = AgentMessage::request("orchestrator", "a", &ctx, None).unwrap();

    assert_eq!(msg.message_type, MessageType::Request);
    assert_eq!(msg.context.task_type, "analysis");
    let decoded = msg.task_context().unwrap();
    assert_eq!(decoded.required_skills, vec!["summarize", "chart"]);
}
