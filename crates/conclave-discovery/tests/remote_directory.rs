//! Remote directory client and hybrid discovery against a fake HTTP directory.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use conclave_core::{AgentCard, AgentFilter, AgentStatus};
use conclave_discovery::*;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, timeout: Duration) -> RemoteRegistryClient {
    RemoteRegistryClient::new(server.uri(), Some("tok-1".to_string()), timeout).unwrap()
}

fn local_registry() -> Arc<AgentRegistry> {
    Arc::new(AgentRegistry::with_agents(vec![
        AgentCard::new("local-1", "analyzer")
            .with_skills(["summarize"])
            .with_status(AgentStatus::Active),
        AgentCard::new("local-2", "analyzer").with_skills(["classify"]),
        AgentCard::new("local-3", "writer").with_skills(["summarize"]),
    ]))
}

// ---------------------------------------------------------------------------
// 1. Query parameters and bearer token reach the directory
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fetch_sends_filter_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .and(query_param("skill", "summarize"))
        .and(query_param("status", "active"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"agentId": "remote-1", "agentType": "analyzer", "status": "active",
             "skills": ["summarize"], "health": "healthy"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let filter = AgentFilter::by_skill("summarize").with_status(AgentStatus::Active);
    let cards = client(&server, Duration::from_secs(2))
        .fetch_agents(&filter)
        .await
        .unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].agent_id, "remote-1");
}

#[tokio::test]
async fn test_fetch_accepts_wrapped_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "agents": [{"agentId": "r-1"}, {"agentId": "r-2"}]
        })))
        .mount(&server)
        .await;

    let cards = client(&server, Duration::from_secs(2))
        .fetch_agents(&AgentFilter::any())
        .await
        .unwrap();
    assert_eq!(cards.len(), 2);
}

#[tokio::test]
async fn test_fetch_drops_cards_outside_filter() {
    let server = MockServer::start().await;
    // Directory ignores every query parameter.
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"agentId": "css-only", "skills": ["css"]},
            {"agentId": "sql-pending", "skills": ["sql"]},
            {"agentId": "sql-active", "skills": ["sql", "css"], "status": "active"}
        ])))
        .mount(&server)
        .await;

    let remote = client(&server, Duration::from_secs(2));
    let cards = remote.fetch_agents(&AgentFilter::by_skill("sql")).await.unwrap();
    let ids: Vec<&str> = cards.iter().map(|c| c.agent_id.as_str()).collect();
    assert_eq!(ids, vec!["sql-pending", "sql-active"]);

    let filter = AgentFilter::by_skill("sql").with_status(AgentStatus::Active);
    let cards = remote.fetch_agents(&filter).await.unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].agent_id, "sql-active");
}

#[tokio::test]
async fn test_skill_lookup_never_returns_agent_without_skill() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"agentId": "css-only", "skills": ["css"]}
        ])))
        .mount(&server)
        .await;

    let discovery = HybridDiscovery::new(
        local_registry(),
        Arc::new(client(&server, Duration::from_secs(2))),
        Duration::from_secs(2),
    );
    let found = discovery.discover(&AgentFilter::by_skill("sql")).await;
    assert_eq!(found.source, DiscoverySource::Remote);
    assert!(found.agents.is_empty());
    assert!(discovery.find_agents_by_skill("sql").await.is_empty());
}

// ---------------------------------------------------------------------------
// 2. Failure classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_non_success_status_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server, Duration::from_secs(2))
        .fetch_agents(&AgentFilter::any())
        .await
        .unwrap_err();
    assert_eq!(err, RemoteFailure::Status(503));
}

#[tokio::test]
async fn test_malformed_body_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server, Duration::from_secs(2))
        .fetch_agents(&AgentFilter::any())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteFailure::Malformed(_)));
}

#[tokio::test]
async fn test_unreachable_directory_is_a_network_failure() {
    let remote = RemoteRegistryClient::new("http://127.0.0.1:9", None, Duration::from_secs(2))
        .unwrap();
    let err = remote.fetch_agents(&AgentFilter::any()).await.unwrap_err();
    assert!(matches!(
        err,
        RemoteFailure::Network(_) | RemoteFailure::Timeout(_)
    ));
}

// ---------------------------------------------------------------------------
// 3. Hybrid discovery over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_failing_remote_matches_local_registry_exactly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let registry = local_registry();
    let discovery = HybridDiscovery::new(
        registry.clone(),
        Arc::new(client(&server, Duration::from_secs(2))),
        Duration::from_secs(2),
    );

    let filters = vec![
        AgentFilter::any(),
        AgentFilter::by_skill("summarize"),
        AgentFilter::by_type("analyzer").with_status(AgentStatus::Active),
        AgentFilter::by_capability("none"),
    ];
    for filter in filters {
        assert_eq!(
            discovery.list_agents(&filter).await,
            registry.list_agents(&filter)
        );
    }
}

#[tokio::test]
async fn test_slow_remote_is_bounded_by_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let discovery = HybridDiscovery::new(
        local_registry(),
        Arc::new(client(&server, Duration::from_secs(5))),
        Duration::from_millis(100),
    );

    let started = std::time::Instant::now();
    let found = discovery.discover(&AgentFilter::by_skill("classify")).await;
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(found.source, DiscoverySource::Local);
    assert_eq!(found.agents[0].agent_id, "local-2");
}

#[tokio::test]
async fn test_register_publishes_card_to_directory() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agents"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let registry = local_registry();
    let discovery = HybridDiscovery::new(
        registry.clone(),
        Arc::new(client(&server, Duration::from_secs(2))),
        Duration::from_secs(2),
    );
    discovery
        .register_agent(AgentCard::new("fresh", "writer"))
        .await
        .unwrap();
    assert_eq!(registry.len(), 4);
}
