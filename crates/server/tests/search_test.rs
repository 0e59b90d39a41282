//! End-to-end searches over an in-memory social graph.

use graph_loader::{Edge, EdgeKind, SocialGraph, UserId, UserProfile};
use server::{ProviderWeights, SearchConfig, SearchError, SearchOptions, SearchOrchestrator};
use std::sync::Arc;

const REQUESTER: UserId = 1;

fn user(id: UserId, username: &str, display_name: &str, verified: bool) -> UserProfile {
    UserProfile {
        id,
        username: username.to_string(),
        display_name: display_name.to_string(),
        verified,
        follower_count: 100 + id,
        following_count: 10,
        moment_count: 3,
        avatar_url: Some(format!("https://cdn.example.com/{}.jpg", id)),
        location: None,
    }
}

fn follow(graph: &mut SocialGraph, from: UserId, to: UserId) {
    graph.insert_edge(EdgeKind::Follow, Edge { from, to });
}

fn build_graph() -> Arc<SocialGraph> {
    let mut graph = SocialGraph::new();
    graph.insert_user(user(1, "alex", "Alex Kim", false));
    graph.insert_user(user(2, "sam_rivera", "Sam Rivera", true));
    graph.insert_user(user(3, "samantha", "Samantha Lee", false));
    graph.insert_user(user(4, "sammy_b", "Sammy B", false));
    graph.insert_user(user(5, "sam_k", "Sam K", false));
    graph.insert_user(user(6, "samuel", "Samuel", false));
    graph.insert_user(user(7, "samsales", "Free Followers Sam", false));
    graph.insert_user(user(8, "sam_jones", "Sam Jones", false));

    // 1 <-> 2 mutual, 1 -> 3 one-way
    follow(&mut graph, 1, 2);
    follow(&mut graph, 2, 1);
    follow(&mut graph, 1, 3);
    // 2 follows 5, so 5 shares one connection with the requester
    follow(&mut graph, 2, 5);

    graph.insert_edge(EdgeKind::Block, Edge { from: 4, to: 1 });
    graph.insert_edge(EdgeKind::Mute, Edge { from: 1, to: 6 });

    Arc::new(graph)
}

fn orchestrator(config: SearchConfig) -> SearchOrchestrator {
    SearchOrchestrator::from_graph(build_graph(), config).expect("Failed to create orchestrator")
}

#[tokio::test]
async fn test_graph_search_end_to_end() {
    let response = orchestrator(SearchConfig::default())
        .search("SAM", REQUESTER, SearchOptions::default())
        .await
        .expect("search failed");

    let ids: Vec<UserId> = response.results.iter().map(|r| r.id).collect();
    // related: 2 (mutual, verified), 3 (one-way); unknown: 5 (shared), 8
    // blocker 4, muted 6 and spammy 7 are screened out
    assert_eq!(ids, vec![2, 3, 5, 8]);

    let first = &response.results[0];
    assert!(first.mutual_follow);
    assert!(first.verified);
    assert_eq!(first.avatar_url.as_deref(), Some("https://cdn.example.com/2.jpg"));
}

#[tokio::test]
async fn test_provider_weights_come_from_config() {
    let config = SearchConfig {
        providers: ProviderWeights {
            one_way_weight: 10.0,
            ..Default::default()
        },
        ..Default::default()
    };

    let response = orchestrator(config)
        .search("sam", REQUESTER, SearchOptions { metrics_enabled: false, diagnostics: true })
        .await
        .unwrap();

    let ids: Vec<UserId> = response.results.iter().map(|r| r.id).collect();
    // one-way follow 3 now outscores mutual follow 2
    assert_eq!(ids, vec![3, 2, 5, 8]);
    let score = response.results[0].diagnostics.as_ref().unwrap().score;
    assert!((score - 11.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_muted_users_return_when_allowed() {
    let mut config = SearchConfig::default();
    config.security.exclude_muted = false;

    let response = orchestrator(config)
        .search("sam", REQUESTER, SearchOptions::default())
        .await
        .unwrap();
    assert!(response.results.iter().any(|r| r.id == 6));
    assert!(response.results.iter().all(|r| r.id != 4));
}

#[tokio::test]
async fn test_unknown_requester_degrades_to_empty() {
    let response = orchestrator(SearchConfig::default())
        .search("sam", 999, SearchOptions { metrics_enabled: true, diagnostics: false })
        .await
        .unwrap();

    assert!(response.results.is_empty());
    let report = response.metrics.unwrap();
    assert!(report.related.error.is_some());
    assert!(report.unknown.error.is_some());
    assert_eq!(report.final_count, 0);
}

#[tokio::test]
async fn test_response_serializes_without_internal_fields() {
    let response = orchestrator(SearchConfig::default())
        .search("sam rivera", REQUESTER, SearchOptions::default())
        .await
        .unwrap();

    let json = serde_json::to_value(&response).unwrap();
    let first = &json["results"][0];
    assert_eq!(first["username"], "sam_rivera");
    assert!(first.get("score").is_none());
    assert!(first.get("blocked").is_none());
    assert!(json.get("metrics").is_none());
}

#[tokio::test]
async fn test_validation_error_surfaces_code() {
    let err = orchestrator(SearchConfig::default())
        .search("a", REQUESTER, SearchOptions::default())
        .await
        .unwrap_err();

    match err {
        SearchError::Validation(e) => assert_eq!(e.code, "SEARCH_TERM_TOO_SHORT"),
        other => panic!("unexpected error: {}", other),
    }
}
