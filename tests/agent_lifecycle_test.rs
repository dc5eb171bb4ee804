// Agent lifecycle integration tests
//
// Drives install -> activate -> fetch through the public LifecycleHandler
// interface with an in-memory store and a scripted network.

use std::sync::Arc;

use http::{Method, StatusCode};
use offline_cache::cache::{CacheStore, MemoryCacheStore};
use offline_cache::config::AgentConfig;
use offline_cache::host::RecordingHost;
use offline_cache::network::MockNetwork;
use offline_cache::request::{Request, Response, ResponseType};
use offline_cache::{AgentError, FetchOutcome, LifecycleHandler, OfflineCacheAgent};
use url::Url;

const ORIGIN: &str = "https://franchiseku.test/";
const CURRENT: &str = "franchiseku-cache-v2";
const FONT_URL: &str = "https://fonts.gstatic.com/font.woff2";

struct Harness {
    store: MemoryCacheStore,
    network: MockNetwork,
    host: RecordingHost,
    agent: OfflineCacheAgent,
}

fn config() -> AgentConfig {
    AgentConfig {
        origin: ORIGIN.to_string(),
        ..Default::default()
    }
}

/// Network answering every default manifest entry
fn network_serving_manifest(config: &AgentConfig) -> MockNetwork {
    let network = MockNetwork::new();
    for entry in &config.manifest {
        let url = config.resolve(entry).unwrap();
        network.respond(url.as_str(), Response::ok(format!("content of {}", entry)));
    }
    network
}

fn harness() -> Harness {
    let config = config();
    let store = MemoryCacheStore::new();
    let network = network_serving_manifest(&config);
    let host = RecordingHost::new();
    let agent = OfflineCacheAgent::new(
        config,
        Arc::new(store.clone()),
        Arc::new(network.clone()),
        Arc::new(host.clone()),
    )
    .unwrap();
    Harness {
        store,
        network,
        host,
        agent,
    }
}

fn get(target: &str) -> Request {
    Request::get(Url::parse(ORIGIN).unwrap().join(target).unwrap())
}

#[tokio::test]
async fn test_installed_manifest_is_served_without_network() {
    let h = harness();
    let report = h.agent.on_install().await.unwrap();
    assert_eq!(report.entries, h.agent.config().manifest.len());
    let calls_after_install = h.network.call_count();

    for entry in h.agent.config().manifest.clone() {
        let outcome = h.agent.on_fetch(&get(&entry)).await;
        assert!(outcome.is_from_cache(), "{} should be served from cache", entry);
    }

    assert_eq!(h.network.call_count(), calls_after_install);
}

#[tokio::test]
async fn test_icon_request_is_served_from_cache() {
    let h = harness();
    h.agent.on_install().await.unwrap();
    let before = h.network.call_count();

    let outcome = h.agent.on_fetch(&get("/icon-192x192.png")).await;

    match outcome {
        FetchOutcome::FromCache(response) => {
            assert_eq!(response.body.as_ref(), b"content of /icon-192x192.png");
        }
        other => panic!("expected cache hit, got {:?}", other),
    }
    assert_eq!(h.network.call_count(), before);
}

#[tokio::test]
async fn test_font_is_returned_and_cached_on_first_fetch() {
    let h = harness();
    h.agent.on_install().await.unwrap();
    h.network.respond(FONT_URL, Response::ok("font bytes"));
    let entries_before = h.store.entry_count(CURRENT);

    let outcome = h.agent.on_fetch(&get(FONT_URL)).await;

    let response = outcome.into_response().unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_ref(), b"font bytes");
    assert_eq!(h.store.entry_count(CURRENT), entries_before + 1);

    let key = get(FONT_URL).key();
    let cached = h.store.match_request(CURRENT, &key).await.unwrap().unwrap();
    assert_eq!(cached.body.as_ref(), b"font bytes");
}

#[tokio::test]
async fn test_opaque_response_from_other_host_is_returned_uncached() {
    let h = harness();
    h.agent.on_install().await.unwrap();
    let url = "https://maps.example.com/tile.png";
    h.network
        .respond(url, Response::new(StatusCode::OK, ResponseType::Opaque, ""));
    let entries_before = h.store.entry_count(CURRENT);

    let outcome = h.agent.on_fetch(&get(url)).await;

    assert!(matches!(
        outcome,
        FetchOutcome::FromNetwork { stored: false, ref response } if response.response_type == ResponseType::Opaque
    ));
    assert_eq!(h.store.entry_count(CURRENT), entries_before);
}

#[tokio::test]
async fn test_network_failure_without_cache_entry() {
    let h = harness();
    h.agent.on_install().await.unwrap();
    h.network.fail(FONT_URL, "no connectivity");
    let entries_before = h.store.entry_count(CURRENT);

    let outcome = h.agent.on_fetch(&get(FONT_URL)).await;

    assert!(matches!(outcome, FetchOutcome::NetworkFailed(_)));
    assert!(outcome.response().is_none());
    assert_eq!(h.store.entry_count(CURRENT), entries_before);
}

#[tokio::test]
async fn test_post_passes_straight_through() {
    let h = harness();
    h.agent.on_install().await.unwrap();
    let reads = h.store.read_count();
    let writes = h.store.write_count();
    let calls = h.network.call_count();

    let request = Request::new(
        Method::POST,
        Url::parse(ORIGIN).unwrap().join("/api/save").unwrap(),
    );
    let outcome = h.agent.on_fetch(&request).await;

    assert!(matches!(outcome, FetchOutcome::PassThrough));
    assert_eq!(h.store.read_count(), reads);
    assert_eq!(h.store.write_count(), writes);
    assert_eq!(h.network.call_count(), calls);
}

#[tokio::test]
async fn test_activation_removes_previous_generation() {
    let h = harness();
    h.store
        .put(
            "franchiseku-cache-v1",
            get("/index.html").key(),
            Response::ok("old shell"),
        )
        .await
        .unwrap();
    h.agent.on_install().await.unwrap();

    let report = h.agent.on_activate().await.unwrap();

    assert_eq!(report.deleted, vec!["franchiseku-cache-v1"]);
    assert_eq!(h.store.keys().await.unwrap(), vec![CURRENT]);
    assert_eq!(h.host.skip_waiting_count(), 1);
    assert_eq!(h.host.claim_clients_count(), 1);

    let outcome = h.agent.on_fetch(&get("/index.html")).await;
    assert_eq!(
        outcome.response().unwrap().body.as_ref(),
        b"content of /index.html"
    );
}

#[tokio::test]
async fn test_failed_install_caches_nothing() {
    let h = harness();
    h.network
        .fail("https://www.gstatic.com/firebasejs/9.6.10/firebase-app-compat.js", "timeout");

    let err = h.agent.on_install().await.unwrap_err();

    assert!(matches!(err, AgentError::Precache { .. }));
    assert_eq!(h.store.entry_count(CURRENT), 0);
    assert!(!h.agent.on_fetch(&get("/index.html")).await.is_from_cache());
}

#[tokio::test]
async fn test_new_version_replaces_old_one() {
    let store = MemoryCacheStore::new();
    let base = config();
    let network = network_serving_manifest(&base);

    let v1 = OfflineCacheAgent::new(
        AgentConfig {
            cache_name: "franchiseku-cache-v1".to_string(),
            ..base.clone()
        },
        Arc::new(store.clone()),
        Arc::new(network.clone()),
        Arc::new(RecordingHost::new()),
    )
    .unwrap();
    v1.on_install().await.unwrap();
    v1.on_activate().await.unwrap();

    let v2 = OfflineCacheAgent::new(
        base,
        Arc::new(store.clone()),
        Arc::new(network.clone()),
        Arc::new(RecordingHost::new()),
    )
    .unwrap();
    v2.on_install().await.unwrap();
    assert_eq!(
        store.keys().await.unwrap(),
        vec!["franchiseku-cache-v1", "franchiseku-cache-v2"]
    );

    v2.on_activate().await.unwrap();

    assert_eq!(store.keys().await.unwrap(), vec!["franchiseku-cache-v2"]);
    assert!(v2.on_fetch(&get("/")).await.is_from_cache());
}

#[tokio::test]
async fn test_stats_after_mixed_traffic() {
    let h = harness();
    h.agent.on_install().await.unwrap();
    h.network.respond(FONT_URL, Response::ok("font"));

    h.agent.on_fetch(&get("/")).await;
    h.agent.on_fetch(&get(FONT_URL)).await;
    h.agent.on_fetch(&get(FONT_URL)).await;
    h.agent
        .on_fetch(&Request::new(
            Method::POST,
            Url::parse("https://franchiseku.test/api/save").unwrap(),
        ))
        .await;

    let stats = h.agent.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.runtime_stores, 1);
    assert_eq!(stats.pass_throughs, 1);

    let generation = h.agent.generation_stats().await.unwrap();
    assert_eq!(
        generation.entry_count as usize,
        h.agent.config().manifest.len() + 1
    );
}
