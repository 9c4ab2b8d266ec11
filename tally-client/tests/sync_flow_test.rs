//! Client sync flows against an in-process server.
//!
//! Covers:
//! - Save-then-load replace semantics through a live server, second device
//!   included
//! - Explicit auth rejections never falling back to the simulated backend
//! - Simulated credentials staying routed to the simulated registry even
//!   with a reachable server
//! - The debounced scheduler landing the final snapshot remotely
//! - Anonymous local-only operation

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::sleep;

use tally_client::cache::KEY_SIMULATED_USERS;
use tally_client::{
    AuthError, AuthGateway, CacheStore, ClientConfig, SaveScheduler, SimulatedBackend,
    SimulatedUser, SyncOrchestrator,
};
use tally_core::Counter;
use tally_server::{build_router, AppState, Db, TokenSigner};

async fn spawn_server() -> String {
    let state = AppState {
        db: Arc::new(Db::open_in_memory().unwrap()),
        tokens: TokenSigner::new("client-flow-test-secret-0123456789abcdef", 7),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client_parts(dir: &TempDir, server: &str) -> (AuthGateway, SyncOrchestrator) {
    let cache = CacheStore::open(dir.path()).unwrap();
    let config = ClientConfig::for_server(server);
    (
        AuthGateway::new(cache.clone(), &config),
        SyncOrchestrator::new(cache, &config),
    )
}

#[tokio::test]
async fn save_then_load_roundtrips_through_the_server() {
    let server = spawn_server().await;

    let phone_dir = TempDir::new().unwrap();
    let (gateway, sync) = client_parts(&phone_dir, &server);
    let session = gateway
        .register("bob", "bob@example.com", "secret123")
        .await
        .unwrap();
    assert!(!session.credential.is_simulated());

    // Distinct creation times keep the server's (createdAt, id) ordering
    // aligned with the pushed order.
    let water = Counter::new("water", "Health", false);
    let mut pushups = Counter::new("pushups", "Fitness", true);
    pushups.created_at = water.created_at + 1;
    let counters = vec![water, pushups];
    sync.save(&counters, Some(&session.credential)).await.unwrap();

    // A second device logs in and sees the pushed state.
    let laptop_dir = TempDir::new().unwrap();
    let (laptop_gateway, laptop_sync) = client_parts(&laptop_dir, &server);
    let laptop_session = laptop_gateway.login("bob", "secret123").await.unwrap();
    let loaded = laptop_sync.load(Some(&laptop_session.credential)).await;
    assert_eq!(loaded, counters);

    // Pushing an empty collection clears the remote copy for everyone.
    sync.save(&[], Some(&session.credential)).await.unwrap();
    assert!(laptop_sync.load(Some(&laptop_session.credential)).await.is_empty());
}

#[tokio::test]
async fn explicit_rejection_does_not_create_a_simulated_account() {
    let server = spawn_server().await;

    let first_dir = TempDir::new().unwrap();
    let (first, _) = client_parts(&first_dir, &server);
    first
        .register("bob", "bob@example.com", "secret123")
        .await
        .unwrap();

    let second_dir = TempDir::new().unwrap();
    let second_cache = CacheStore::open(second_dir.path()).unwrap();
    let second = AuthGateway::new(second_cache.clone(), &ClientConfig::for_server(&server));

    let err = second
        .register("bob", "other@example.com", "different")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UsernameTaken));

    // The rejection reached the caller; nothing fell through to the
    // simulated registry and no session was stored.
    let registry: Option<Vec<SimulatedUser>> = second_cache.get(KEY_SIMULATED_USERS);
    assert!(registry.is_none());
    assert!(second.stored_session().is_none());
}

#[tokio::test]
async fn simulated_credential_keeps_routing_to_the_registry() {
    // Register while the server is unreachable.
    let dir = TempDir::new().unwrap();
    let cache = CacheStore::open(dir.path()).unwrap();
    let dead = ClientConfig::for_server("http://127.0.0.1:9");
    let gateway = AuthGateway::new(cache.clone(), &dead);
    let session = gateway
        .register("ana", "ana@example.com", "secret123")
        .await
        .unwrap();
    assert!(session.credential.is_simulated());

    // The server comes up, but the simulated session must not migrate.
    let server = spawn_server().await;
    let live = ClientConfig::for_server(&server);
    let sync = SyncOrchestrator::new(cache.clone(), &live);

    let counters = vec![Counter::new("reading", "Habits", false)];
    sync.save(&counters, Some(&session.credential)).await.unwrap();
    assert_eq!(sync.load(Some(&session.credential)).await, counters);

    let bucket = SimulatedBackend::new(cache, &live).load_bucket(session.user.id);
    assert_eq!(bucket, counters);
}

#[tokio::test]
async fn debounced_saves_land_the_final_snapshot_remotely() {
    let server = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let cache = CacheStore::open(dir.path()).unwrap();
    let config = ClientConfig {
        debounce_window: Duration::from_millis(80),
        ..ClientConfig::for_server(&server)
    };

    let gateway = AuthGateway::new(cache.clone(), &config);
    let session = gateway
        .register("bob", "bob@example.com", "secret123")
        .await
        .unwrap();

    let sync = Arc::new(SyncOrchestrator::new(cache, &config));
    let scheduler = SaveScheduler::new(Arc::clone(&sync), &config);

    let mut counters = vec![Counter::new("water", "Health", false)];
    scheduler.schedule_save(counters.clone(), Some(session.credential.clone()));
    counters[0].increment();
    let mut coffee = Counter::new("coffee", "Health", false);
    coffee.created_at = counters[0].created_at + 1;
    counters.push(coffee);
    scheduler.schedule_save(counters.clone(), Some(session.credential.clone()));

    sleep(Duration::from_millis(500)).await;

    // Only the second snapshot reached the server.
    let loaded = sync.load(Some(&session.credential)).await;
    assert_eq!(loaded, counters);
}

#[tokio::test]
async fn anonymous_usage_stays_on_disk() {
    let dir = TempDir::new().unwrap();
    let server = "http://127.0.0.1:9";

    let (_, sync) = client_parts(&dir, server);
    let counters = vec![Counter::new("stretch", "Fitness", false)];
    sync.save(&counters, None).await.unwrap();

    // A fresh orchestrator over the same directory sees the data.
    let (_, reopened) = client_parts(&dir, server);
    assert_eq!(reopened.load(None).await, counters);
}
