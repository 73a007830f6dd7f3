#![allow(clippy::unwrap_used)]
// Integration tests for `Tailnet`: token caching, recovery, and inventory.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{bearer_token, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tailinv_core::{CoreError, InventoryConfig, Tailnet, TokenStatus, TokenStore};

const TOKEN_PATH: &str = "/api/v2/oauth/token";
const DEVICES_PATH: &str = "/api/v2/tailnet/example.com/devices";

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    server: MockServer,
    cache_dir: TempDir,
}

impl Harness {
    async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            cache_dir: tempfile::tempdir().unwrap(),
        }
    }

    fn config(&self) -> InventoryConfig {
        let mut config = InventoryConfig::new(
            "example.com",
            "client-id",
            SecretString::from("client-secret".to_string()),
        );
        config.api_base = Url::parse(&format!("{}/api/v2", self.server.uri())).unwrap();
        config.token_url = Url::parse(&format!("{}{TOKEN_PATH}", self.server.uri())).unwrap();
        config.token_cache = self.cache_dir.path().join("token.json");
        config.timeout = Duration::from_secs(5);
        config
    }

    fn tailnet(&self) -> Tailnet {
        Tailnet::new(self.config()).unwrap()
    }

    fn store(&self) -> TokenStore {
        TokenStore::new(self.cache_dir.path().join("token.json"))
    }

    fn seed_cache(&self, access_token: &str, expires_in_secs: i64) {
        let token = serde_json::from_value(json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_at": Utc::now() + ChronoDuration::seconds(expires_in_secs),
        }))
        .unwrap();
        self.store().save(&token).unwrap();
    }

    async fn mount_token(&self, access_token: &str, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    async fn mount_devices(&self, access_token: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(DEVICES_PATH))
            .and(bearer_token(access_token))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }
}

fn device(hostname: &str, address: &str, tags: &[&str]) -> serde_json::Value {
    json!({
        "id": format!("id-{hostname}"),
        "hostname": hostname,
        "addresses": [address],
        "tags": tags,
    })
}

// ── Token acquisition ───────────────────────────────────────────────

#[tokio::test]
async fn test_valid_cached_token_is_reused() {
    let h = Harness::start().await;
    h.seed_cache("cached", 3600);
    h.mount_token("fresh", 0).await;

    let token = h.tailnet().token().await.unwrap();

    assert_eq!(token.access_token, "cached");
}

#[tokio::test]
async fn test_missing_cache_authenticates_and_saves() {
    let h = Harness::start().await;
    h.mount_token("fresh", 1).await;

    let token = h.tailnet().token().await.unwrap();

    assert_eq!(token.access_token, "fresh");
    assert_eq!(h.store().load().unwrap().unwrap().access_token, "fresh");
}

#[tokio::test]
async fn test_expired_cache_is_replaced() {
    let h = Harness::start().await;
    h.seed_cache("stale", -10);
    h.mount_token("fresh", 1).await;

    let token = h.tailnet().token().await.unwrap();

    assert_eq!(token.access_token, "fresh");
    assert_eq!(h.store().load().unwrap().unwrap().access_token, "fresh");
}

#[tokio::test]
async fn test_token_inside_skew_window_counts_as_expired() {
    let h = Harness::start().await;
    h.seed_cache("almost", 30);
    h.mount_token("fresh", 1).await;

    let token = h.tailnet().token().await.unwrap();

    assert_eq!(token.access_token, "fresh");
}

#[tokio::test]
async fn test_corrupt_cache_is_overwritten() {
    let h = Harness::start().await;
    std::fs::write(h.store().path(), "not json").unwrap();
    h.mount_token("fresh", 1).await;

    let token = h.tailnet().token().await.unwrap();

    assert_eq!(token.access_token, "fresh");
    assert_eq!(h.store().load().unwrap().unwrap().access_token, "fresh");
}

#[tokio::test]
async fn test_rejected_credentials_surface_as_authentication_error() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid client"))
        .mount(&h.server)
        .await;

    let err = h.tailnet().token().await.unwrap_err();

    assert!(err.is_auth(), "got: {err:?}");
    assert!(h.store().load().unwrap().is_none());
}

#[tokio::test]
async fn test_refresh_ignores_valid_cache() {
    let h = Harness::start().await;
    h.seed_cache("cached", 3600);
    h.mount_token("fresh", 1).await;

    let token = h.tailnet().refresh_token().await.unwrap();

    assert_eq!(token.access_token, "fresh");
}

#[tokio::test]
async fn test_token_status_reports_cache_state() {
    let h = Harness::start().await;
    let tailnet = h.tailnet();
    assert_eq!(tailnet.token_status(), TokenStatus::Missing);

    h.seed_cache("cached", 3600);
    assert!(matches!(tailnet.token_status(), TokenStatus::Valid { expires_at: Some(_) }));

    h.seed_cache("stale", -10);
    assert!(matches!(tailnet.token_status(), TokenStatus::Expired { .. }));

    std::fs::write(h.store().path(), "{").unwrap();
    assert!(matches!(tailnet.token_status(), TokenStatus::Corrupt { .. }));
}

// ── Device listing ──────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_cached_token_is_replaced_and_retried() {
    let h = Harness::start().await;
    h.seed_cache("revoked", 3600);
    h.mount_token("fresh", 1).await;

    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .and(bearer_token("revoked"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token revoked"))
        .expect(1)
        .mount(&h.server)
        .await;
    h.mount_devices(
        "fresh",
        json!({ "devices": [device("a", "100.64.0.1", &[])] }),
    )
    .await;

    let devices = h.tailnet().devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(h.store().load().unwrap().unwrap().access_token, "fresh");
}

#[tokio::test]
async fn test_unauthorized_fresh_token_is_not_retried() {
    let h = Harness::start().await;
    h.mount_token("fresh", 1).await;

    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.tailnet().devices().await.unwrap_err();

    assert!(matches!(err, CoreError::Api { status: 401, .. }), "got: {err:?}");
}

#[tokio::test]
async fn test_forbidden_is_an_api_error() {
    let h = Harness::start().await;
    h.seed_cache("cached", 3600);

    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("missing scope"))
        .mount(&h.server)
        .await;

    let err = h.tailnet().devices().await.unwrap_err();

    match err {
        CoreError::Api { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("missing scope"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_device_fetch_times_out() {
    let h = Harness::start().await;
    h.seed_cache("cached", 3600);

    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "devices": [] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&h.server)
        .await;

    let mut config = h.config();
    config.timeout = Duration::from_secs(1);
    let err = Tailnet::new(config).unwrap().devices().await.unwrap_err();

    assert!(
        matches!(err, CoreError::Timeout { operation: "device fetch", .. }),
        "got: {err:?}"
    );
}

// ── Inventory ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_inventory_groups_by_tag_with_filter() {
    let h = Harness::start().await;
    h.seed_cache("cached", 3600);
    h.mount_devices(
        "cached",
        json!({
            "devices": [
                device("a", "10.0.0.1", &["tag:web", "tag:prod"]),
                device("b", "10.0.0.2", &["tag:db"]),
                device("c", "10.0.0.3", &[]),
            ]
        }),
    )
    .await;

    let mut config = h.config();
    config.tags = vec!["web".into()];
    let inv = Tailnet::new(config).unwrap().inventory().await.unwrap();

    assert_eq!(inv.hosts.keys().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(inv.address("a"), Some("10.0.0.1"));
    assert_eq!(
        inv.groups.keys().collect::<Vec<_>>(),
        vec!["tag_web", "tag_prod"]
    );
}

#[tokio::test]
async fn test_inventory_without_filter_includes_everything() {
    let h = Harness::start().await;
    h.seed_cache("cached", 3600);
    h.mount_devices(
        "cached",
        json!({
            "devices": [
                device("a", "10.0.0.1", &["tag:web"]),
                device("c", "10.0.0.3", &[]),
            ]
        }),
    )
    .await;

    let inv = h.tailnet().inventory().await.unwrap();

    assert_eq!(inv.hosts.len(), 2);
    assert_eq!(inv.ungrouped().collect::<Vec<_>>(), vec!["c"]);
}
