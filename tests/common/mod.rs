//! Test helpers for the HTTP API tests.
//!
//! Builds routers around temporary share directories and drives the
//! create/authenticate flow.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;

use lanshare::share::Clock;
use lanshare::web::router::create_router;
use lanshare::{AppState, Config, InMemoryShareRegistry, ShareRegistry};

pub const PASSWORD: &str = "hunter2";

/// Create a test configuration.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.web.auth_rate_limit = 1000;
    config
}

/// Create a test server with a fresh in-memory registry.
pub fn create_test_server() -> TestServer {
    create_test_server_with_config(&test_config())
}

/// Create a test server from a configuration.
pub fn create_test_server_with_config(config: &Config) -> TestServer {
    let state = Arc::new(AppState::from_config(config));
    TestServer::new(create_router(state, &config.web)).expect("Failed to create test server")
}

/// Create a test server around a given registry.
pub fn create_test_server_with_registry(registry: Arc<dyn ShareRegistry>) -> TestServer {
    let config = test_config();
    let state = Arc::new(AppState::new(registry, &config));
    TestServer::new(create_router(state, &config.web)).expect("Failed to create test server")
}

/// A manually advanced clock.
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())),
        }
    }

    pub fn clock(&self) -> Clock {
        let now = self.now.clone();
        Arc::new(move || *now.lock().unwrap())
    }

    pub fn advance_minutes(&self, minutes: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::minutes(minutes);
    }
}

/// Create a test server whose registry uses a manual clock.
pub fn create_test_server_with_clock() -> (TestServer, ManualClock) {
    let clock = ManualClock::new();
    let registry = InMemoryShareRegistry::with_clock(24 * 60, clock.clock());
    (create_test_server_with_registry(Arc::new(registry)), clock)
}

/// Temporary directory with a small tree:
///
/// ```text
/// project/
///   B/inner.txt
///   a.txt
///   photo.png
///   notes.md
///   data.bin
/// ```
pub fn shared_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = fs::canonicalize(temp_dir.path()).unwrap().join("project");
    fs::create_dir_all(root.join("B")).unwrap();
    fs::write(root.join("B").join("inner.txt"), b"inner").unwrap();
    fs::write(root.join("a.txt"), b"hello from a").unwrap();
    fs::write(root.join("photo.png"), b"\x89PNG\r\n\x1a\nfake").unwrap();
    fs::write(root.join("notes.md"), b"# notes").unwrap();
    fs::write(root.join("data.bin"), [0u8, 1, 2, 3]).unwrap();
    (temp_dir, root)
}

/// Create a share and return the response data.
pub async fn create_share_with(server: &TestServer, body: Value) -> Value {
    let response = server.post("/api/share/create").json(&body).await;
    response.assert_status_ok();
    response.json::<Value>()["data"].clone()
}

/// Create a share of `root` and return its token.
pub async fn create_share(server: &TestServer, root: &std::path::Path) -> String {
    let data = create_share_with(
        server,
        json!({
            "dirpath": root.to_str().unwrap(),
            "password": PASSWORD,
            "ip": "192.168.1.20"
        }),
    )
    .await;
    data["token"].as_str().unwrap().to_string()
}

/// Authenticate for `token` and return the issued session cookie.
pub async fn authenticate(server: &TestServer, token: &str) -> Cookie<'static> {
    let response = server
        .post(&format!("/api/share/{}/auth", token))
        .json(&json!({ "password": PASSWORD }))
        .await;
    response.assert_status_ok();
    response.cookie("lanshare_session")
}

/// Create a share of `root`, authenticate, and return token and cookie.
pub async fn open_share(
    server: &TestServer,
    root: &std::path::Path,
) -> (String, Cookie<'static>) {
    let token = create_share(server, root).await;
    let cookie = authenticate(server, &token).await;
    (token, cookie)
}
