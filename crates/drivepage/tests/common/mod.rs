// Shared setup for integration tests
//
// Each test binary compiles this module separately, so not every helper is
// used everywhere.
#![allow(dead_code)]

use drivepage::{Harness, HarnessConfig, TestContext, TestData};
use std::collections::HashMap;
use std::path::Path;

pub fn init_tracing() {
    drivepage::logging::init_tracing();
}

/// Configuration for the real application, from the environment.
pub fn env_config() -> HarnessConfig {
    HarnessConfig::from_env().expect("BASE_URL, USER_EMAIL and USER_PASSWORD must be set")
}

/// Configuration pointing at a local test server, with every artifact under
/// `scratch` and short timeouts.
pub fn local_config(base_url: &str, password: &str, scratch: &Path) -> HarnessConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("BASE_URL", base_url.to_string()),
        ("USER_EMAIL", "qa@example.com".to_string()),
        ("USER_PASSWORD", password.to_string()),
        ("ACTION_TIMEOUT", "5000".to_string()),
        ("NAVIGATION_TIMEOUT", "10000".to_string()),
        ("EXPECT_TIMEOUT", "1000".to_string()),
        ("SESSION_STATE_PATH", scratch.join("user.json").display().to_string()),
        ("SCREENSHOTS_PATH", scratch.join("screenshots").display().to_string()),
        ("DOWNLOADS_PATH", scratch.join("downloads").display().to_string()),
        ("TEST_FILES_PATH", scratch.join("files").display().to_string()),
    ]);
    HarnessConfig::from_lookup(|name| vars.get(name).cloned()).expect("valid local config")
}

/// Test data shipped with the crate.
pub fn test_data() -> TestData {
    TestData::load(Path::new(env!("CARGO_MANIFEST_DIR")).join("test-data/drive.json"))
        .expect("test-data/drive.json should be valid")
}

/// Test data from TEST_DATA_PATH when running against the real application.
///
/// A missing or malformed file fails the test; there is no fallback record.
pub fn env_test_data(config: &HarnessConfig) -> TestData {
    TestData::load(&config.paths.test_data).unwrap_or_else(|e| panic!("{e}"))
}

/// Ensures a session snapshot exists and opens an authenticated context on
/// the drive workspace.
pub async fn signed_in(config: &HarnessConfig) -> (Harness, TestContext) {
    drivepage::session::ensure_session(config)
        .await
        .expect("session bootstrap failed");
    let harness = Harness::launch(config).await.expect("Failed to launch browser");
    let ctx = harness
        .authenticated_context()
        .await
        .expect("Failed to open authenticated context");
    (harness, ctx)
}

/// Like [`signed_in`], but always bootstraps a fresh snapshot for `config`.
///
/// Local tests each use their own snapshot path, which the process-wide
/// bootstrap guard in `ensure_session` does not account for.
pub async fn signed_in_fresh(config: &HarnessConfig) -> (Harness, TestContext) {
    drivepage::session::bootstrap(config)
        .await
        .expect("session bootstrap failed");
    let harness = Harness::launch(config).await.expect("Failed to launch browser");
    let ctx = harness
        .authenticated_context()
        .await
        .expect("Failed to open authenticated context");
    (harness, ctx)
}
