//! Integration tests for the HTTP transport and full runs
//!
//! These tests use wiremock to stand in for the VK API and drive the real
//! HTTP transport, the gateway and the runner end-to-end.

use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use vk_relink::api::{HttpTransport, Params, Transport};
use vk_relink::config::{load_config, ApiConfig, Config, RunParams};
use vk_relink::output::CommunityStatus;
use vk_relink::{RemoteErrorKind, RunEvent, RunSummary, Runner};
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const OLD: &str = "https://old.example/promo";
const NEW: &str = "https://new.example/promo";

/// Matches a form-encoded body field
struct FormParam(&'static str, String);

impl Match for FormParam {
    fn matches(&self, request: &Request) -> bool {
        url::form_urlencoded::parse(&request.body)
            .any(|(key, value)| key == self.0 && value == self.1.as_str())
    }
}

fn form(key: &'static str, value: impl ToString) -> FormParam {
    FormParam(key, value.to_string())
}

fn api_path(name: &str) -> impl Match {
    path(format!("/method/{}", name))
}

fn ok(response: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "response": response }))
}

fn vk_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(json!({"error": {"error_code": code, "error_msg": message}}))
}

fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: server.uri(),
        local_retries: 2,
        local_retry_backoff_ms: 1,
        ..ApiConfig::default()
    }
}

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::new(&api_config(server), "secret").expect("client")
}

fn wall_params() -> Params {
    Params::new()
        .with("owner_id", -1)
        .with("offset", 0)
        .with("count", 100)
}

/// Writes a config pointing at the mock server, without any delays
fn write_config(server: &MockServer, communities: &[&str]) -> NamedTempFile {
    let communities = communities
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");
    let content = format!(
        r#"
[api]
base-url = "{}"
local-retries = 0

[limits]
pacing-ms = 0
community-pause-ms = 0

[retry]
rate-limit-base-ms = 5
rate-limit-ceiling-ms = 20
network-base-ms = 5
network-ceiling-ms = 20

[run]
old-link = "{}"
new-link = "{}"
communities = [{}]
"#,
        server.uri(),
        OLD,
        NEW,
        communities
    );
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn load(file: &NamedTempFile) -> Config {
    load_config(file.path()).expect("config should load")
}

/// Runs to completion and checks that `Finished` closes the event stream
async fn run_to_end(config: Config) -> RunSummary {
    let params = RunParams::from_config(&config.run, "secret");
    let runner = Runner::new(config);
    let mut handle = runner.start(params).expect("run should start");

    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    assert!(matches!(events.last(), Some(RunEvent::Finished(_))));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    handle.wait().await.expect("worker should not panic")
}

#[tokio::test]
async fn test_call_sends_token_version_and_params() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(api_path("wall.get"))
        .and(form("access_token", "secret"))
        .and(form("v", "5.199"))
        .and(form("owner_id", -1))
        .and(form("count", 100))
        .respond_with(ok(json!({"count": 0, "items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let value = transport(&server)
        .call("wall.get", &wall_params())
        .await
        .unwrap();

    assert_eq!(value["count"], 0);
}

#[tokio::test]
async fn test_api_error_is_classified() {
    let server = MockServer::start().await;
    Mock::given(api_path("wall.get"))
        .respond_with(vk_error(15, "Access denied: wall is disabled"))
        .mount(&server)
        .await;

    let err = transport(&server)
        .call("wall.get", &wall_params())
        .await
        .unwrap_err();

    assert_eq!(err.kind, RemoteErrorKind::PermissionOrNotFound);
    assert_eq!(err.code, Some(15));
    assert!(err.message.contains("wall is disabled"));
}

#[tokio::test]
async fn test_rate_limit_code_is_classified() {
    let server = MockServer::start().await;
    Mock::given(api_path("wall.get"))
        .respond_with(vk_error(6, "Too many requests per second"))
        .mount(&server)
        .await;

    let err = transport(&server)
        .call("wall.get", &wall_params())
        .await
        .unwrap_err();

    assert_eq!(err.kind, RemoteErrorKind::RateLimited);
    // Envelope errors are not retried at the HTTP level
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_server_errors_are_retried_locally() {
    let server = MockServer::start().await;
    Mock::given(api_path("wall.get"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(api_path("wall.get"))
        .respond_with(ok(json!({"count": 0, "items": []})))
        .mount(&server)
        .await;

    let result = transport(&server).call("wall.get", &wall_params()).await;

    assert!(result.is_ok());
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_persistent_server_error_is_network_failure() {
    let server = MockServer::start().await;
    Mock::given(api_path("wall.get"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = transport(&server)
        .call("wall.get", &wall_params())
        .await
        .unwrap_err();

    assert_eq!(err.kind, RemoteErrorKind::Network);
    // One attempt plus two local retries
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_persistent_429_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(api_path("wall.get"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = transport(&server)
        .call("wall.get", &wall_params())
        .await
        .unwrap_err();

    assert_eq!(err.kind, RemoteErrorKind::RateLimited);
}

#[tokio::test]
async fn test_malformed_reply_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(api_path("wall.get"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = transport(&server)
        .call("wall.get", &wall_params())
        .await
        .unwrap_err();

    assert_eq!(err.kind, RemoteErrorKind::Protocol);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_full_run_edits_posts_comments_and_threads() {
    let server = MockServer::start().await;

    Mock::given(api_path("utils.resolveScreenName"))
        .and(form("screen_name", "my_public"))
        .respond_with(ok(json!({"type": "group", "object_id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(api_path("wall.get"))
        .and(form("owner_id", -42))
        .and(form("offset", 0))
        .respond_with(ok(json!({
            "count": 2,
            "items": [
                {
                    "id": 7,
                    "text": format!("see {}", OLD),
                    "attachments": [
                        {"type": "photo", "photo": {"owner_id": -42, "id": 5, "access_key": "k1"}},
                        {"type": "link", "link": {"url": OLD}}
                    ]
                },
                {"id": 8, "text": "nothing to do"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(api_path("wall.getComments"))
        .and(form("owner_id", -42))
        .and(form("post_id", 7))
        .respond_with(ok(json!({
            "count": 1,
            "items": [{
                "id": 70,
                "text": OLD,
                "thread": {"count": 1, "items": [{"id": 71, "text": format!("reply {}", OLD)}]}
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(api_path("wall.getComments"))
        .and(form("owner_id", -42))
        .and(form("post_id", 8))
        .respond_with(ok(json!({"count": 0, "items": []})))
        .mount(&server)
        .await;

    Mock::given(api_path("wall.edit"))
        .and(form("owner_id", -42))
        .and(form("post_id", 7))
        .and(form("message", format!("see {}", NEW)))
        .and(form("attachments", "photo-42_5_k1"))
        .and(form("from_group", 1))
        .respond_with(ok(json!({"post_id": 7})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(api_path("wall.editComment"))
        .and(form("comment_id", 70))
        .and(form("message", NEW))
        .respond_with(ok(json!(1)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(api_path("wall.editComment"))
        .and(form("comment_id", 71))
        .and(form("message", format!("reply {}", NEW)))
        .respond_with(ok(json!(1)))
        .expect(1)
        .mount(&server)
        .await;

    let file = write_config(&server, &["https://vk.com/my_public"]);
    let summary = run_to_end(load(&file)).await;

    let report = summary.report_for("https://vk.com/my_public").unwrap();
    assert_eq!(report.status, CommunityStatus::Completed);
    assert_eq!(report.posts_seen, 2);
    assert_eq!(report.posts_edited, 1);
    assert_eq!(report.comments_edited, 2);
    assert_eq!(summary.edits_failed(), 0);
}

#[tokio::test]
async fn test_run_survives_rate_limit_and_denied_community() {
    let server = MockServer::start().await;

    // club1: rate limited once, then served
    Mock::given(api_path("wall.get"))
        .and(form("owner_id", -1))
        .respond_with(vk_error(6, "Too many requests per second"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(api_path("wall.get"))
        .and(form("owner_id", -1))
        .respond_with(ok(json!({"count": 1, "items": [{"id": 1, "text": OLD}]})))
        .mount(&server)
        .await;

    // club2: wall closed
    Mock::given(api_path("wall.get"))
        .and(form("owner_id", -2))
        .respond_with(vk_error(15, "Access denied"))
        .mount(&server)
        .await;

    // club3: one post, edit rejected
    Mock::given(api_path("wall.get"))
        .and(form("owner_id", -3))
        .respond_with(ok(json!({"count": 1, "items": [{"id": 9, "text": OLD}]})))
        .mount(&server)
        .await;
    Mock::given(api_path("wall.edit"))
        .and(form("owner_id", -3))
        .respond_with(vk_error(210, "Access to wall's post denied"))
        .mount(&server)
        .await;

    Mock::given(api_path("wall.edit"))
        .and(form("owner_id", -1))
        .and(form("message", NEW))
        .respond_with(ok(json!({"post_id": 1})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(api_path("wall.getComments"))
        .respond_with(ok(json!({"count": 0, "items": []})))
        .mount(&server)
        .await;

    let file = write_config(&server, &["club1", "club2", "club3"]);
    let summary = run_to_end(load(&file)).await;

    assert_eq!(summary.reports.len(), 3);
    assert_eq!(summary.reports[0].posts_edited, 1);
    assert!(matches!(
        summary.reports[1].status,
        CommunityStatus::Aborted(_)
    ));
    assert_eq!(summary.reports[2].posts_edited, 0);
    assert_eq!(summary.reports[2].edits_failed, 1);
    assert!(!summary.stopped_by_user);
}

#[tokio::test]
async fn test_unknown_screen_name_is_reported_and_skipped() {
    let server = MockServer::start().await;
    Mock::given(api_path("utils.resolveScreenName"))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;
    Mock::given(api_path("wall.get"))
        .respond_with(ok(json!({"count": 0, "items": []})))
        .mount(&server)
        .await;

    let file = write_config(&server, &["nobody_here", "club5"]);
    let summary = run_to_end(load(&file)).await;

    assert_eq!(summary.unresolved(), 1);
    assert!(summary.reports[1].is_resolved());
}

#[tokio::test]
async fn test_second_start_is_refused_while_running() {
    let server = MockServer::start().await;
    Mock::given(api_path("wall.get"))
        .respond_with(
            ok(json!({"count": 0, "items": []}))
                .set_delay(std::time::Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let file = write_config(&server, &["club1"]);
    let config = load(&file);
    let params = RunParams::from_config(&config.run, "secret");
    let runner = Runner::new(config);

    let handle = runner.start(params.clone()).unwrap();
    assert!(runner.is_active());
    assert!(matches!(
        runner.start(params),
        Err(vk_relink::RelinkError::RunActive)
    ));

    handle.wait().await.unwrap();
    assert!(!runner.is_active());
}

#[test]
fn test_config_file_rejects_oversized_page() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[limits]
page-size = 500

[run]
old-link = "a"
new-link = "b"
communities = ["club1"]
"#,
    )
    .unwrap();

    assert!(load_config(file.path()).is_err());
}

#[tokio::test]
async fn test_transport_is_usable_as_trait_object() {
    let server = MockServer::start().await;
    Mock::given(api_path("utils.resolveScreenName"))
        .respond_with(ok(json!({"type": "page", "object_id": 3})))
        .mount(&server)
        .await;

    let transport: Arc<dyn Transport> = Arc::new(transport(&server));
    let value = transport
        .call(
            "utils.resolveScreenName",
            &Params::new().with("screen_name", "x"),
        )
        .await
        .unwrap();

    assert_eq!(value["object_id"], 3);
}
