use std::sync::Arc;

use axum_test::TestServer;
use browser::fake::{FakeEngine, PortalScript};
use orchestrator::PortalLocators;
use serde_json::{json, Value};
use server::config::AppConfig;
use server::{create_router, state::AppState};

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.portal.base_url = "http://portal.test".to_string();
    config.portal.warning_timeout_ms = 50;
    config.portal.step_timeout_ms = 200;
    config
}

fn setup_test_server(script: PortalScript) -> (TestServer, FakeEngine) {
    let engine = FakeEngine::new(script);
    let state = AppState::with_engine(Arc::new(engine.clone()), &test_config())
        .expect("Failed to build state");
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");
    (server, engine)
}

fn accepting_portal() -> PortalScript {
    let l = PortalLocators::default();
    PortalScript::new()
        .element(&l.username_field, "")
        .element(&l.next_button, "Next")
        .element(&l.password_field, "")
        .element(&l.submit_button, "Login")
        .element(&l.student_main_link, "Student")
        .element(&l.student_name_label, "WELCOME JOHN DOE")
        .element(&l.total_percentage_label, "87%")
}

/// `data:` payloads of an SSE body, in order
fn sse_data(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim_start()).expect("data line is JSON"))
        .collect()
}

fn sse_ids(body: &str) -> Vec<u64> {
    body.lines()
        .filter_map(|line| line.strip_prefix("id:"))
        .map(|id| id.trim().parse().expect("id is a sequence number"))
        .collect()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _) = setup_test_server(PortalScript::new());

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["portal_login_url"], "http://portal.test/Login.aspx");
    }

    #[tokio::test]
    async fn test_openapi_document_lists_scrape() {
        let (server, _) = setup_test_server(PortalScript::new());

        let response = server.get("/api/openapi.json").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["paths"]["/api/scrape"].is_object());
    }
}

mod scrape {
    use super::*;

    #[tokio::test]
    async fn test_missing_query_is_bad_request() {
        let (server, engine) = setup_test_server(accepting_portal());

        let response = server.get("/api/scrape").await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "bad_request");
        assert_eq!(
            body["message"],
            attendance_core::CoreError::EmptyCredential.to_string()
        );
        assert_eq!(engine.launches(), 0);
    }

    #[tokio::test]
    async fn test_blank_query_is_bad_request() {
        let (server, engine) = setup_test_server(accepting_portal());

        let response = server
            .get("/api/scrape")
            .add_query_param("query", "   ")
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["message"], "Credential must not be empty");
        assert_eq!(engine.launches(), 0);
    }

    #[tokio::test]
    async fn test_successful_lookup_streams_result() {
        let (server, engine) = setup_test_server(accepting_portal());

        let response = server
            .get("/api/scrape")
            .add_query_param("query", "2021001")
            .await;

        response.assert_status_ok();
        let body = response.text();
        let records = sse_data(&body);

        assert_eq!(
            records.first(),
            Some(&json!({"message": "Started processing query for username: 2021001"}))
        );
        assert!(records.contains(&json!({
            "message": "Student Name: WELCOME JOHN DOE, Total Percentage: 87%"
        })));
        assert_eq!(
            records.last(),
            Some(&json!({"result": {"name": "WELCOME JOHN DOE", "total_percentage": "87%"}}))
        );
        let (_, progress) = records.split_last().unwrap();
        assert!(progress.iter().all(|r| r.get("message").is_some()));

        let ids = sse_ids(&body);
        assert_eq!(ids, (0..records.len() as u64).collect::<Vec<_>>());
        assert!(!body.contains("event:"));

        assert!(engine.typed_into(&PortalLocators::default().password_field));
        assert_eq!(engine.releases(), 1);
    }

    #[tokio::test]
    async fn test_unknown_username_streams_rejection() {
        let l = PortalLocators::default();
        let script = PortalScript::new()
            .element(&l.username_field, "")
            .element(&l.next_button, "Next")
            .element(&l.warning_label, "Invalid Username");
        let (server, engine) = setup_test_server(script);

        let response = server
            .get("/api/scrape")
            .add_query_param("query", "9999999")
            .await;

        response.assert_status_ok();
        let records = sse_data(&response.text());

        assert!(records.contains(&json!({"message": "Error: Invalid Username"})));
        assert_eq!(
            records.last(),
            Some(&json!({"result": {"error": "Invalid Username"}}))
        );
        assert!(!engine.typed_into(&l.password_field));
        assert_eq!(engine.releases(), 1);
    }

    #[tokio::test]
    async fn test_portal_fault_streams_fault() {
        let (server, engine) =
            setup_test_server(accepting_portal().failing_navigation("net::ERR_CONNECTION_REFUSED"));

        let response = server
            .get("/api/scrape")
            .add_query_param("query", "2021001")
            .await;

        response.assert_status_ok();
        let records = sse_data(&response.text());
        let (last, progress) = records.split_last().unwrap();

        let message = last["fault"]["message"].as_str().unwrap();
        assert!(message.starts_with("Scraping failed for 2021001:"));
        assert!(message.contains("ERR_CONNECTION_REFUSED"));
        assert!(progress
            .last()
            .and_then(|r| r["message"].as_str())
            .is_some_and(|m| m.starts_with("Error during scraping:")));
        assert_eq!(engine.releases(), 1);
    }

    #[tokio::test]
    async fn test_missing_element_streams_timeout_fault() {
        let l = PortalLocators::default();
        let script = PortalScript::new()
            .element(&l.username_field, "")
            .element(&l.next_button, "Next")
            .element(&l.password_field, "")
            .element(&l.submit_button, "Login");
        let (server, engine) = setup_test_server(script);

        let response = server
            .get("/api/scrape")
            .add_query_param("query", "2021001")
            .await;

        let records = sse_data(&response.text());
        let message = records.last().unwrap()["fault"]["message"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(message.contains(&l.student_main_link));
        assert_eq!(engine.releases(), 1);
    }

    #[tokio::test]
    async fn test_query_is_trimmed() {
        let (server, _) = setup_test_server(accepting_portal());

        let response = server
            .get("/api/scrape")
            .add_query_param("query", "  2021001 ")
            .await;

        let records = sse_data(&response.text());
        assert_eq!(
            records.first(),
            Some(&json!({"message": "Started processing query for username: 2021001"}))
        );
    }
}
