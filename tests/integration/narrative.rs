//! Chat-completion narrator against a mocked endpoint

use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use candlescope::config::NarrativeSettings;
use candlescope::services::{ChatCompletionNarrator, NarrativeGenerator};

fn narrator(server: &MockServer, api_key: Option<&str>) -> ChatCompletionNarrator {
    ChatCompletionNarrator::with_client(
        NarrativeSettings {
            base_url: format!("{}/", server.uri()),
            api_key: api_key.map(str::to_string),
            model: "plan-model".to_string(),
        },
        reqwest::Client::new(),
    )
}

#[tokio::test]
async fn returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "plan-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "{\"entry\": 1000, \"target\": 1100, \"stop_loss\": 950}"
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = narrator(&server, Some("sk-test"))
        .generate_plan("Plan a trade for BBCA.JK")
        .await
        .unwrap();
    assert!(text.contains("\"target\": 1100"));
}

#[tokio::test]
async fn prompt_is_sent_as_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"role\":\"user\",\"content\":\"Plan a trade for TLKM.JK\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "ok" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = narrator(&server, None)
        .generate_plan("Plan a trade for TLKM.JK")
        .await
        .unwrap();
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn upstream_error_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = narrator(&server, None).generate_plan("anything").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn response_without_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = narrator(&server, None)
        .generate_plan("anything")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no content"));
}
