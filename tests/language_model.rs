//! End-to-end tests of the model-backed services against a mock chat API

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};
use travel_assistant::config::ModelConfig;
use travel_assistant::{
    AttractionExtractor, ChatModel, LocationResolver, OpenAiChatModel, TravelAssistantError,
};
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn model(server: &MockServer) -> Arc<dyn ChatModel> {
    let config = ModelConfig {
        base_url: format!("{}/v1", server.uri()),
        ..ModelConfig::default()
    };
    Arc::new(OpenAiChatModel::new(Client::new(), "sk-test", &config).unwrap())
}

fn tool_call(name: &str, arguments: Value) -> Value {
    json!({
        "choices": [{
            "message": {
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": { "name": name, "arguments": arguments.to_string() }
                }]
            }
        }]
    })
}

#[tokio::test]
async fn test_resolve_location_through_chat_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(bearer_token("sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "tool_choice": { "type": "function", "function": { "name": "Location" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_call(
            "Location",
            json!({ "location": "Barcelona, Spain", "latitude": 41.3874, "longitude": 2.1686 }),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(model(&server));
    let resolution = resolver.resolve_location("barcelonna").await.unwrap();

    assert_eq!(resolution.location, "Barcelona, Spain");
    assert_eq!(resolution.latitude, 41.3874);
    assert_eq!(resolution.longitude, 2.1686);
}

#[tokio::test]
async fn test_missing_field_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_call(
            "Location",
            json!({ "location": "Barcelona, Spain", "latitude": 41.3874 }),
        )))
        .mount(&server)
        .await;

    let result = LocationResolver::new(model(&server))
        .resolve_location("barcelona")
        .await;
    assert!(matches!(result, Err(TravelAssistantError::MalformedResponse { .. })));
}

#[tokio::test]
async fn test_rejected_key_is_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": { "message": "bad key" } })))
        .mount(&server)
        .await;

    let result = LocationResolver::new(model(&server))
        .resolve_location("Rome")
        .await;
    assert!(matches!(result, Err(TravelAssistantError::Config { .. })));
}

#[tokio::test]
async fn test_slow_model_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(tool_call("Location", json!({})))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = ModelConfig {
        base_url: format!("{}/v1", server.uri()),
        timeout_seconds: 1,
        ..ModelConfig::default()
    };
    let model = OpenAiChatModel::new(Client::new(), "sk-test", &config).unwrap();
    let result = LocationResolver::new(Arc::new(model))
        .resolve_location("Rome")
        .await;
    assert!(matches!(result, Err(TravelAssistantError::Timeout { .. })));
}

#[tokio::test]
async fn test_suggest_attractions_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system", "content": "You are a helpful travel assistant" },
                { "role": "user", "content": "Give me the top 10 touristic attractions names in Rome. Do not add comments." }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "1. Colosseum\n2. Pantheon\n" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let extractor = AttractionExtractor::new(model(&server), Duration::from_secs(5));
    let text = extractor.suggest_attractions("Rome").await.unwrap();
    assert_eq!(text, "1. Colosseum\n2. Pantheon");
}

#[tokio::test]
async fn test_extract_attractions_through_chat_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "tool_choice": { "function": { "name": "Information" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_call(
            "Information",
            json!({ "attractions": [{ "name": "Colosseum", "latitude": 41.8902, "longitude": 12.4922 }] }),
        )))
        .expect(2)
        .mount(&server)
        .await;

    let extractor = AttractionExtractor::new(model(&server), Duration::from_secs(5));
    let extraction = extractor
        .extract_attraction_groups("1. Colosseum\n\n2. Colosseo")
        .await;

    assert_eq!(extraction.groups.len(), 2);
    assert_eq!(extraction.failed_lines, 0);
    assert_eq!(extraction.attractions()[0].name, "Colosseum");
}
