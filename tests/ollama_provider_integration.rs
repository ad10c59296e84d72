use serde_json::json;

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parley::config::OllamaConfig;
use parley::error::{as_parley_error, ParleyError};
use parley::providers::{Message, OllamaProvider, Provider};

fn provider_for(server: &MockServer) -> OllamaProvider {
    OllamaProvider::new(OllamaConfig {
        host: server.uri(),
        timeout_seconds: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_complete_sends_history_and_parses_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.2:latest",
            "stream": false,
            "messages": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello" },
                { "role": "user", "content": "how are you?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2:latest",
            "message": { "role": "assistant", "content": "Fine, thanks." },
            "done": true,
            "prompt_eval_count": 12,
            "eval_count": 4
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let messages = vec![
        Message::user("hi"),
        Message::assistant("hello"),
        Message::user("how are you?"),
    ];
    let response = provider
        .complete("llama3.2:latest", &messages)
        .await
        .unwrap();

    assert_eq!(response.content, "Fine, thanks.");
    let usage = response.usage.unwrap();
    assert_eq!(usage.prompt_tokens, 12);
    assert_eq!(usage.completion_tokens, 4);
}

#[tokio::test]
async fn test_complete_maps_backend_error_to_inference() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "model 'nope' not found" })),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .complete("nope", &[Message::user("hi")])
        .await
        .unwrap_err();

    match as_parley_error(&err) {
        Some(ParleyError::Inference(detail)) => assert!(detail.contains("model 'nope' not found")),
        other => panic!("expected inference error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_models_reads_tags() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                { "name": "llama3.2:latest", "size": 2019393189u64, "modified_at": "2024-10-01T10:00:00Z" },
                { "name": "mistral:7b", "size": 4109865159u64, "modified_at": "2024-09-12T08:30:00Z" }
            ]
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let models = provider.list_models().await.unwrap();
    let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["llama3.2:latest", "mistral:7b"]);
    assert_eq!(models[0].size, 2019393189);

    assert!(provider.health_check().await.is_ok());
}

#[tokio::test]
async fn test_unload_model_posts_zero_keep_alive() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama3.2:latest",
            "keep_alive": 0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "done": true })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    provider.unload_model("llama3.2:latest").await.unwrap();
}

#[tokio::test]
async fn test_health_check_fails_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider.health_check().await.unwrap_err();
    assert!(matches!(
        as_parley_error(&err),
        Some(ParleyError::Inference(_))
    ));
}
