//! OpenAI-compatible client tests against a wiremock server.

use council::llm::{ChatMessage, LLMClient, LLMClientFactory, OpenAIClient, OpenAIClientFactory};
use council::research::prompts;
use council::utils::toml_config::ProviderConfig;
use futures::StreamExt;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "deepseek-chat",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn sse_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    for delta in deltas {
        let chunk = json!({
            "id": "chatcmpl-test",
            "object": "chat.completion.chunk",
            "created": 1_700_000_000,
            "model": "deepseek-chat",
            "choices": [{"index": 0, "delta": {"content": delta}, "finish_reason": null}]
        });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn client(server: &MockServer) -> OpenAIClient {
    OpenAIClient::new(
        "sk-test".to_string(),
        server.uri(),
        "deepseek-chat".to_string(),
    )
}

#[tokio::test]
async fn test_complete_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "deepseek-chat"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("quantum error correction")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server)
        .complete(&[ChatMessage::system("sys"), ChatMessage::user("q")])
        .await
        .unwrap();

    assert_eq!(reply, "quantum error correction");
}

#[tokio::test]
async fn test_complete_surfaces_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "invalid api key", "type": "invalid_request_error", "param": null, "code": "invalid_api_key"}
        })))
        .mount(&server)
        .await;

    let result = client(&server).complete(&[ChatMessage::user("q")]).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_merged_prompt_is_sent_as_single_user_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("q")))
        .mount(&server)
        .await;

    let messages = prompts::query_gen_messages("what is a qubit", true);
    client(&server).complete(&messages).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let sent = body["messages"].as_array().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["role"], "user");
    assert!(sent[0]["content"].as_str().unwrap().ends_with("User question: what is a qubit"));
}

#[tokio::test]
async fn test_complete_stream_yields_deltas() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["Final", " answer", ""]).into_bytes(), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let chunks: Vec<String> = client(&server)
        .complete_stream(&[ChatMessage::user("q")])
        .await
        .unwrap()
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;

    // Empty deltas are filtered by the solver, not the client
    assert_eq!(chunks.concat(), "Final answer");
}

#[tokio::test]
async fn test_factory_opens_client_for_configured_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-factory"))
        .and(body_partial_json(json!({"model": "moonshot-v1-8k"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = ProviderConfig::new("moonshot-v1-8k", server.uri(), "sk-factory");
    let client = OpenAIClientFactory::default().create(&provider).await.unwrap();

    assert_eq!(client.model_name(), "moonshot-v1-8k");
    assert_eq!(client.complete(&[ChatMessage::user("q")]).await.unwrap(), "ok");
}
