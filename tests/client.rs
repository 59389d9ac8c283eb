//! OpenAI client tests against a mock server

mod common;

use briefgen::{
    complete, ChatClient, ChatOptions, CompletionRequest, CompletionResponse, Error, Message,
    Mode, OpenAIClient, PromptPair,
};
use common::OpenAIMockServer;
use futures::StreamExt;

fn options(json: bool) -> ChatOptions {
    ChatOptions {
        model: "gpt-4o-mini".to_string(),
        temperature: Some(0.3),
        json,
    }
}

fn messages() -> Vec<Message> {
    vec![Message::system("You write briefs."), Message::user("Write one.")]
}

#[tokio::test]
async fn test_chat_returns_content() {
    let server = OpenAIMockServer::start().await;
    server.mock_chat_completion(Some(r#"{"briefs":[]}"#)).await;

    let client = OpenAIClient::new(server.base_url(), "test-key").unwrap();
    let content = client.chat(&messages(), &options(true)).await.unwrap();
    assert_eq!(content.as_deref(), Some(r#"{"briefs":[]}"#));

    let bodies = server.request_bodies().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["stream"], false);
    assert_eq!(bodies[0]["model"], "gpt-4o-mini");
    assert_eq!(bodies[0]["response_format"]["type"], "json_object");
    assert_eq!(bodies[0]["messages"][0]["role"], "system");
    assert_eq!(bodies[0]["messages"][1]["content"], "Write one.");
}

#[tokio::test]
async fn test_chat_null_content() {
    let server = OpenAIMockServer::start().await;
    server.mock_chat_completion(None).await;

    let client = OpenAIClient::new(server.base_url(), "test-key").unwrap();
    assert_eq!(client.chat(&messages(), &options(true)).await.unwrap(), None);
}

#[tokio::test]
async fn test_trailing_slash_in_api_base() {
    let server = OpenAIMockServer::start().await;
    server.mock_chat_completion(Some("{}")).await;

    let client = OpenAIClient::new(format!("{}/", server.base_url()), "test-key").unwrap();
    assert!(client.chat(&messages(), &options(false)).await.is_ok());
}

#[tokio::test]
async fn test_chat_api_error_uses_service_message() {
    let server = OpenAIMockServer::start().await;
    server
        .mock_error(
            401,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        )
        .await;

    let client = OpenAIClient::new(server.base_url(), "test-key").unwrap();
    let err = client.chat(&messages(), &options(false)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Api { status: 401, ref message } if message == "Incorrect API key provided"
    ));
}

#[tokio::test]
async fn test_stream_yields_deltas_then_done() {
    let server = OpenAIMockServer::start().await;
    server.mock_chat_streaming(&["Hel", "lo"]).await;

    let client = OpenAIClient::new(server.base_url(), "test-key").unwrap();
    let events: Vec<_> = client
        .chat_stream(&messages(), &options(false))
        .map(|e| e.unwrap())
        .collect()
        .await;

    let deltas: Vec<&str> = events.iter().map(|e| e.delta.as_str()).collect();
    assert_eq!(deltas, ["Hel", "lo", ""]);
    assert!(events.last().unwrap().done);
    assert!(events[..2].iter().all(|e| !e.done));

    let bodies = server.request_bodies().await;
    assert_eq!(bodies[0]["stream"], true);
    assert!(bodies[0].get("response_format").is_none());
}

#[tokio::test]
async fn test_stream_api_error_is_yielded() {
    let server = OpenAIMockServer::start().await;
    server.mock_error(500, "").await;

    let client = OpenAIClient::new(server.base_url(), "test-key").unwrap();
    let mut stream = client.chat_stream(&messages(), &options(false));
    let first = stream.next().await.unwrap();
    assert!(matches!(
        first,
        Err(Error::Api { status: 500, ref message }) if message.contains("500")
    ));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_stream_is_lazy() {
    let server = OpenAIMockServer::start().await;

    let client = OpenAIClient::new(server.base_url(), "test-key").unwrap();
    let stream = client.chat_stream(&messages(), &options(false));
    drop(stream);

    assert!(server.request_bodies().await.is_empty());
}

#[tokio::test]
async fn test_transport_error() {
    // Nothing listens on port 9 (discard) in the test environment
    let client = OpenAIClient::new("http://127.0.0.1:9", "test-key").unwrap();
    let err = client.chat(&messages(), &options(false)).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn test_complete_streaming_over_http() {
    let server = OpenAIMockServer::start().await;
    server.mock_chat_streaming(&["{\"a\"", ":1}"]).await;

    let client = OpenAIClient::new(server.base_url(), "test-key").unwrap();
    let request = CompletionRequest {
        model: "gpt-4o-mini".to_string(),
        temperature: 0.3,
        prompts: PromptPair {
            system: "s".to_string(),
            user: "u".to_string(),
        },
        mode: Mode::Streaming,
    };

    let CompletionResponse::Stream(stream) = complete(&client, &request).await.unwrap() else {
        panic!("expected a stream");
    };
    let text: String = stream.map(|f| f.unwrap()).collect::<Vec<_>>().await.concat();
    assert_eq!(text, "{\"a\":1}");

    let bodies = server.request_bodies().await;
    assert_eq!(bodies[0]["temperature"], 0.3);
}
