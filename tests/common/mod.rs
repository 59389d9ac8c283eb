//! Mock OpenAI server for testing offline
//!
//! wiremock-based stand-in for the chat completions endpoint so tests run
//! without a real API key.

#![allow(dead_code)]

use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// OpenAI mock server for testing
pub struct OpenAIMockServer {
    server: MockServer,
}

impl OpenAIMockServer {
    /// Create a new OpenAI mock server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of this mock server
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    fn completions() -> wiremock::MockBuilder {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
    }

    /// Non-streaming completion answered with `content` (JSON `null` when `None`).
    /// Expects exactly one call.
    pub async fn mock_chat_completion(&self, content: Option<&str>) {
        Self::completions()
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-mock",
                "object": "chat.completion",
                "created": 1234567890,
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": content
                    },
                    "finish_reason": "stop"
                }],
                "usage": {
                    "prompt_tokens": 10,
                    "completion_tokens": 5,
                    "total_tokens": 15
                }
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Streaming completion (SSE) delivering `chunks` as content deltas.
    /// Expects exactly one call.
    pub async fn mock_chat_streaming(&self, chunks: &[&str]) {
        let mut sse_response = String::new();

        let role_chunk = serde_json::json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"role": "assistant"}, "finish_reason": null}]
        });
        sse_response.push_str(&format!("data: {}\n\n", role_chunk));

        for chunk in chunks {
            let chunk_json = serde_json::json!({
                "id": "chatcmpl-mock",
                "object": "chat.completion.chunk",
                "choices": [{"index": 0, "delta": {"content": chunk}, "finish_reason": null}]
            });
            sse_response.push_str(&format!("data: {}\n\n", chunk_json));
        }

        let stop_chunk = serde_json::json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]
        });
        sse_response.push_str(&format!("data: {}\n\n", stop_chunk));
        sse_response.push_str("data: [DONE]\n\n");

        Self::completions()
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_response),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Failure with the given status and body. Expects exactly one call.
    pub async fn mock_error(&self, status: u16, body: &str) {
        Self::completions()
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// JSON bodies of every request received so far
    pub async fn request_bodies(&self) -> Vec<serde_json::Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }
}
