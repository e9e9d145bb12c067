// src/infrastructure/llm/mod.rs
// DeepSeek chat-completions decision transport

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request};
use hyper_tls::HttpsConnector;

use crate::application::dto::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat};
use crate::config::DecisionConfig;
use crate::domain::errors::{DecisionError, DecisionResult};
use crate::domain::service::{DecisionPrompt, DecisionService};

pub struct DeepSeekClient {
    http: Client<HttpsConnector<HttpConnector>>,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl DeepSeekClient {
    pub fn new(config: &DecisionConfig) -> Self {
        let https = HttpsConnector::new();
        Self {
            http: Client::builder().build::<_, Body>(https),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn chat_request(&self, prompt: &DecisionPrompt) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(&prompt.system),
                ChatMessage::user(&prompt.user),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        }
    }
}

#[async_trait]
impl DecisionService for DeepSeekClient {
    async fn request_decision(&self, prompt: &DecisionPrompt) -> DecisionResult<String> {
        let payload = serde_json::to_string(&self.chat_request(prompt))?;

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .body(Body::from(payload))
            .map_err(|e| DecisionError::Transport(format!("{}", e)))?;

        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| DecisionError::Transport(format!("{}", e)))?;

        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| DecisionError::Transport(format!("{}", e)))?;

        if !status.is_success() {
            return Err(DecisionError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).to_string(),
            });
        }

        let envelope: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|e| DecisionError::Envelope(format!("{}", e)))?;

        envelope
            .into_content()
            .ok_or_else(|| DecisionError::Envelope("response has no choices".to_string()))
    }
}
