use crate::config::Config;
use crate::model_client::{ChunkStream, ModelClient};
use async_stream::try_stream;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use domain::models::{GenerationChunk, PromptPart};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::error::ModelRequestError;
use tracing::{debug, warn};

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    message: String,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all parts joined.
    fn into_chunk(self) -> GenerationChunk {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            GenerationChunk::empty()
        } else {
            GenerationChunk::text(text)
        }
    }
}

/// Google Gemini REST client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, ModelRequestError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ModelRequestError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, stream: bool) -> String {
        if stream {
            format!(
                "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
                self.base_url, self.model
            )
        } else {
            format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
        }
    }

    fn request_body(parts: &[PromptPart]) -> GenerateContentRequest {
        let parts = parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => Part::Text { text: text.clone() },
                PromptPart::Image(image) => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type.clone(),
                        data: BASE64.encode(&image.bytes),
                    },
                },
            })
            .collect();
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
        }
    }

    async fn send(
        &self,
        parts: &[PromptPart],
        stream: bool,
    ) -> Result<reqwest::Response, ModelRequestError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ModelRequestError::NotConfigured)?;
        let url = self.endpoint(stream);
        debug!(model = %self.model, parts = parts.len(), stream, "sending generate request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(parts))
            .send()
            .await
            .map_err(|e| ModelRequestError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            warn!(status = status.as_u16(), "Gemini API error");
            return Err(ModelRequestError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

fn decode_payload(data: &str) -> Result<GenerationChunk, ModelRequestError> {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(data) {
        return Err(ModelRequestError::Api {
            status: envelope.error.code.unwrap_or(500),
            message: envelope.error.message,
        });
    }
    serde_json::from_str::<GenerateContentResponse>(data)
        .map(GenerateContentResponse::into_chunk)
        .map_err(|e| ModelRequestError::Decode(e.to_string()))
}

impl ModelClient for GeminiClient {
    fn configure(&mut self, api_key: &str) {
        self.api_key = Some(api_key.to_string());
    }

    fn generate_content(&self, parts: Vec<PromptPart>, stream: bool) -> ChunkStream {
        let this = self.clone();
        if stream {
            try_stream! {
                let response = this.send(&parts, true).await?;
                let mut events = response.bytes_stream().eventsource();
                while let Some(event) = events.next().await {
                    let event = event.map_err(|e| ModelRequestError::Transport(e.to_string()))?;
                    if event.data.trim().is_empty() {
                        continue;
                    }
                    let chunk = decode_payload(&event.data)?;
                    yield chunk;
                }
            }
            .boxed()
        } else {
            try_stream! {
                let response = this.send(&parts, false).await?;
                let body = response
                    .text()
                    .await
                    .map_err(|e| ModelRequestError::Transport(e.to_string()))?;
                let chunk = decode_payload(&body)?;
                yield chunk;
            }
            .boxed()
        }
    }
}
