use crate::{
    config::ProviderConfig,
    error::{GenerationError, Result},
    hf::decoder::{is_truthy, value_text},
    models::{GenerationRequest, RawResponse},
};
use reqwest::Client;
use serde_json::{json, Value};

/// Client for a hosted text-to-image inference endpoint.
#[derive(Clone)]
pub struct InferenceClient {
    client: Client,
    config: ProviderConfig,
}

impl InferenceClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("txt2img/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GenerationError::ConfigError(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn build_payload(request: &GenerationRequest) -> Value {
        json!({
            "inputs": request.prompt,
            "options": { "wait_for_model": true },
            "parameters": {
                "num_inference_steps": request.steps as i64,
                "guidance_scale": request.guidance_scale as f64
            }
        })
    }

    /// Posts the request and returns the raw response. Non-200 statuses are
    /// turned into `ProviderError` here; decoding is left to the caller.
    pub async fn generate(&self, token: &str, request: &GenerationRequest) -> Result<RawResponse> {
        let url = self.config.endpoint_url();
        let payload = Self::build_payload(request);

        log::info!("Generating image with model: {}", self.config.model_id);
        log::debug!("Inference request payload: {}", payload);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                log::error!("Inference request to {} failed: {}", url, e);
                GenerationError::NetworkFailure(format!("request to {} failed: {}", url, e))
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| GenerationError::NetworkFailure(format!("reading response body failed: {}", e)))?
            .to_vec();

        log::debug!(
            "Inference response: status {}, content-type '{}', {} bytes",
            status,
            content_type,
            body.len()
        );

        if status != 200 {
            return Err(GenerationError::ProviderError {
                status,
                message: error_message(&body),
            });
        }

        Ok(RawResponse::Http {
            content_type,
            status,
            body,
        })
    }
}

/// The JSON `error` value if present, else the JSON body, else the raw text.
fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(payload) => match payload.get("error") {
            Some(error) if is_truthy(error) => value_text(error),
            _ => payload.to_string(),
        },
        Err(_) => truncate_text(&String::from_utf8_lossy(body), 512),
    }
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push('…');
    out
}
