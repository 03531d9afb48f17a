pub mod decoder;
pub mod inference_client;
pub mod local;

use crate::{
    config::Config,
    credentials::{CredentialResolver, FileSecretStore},
    error::{GenerationError, Result},
    models::{BackendInfo, BackendKind, GenerationRequest, ImageArtifact},
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub use decoder::ResponseDecoder;
pub use inference_client::InferenceClient;
pub use local::{LocalImageModel, LocalModelHandle};

/// One way of turning a request into an artifact.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageArtifact>;

    fn info(&self) -> BackendInfo;
}

pub struct HostedBackend {
    client: InferenceClient,
    credentials: CredentialResolver,
    decoder: ResponseDecoder,
}

impl HostedBackend {
    pub fn new(client: InferenceClient, credentials: CredentialResolver) -> Self {
        let decoder = ResponseDecoder::from_config(client.config());
        Self {
            client,
            credentials,
            decoder,
        }
    }
}

#[async_trait]
impl ImageBackend for HostedBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageArtifact> {
        // no token, no request
        let token = self.credentials.resolve()?;
        let raw = self.client.generate(&token, request).await?;
        self.decoder.decode(raw)
    }

    fn info(&self) -> BackendInfo {
        let missing = self.credentials.check().err().map(|e| e.to_string());
        BackendInfo {
            kind: BackendKind::Hosted,
            model: self.client.config().model_id.clone(),
            available: missing.is_none(),
            unavailable_reason: missing,
        }
    }
}

pub struct LocalBackend {
    handle: Arc<LocalModelHandle>,
    decoder: ResponseDecoder,
}

impl LocalBackend {
    pub fn new(handle: Arc<LocalModelHandle>) -> Self {
        Self {
            handle,
            decoder: ResponseDecoder::default(),
        }
    }
}

#[async_trait]
impl ImageBackend for LocalBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageArtifact> {
        let handle = Arc::clone(&self.handle);
        let request = request.clone();
        let raw = tokio::task::spawn_blocking(move || handle.run(&request))
            .await
            .map_err(|e| GenerationError::GenerationFailure(format!("local generation aborted: {}", e)))??;
        self.decoder.decode(raw)
    }

    fn info(&self) -> BackendInfo {
        let load_error = self.handle.load_error();
        BackendInfo {
            kind: BackendKind::Local,
            model: self.handle.name().to_string(),
            available: load_error.is_none(),
            unavailable_reason: load_error,
        }
    }
}

/// Entry point for one user action: request in, artifact or error out.
#[derive(Clone)]
pub struct Generator {
    backend: Arc<dyn ImageBackend>,
}

impl Generator {
    pub fn new(backend: Arc<dyn ImageBackend>) -> Self {
        Self { backend }
    }

    /// Hosted backend wired from configuration: secrets file first, then
    /// the environment.
    pub fn hosted(config: &Config) -> Result<Self> {
        let store = FileSecretStore::load(&config.secrets_file)?;
        let client = InferenceClient::new(config.provider.clone())?;
        Ok(Self::new(Arc::new(HostedBackend::new(
            client,
            CredentialResolver::new(store),
        ))))
    }

    pub fn local(handle: Arc<LocalModelHandle>) -> Self {
        Self::new(Arc::new(LocalBackend::new(handle)))
    }

    pub fn info(&self) -> BackendInfo {
        self.backend.info()
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<ImageArtifact> {
        let request_id = Uuid::new_v4();
        let info = self.backend.info();
        log::info!(
            "🎨 [{}] Generating with {} backend ({}): guidance_scale={}, steps={}",
            request_id,
            info.kind.as_str(),
            info.model,
            request.guidance_scale,
            request.steps
        );
        let timer = crate::logger::timer(&format!("generation {}", request_id));

        match self.backend.generate(request).await {
            Ok(artifact) => {
                log::info!(
                    "✅ [{}] Generated {}x{} image in {}ms",
                    request_id,
                    artifact.width(),
                    artifact.height(),
                    timer.elapsed().as_millis()
                );
                Ok(artifact)
            }
            Err(e) => {
                log::error!("❌ [{}] Generation failed ({}): {}", request_id, e.kind(), e);
                Err(e)
            }
        }
    }
}
