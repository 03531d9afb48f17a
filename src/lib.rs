pub mod config;
pub mod credentials;
pub mod error;
pub mod hf;
pub mod logger;
pub mod models;
pub mod presenter;
#[cfg(feature = "server")]
pub mod server;

pub use config::{Config, ProviderConfig};
pub use credentials::{CredentialResolver, FileSecretStore, MapSecretStore, SecretStore};
pub use error::{GenerationError, Result};
pub use hf::{
    Generator, HostedBackend, ImageBackend, InferenceClient, LocalBackend, LocalImageModel,
    LocalModelHandle, ResponseDecoder,
};
pub use models::{
    BackendInfo, BackendKind, GenerationRequest, ImageArtifact, LocalOutput, RawResponse,
    DEFAULT_GUIDANCE_SCALE, DEFAULT_PROMPT, DEFAULT_STEPS, GUIDANCE_SCALE_RANGE, STEPS_RANGE,
};
