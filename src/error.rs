use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Hugging Face token not found. Add {name} to the secrets file or set the {name} environment variable")]
    MissingCredential { name: String },

    #[error("Network/timeout error: {0}")]
    NetworkFailure(String),

    #[error("Provider error (status {status}): {message}")]
    ProviderError { status: u16, message: String },

    #[error("Unexpected response content-type: {content_type} (status {status})")]
    UnexpectedContentType { content_type: String, status: u16 },

    #[error("Could not decode image from response: {0}")]
    UndecodableResponse(String),

    #[error("Local model unavailable: {0}")]
    LocalModelLoadFailure(String),

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerationError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::MissingCredential { .. } => "missing_credential",
            GenerationError::NetworkFailure(_) => "network_failure",
            GenerationError::ProviderError { .. } => "provider_error",
            GenerationError::UnexpectedContentType { .. } => "unexpected_content_type",
            GenerationError::UndecodableResponse(_) => "undecodable_response",
            GenerationError::LocalModelLoadFailure(_) => "local_model_load_failure",
            GenerationError::GenerationFailure(_) => "generation_failure",
            GenerationError::ConfigError(_) => "config_error",
            GenerationError::Io(_) => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
