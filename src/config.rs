use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL_ID: &str = "stabilityai/sd-turbo";
pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "https://api-inference.huggingface.co/models/{model}";
pub const DEFAULT_TIMEOUT_SECS: u64 = 240;
pub const DEFAULT_IMAGE_FIELDS: [&str; 3] = ["images", "generated_images", "image"];
pub const DEFAULT_SECRETS_FILE: &str = "secrets.env";
pub const TOKEN_NAME: &str = "HF_TOKEN";

/// Everything that differs between hosted text-to-image providers.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub model_id: String,
    /// URL template; `{model}` is replaced by `model_id`.
    pub endpoint_template: String,
    /// JSON fields scanned in order for a base64 image.
    pub image_fields: Vec<String>,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            model_id: DEFAULT_MODEL_ID.to_string(),
            endpoint_template: DEFAULT_ENDPOINT_TEMPLATE.to_string(),
            image_fields: DEFAULT_IMAGE_FIELDS.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let model_id = env::var("TXT2IMG_MODEL_ID")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.model_id);
        let endpoint_template = env::var("TXT2IMG_ENDPOINT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.endpoint_template);
        let image_fields = env::var("TXT2IMG_IMAGE_FIELDS")
            .ok()
            .map(|raw| parse_field_list(&raw))
            .filter(|fields| !fields.is_empty())
            .unwrap_or(defaults.image_fields);
        let timeout = env::var("TXT2IMG_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        ProviderConfig {
            model_id,
            endpoint_template,
            image_fields,
            timeout,
        }
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_endpoint_template(mut self, template: impl Into<String>) -> Self {
        self.endpoint_template = template.into();
        self
    }

    pub fn with_image_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.image_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint_url(&self) -> String {
        self.endpoint_template.replace("{model}", &self.model_id)
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub provider: ProviderConfig,
    pub secrets_file: PathBuf,
    pub log_level: Option<String>,
    pub log_json: bool,
    /// Log lines are also appended here when set.
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: None,
            port: None,
            provider: ProviderConfig::default(),
            secrets_file: PathBuf::from(DEFAULT_SECRETS_FILE),
            log_level: None,
            log_json: false,
            log_file: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let host = env::var("HOST").ok().filter(|s| !s.trim().is_empty());
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let secrets_file = env::var("TXT2IMG_SECRETS_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRETS_FILE));
        let log_level = env::var("TXT2IMG_LOG_LEVEL").ok();
        let log_json = env::var("TXT2IMG_LOG_JSON")
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false);
        let log_file = env::var("TXT2IMG_LOG_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Config {
            host,
            port,
            provider: ProviderConfig::from_env(),
            secrets_file,
            log_level,
            log_json,
            log_file,
        }
    }

    pub fn host_or_default(&self) -> &str {
        self.host.as_deref().unwrap_or("127.0.0.1")
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(8080)
    }
}
