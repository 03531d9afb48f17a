use crate::{
    config::TOKEN_NAME,
    error::{GenerationError, Result},
};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// A read-only source of named secrets.
pub trait SecretStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    fn describe(&self) -> String;
}

/// Key/value secrets file in dotenv syntax. Read without touching the
/// process environment.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileSecretStore {
    /// Loads `path`. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut values = HashMap::new();

        match dotenv::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|e| {
                        GenerationError::ConfigError(format!(
                            "Invalid secrets file {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                    values.insert(key, value);
                }
                log::debug!(
                    "Loaded {} secret(s) from {}",
                    values.len(),
                    path.display()
                );
            }
            Err(e) if e.not_found() => {
                log::debug!("No secrets file at {}", path.display());
            }
            Err(e) => {
                return Err(GenerationError::ConfigError(format!(
                    "Failed to read secrets file {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        Ok(Self { path, values })
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn describe(&self) -> String {
        format!("secrets file {}", self.path.display())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MapSecretStore {
    values: HashMap<String, String>,
}

impl MapSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl SecretStore for MapSecretStore {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn describe(&self) -> String {
        "in-memory secrets".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretStore;

impl SecretStore for EnvSecretStore {
    fn get(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }

    fn describe(&self) -> String {
        "environment".to_string()
    }
}

/// Looks a token up in the secret store first, then in the environment.
pub struct CredentialResolver {
    name: String,
    store: Box<dyn SecretStore>,
    fallback: Box<dyn SecretStore>,
}

impl CredentialResolver {
    pub fn new(store: impl SecretStore + 'static) -> Self {
        Self {
            name: TOKEN_NAME.to_string(),
            store: Box::new(store),
            fallback: Box::new(EnvSecretStore),
        }
    }

    pub fn with_fallback(mut self, fallback: impl SecretStore + 'static) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    pub fn resolve(&self) -> Result<String> {
        match self.lookup() {
            Some((token, source)) => {
                log::debug!("{} resolved from {} ({} chars)", self.name, source, token.len());
                Ok(token)
            }
            None => {
                log::warn!("{} not found in secrets or environment", self.name);
                Err(self.missing())
            }
        }
    }

    /// Same lookup as `resolve` without logging; for availability checks.
    pub fn check(&self) -> Result<()> {
        self.lookup().map(|_| ()).ok_or_else(|| self.missing())
    }

    fn lookup(&self) -> Option<(String, String)> {
        [&self.store, &self.fallback].into_iter().find_map(|source| {
            // blank counts as absent
            source
                .get(&self.name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|token| (token, source.describe()))
        })
    }

    fn missing(&self) -> GenerationError {
        GenerationError::MissingCredential {
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn store_wins_over_fallback() {
        let resolver = CredentialResolver::new(MapSecretStore::new().with_secret("HF_TOKEN", "hf_store"))
            .with_fallback(MapSecretStore::new().with_secret("HF_TOKEN", "hf_env"));
        assert_eq!(resolver.resolve().unwrap(), "hf_store");
    }

    #[test]
    fn falls_back_when_store_lacks_token() {
        let resolver = CredentialResolver::new(MapSecretStore::new())
            .with_fallback(MapSecretStore::new().with_secret("HF_TOKEN", "hf_env"));
        assert_eq!(resolver.resolve().unwrap(), "hf_env");
    }

    #[test]
    fn blank_store_value_falls_through() {
        let resolver = CredentialResolver::new(MapSecretStore::new().with_secret("HF_TOKEN", "  "))
            .with_fallback(MapSecretStore::new().with_secret("HF_TOKEN", "hf_env"));
        assert_eq!(resolver.resolve().unwrap(), "hf_env");
    }

    #[test]
    fn missing_everywhere_is_an_error() {
        let resolver =
            CredentialResolver::new(MapSecretStore::new()).with_fallback(MapSecretStore::new());
        match resolver.resolve() {
            Err(GenerationError::MissingCredential { name }) => assert_eq!(name, "HF_TOKEN"),
            other => panic!("expected MissingCredential, got {:?}", other),
        }
        assert!(matches!(
            resolver.check(),
            Err(GenerationError::MissingCredential { .. })
        ));

        let resolver = CredentialResolver::new(MapSecretStore::new())
            .with_fallback(MapSecretStore::new().with_secret("HF_TOKEN", "hf_env"));
        assert!(resolver.check().is_ok());
    }

    #[test]
    fn file_store_reads_dotenv_syntax() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# hosted inference").unwrap();
        writeln!(file, "HF_TOKEN=hf_from_file").unwrap();
        drop(file);

        let store = FileSecretStore::load(&path).unwrap();
        assert_eq!(store.get("HF_TOKEN").as_deref(), Some("hf_from_file"));
        assert!(std::env::var("HF_TOKEN").map_or(true, |v| v != "hf_from_file"));
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::load(dir.path().join("nope.env")).unwrap();
        assert_eq!(store.get("HF_TOKEN"), None);
    }
}
