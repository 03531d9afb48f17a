use crate::{
    error::{GenerationError, Result},
    models::{GenerationRequest, LocalOutput, RawResponse},
};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// An in-process diffusion pipeline. Sampling happens entirely inside the
/// implementation.
pub trait LocalImageModel: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        guidance_scale: f32,
        steps: u32,
    ) -> std::result::Result<LocalOutput, String>;
}

type Loader = Box<dyn Fn() -> std::result::Result<Arc<dyn LocalImageModel>, String> + Send + Sync>;

/// Lazily constructed local model, shared by reference between handlers.
///
/// The loader runs at most once, even under concurrent first use. A failed
/// load is remembered and every later call reports the model unavailable.
pub struct LocalModelHandle {
    name: String,
    loader: Loader,
    model: OnceCell<std::result::Result<Arc<dyn LocalImageModel>, String>>,
}

impl LocalModelHandle {
    pub fn new<F>(name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> std::result::Result<Arc<dyn LocalImageModel>, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            loader: Box::new(loader),
            model: OnceCell::new(),
        }
    }

    /// Wraps an already constructed model.
    pub fn preloaded(name: impl Into<String>, model: Arc<dyn LocalImageModel>) -> Self {
        let handle = Self::new(name, || Err("loader not used".to_string()));
        let _ = handle.model.set(Ok(model));
        handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> Result<Arc<dyn LocalImageModel>> {
        let loaded = self.model.get_or_init(|| {
            log::info!("🔄 Loading local model: {}", self.name);
            let result = (self.loader)();
            match &result {
                Ok(_) => log::info!("✅ Local model {} loaded", self.name),
                Err(e) => log::error!("❌ Failed to load local model {}: {}", self.name, e),
            }
            result
        });

        loaded
            .as_ref()
            .map(Arc::clone)
            .map_err(|e| GenerationError::LocalModelLoadFailure(e.clone()))
    }

    /// `None` until a load has been attempted.
    pub fn load_error(&self) -> Option<String> {
        match self.model.get() {
            Some(Err(e)) => Some(e.clone()),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.load_error().is_none()
    }

    /// Blocking call into the model; no timeout is applied.
    pub fn run(&self, request: &GenerationRequest) -> Result<RawResponse> {
        let model = self.get()?;
        log::info!("Generating image with local model: {}", self.name);
        model
            .generate(&request.prompt, request.guidance_scale, request.steps)
            .map(RawResponse::Local)
            .map_err(GenerationError::GenerationFailure)
    }
}
