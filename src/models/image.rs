use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const DEFAULT_PROMPT: &str = "A futuristic city skyline at sunset";
pub const DEFAULT_GUIDANCE_SCALE: f32 = 7.5;
pub const DEFAULT_STEPS: u32 = 25;
/// Slider bounds. Only the input widgets enforce these.
pub const GUIDANCE_SCALE_RANGE: RangeInclusive<f32> = 1.0..=20.0;
pub const STEPS_RANGE: RangeInclusive<u32> = 5..=50;

/// One user action's worth of parameters. Passed through to the model as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,
    #[serde(default = "default_steps")]
    pub steps: u32,
}

fn default_guidance_scale() -> f32 {
    DEFAULT_GUIDANCE_SCALE
}

fn default_steps() -> u32 {
    DEFAULT_STEPS
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, guidance_scale: f32, steps: u32) -> Self {
        Self {
            prompt: prompt.into(),
            guidance_scale,
            steps,
        }
    }
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT, DEFAULT_GUIDANCE_SCALE, DEFAULT_STEPS)
    }
}

/// What a local diffusion library hands back.
#[derive(Debug, Clone, Default)]
pub struct LocalOutput {
    pub images: Vec<DynamicImage>,
}

/// Undecoded result of one generation call.
#[derive(Debug, Clone)]
pub enum RawResponse {
    Http {
        content_type: String,
        status: u16,
        body: Vec<u8>,
    },
    Local(LocalOutput),
}

/// The single image produced by one generation attempt.
#[derive(Debug, Clone)]
pub struct ImageArtifact {
    pub image: DynamicImage,
    /// PNG bytes offered for download.
    pub png: Vec<u8>,
}

impl ImageArtifact {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
