use super::tensor::{ImageBatch, ImageTensor};
use super::seed::{SeedControl, MAX_SEED, RANDOM_SEED};
use super::size::{ApiSize, SizePreset, MAX_DIMENSION, MIN_DIMENSION};
use crate::error::{GenerationError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_IMAGES_LIMIT: u32 = 15;
pub const MAX_REFERENCE_IMAGES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequentialMode {
    #[default]
    Disabled,
    Auto,
}

impl fmt::Display for SequentialMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequentialMode::Disabled => f.write_str("disabled"),
            SequentialMode::Auto => f.write_str("auto"),
        }
    }
}

impl FromStr for SequentialMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" => Ok(SequentialMode::Disabled),
            "auto" => Ok(SequentialMode::Auto),
            other => Err(format!(
                "unknown sequential mode '{}', expected disabled or auto",
                other
            )),
        }
    }
}

/// Everything a caller supplies for one generation run.
#[derive(Clone)]
pub struct GenerationRequest {
    pub api_token: String,
    pub prompt: String,
    pub size_preset: SizePreset,
    /// Only used with [`SizePreset::Custom`].
    pub width: u32,
    /// Only used with [`SizePreset::Custom`].
    pub height: u32,
    pub max_images: u32,
    pub sequential_mode: SequentialMode,
    /// `-1` draws a random seed for this run.
    pub seed: i64,
    pub seed_control: SeedControl,
    pub reference_images: Vec<ImageTensor>,
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("api_token", &"<redacted>")
            .field("prompt", &self.prompt)
            .field("size_preset", &self.size_preset)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("max_images", &self.max_images)
            .field("sequential_mode", &self.sequential_mode)
            .field("seed", &self.seed)
            .field("seed_control", &self.seed_control)
            .field("reference_images", &self.reference_images.len())
            .finish()
    }
}

impl GenerationRequest {
    pub fn new(api_token: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            prompt: prompt.into(),
            size_preset: SizePreset::default(),
            width: 2048,
            height: 2048,
            max_images: 1,
            sequential_mode: SequentialMode::default(),
            seed: RANDOM_SEED,
            seed_control: SeedControl::default(),
            reference_images: Vec::new(),
        }
    }

    pub fn with_preset(mut self, preset: SizePreset) -> Self {
        self.size_preset = preset;
        self
    }

    /// Switches to [`SizePreset::Custom`] with the given dimensions.
    pub fn with_custom_size(mut self, width: u32, height: u32) -> Self {
        self.size_preset = SizePreset::Custom;
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_max_images(mut self, max_images: u32) -> Self {
        self.max_images = max_images;
        self
    }

    pub fn with_sequential_mode(mut self, mode: SequentialMode) -> Self {
        self.sequential_mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: i64, control: SeedControl) -> Self {
        self.seed = seed;
        self.seed_control = control;
        self
    }

    pub fn with_reference_images(mut self, images: Vec<ImageTensor>) -> Self {
        self.reference_images = images;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(GenerationError::Validation("API key is required".into()));
        }
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::Validation("Prompt is required".into()));
        }
        if self.size_preset == SizePreset::Custom {
            for (name, value) in [("width", self.width), ("height", self.height)] {
                if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
                    return Err(GenerationError::Validation(format!(
                        "{} must be between {} and {} pixels, got {}",
                        name, MIN_DIMENSION, MAX_DIMENSION, value
                    )));
                }
            }
        }
        if !(1..=MAX_IMAGES_LIMIT).contains(&self.max_images) {
            return Err(GenerationError::Validation(format!(
                "max_images must be between 1 and {}, got {}",
                MAX_IMAGES_LIMIT, self.max_images
            )));
        }
        if self.seed != RANDOM_SEED && !(0..=MAX_SEED).contains(&self.seed) {
            return Err(GenerationError::Validation(format!(
                "seed must be -1 or between 0 and {}, got {}",
                MAX_SEED, self.seed
            )));
        }
        Ok(())
    }
}

/// The `input` object sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionInput {
    pub prompt: String,
    pub size: ApiSize,
    pub max_images: u32,
    pub sequential_image_generation: SequentialMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_input: Vec<String>,
}

impl PredictionInput {
    /// Log-friendly rendering with data URIs replaced by their length.
    pub fn summary(&self) -> String {
        let mut shown = self.clone();
        shown.image_input = self
            .image_input
            .iter()
            .map(|uri| format!("<data uri, {} bytes>", uri.len()))
            .collect();
        serde_json::to_string(&shown).unwrap_or_else(|_| format!("{:?}", shown))
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub images: ImageBatch,
    /// Seed resolved for this run. Local only, never sent to the service.
    pub seed: i64,
    pub prediction_id: String,
}
