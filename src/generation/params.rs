use crate::models::{ApiSize, GenerationRequest, PredictionInput, ResolvedSize, SeedState};
use rand::Rng;

/// Concrete values derived from a request before anything is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedParameters {
    pub size: ResolvedSize,
    pub seed: i64,
}

/// Resolve size and seed. Updates `seeds` with the suggestion for the next run.
pub fn resolve_parameters<R: Rng>(
    request: &GenerationRequest,
    seeds: &mut SeedState,
    rng: &mut R,
) -> ResolvedParameters {
    let size = ResolvedSize::resolve(request.size_preset, request.width, request.height);
    let seed = seeds.advance(request.seed, request.seed_control, rng);
    ResolvedParameters { size, seed }
}

/// `custom` sizes carry explicit dimensions, named sizes carry the aspect ratio.
pub fn build_input(
    request: &GenerationRequest,
    size: &ResolvedSize,
    image_input: Vec<String>,
) -> PredictionInput {
    let (width, height, aspect_ratio) = match size.api_size {
        ApiSize::Custom => (Some(size.width), Some(size.height), None),
        _ => (None, None, size.aspect_ratio.map(str::to_string)),
    };

    PredictionInput {
        prompt: request.prompt.clone(),
        size: size.api_size,
        max_images: request.max_images,
        sequential_image_generation: request.sequential_mode,
        width,
        height,
        aspect_ratio,
        image_input,
    }
}
