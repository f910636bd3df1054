pub mod encoder;
pub mod materializer;
pub mod params;
pub mod poller;
#[cfg(test)]
pub(crate) mod testing;

use crate::{
    config::ReplicateConfig,
    error::{GenerationError, Result},
    models::{
        GenerationOutput, GenerationRequest, ImageBatch, Prediction, PredictionInput, SeedState,
    },
    replicate::{PredictionBackend, ReplicateClient},
};
use std::borrow::Cow;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub use encoder::encode_reference_images;
pub use materializer::materialize;
pub use params::{build_input, resolve_parameters, ResolvedParameters};
pub use poller::PollSettings;

const PROMPT_LOG_CHARS: usize = 100;

/// Runs one generation request end to end: resolve parameters, submit,
/// poll, download.
///
/// Holds no per-run state. The remote job handle lives only for the
/// duration of [`generate`](Self::generate) and is canceled on every
/// failure path after it was created. Seed state is passed in by the caller.
/// A request without an API key falls back to the configured token.
pub struct GenerationJobController<B = ReplicateClient> {
    backend: B,
    api_token: Option<String>,
    model: String,
    poll: PollSettings,
}

impl GenerationJobController<ReplicateClient> {
    pub fn from_config(config: &ReplicateConfig) -> Self {
        Self::new(ReplicateClient::new(config), config)
    }
}

impl<B: PredictionBackend> GenerationJobController<B> {
    pub fn new(backend: B, config: &ReplicateConfig) -> Self {
        Self {
            backend,
            api_token: config.api_token.clone(),
            model: config.model.clone(),
            poll: PollSettings::from(config),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        seeds: &mut SeedState,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutput> {
        let request = self.with_default_token(request);
        let request = request.as_ref();
        request.validate()?;

        let resolved = resolve_parameters(request, seeds, &mut rand::thread_rng());
        log::debug!(
            "Resolved size {}x{} ({}), seed {} (next: {})",
            resolved.size.width,
            resolved.size.height,
            resolved.size.api_size,
            resolved.seed,
            seeds.next_seed
        );

        let image_input = encode_reference_images(&request.reference_images)?;
        let input = build_input(request, &resolved.size, image_input);
        let api_token = request.api_token.trim();

        let mut job: Option<Prediction> = None;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenerationError::Canceled(
                "Generation was canceled by user".into(),
            )),
            result = self.execute(api_token, &input, &mut job) => result,
        };

        // The handle is released here on every path.
        let job = job.take();

        match outcome {
            Ok(images) => Ok(GenerationOutput {
                images,
                seed: resolved.seed,
                prediction_id: job.map(|p| p.id).unwrap_or_default(),
            }),
            Err(err) => {
                let user_canceled = cancel.is_cancelled();
                if user_canceled {
                    log::warn!("Cancellation requested");
                }
                if let Some(prediction) = job {
                    self.cancel_remote(api_token, &prediction.id, user_canceled)
                        .await;
                }
                if !user_canceled {
                    report_failure(&err, request, &input);
                }
                Err(err)
            }
        }
    }

    fn with_default_token<'a>(
        &self,
        request: &'a GenerationRequest,
    ) -> Cow<'a, GenerationRequest> {
        match &self.api_token {
            Some(token) if request.api_token.trim().is_empty() => {
                let mut request = request.clone();
                request.api_token = token.clone();
                Cow::Owned(request)
            }
            _ => Cow::Borrowed(request),
        }
    }

    async fn execute(
        &self,
        api_token: &str,
        input: &PredictionInput,
        job: &mut Option<Prediction>,
    ) -> Result<ImageBatch> {
        log::info!("Creating prediction... (25%)");
        let submitted_at = Instant::now();
        let created = self
            .backend
            .create_prediction(api_token, &self.model, input)
            .await?;
        log::info!("Prediction ID: {}", created.id);

        let prediction = job.insert(created);
        poller::wait_for_completion(&self.backend, api_token, prediction, &self.poll, submitted_at)
            .await?;

        let items = poller::output_items(prediction)?;
        materialize(&self.backend, &items).await
    }

    /// Best effort: failures are logged and never replace the original error.
    async fn cancel_remote(&self, api_token: &str, id: &str, user_canceled: bool) {
        if user_canceled {
            log::info!("Canceling prediction {}...", id);
        } else {
            log::warn!("Error occurred, canceling prediction {}...", id);
        }

        match self.backend.cancel_prediction(api_token, id).await {
            Ok(()) => log::info!("Prediction canceled successfully"),
            Err(e) => log::error!("Error canceling prediction: {}", e),
        }
    }
}

fn report_failure(err: &GenerationError, request: &GenerationRequest, input: &PredictionInput) {
    log::error!("Seedream4 API Error: {}", err);
    log::error!("Prompt that caused error: {}", truncate_prompt(&request.prompt));
    log::error!("API input parameters: {}", input.summary());

    if err.is_content_policy() {
        log::warn!("This appears to be a content policy violation. Try rephrasing your prompt.");
    }
}

fn truncate_prompt(prompt: &str) -> String {
    let mut chars = prompt.chars();
    let head: String = chars.by_ref().take(PROMPT_LOG_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
