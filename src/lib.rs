//! Client for the Seedream 4 image model on Replicate.
//!
//! [`GenerationJobController`] takes a [`GenerationRequest`], resolves the
//! size preset and seed, submits a prediction, polls it to completion (with
//! a timeout and caller-driven cancellation) and returns the generated
//! images as a normalized float [`ImageBatch`].

pub mod config;
pub mod error;
pub mod generation;
pub mod logger;
pub mod models;
pub mod replicate;

pub use config::ReplicateConfig;
pub use error::{ErrorKind, GenerationError, Result};
pub use generation::{GenerationJobController, PollSettings};
pub use models::{
    ApiSize, GenerationOutput, GenerationRequest, ImageBatch, ImageTensor, OutputItem, Prediction,
    PredictionInput, PredictionStatus, SeedControl, SeedState, SequentialMode, SizePreset,
};
pub use replicate::{PredictionBackend, ReplicateClient};

pub use tokio_util::sync::CancellationToken;
