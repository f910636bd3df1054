pub mod client;

use crate::{
    error::Result,
    models::{Prediction, PredictionInput},
};
use async_trait::async_trait;

pub use client::ReplicateClient;

/// The remote prediction service, as seen by the job controller.
///
/// [`ReplicateClient`] is the HTTP implementation; tests substitute a
/// scripted one.
#[async_trait]
pub trait PredictionBackend: Send + Sync {
    /// Create a prediction and return its id plus initial status.
    async fn create_prediction(
        &self,
        api_token: &str,
        model: &str,
        input: &PredictionInput,
    ) -> Result<Prediction>;

    /// Fetch the current state of a prediction.
    async fn get_prediction(&self, api_token: &str, id: &str) -> Result<Prediction>;

    /// Ask the service to stop a prediction.
    async fn cancel_prediction(&self, api_token: &str, id: &str) -> Result<()>;

    /// Download one output file. Non-2xx responses are errors.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}
