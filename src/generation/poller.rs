use crate::{
    config::ReplicateConfig,
    error::{GenerationError, Result},
    models::{OutputItem, Prediction, PredictionStatus},
    replicate::PredictionBackend,
};
use colored::*;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub poll_interval: Duration,
    pub status_interval: Duration,
    /// Budget for starting + processing, measured from submission.
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from(&ReplicateConfig::default())
    }
}

impl From<&ReplicateConfig> for PollSettings {
    fn from(config: &ReplicateConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            status_interval: config.status_interval,
            timeout: config.timeout,
        }
    }
}

/// Rate limit for the periodic "still working" line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StatusTicker {
    interval: Duration,
    last: Instant,
}

impl StatusTicker {
    pub(crate) fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last: start,
        }
    }

    /// True at most once per `interval`; resets the window when it fires.
    pub(crate) fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

fn timed_out(status: PredictionStatus, settings: &PollSettings) -> GenerationError {
    let phase = match status {
        PredictionStatus::Starting => "waiting for prediction to start",
        _ => "processing prediction",
    };
    GenerationError::Timeout {
        phase,
        seconds: settings.timeout.as_secs(),
    }
}

/// Refresh `prediction` until it leaves `starting`/`processing`.
///
/// A failed refresh stops the loop and leaves the last known state in
/// place. The timeout is a hard deadline from `submitted_at`: a refresh
/// still in flight when it passes is abandoned and reported as a timeout.
pub async fn wait_for_completion<B: PredictionBackend + ?Sized>(
    backend: &B,
    api_token: &str,
    prediction: &mut Prediction,
    settings: &PollSettings,
    submitted_at: Instant,
) -> Result<()> {
    log::info!("Initializing generation... (50%)");

    let deadline = submitted_at + settings.timeout;
    let mut ticker = StatusTicker::new(settings.status_interval, Instant::now());
    let mut generating_announced = false;

    while prediction.status.is_pending() {
        if prediction.status == PredictionStatus::Processing && !generating_announced {
            log::info!("Generating image... (75%)");
            generating_announced = true;
        }

        if submitted_at.elapsed() > settings.timeout {
            return Err(timed_out(prediction.status, settings));
        }

        if ticker.due(Instant::now()) {
            log::info!("{}", "Processing API request".green());
        }

        let refreshed = timeout_at(deadline, async {
            sleep(settings.poll_interval).await;
            backend.get_prediction(api_token, &prediction.id).await
        })
        .await;

        match refreshed {
            Ok(Ok(latest)) => *prediction = latest,
            Ok(Err(e)) => {
                log::warn!("Error checking prediction status: {}", e);
                break;
            }
            Err(_) => return Err(timed_out(prediction.status, settings)),
        }
    }

    log::info!("Processing complete! (100%)");
    Ok(())
}

/// Map a settled prediction to its output items or the matching error.
pub fn output_items(prediction: &Prediction) -> Result<Vec<OutputItem>> {
    match prediction.status {
        PredictionStatus::Succeeded => {}
        PredictionStatus::Canceled => {
            return Err(GenerationError::Canceled("Prediction was canceled".into()));
        }
        PredictionStatus::Failed => {
            let message = prediction
                .error_message()
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(GenerationError::RemoteJob(format!(
                "Prediction failed: {}",
                message
            )));
        }
        other => {
            return Err(GenerationError::RemoteJob(format!(
                "Prediction ended with status: {}",
                other
            )));
        }
    }

    let items = prediction.output_items()?;
    if items.is_empty() {
        return Err(GenerationError::EmptyOutput(
            "No output received from prediction".into(),
        ));
    }
    Ok(items)
}
