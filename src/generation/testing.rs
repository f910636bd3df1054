//! Scripted in-memory backend for controller and poller tests.

use crate::{
    error::{GenerationError, Result},
    models::{Prediction, PredictionInput, PredictionStatus},
    replicate::PredictionBackend,
};
use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

pub(crate) fn prediction(id: &str, status: PredictionStatus) -> Prediction {
    Prediction {
        id: id.to_string(),
        status,
        output: None,
        error: None,
    }
}

pub(crate) fn succeeded(id: &str, urls: &[&str]) -> Prediction {
    Prediction {
        output: Some(Value::Array(urls.iter().map(|url| json!(url)).collect())),
        ..prediction(id, PredictionStatus::Succeeded)
    }
}

pub(crate) fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("png encoding");
    bytes
}

#[derive(Clone)]
enum Refresh {
    Ok(Prediction),
    Err,
    Stall,
}

/// Returns `created` from create calls, then replays the queued refreshes.
/// The last refresh repeats once the queue is drained.
pub(crate) struct ScriptedBackend {
    created: Prediction,
    refreshes: Mutex<VecDeque<Refresh>>,
    files: HashMap<String, Vec<u8>>,
    fail_cancel: bool,
    inputs: Mutex<Vec<PredictionInput>>,
    refresh_calls: AtomicUsize,
    refresh_times: Mutex<Vec<Instant>>,
    cancel_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub(crate) fn new(created: Prediction) -> Self {
        Self {
            created,
            refreshes: Mutex::new(VecDeque::new()),
            files: HashMap::new(),
            fail_cancel: false,
            inputs: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
            refresh_times: Mutex::new(Vec::new()),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn then(self, next: Prediction) -> Self {
        self.refreshes.lock().unwrap().push_back(Refresh::Ok(next));
        self
    }

    pub(crate) fn then_refresh_error(self) -> Self {
        self.refreshes.lock().unwrap().push_back(Refresh::Err);
        self
    }

    /// Refreshes from here on never resolve.
    pub(crate) fn then_stall(self) -> Self {
        self.refreshes.lock().unwrap().push_back(Refresh::Stall);
        self
    }

    pub(crate) fn with_file(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), bytes);
        self
    }

    pub(crate) fn failing_cancel(mut self) -> Self {
        self.fail_cancel = true;
        self
    }

    pub(crate) fn inputs(&self) -> Vec<PredictionInput> {
        self.inputs.lock().unwrap().clone()
    }

    pub(crate) fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn refresh_times(&self) -> Vec<Instant> {
        self.refresh_times.lock().unwrap().clone()
    }

    pub(crate) fn cancel_count(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionBackend for ScriptedBackend {
    async fn create_prediction(
        &self,
        _api_token: &str,
        _model: &str,
        input: &PredictionInput,
    ) -> Result<Prediction> {
        self.inputs.lock().unwrap().push(input.clone());
        Ok(self.created.clone())
    }

    async fn get_prediction(&self, _api_token: &str, _id: &str) -> Result<Prediction> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_times.lock().unwrap().push(Instant::now());
        let next = {
            let mut queue = self.refreshes.lock().unwrap();
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };

        match next {
            Some(Refresh::Ok(prediction)) => Ok(prediction),
            Some(Refresh::Err) => Err(GenerationError::Api {
                status: 502,
                body: "bad gateway".into(),
            }),
            Some(Refresh::Stall) => std::future::pending().await,
            None => Ok(self.created.clone()),
        }
    }

    async fn cancel_prediction(&self, _api_token: &str, _id: &str) -> Result<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_cancel {
            return Err(GenerationError::Api {
                status: 500,
                body: "cancel unavailable".into(),
            });
        }
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| GenerationError::Fetch {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".into(),
            })
    }
}
