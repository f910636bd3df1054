use crate::{
    config::ReplicateConfig,
    error::{GenerationError, Result},
    models::{Prediction, PredictionInput},
    replicate::PredictionBackend,
};
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde_json::json;

#[derive(Clone)]
pub struct ReplicateClient {
    client: Client,
    base_url: String,
}

impl ReplicateClient {
    pub fn new(config: &ReplicateConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Reuse an existing [`reqwest::Client`] and its connection pool.
    pub fn with_client(client: Client, config: &ReplicateConfig) -> Self {
        Self {
            client,
            base_url: config.api_root().to_string(),
        }
    }

    fn build_headers(api_token: &str) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        let bearer: header::HeaderValue = format!("Bearer {}", api_token.trim())
            .parse()
            .map_err(|_| {
                GenerationError::Validation("API key contains invalid characters".into())
            })?;
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_prediction(response: Response) -> Result<Prediction> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Prediction>().await?)
    }
}

#[async_trait]
impl PredictionBackend for ReplicateClient {
    async fn create_prediction(
        &self,
        api_token: &str,
        model: &str,
        input: &PredictionInput,
    ) -> Result<Prediction> {
        let url = format!("{}/models/{}/predictions", self.base_url, model);
        log::debug!("POST {} input: {}", url, input.summary());

        let response = self
            .client
            .post(&url)
            .headers(Self::build_headers(api_token)?)
            .json(&json!({ "input": input }))
            .send()
            .await?;

        Self::parse_prediction(response).await
    }

    async fn get_prediction(&self, api_token: &str, id: &str) -> Result<Prediction> {
        let response = self
            .client
            .get(format!("{}/predictions/{}", self.base_url, id))
            .headers(Self::build_headers(api_token)?)
            .send()
            .await?;

        Self::parse_prediction(response).await
    }

    async fn cancel_prediction(&self, api_token: &str, id: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/predictions/{}/cancel", self.base_url, id))
            .headers(Self::build_headers(api_token)?)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_error = |reason: String| GenerationError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
