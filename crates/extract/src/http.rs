use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::TaggerError;
use crate::retry::RetryPolicy;
use crate::tagger::{TaggedText, TokenTagger};

/// Client for a remote token-classification service.
///
/// Sends `POST {base_url}/tag` and expects label ids with char offsets back.
/// Tokens scored below `threshold` are relabeled as outside.
#[derive(Clone)]
pub struct HttpTagger {
    base_url: String,
    model: String,
    threshold: f32,
    outside_id: u32,
    retry: RetryPolicy,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct TagRequest<'a> {
    text: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct TagResponse {
    labels: Vec<u32>,
    offsets: Vec<(usize, usize)>,
    #[serde(default)]
    scores: Option<Vec<f32>>,
}

impl HttpTagger {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, TaggerError> {
        Self::with_timeout(base_url, model, Duration::from_secs(30))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TaggerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            threshold: 0.0,
            outside_id: 0,
            retry: RetryPolicy::none(),
            client,
        })
    }

    pub fn with_threshold(mut self, threshold: f32, outside_id: u32) -> Self {
        self.threshold = threshold;
        self.outside_id = outside_id;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request(&self, text: &str) -> Result<TagResponse, TaggerError> {
        let url = format!("{}/tag", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&TagRequest {
                text,
                model: &self.model,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TaggerError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    fn apply_threshold(&self, labels: &mut [u32], scores: &[f32]) {
        for (label, score) in labels.iter_mut().zip(scores) {
            if *score < self.threshold {
                *label = self.outside_id;
            }
        }
    }
}

#[async_trait]
impl TokenTagger for HttpTagger {
    async fn tag(&self, text: &str) -> Result<TaggedText, TaggerError> {
        let response = self
            .retry
            .retry_if("tag", || self.request(text), TaggerError::is_transient)
            .await?;

        let mut labels = response.labels;
        if let Some(scores) = &response.scores {
            self.apply_threshold(&mut labels, scores);
        }

        let tagged = TaggedText::new(labels, response.offsets)?;
        tracing::debug!(tokens = tagged.len(), model = %self.model, "Tagged chunk");
        Ok(tagged)
    }
}
