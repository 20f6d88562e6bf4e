use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Message shown for any transport or decode failure.
pub const FETCH_FAILED: &str = "Failed to fetch recommendations.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationRequest {
    pub name: String,
    pub skills: Vec<String>,
    pub goals: Vec<String>,
    pub work_experience: Vec<String>,
    pub posts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub why: String,
    pub conversation_starters: Vec<String>,
}

/// Body returned by `/recommend`: an application error or a list of people.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecommendationResponse {
    Error { error: String },
    Recommendations(Vec<Recommendation>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub work_experience: Vec<String>,
    #[serde(default)]
    pub posts: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct RecommendClient {
    client: Client,
    base_url: String,
}

impl RecommendClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST the payload to `/recommend`.
    ///
    /// The status code is not checked: whatever JSON comes back decides
    /// the outcome, so a `{"error": ...}` body on a 4xx still reaches the
    /// user verbatim.
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, FetchError> {
        let url = format!("{}/recommend", self.base_url);

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        let body = response.bytes().await?;
        tracing::debug!(%status, bytes = body.len(), "recommend response received");

        let parsed: RecommendationResponse = serde_json::from_slice(&body)?;
        Ok(parsed)
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        let url = format!("{}/profiles", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to list profiles: {}. Is the LinkUp service running at {}?",
                response.status(),
                self.base_url
            ));
        }

        let profiles: Vec<Profile> = response.json().await?;
        Ok(profiles)
    }
}
