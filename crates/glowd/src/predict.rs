//! Outbound call to the rule-prediction service.
//!
//! One POST per successful authentication, no retries. Any failure at all
//! (transport, non-success status, malformed body) degrades to a fixed
//! fallback rule; the caller never sees an error.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::config::PredictionConfig;
use crate::store::State;

/// Rule text served when the prediction service is unreachable or answers
/// something unusable.
pub const FALLBACK_RULE: &str =
    "Default rule: Adjust brightness based on ambient light (API unavailable)";

/// Payload sent to the prediction endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorSample {
    pub brightness: u8,
    pub temperature: i32,

    /// Hour of day, 0-23.
    pub time: u32,
}

impl SensorSample {
    /// Build the sample the dashboard sends: first light's brightness and
    /// the first seeded temperature reading, at the given hour.
    pub fn from_state(state: &State, hour: u32) -> Self {
        Self {
            brightness: state.lights.first().map(|l| l.brightness).unwrap_or(0),
            temperature: state.sensors.temperature.first().copied().unwrap_or(0),
            time: hour,
        }
    }
}

/// Expected response shape: `{"status": "success", "rule": "..."}`.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    status: String,

    #[serde(default)]
    rule: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum PredictError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service answered status {0:?}")]
    Status(String),

    #[error("success response carried no rule")]
    MissingRule,
}

fn rule_from(body: PredictResponse) -> Result<String, PredictError> {
    if body.status != "success" {
        return Err(PredictError::Status(body.status));
    }
    body.rule.ok_or(PredictError::MissingRule)
}

/// Source of predicted rules.
///
/// The trait is the seam for tests; the one real implementation speaks
/// HTTP.
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Fetch the predicted rule for `sample`. Infallible by contract:
    /// failures degrade to [`FALLBACK_RULE`].
    async fn fetch_rule(&self, sample: &SensorSample) -> String;
}

/// HTTP client for the prediction service.
pub struct HttpRuleSource {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRuleSource {
    pub fn new(cfg: &PredictionConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()?;
        Ok(Self {
            endpoint: cfg.endpoint.clone(),
            client,
        })
    }

    async fn request(&self, sample: &SensorSample) -> Result<String, PredictError> {
        let response = self.client.post(&self.endpoint).json(sample).send().await?;
        let body: PredictResponse = response.json().await?;
        rule_from(body)
    }
}

#[async_trait]
impl RuleSource for HttpRuleSource {
    async fn fetch_rule(&self, sample: &SensorSample) -> String {
        match self.request(sample).await {
            Ok(rule) => {
                debug!("prediction service answered");
                rule
            }
            Err(e) => {
                warn!(error = %e, "prediction fetch failed, using fallback rule");
                FALLBACK_RULE.to_string()
            }
        }
    }
}

/// Canned rule source for tests.
#[cfg(test)]
pub struct StaticRuleSource(pub String);

#[cfg(test)]
#[async_trait]
impl RuleSource for StaticRuleSource {
    async fn fetch_rule(&self, _sample: &SensorSample) -> String {
        self.0.clone()
    }
}
