//! Client for the hosted generative-model endpoint. Translates a coordinate
//! pair into a coverage-analysis request with a fixed JSON response schema
//! and normalizes the reply into operator results.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::{
    config::InsightConfig,
    model::{resolve_color, ConnectionTech, OperatorExtension, OperatorResult, SignalStatus},
};

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model endpoint returned {0}")]
    BadStatus(reqwest::StatusCode),
    #[error("response carried no candidate text")]
    EmptyResponse,
    #[error("payload did not match the expected schema: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A normalized analysis result: recommendation text plus operator list.
#[derive(Debug, Clone)]
pub struct Insight {
    pub recommendation: String,
    pub operators: Vec<OperatorResult>,
}

pub struct InsightClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl InsightClient {
    pub fn new(config: &InsightConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
        })
    }

    pub async fn fetch_insight(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Insight, InsightError> {
        let key = self.api_key.as_deref().ok_or(InsightError::MissingApiKey)?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={key}",
            self.endpoint, self.model
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(latitude, longitude),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        };

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InsightError::BadStatus(status));
        }

        let body = response.text().await?;
        debug!("insight response: {body}");
        let envelope: GenerateResponse = serde_json::from_str(&body)?;
        let text = envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(InsightError::EmptyResponse)?;

        let payload = parse_payload(&text)?;
        Ok(normalize(payload, Utc::now().timestamp_millis()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsightPayload {
    recommendation: String,
    operators: Vec<RawOperator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperator {
    name: String,
    strength: i64,
    latency: i64,
    #[serde(rename = "type")]
    tech: ConnectionTech,
    status: SignalStatus,
    integrity_score: Option<i64>,
    bands: Option<Vec<String>>,
    verified: Option<bool>,
}

fn build_prompt(latitude: f64, longitude: f64) -> String {
    format!(
        "Analyze Indonesian network coverage at {latitude}, {longitude}. \
         Return a JSON with: \
         1. 'recommendation': brief 2-sentence summary. \
         2. 'operators': list of objects with name, strength(0-100), latency(ms), \
         type(4G/5G/LTE), status(Excellent/Good/Fair/Poor), integrityScore(0-100), \
         bands(detected frequency bands), verified. \
         Focus on Telkomsel, XL Axiata, Indosat Ooredoo Hutchison, Tri, and Smartfren."
    )
}

fn response_schema() -> serde_json::Value {
    let techs: Vec<String> = ConnectionTech::iter().map(|t| t.to_string()).collect();
    let statuses: Vec<String> = SignalStatus::iter().map(|s| s.to_string()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "recommendation": { "type": "STRING" },
            "operators": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "strength": { "type": "INTEGER" },
                        "latency": { "type": "INTEGER" },
                        "type": { "type": "STRING", "enum": techs },
                        "status": { "type": "STRING", "enum": statuses },
                        "integrityScore": { "type": "INTEGER" },
                        "bands": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "verified": { "type": "BOOLEAN" }
                    },
                    "required": ["name", "strength", "latency", "type", "status"]
                }
            }
        },
        "required": ["recommendation", "operators"]
    })
}

fn parse_payload(text: &str) -> Result<InsightPayload, serde_json::Error> {
    serde_json::from_str(text)
}

/// Assign synthetic ids and display colors. No clamping of model-supplied
/// numbers happens here.
fn normalize(payload: InsightPayload, requested_at_millis: i64) -> Insight {
    let operators = payload
        .operators
        .into_iter()
        .enumerate()
        .map(|(idx, op)| OperatorResult {
            id: format!("{requested_at_millis}-{idx}"),
            color: resolve_color(&op.name).to_string(),
            name: op.name,
            strength: op.strength,
            latency: op.latency,
            tech: op.tech,
            status: op.status,
            extension: match (op.integrity_score, op.bands, op.verified) {
                (Some(integrity_score), Some(bands), Some(verified)) => Some(OperatorExtension {
                    integrity_score,
                    bands,
                    verified,
                }),
                _ => None,
            },
        })
        .collect();

    Insight {
        recommendation: payload.recommendation,
        operators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_COLOR;

    const PAYLOAD: &str = r#"{
        "recommendation": "Telkomsel leads in this area. XL is a solid backup.",
        "operators": [
            {"name": "Telkomsel", "strength": 92, "latency": 18, "type": "5G",
             "status": "Excellent", "integrityScore": 96, "bands": ["n40", "B3"],
             "verified": true},
            {"name": "ByU", "strength": 41, "latency": 77, "type": "LTE", "status": "Poor"}
        ]
    }"#;

    #[test]
    fn normalizes_ids_colors_and_extension() {
        let payload = parse_payload(PAYLOAD).unwrap();
        let insight = normalize(payload, 1700000000000);

        assert_eq!(insight.operators.len(), 2);
        let first = &insight.operators[0];
        assert_eq!(first.id, "1700000000000-0");
        assert_eq!(first.color, "#f43f5e");
        assert_eq!(
            first.extension.as_ref().unwrap().bands,
            vec!["n40".to_string(), "B3".to_string()]
        );

        // unmapped carrier name falls back to the neutral color and has no
        // extension record
        let second = &insight.operators[1];
        assert_eq!(second.id, "1700000000000-1");
        assert_eq!(second.color, DEFAULT_COLOR);
        assert!(second.extension.is_none());
    }

    #[test]
    fn out_of_range_numbers_pass_through() {
        let payload = parse_payload(
            r#"{"recommendation": "x", "operators":
                [{"name": "Tri", "strength": 140, "latency": -3, "type": "4G", "status": "Fair"}]}"#,
        )
        .unwrap();
        let insight = normalize(payload, 0);
        assert_eq!(insight.operators[0].strength, 140);
        assert_eq!(insight.operators[0].latency, -3);
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        assert!(parse_payload("not json at all").is_err());
        // schema mismatch: missing required field
        assert!(parse_payload(r#"{"operators": []}"#).is_err());
        // unknown technology tag
        assert!(parse_payload(
            r#"{"recommendation": "x", "operators":
                [{"name": "Tri", "strength": 1, "latency": 1, "type": "6G", "status": "Fair"}]}"#
        )
        .is_err());
    }

    #[test]
    fn empty_envelope_is_detected() {
        let envelope: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(envelope.candidates.is_empty());
    }
}
