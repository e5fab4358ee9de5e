//! Generative extraction stage: Ollama client for structured event output.
//!
//! The model is used **only** to propose a single event candidate from
//! recognized text. Any failure — server absent, request error, malformed
//! response — makes the stage unavailable and the pipeline falls back to
//! the heuristic extractor; nothing from this module is fatal.

use std::sync::OnceLock;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::candidate::{DEFAULT_TITLE, EventCandidate};
use crate::normalize::{normalize, normalize_date_only};

/// Errors from the generative model subsystem.
#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("model server is not available at {url}")]
    #[diagnostic(
        code(scribecal::model::unavailable),
        help("Start Ollama with `ollama serve`, or run with --heuristic-only.")
    )]
    Unavailable { url: String },

    #[error("model request failed: {message}")]
    #[diagnostic(
        code(scribecal::model::request_failed),
        help("Check that the model server is running and the model is pulled.")
    )]
    RequestFailed { message: String },

    #[error("failed to parse model response: {message}")]
    #[diagnostic(
        code(scribecal::model::parse_error),
        help("The model returned an unexpected response format.")
    )]
    ParseError { message: String },
}

/// Configuration for the model stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the Ollama API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "llama3.2".into(),
            timeout_secs: 30,
        }
    }
}

const SYSTEM_PROMPT: &str = "You are an event extraction assistant. \
    The user gives you text recognized from a photo. \
    Return a single JSON object with these fields: \
    title (string, concise, without any dates or times), \
    venue (string, venue or address only), \
    date (string, YYYY-MM-DD), \
    start_time (string, ISO 8601 date-time), \
    end_time (string, ISO 8601 date-time). \
    Omit any field you cannot determine, except title. \
    Only return the JSON object, no other text.";

/// Model-stage output before normalization. Ephemeral: each field may
/// independently be malformed and is validated separately.
#[derive(Debug, Default)]
struct ModelCandidate {
    title: String,
    venue: Option<String>,
    date: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
}

/// The generative extraction stage.
pub struct ModelStage {
    config: ModelConfig,
    /// Lazily probed server availability, checked once per stage instance.
    probed: OnceLock<bool>,
}

impl ModelStage {
    /// Create a stage with the given configuration. The server is not
    /// contacted until the first extraction.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            probed: OnceLock::new(),
        }
    }

    /// Whether the model server answers on `/api/tags`. Probed once.
    pub fn is_available(&self) -> bool {
        *self.probed.get_or_init(|| {
            let url = format!("{}/api/tags", self.config.base_url);
            let agent = ureq::AgentBuilder::new()
                .timeout(std::time::Duration::from_secs(5))
                .build();
            match agent.get(&url).call() {
                Ok(resp) => resp.status() == 200,
                Err(_) => false,
            }
        })
    }

    /// Extract an event candidate, or report the stage unavailable.
    pub fn extract_candidate(&self, text: &str) -> Result<EventCandidate, ModelError> {
        if !self.is_available() {
            return Err(ModelError::Unavailable {
                url: self.config.base_url.clone(),
            });
        }
        let response = self.generate(text)?;
        let model_candidate = parse_response(&response)?;
        Ok(finish_candidate(model_candidate, text))
    }

    /// Generate a completion for `text` under the extraction prompt.
    fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.config.base_url);
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .build();

        let body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "system": SYSTEM_PROMPT,
            "stream": false,
        });

        let body_str = serde_json::to_string(&body).map_err(|e| ModelError::RequestFailed {
            message: format!("JSON serialize error: {e}"),
        })?;

        let resp = agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body_str)
            .map_err(|e: ureq::Error| ModelError::RequestFailed {
                message: e.to_string(),
            })?;

        let resp_str = resp.into_string().map_err(|e| ModelError::ParseError {
            message: e.to_string(),
        })?;

        let json: serde_json::Value =
            serde_json::from_str(&resp_str).map_err(|e| ModelError::ParseError {
                message: e.to_string(),
            })?;

        json["response"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ModelError::ParseError {
                message: "missing 'response' field".into(),
            })
    }
}

/// Pull the JSON object out of the model's reply and read its fields.
///
/// Fields are read individually; a field of the wrong type is treated as
/// absent rather than failing the whole candidate.
fn parse_response(response: &str) -> Result<ModelCandidate, ModelError> {
    let trimmed = response.trim();
    let json_str = if trimmed.starts_with('{') {
        trimmed
    } else {
        // The model sometimes wraps the object in prose or a code fence.
        let start = trimmed.find('{');
        let end = trimmed.rfind('}');
        match (start, end) {
            (Some(s), Some(e)) if e > s => &trimmed[s..=e],
            _ => {
                return Err(ModelError::ParseError {
                    message: "no JSON object found in response".into(),
                });
            }
        }
    };

    let value: serde_json::Value =
        serde_json::from_str(json_str).map_err(|e| ModelError::ParseError {
            message: format!("JSON parse error: {e}"),
        })?;

    let field = |name: &str| -> Option<String> {
        value[name]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(ModelCandidate {
        title: field("title").unwrap_or_default(),
        venue: field("venue"),
        date: field("date"),
        start_time: field("start_time"),
        end_time: field("end_time"),
    })
}

/// Normalize the model candidate's date/time fields into the canonical
/// candidate. A field that fails normalization is dropped; the rest of the
/// candidate stands. Notes always carry the original recognized text.
fn finish_candidate(model: ModelCandidate, text: &str) -> EventCandidate {
    let date_only = model.date.as_deref().and_then(|s| {
        let parsed = normalize_date_only(s);
        if parsed.is_none() {
            tracing::debug!(field = "date", value = s, "dropping unparseable model field");
        }
        parsed
    });
    let start_time = model.start_time.as_deref().and_then(|s| {
        let parsed = normalize(s);
        if parsed.is_none() {
            tracing::debug!(field = "start_time", value = s, "dropping unparseable model field");
        }
        parsed
    });
    let end_time = model.end_time.as_deref().and_then(|s| {
        let parsed = normalize(s);
        if parsed.is_none() {
            tracing::debug!(field = "end_time", value = s, "dropping unparseable model field");
        }
        parsed
    });

    let title = if model.title.trim().is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        model.title.trim().to_string()
    };

    EventCandidate {
        title,
        date_only,
        start_time,
        end_time,
        venue: model.venue,
        notes: text.to_string(),
    }
}

impl std::fmt::Debug for ModelStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStage")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("probed", &self.probed.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Timelike, Utc};

    #[test]
    fn unreachable_server_reports_unavailable() {
        let stage = ModelStage::new(ModelConfig {
            base_url: "http://127.0.0.1:1".into(), // unreachable port
            ..Default::default()
        });
        assert!(!stage.is_available());
        assert!(matches!(
            stage.extract_candidate("anything"),
            Err(ModelError::Unavailable { .. })
        ));
    }

    #[test]
    fn parse_response_reads_all_fields() {
        let raw = r#"{"title":"Board Meeting","venue":"HQ","date":"2025-11-10",
            "start_time":"2025-11-10T14:00:00Z","end_time":""}"#;
        let c = parse_response(raw).unwrap();
        assert_eq!(c.title, "Board Meeting");
        assert_eq!(c.venue.as_deref(), Some("HQ"));
        assert_eq!(c.date.as_deref(), Some("2025-11-10"));
        assert_eq!(c.start_time.as_deref(), Some("2025-11-10T14:00:00Z"));
        assert!(c.end_time.is_none()); // empty string is absent
    }

    #[test]
    fn parse_response_unwraps_surrounding_prose() {
        let raw = "Here is the event:\n```json\n{\"title\":\"Gala\"}\n```";
        let c = parse_response(raw).unwrap();
        assert_eq!(c.title, "Gala");
    }

    #[test]
    fn parse_response_without_object_is_an_error() {
        assert!(matches!(
            parse_response("I could not find an event."),
            Err(ModelError::ParseError { .. })
        ));
    }

    #[test]
    fn wrong_typed_fields_are_treated_as_absent() {
        let raw = r#"{"title":"Gala","venue":42,"date":["2025-11-10"]}"#;
        let c = parse_response(raw).unwrap();
        assert_eq!(c.title, "Gala");
        assert!(c.venue.is_none());
        assert!(c.date.is_none());
    }

    #[test]
    fn malformed_field_is_dropped_without_invalidating_the_rest() {
        let model = ModelCandidate {
            title: "Board Meeting".into(),
            venue: Some("HQ".into()),
            date: Some("2025-11-10".into()),
            start_time: Some("2025-11-10T14:00:00Z".into()),
            end_time: Some("2025-13-40Txx".into()), // malformed
        };
        let c = finish_candidate(model, "raw text");
        assert!(c.end_time.is_none());
        assert_eq!(c.date_only, NaiveDate::from_ymd_opt(2025, 11, 10));
        assert!(c.start_time.is_some());
        assert_eq!(c.venue.as_deref(), Some("HQ"));
        assert_eq!(c.notes, "raw text");
    }

    #[test]
    fn empty_title_falls_back_to_default() {
        let c = finish_candidate(ModelCandidate::default(), "text");
        assert_eq!(c.title, DEFAULT_TITLE);
    }

    #[test]
    fn zone_adjusted_start_keeps_utc_instant() {
        let model = ModelCandidate {
            title: "T".into(),
            start_time: Some("2025-11-10T14:00:00Z".into()),
            ..Default::default()
        };
        let c = finish_candidate(model, "");
        let start = c.start_time.unwrap().with_timezone(&Utc);
        assert_eq!(start.hour(), 14);
        assert_eq!(start.day(), 10);
    }
}
