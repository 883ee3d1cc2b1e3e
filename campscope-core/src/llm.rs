//! Model client: streaming campaign-change analysis
//!
//! Talks to an OpenAI-compatible chat-completions endpoint with `stream`
//! enabled and forwards content deltas as they arrive. Clients are built per
//! request from a caller-supplied API key; there is no process-wide model
//! state.
//!
//! Response handling is a deliberate two-tier strategy: the finished buffer
//! gets a strict JSON parse, while in-flight buffers are rendered through a
//! clearly-labeled heuristic that splices out whatever structured content
//! has arrived so far. A failed final parse falls back to the raw text so
//! the answer is never lost.

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;

use crate::config::ModelConfig;
use crate::error::{Error, Result};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Streaming chat-completions client scoped to one analysis request.
pub struct ModelClient {
    http: reqwest::Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl ModelClient {
    /// Build a client for the configured endpoint and model.
    pub fn new(api_key: &str, config: &ModelConfig) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Model("API key is required".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Model(format!("failed to create HTTP client: {}", e)))?;

        let base_url = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model_name: config.model_name.clone(),
            base_url,
        })
    }

    /// Stream an analysis completion, invoking `on_chunk` for every content
    /// delta. Returns the full concatenated response text.
    pub async fn stream_analysis(
        &self,
        system_text: &str,
        user_text: &str,
        mut on_chunk: impl FnMut(&str),
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model_name,
            "stream": true,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": system_text},
                {"role": "user", "content": user_text}
            ]
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Model(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Model(format!("API error ({}): {}", status, detail)));
        }

        let mut stream = response.bytes_stream();
        let mut line_buf: Vec<u8> = Vec::new();
        let mut full = String::new();
        let mut done = false;

        // SSE frames may split anywhere, including inside a UTF-8 sequence,
        // so bytes accumulate until a complete line is available.
        while let Some(item) = stream.next().await {
            let bytes = item.map_err(|e| Error::Model(format!("stream error: {}", e)))?;
            line_buf.extend_from_slice(&bytes);

            while let Some(pos) = line_buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = line_buf.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line);
                let line = line.trim_end();

                let Some(payload) = line.strip_prefix("data:") else {
                    continue;
                };
                let payload = payload.trim();
                if payload.is_empty() {
                    continue;
                }
                if payload == "[DONE]" {
                    done = true;
                    break;
                }

                match serde_json::from_str::<Value>(payload) {
                    Ok(event) => {
                        if let Some(delta) = event["choices"][0]["delta"]["content"].as_str() {
                            full.push_str(delta);
                            on_chunk(delta);
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Skipping unparseable stream event");
                    }
                }
            }

            if done {
                break;
            }
        }

        tracing::info!(chars = full.len(), "Model stream complete");
        Ok(full)
    }
}

/// Structured result of a finished analysis call.
#[derive(Debug, Clone)]
pub struct AnalysisResponse {
    pub summary: String,
    pub key_insights: Vec<String>,
    pub raw_response: String,
}

impl AnalysisResponse {
    /// Strict parse of the complete response buffer.
    ///
    /// Fails on malformed JSON; missing fields degrade to placeholders the
    /// way absent data should, since the transport contract was still met.
    pub fn parse_final(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;

        let summary = value["summary"]
            .as_str()
            .unwrap_or("No summary available")
            .to_string();
        let key_insights = value["key_insights"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            summary,
            key_insights,
            raw_response: raw.to_string(),
        })
    }

    /// Display text for a finished response.
    pub fn to_formatted_text(&self) -> String {
        let mut text = format!("**Summary:**\n{}\n\n", self.summary);

        if !self.key_insights.is_empty() {
            text.push_str("**Key Insights:**\n");
            for insight in &self.key_insights {
                text.push_str(&format!("- {}\n", insight));
            }
        }

        text
    }

    /// Best-effort display text for an in-flight buffer.
    ///
    /// Tier one is the strict parse (the buffer may momentarily be complete
    /// JSON). Tier two splices out the `summary` string and any complete
    /// `key_insights` entries from the partial text. Anything else shows
    /// raw, so the display never pretends unstructured data is structured.
    pub fn format_partial(raw: &str) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }

        if let Ok(parsed) = Self::parse_final(raw) {
            return parsed.to_formatted_text();
        }

        let summary = extract_string_field(raw, "summary");
        let insights = extract_array_strings(raw, "key_insights");

        match (summary, insights.is_empty()) {
            (Some(summary), true) => format!("**Summary:**\n{}", summary),
            (Some(summary), false) => {
                let mut text = format!("**Summary:**\n{}\n\n**Key Insights:**\n", summary);
                for insight in insights {
                    text.push_str(&format!("- {}\n", insight));
                }
                text
            }
            (None, _) => raw.to_string(),
        }
    }
}

/// Pull a string field's value out of possibly-incomplete JSON text.
///
/// Scans for `"name"`, the following colon and opening quote, then collects
/// until an unescaped closing quote or the end of the buffer, since the value may
/// still be streaming in.
fn extract_string_field(raw: &str, name: &str) -> Option<String> {
    let marker = format!("\"{}\"", name);
    let after_key = &raw[raw.find(&marker)? + marker.len()..];
    let colon = after_key.find(':')?;
    let after_colon = after_key[colon + 1..].trim_start();
    let value = after_colon.strip_prefix('"')?;

    let mut out = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => break,
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => break,
            },
            _ => out.push(c),
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Collect the complete string literals inside a (possibly unterminated)
/// JSON array field.
fn extract_array_strings(raw: &str, name: &str) -> Vec<String> {
    let marker = format!("\"{}\"", name);
    let Some(key_at) = raw.find(&marker) else {
        return Vec::new();
    };
    let after_key = &raw[key_at + marker.len()..];
    let Some(bracket) = after_key.find('[') else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in after_key[bracket + 1..].chars() {
        if !in_string {
            match c {
                '"' => {
                    in_string = true;
                    current.clear();
                }
                ']' => break,
                _ => {}
            }
            continue;
        }

        if escaped {
            match c {
                'n' => current.push('\n'),
                't' => current.push('\t'),
                other => current.push(other),
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            in_string = false;
            items.push(current.clone());
        } else {
            current.push(c);
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_final_complete_response() {
        let raw = r#"{"summary": "Budget doubled.", "key_insights": ["Scaling up", "Confidence"]}"#;
        let resp = AnalysisResponse::parse_final(raw).unwrap();
        assert_eq!(resp.summary, "Budget doubled.");
        assert_eq!(resp.key_insights.len(), 2);
        assert_eq!(resp.raw_response, raw);
    }

    #[test]
    fn test_parse_final_rejects_malformed_json() {
        assert!(AnalysisResponse::parse_final(r#"{"summary": "trunc"#).is_err());
    }

    #[test]
    fn test_parse_final_tolerates_missing_fields() {
        let resp = AnalysisResponse::parse_final(r#"{"other": 1}"#).unwrap();
        assert_eq!(resp.summary, "No summary available");
        assert!(resp.key_insights.is_empty());
    }

    #[test]
    fn test_format_partial_extracts_streaming_summary() {
        let raw = r#"{"summary": "The budget was changed from $100 to"#;
        let text = AnalysisResponse::format_partial(raw);
        assert!(text.starts_with("**Summary:**"));
        assert!(text.contains("The budget was changed from $100 to"));
    }

    #[test]
    fn test_format_partial_picks_up_complete_insights() {
        let raw = r#"{"summary": "Done.", "key_insights": ["First insight", "Second ins"#;
        let text = AnalysisResponse::format_partial(raw);
        assert!(text.contains("- First insight"));
        // The unterminated second entry is not shown.
        assert!(!text.contains("Second ins"));
    }

    #[test]
    fn test_format_partial_falls_back_to_raw() {
        let raw = "plain text, not json";
        assert_eq!(AnalysisResponse::format_partial(raw), raw);
    }

    #[test]
    fn test_format_partial_handles_escapes() {
        let raw = r#"{"summary": "Line one.\nLine \"two\"."#;
        let text = AnalysisResponse::format_partial(raw);
        assert!(text.contains("Line one.\nLine \"two\"."));
    }

    #[test]
    fn test_formatted_text_shape() {
        let resp = AnalysisResponse {
            summary: "S".to_string(),
            key_insights: vec!["i1".to_string()],
            raw_response: String::new(),
        };
        let text = resp.to_formatted_text();
        assert!(text.contains("**Summary:**\nS"));
        assert!(text.contains("- i1"));
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = ModelConfig::default();
        assert!(ModelClient::new("", &config).is_err());
        assert!(ModelClient::new("sk-test", &config).is_ok());
    }
}
