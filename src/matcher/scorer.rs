//! External relevance signals blended into keyword ranking.
//!
//! A [`RelevanceScorer`] is optional: the matcher treats any failure from it
//! as "no signal" and ranks on keywords alone.

use crate::config::ScorerConfig;
use crate::gateway::ToolDescriptor;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Relevance per tool name, each in `[0, 1]`. Tools absent from the map score 0.
pub type RelevanceScores = HashMap<String, f64>;

#[derive(Error, Debug)]
pub enum ScorerError {
    #[error("scorer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("scorer returned HTTP {status}")]
    Http { status: u16 },

    #[error("scorer timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed scorer output: {0}")]
    Malformed(String),
}

/// A source of task-to-tool relevance other than keyword overlap.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Score `tools` for `task`. An empty map means "no opinion".
    async fn score(
        &self,
        task: &str,
        context: &str,
        tools: &[ToolDescriptor],
    ) -> Result<RelevanceScores, ScorerError>;
}

/// Scorer that asks an Ollama model to pick the single best tool.
///
/// The chosen tool gets the model's confidence; all other tools get 0.
/// Selections below `min_confidence` are treated as no opinion.
pub struct OllamaScorer {
    client: Client,
    endpoint: String,
    model: String,
    min_confidence: f64,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct Selection {
    tool_name: String,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

impl OllamaScorer {
    pub fn new(config: &ScorerConfig) -> Result<Self, ScorerError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            min_confidence: config.min_confidence,
            timeout,
        })
    }

    fn request_error(&self, err: reqwest::Error) -> ScorerError {
        if err.is_timeout() {
            ScorerError::Timeout(self.timeout)
        } else {
            ScorerError::Request(err)
        }
    }

    fn build_prompt(task: &str, context: &str, tools: &[ToolDescriptor]) -> String {
        let tool_list = tools
            .iter()
            .map(|t| {
                let description = if t.description.is_empty() {
                    "No description"
                } else {
                    t.description.as_str()
                };
                format!("- {}: {}", t.name, description)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let context_line = if context.trim().is_empty() {
            String::new()
        } else {
            format!("Context: {}\n", context.trim())
        };

        format!(
            "You select the single best tool for a task.\n\
             Task: {}\n{}\
             Available tools:\n{}\n\n\
             Answer with JSON only: \
             {{\"tool_name\": \"<exact tool name>\", \"confidence\": <0.0-1.0>, \"reasoning\": \"<short>\"}}",
            task.trim(),
            context_line,
            tool_list
        )
    }

    /// Extract and validate the selection object embedded in the model reply.
    fn parse_selection(reply: &str, tools: &[ToolDescriptor]) -> Result<Selection, ScorerError> {
        let start = reply
            .find('{')
            .ok_or_else(|| ScorerError::Malformed("no JSON object in reply".into()))?;
        let end = reply
            .rfind('}')
            .filter(|&end| end > start)
            .ok_or_else(|| ScorerError::Malformed("unterminated JSON object in reply".into()))?;

        let selection: Selection = serde_json::from_str(&reply[start..=end])
            .map_err(|e| ScorerError::Malformed(e.to_string()))?;

        if !selection.confidence.is_finite() || !(0.0..=1.0).contains(&selection.confidence) {
            return Err(ScorerError::Malformed(format!(
                "confidence {} outside [0, 1]",
                selection.confidence
            )));
        }

        if !tools.iter().any(|t| t.name == selection.tool_name) {
            return Err(ScorerError::Malformed(format!(
                "unknown tool '{}'",
                selection.tool_name
            )));
        }

        Ok(selection)
    }
}

#[async_trait]
impl RelevanceScorer for OllamaScorer {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn score(
        &self,
        task: &str,
        context: &str,
        tools: &[ToolDescriptor],
    ) -> Result<RelevanceScores, ScorerError> {
        if tools.is_empty() {
            return Ok(RelevanceScores::new());
        }

        let body = json!({
            "model": self.model,
            "prompt": Self::build_prompt(task, context, tools),
            "stream": false,
            "options": { "temperature": 0.1, "num_predict": 200 },
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScorerError::Http {
                status: status.as_u16(),
            });
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| self.request_error(e))?;
        let selection = Self::parse_selection(generated.response.trim(), tools)?;

        if selection.confidence < self.min_confidence {
            tracing::info!(
                tool = %selection.tool_name,
                confidence = selection.confidence,
                min_confidence = self.min_confidence,
                "Scorer selection discarded: confidence below threshold"
            );
            return Ok(RelevanceScores::new());
        }

        tracing::debug!(
            tool = %selection.tool_name,
            confidence = selection.confidence,
            reasoning = %selection.reasoning,
            "Scorer selected tool"
        );

        Ok(RelevanceScores::from([(selection.tool_name, selection.confidence)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tools() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("search_web", "Search the web", json!({})),
            ToolDescriptor::new("read_file", "", json!({})),
        ]
    }

    #[test]
    fn test_prompt_lists_tools_and_context() {
        let prompt = OllamaScorer::build_prompt("find rust docs", "docs only", &tools());
        assert!(prompt.contains("Task: find rust docs"));
        assert!(prompt.contains("Context: docs only"));
        assert!(prompt.contains("- search_web: Search the web"));
        assert!(prompt.contains("- read_file: No description"));
    }

    #[test]
    fn test_parse_selection_with_surrounding_text() {
        let reply = r#"Sure! {"tool_name": "search_web", "confidence": 0.9, "reasoning": "best"} done"#;
        let selection = OllamaScorer::parse_selection(reply, &tools()).unwrap();
        assert_eq!(selection.tool_name, "search_web");
        assert_eq!(selection.confidence, 0.9);
    }

    #[test]
    fn test_parse_selection_rejects_bad_confidence() {
        let reply = r#"{"tool_name": "search_web", "confidence": 1.5, "reasoning": "x"}"#;
        assert!(matches!(
            OllamaScorer::parse_selection(reply, &tools()),
            Err(ScorerError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_selection_rejects_unknown_tool() {
        let reply = r#"{"tool_name": "delete_everything", "confidence": 0.8}"#;
        assert!(OllamaScorer::parse_selection(reply, &tools()).is_err());
    }

    #[tokio::test]
    async fn test_slow_model_reports_timeout() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let scorer = OllamaScorer::new(&ScorerConfig {
            endpoint: format!("http://{}", addr),
            model: "llama3.2:3b".into(),
            weight: 0.3,
            timeout_ms: 100,
            min_confidence: 0.3,
        })
        .unwrap();

        let err = scorer.score("find docs", "", &tools()).await.unwrap_err();
        assert!(
            matches!(err, ScorerError::Timeout(d) if d == Duration::from_millis(100)),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_parse_selection_without_json() {
        assert!(OllamaScorer::parse_selection("I think search_web", &tools()).is_err());
        assert!(OllamaScorer::parse_selection("} {", &tools()).is_err());
    }
}
