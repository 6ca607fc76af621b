//! Weighted keyword ranking of tools against a natural-language task.
//!
//! Each tool gets independent sub-scores in `[0, 1]`:
//!
//! - **name**: share of the tool-name tokens that appear in the query
//! - **description**: IDF-weighted overlap between query and description
//! - **gateway**: share of the owning-gateway tokens that appear in the query
//! - **synonym bonus**: fixed bonus when a query token is a synonym of a name token
//!
//! The weighted sum is the keyword score. When a [`RelevanceScorer`] is
//! configured and answers sensibly, its output is blended in at a fixed
//! weight; otherwise the keyword score alone decides. A task that contains a
//! tool's literal name always ranks that tool first.

use crate::gateway::ToolDescriptor;
use crate::matcher::scorer::{RelevanceScorer, RelevanceScores};
use crate::matcher::synonyms::are_synonyms;
use crate::matcher::tokenize::{tokenize, tokenize_identifier, TokenSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on how long ranking waits for the external scorer.
const DEFAULT_SCORER_TIMEOUT: Duration = Duration::from_secs(2);

/// Weights of the keyword sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub name: f64,
    pub description: f64,
    pub gateway: f64,
    /// Added (not weighted) when a synonym of a name token appears in the query.
    pub synonym_bonus: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            name: 0.4,
            description: 0.4,
            gateway: 0.2,
            synonym_bonus: 0.1,
        }
    }
}

/// Sub-scores behind a composite score, kept for explainability.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub name: f64,
    pub description: f64,
    pub gateway: f64,
    pub synonym_bonus: f64,
    /// Weighted keyword score before any external blending.
    pub keyword: f64,
    /// External relevance, when a scorer contributed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<f64>,
    /// The task text contains the tool's literal name.
    pub exact_match: bool,
}

/// A tool annotated with its relevance to one task. Built per request.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredTool<'a> {
    pub tool: &'a ToolDescriptor,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

impl ScoredTool<'_> {
    fn is_relevant(&self) -> bool {
        self.breakdown.exact_match || self.score > 0.0
    }
}

pub struct ToolMatcher {
    weights: MatchWeights,
    scorer: Option<Arc<dyn RelevanceScorer>>,
    /// Share of the composite taken by the external scorer.
    external_weight: f64,
    scorer_timeout: Duration,
}

impl ToolMatcher {
    pub fn new(weights: MatchWeights) -> Self {
        Self {
            weights,
            scorer: None,
            external_weight: 0.0,
            scorer_timeout: DEFAULT_SCORER_TIMEOUT,
        }
    }

    /// Blend `scorer` into ranking at `weight` (clamped to `[0, 1]`).
    pub fn with_scorer(mut self, scorer: Arc<dyn RelevanceScorer>, weight: f64) -> Self {
        self.scorer = Some(scorer);
        self.external_weight = if weight.is_finite() {
            weight.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn with_scorer_timeout(mut self, timeout: Duration) -> Self {
        self.scorer_timeout = timeout;
        self
    }

    /// Rank `tools` for `task` (and optional `context`), best first.
    ///
    /// Returns at most `top_n` tools, only those with a nonzero score or an
    /// exact name match. Ties keep input order. Never fails: a misbehaving
    /// external scorer only costs its contribution.
    pub async fn rank<'a>(
        &self,
        tools: &'a [ToolDescriptor],
        task: &str,
        context: &str,
        top_n: usize,
    ) -> Vec<ScoredTool<'a>> {
        if tools.is_empty() || task.trim().is_empty() || top_n == 0 {
            return Vec::new();
        }

        let mut scored = self.score_keywords(tools, task, context);

        if let Some(external) = self.external_scores(tools, task, context).await {
            for candidate in &mut scored {
                let value = external.get(&candidate.tool.name).copied().unwrap_or(0.0);
                let keyword = candidate.breakdown.keyword.min(1.0);
                candidate.breakdown.external = Some(value);
                candidate.score =
                    (1.0 - self.external_weight) * keyword + self.external_weight * value;
            }
        }

        select_top(scored, top_n)
    }

    /// Keyword-only scores for every tool, in input order.
    pub fn score_keywords<'a>(
        &self,
        tools: &'a [ToolDescriptor],
        task: &str,
        context: &str,
    ) -> Vec<ScoredTool<'a>> {
        let mut query = tokenize(task);
        if !context.trim().is_empty() {
            query.extend(tokenize(context));
        }
        let task_lower = task.to_lowercase();

        let descriptions: Vec<TokenSet> = tools.iter().map(|t| tokenize(&t.description)).collect();
        let idf = InverseFrequency::new(&descriptions);

        tools
            .iter()
            .zip(descriptions.iter())
            .map(|(tool, description_tokens)| {
                let name_tokens = tokenize_identifier(&tool.name);
                let gateway_tokens = tokenize_identifier(&tool.gateway);

                let name = overlap_ratio(&query, &name_tokens);
                let description = idf.weighted_overlap(&query, description_tokens);
                let gateway = overlap_ratio(&query, &gateway_tokens);
                let synonym_bonus = if has_synonym_match(&query, &name_tokens) {
                    self.weights.synonym_bonus
                } else {
                    0.0
                };

                let keyword = self.weights.name * name
                    + self.weights.description * description
                    + self.weights.gateway * gateway
                    + synonym_bonus;

                let exact_match = !tool.name.is_empty() && task_lower.contains(&tool.name.to_lowercase());

                ScoredTool {
                    tool,
                    score: keyword,
                    breakdown: ScoreBreakdown {
                        name,
                        description,
                        gateway,
                        synonym_bonus,
                        keyword,
                        external: None,
                        exact_match,
                    },
                }
            })
            .collect()
    }

    /// Ask the external scorer, if any. `None` means keyword-only ranking.
    async fn external_scores(
        &self,
        tools: &[ToolDescriptor],
        task: &str,
        context: &str,
    ) -> Option<RelevanceScores> {
        let scorer = self.scorer.as_ref()?;
        if self.external_weight == 0.0 {
            return None;
        }

        let outcome =
            tokio::time::timeout(self.scorer_timeout, scorer.score(task, context, tools)).await;

        let scores = match outcome {
            Ok(Ok(scores)) => scores,
            Ok(Err(e)) => {
                tracing::warn!(scorer = scorer.name(), error = %e, "Relevance scorer failed, using keyword ranking");
                metrics::counter!("scorer_fallbacks_total").increment(1);
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    scorer = scorer.name(),
                    timeout_ms = self.scorer_timeout.as_millis() as u64,
                    "Relevance scorer timed out, using keyword ranking"
                );
                metrics::counter!("scorer_fallbacks_total").increment(1);
                return None;
            }
        };

        if let Some((name, value)) = scores
            .iter()
            .find(|(_, v)| !v.is_finite() || !(0.0..=1.0).contains(*v))
        {
            tracing::warn!(
                scorer = scorer.name(),
                tool = %name,
                value = *value,
                "Relevance scorer returned an out-of-range score, using keyword ranking"
            );
            metrics::counter!("scorer_fallbacks_total").increment(1);
            return None;
        }

        if scores.is_empty() {
            tracing::debug!(scorer = scorer.name(), "Relevance scorer had no opinion");
            return None;
        }

        Some(scores)
    }
}

impl Default for ToolMatcher {
    fn default() -> Self {
        Self::new(MatchWeights::default())
    }
}

/// Sort relevant candidates best first and keep `top_n`.
///
/// Exact name matches lead (longest name first), then composite score
/// descending; the stable sort keeps input order among ties.
pub fn select_top(mut scored: Vec<ScoredTool<'_>>, top_n: usize) -> Vec<ScoredTool<'_>> {
    scored.retain(|candidate| candidate.is_relevant());

    scored.sort_by(|a, b| {
        b.breakdown
            .exact_match
            .cmp(&a.breakdown.exact_match)
            .then_with(|| {
                if a.breakdown.exact_match {
                    b.tool.name.len().cmp(&a.tool.name.len())
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
    });

    scored.truncate(top_n);
    scored
}

/// Fraction of `target` tokens present in `query`.
fn overlap_ratio(query: &TokenSet, target: &TokenSet) -> f64 {
    if target.is_empty() {
        return 0.0;
    }
    let shared = target.iter().filter(|t| query.contains(*t)).count();
    shared as f64 / target.len() as f64
}

fn has_synonym_match(query: &TokenSet, name_tokens: &TokenSet) -> bool {
    query.iter().any(|q| {
        !name_tokens.contains(q) && name_tokens.iter().any(|n| are_synonyms(q, n))
    })
}

/// Inverse document frequency over the descriptions of one tool list.
struct InverseFrequency {
    document_count: usize,
    frequency: HashMap<String, usize>,
}

impl InverseFrequency {
    fn new(documents: &[TokenSet]) -> Self {
        let mut frequency = HashMap::new();
        for doc in documents {
            for token in doc {
                *frequency.entry(token.clone()).or_insert(0) += 1;
            }
        }
        Self {
            document_count: documents.len(),
            frequency,
        }
    }

    /// `ln(1 + N / df)`; tokens absent from every description get the maximum.
    fn weight(&self, token: &str) -> f64 {
        let df = self.frequency.get(token).copied().unwrap_or(1).max(1);
        (1.0 + self.document_count as f64 / df as f64).ln()
    }

    /// Weight of the shared tokens over the weight of the smaller side, in `[0, 1]`.
    fn weighted_overlap(&self, query: &TokenSet, description: &TokenSet) -> f64 {
        if query.is_empty() || description.is_empty() {
            return 0.0;
        }
        let shared: f64 = description
            .iter()
            .filter(|t| query.contains(*t))
            .map(|t| self.weight(t))
            .sum();
        if shared == 0.0 {
            return 0.0;
        }
        let description_weight: f64 = description.iter().map(|t| self.weight(t)).sum();
        let query_weight: f64 = query.iter().map(|t| self.weight(t)).sum();
        (shared / description_weight.min(query_weight)).min(1.0)
    }
}
