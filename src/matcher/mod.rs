//! Task-to-tool relevance ranking.

pub mod scorer;
pub mod scoring;
pub mod synonyms;
pub mod tokenize;

pub use scorer::{OllamaScorer, RelevanceScorer, RelevanceScores, ScorerError};
pub use scoring::{select_top, MatchWeights, ScoreBreakdown, ScoredTool, ToolMatcher};
pub use tokenize::{tokenize, tokenize_identifier, TokenSet};
