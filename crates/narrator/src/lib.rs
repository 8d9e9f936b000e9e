//! # EdgeIQ Narrator Crate
//!
//! Turns a period digest into a written coaching narrative. The generator is
//! an external collaborator: the engine only sees the `NarrativeGenerator`
//! port, and `OpenAiNarrator` is the adapter for OpenAI-compatible chat APIs.

pub mod error;
pub mod openai;
pub mod prompt;

pub use error::NarratorError;
pub use openai::OpenAiNarrator;

use analytics::PeriodDigest;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The generator's overall read on the trader's psychology for the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PsychologyRating {
    Excellent,
    Good,
    NeedsWork,
    Poor,
    #[serde(other)]
    Unrated,
}

/// A written review of one period.
///
/// Every field is optional on the wire; a generator that leaves one out
/// produces an empty value rather than an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Narrative {
    pub summary: String,
    pub key_strengths: Vec<String>,
    pub key_weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub focus_for_next_week: String,
    /// 0 to 100.
    pub discipline_score: Option<Decimal>,
    /// 0 to 100.
    pub consistency_score: Option<Decimal>,
    pub psychology_rating: Option<PsychologyRating>,
    pub behavioral_warnings: Vec<String>,
}

/// Writes a narrative for a period from its aggregated numbers.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Generator name for logging.
    fn name(&self) -> &'static str;

    async fn generate(&self, digest: &PeriodDigest) -> Result<Narrative, NarratorError>;
}
