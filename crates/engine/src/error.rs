use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid trade: {0}")]
    InvalidTrade(#[from] core_types::CoreError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    #[error("Narrative generation failed: {0}")]
    Narrator(#[from] narrator::NarratorError),

    #[error("Trade '{0}' not found.")]
    TradeNotFound(Uuid),

    #[error("Report '{0}' not found.")]
    ReportNotFound(Uuid),
}
