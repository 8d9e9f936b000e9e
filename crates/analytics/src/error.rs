use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid reporting period: {0}")]
    InvalidPeriod(String),
}
