use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cached value could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
}
