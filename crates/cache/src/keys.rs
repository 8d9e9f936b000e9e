//! Cache key layout. Every key starts with a family and the owner id, so one
//! owner's entries can be dropped with a single prefix pattern.

use uuid::Uuid;

pub fn summary(owner_id: Uuid, range: &str) -> String {
    format!("analytics:{owner_id}:summary:{range}")
}

pub fn equity(owner_id: Uuid, range: &str, granularity: &str) -> String {
    format!("analytics:{owner_id}:equity:{range}:{granularity}")
}

pub fn sessions(owner_id: Uuid) -> String {
    format!("analytics:{owner_id}:sessions")
}

pub fn strategies(owner_id: Uuid) -> String {
    format!("analytics:{owner_id}:strategies")
}

pub fn trade_listing(owner_id: Uuid, fingerprint: &str) -> String {
    format!("trades:{owner_id}:{fingerprint}")
}

/// Matches every analytics entry of `owner_id`.
pub fn owner_analytics(owner_id: Uuid) -> String {
    format!("analytics:{owner_id}:*")
}

/// Matches every cached trade listing of `owner_id`.
pub fn owner_trades(owner_id: Uuid) -> String {
    format!("trades:{owner_id}:*")
}

/// A pattern is either an exact key or a prefix followed by a single trailing `*`.
pub fn matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}
