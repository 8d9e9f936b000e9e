use analytics::PeriodDigest;
use async_trait::async_trait;
use narrator::{Narrative, NarrativeGenerator, NarratorError};
use std::sync::Mutex;

/// Returns a fixed narrative, or fails, and records every digest it was given.
#[derive(Default)]
pub struct ScriptedNarrator {
    narrative: Narrative,
    fail: bool,
    digests: Mutex<Vec<PeriodDigest>>,
}

impl ScriptedNarrator {
    pub fn returning(narrative: Narrative) -> Self {
        Self {
            narrative,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.digests.lock().expect("lock narrator digests").len()
    }

    pub fn last_digest(&self) -> Option<PeriodDigest> {
        self.digests.lock().expect("lock narrator digests").last().cloned()
    }
}

#[async_trait]
impl NarrativeGenerator for ScriptedNarrator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, digest: &PeriodDigest) -> Result<Narrative, NarratorError> {
        self.digests
            .lock()
            .expect("lock narrator digests")
            .push(digest.clone());
        if self.fail {
            return Err(NarratorError::ApiError("503 Service Unavailable".to_string()));
        }
        Ok(self.narrative.clone())
    }
}
