use crate::error::EngineError;
use behavior::{AnalysisInput, BehaviorAnalysis, BehaviorEngine, BehaviorTrend, summarize};
use chrono::{DateTime, Utc};
use database::{RecordStore, TradeQuery, TradeSort};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Runs the pattern detector and scorer for an owner and records the result.
pub struct BehaviorAnalyzer {
    store: Arc<dyn RecordStore>,
    engine: BehaviorEngine,
}

impl BehaviorAnalyzer {
    pub fn new(store: Arc<dyn RecordStore>, engine: BehaviorEngine) -> Self {
        Self { store, engine }
    }

    /// Analyzes the owner's recent activity as of `now`.
    ///
    /// Returns `Ok(None)` when nothing was logged inside the look-back window.
    /// A snapshot that fails to persist is logged and the analysis is still
    /// returned; only the trend history misses that point.
    pub async fn analyze(
        &self,
        owner_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<BehaviorAnalysis>, EngineError> {
        let settings = self.engine.settings();
        let window_start = self.engine.detector().window_start(now);

        let window = self
            .store
            .find_trades(
                &TradeQuery::for_owner(owner_id)
                    .created_since(window_start)
                    .sorted(TradeSort::CreatedAtAsc),
            )
            .await?;
        if window.is_empty() {
            debug!(%owner_id, "No trades in the look-back window; skipping analysis.");
            return Ok(None);
        }

        let recent = self
            .store
            .find_trades(
                &TradeQuery::for_owner(owner_id)
                    .sorted(TradeSort::CreatedAtDesc)
                    .limit(settings.risk_sample_size),
            )
            .await?;
        let recent_closed = self
            .store
            .find_trades(
                &TradeQuery::for_owner(owner_id)
                    .closed()
                    .sorted(TradeSort::TradeDateDesc)
                    .limit(settings.consistency_sample_size),
            )
            .await?;

        let Some(analysis) = self.engine.analyze(AnalysisInput {
            window: &window,
            recent: &recent,
            recent_closed: &recent_closed,
        }) else {
            return Ok(None);
        };

        let snapshot = analysis.clone().into_snapshot(owner_id, now);
        if let Err(e) = self.store.append_snapshot(&snapshot).await {
            error!(%owner_id, error = %e, "Failed to persist behavior snapshot.");
        } else {
            info!(
                %owner_id,
                flags = analysis.flags.active().count(),
                discipline = %analysis.discipline_score,
                "Behavior snapshot recorded."
            );
        }
        Ok(Some(analysis))
    }

    /// Trend over the owner's most recent snapshots, or `None` without history.
    pub async fn summary(&self, owner_id: Uuid) -> Result<Option<BehaviorTrend>, EngineError> {
        let settings = self.engine.settings();
        let snapshots = self
            .store
            .recent_snapshots(owner_id, settings.trend_sample_size)
            .await?;
        Ok(summarize(
            &snapshots,
            settings.trend_sample_size,
            settings.trend_series_len,
        ))
    }
}

/// A cloneable handle for submitting analysis jobs.
#[derive(Debug, Clone)]
pub struct AnalysisHandle {
    sender: mpsc::Sender<Uuid>,
}

impl AnalysisHandle {
    /// Queues an analysis of `owner_id` without waiting for it.
    ///
    /// A full or closed queue drops the job with a warning; the caller never
    /// sees a failure.
    pub fn submit(&self, owner_id: Uuid) {
        match self.sender.try_send(owner_id) {
            Ok(()) => debug!(%owner_id, "Behavior analysis queued."),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(%owner_id, "Analysis queue is full; dropping job.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(%owner_id, "Analysis queue is closed; dropping job.");
            }
        }
    }
}

/// A single background worker that runs behavior analyses off the request path.
pub struct AnalysisQueue {
    handle: AnalysisHandle,
    worker: JoinHandle<()>,
}

impl AnalysisQueue {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(analyzer: Arc<BehaviorAnalyzer>, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Uuid>(capacity.max(1));

        let worker = tokio::spawn(async move {
            info!("Behavior analysis worker started.");
            while let Some(owner_id) = receiver.recv().await {
                match analyzer.analyze(owner_id, Utc::now()).await {
                    Ok(Some(_)) => {}
                    Ok(None) => debug!(%owner_id, "Analysis produced no result."),
                    Err(e) => error!(%owner_id, error = %e, "Behavior analysis failed."),
                }
            }
            info!("Behavior analysis worker stopped.");
        });

        Self {
            handle: AnalysisHandle { sender },
            worker,
        }
    }

    pub fn handle(&self) -> AnalysisHandle {
        self.handle.clone()
    }

    pub fn submit(&self, owner_id: Uuid) {
        self.handle.submit(owner_id);
    }

    /// Stops accepting jobs, then waits until the queued ones have run.
    ///
    /// Handles cloned from this queue keep the channel open; drop them first.
    pub async fn shutdown(self) {
        drop(self.handle);
        if let Err(e) = self.worker.await {
            error!(error = %e, "Behavior analysis worker panicked.");
        }
    }
}
