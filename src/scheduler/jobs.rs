use std::{sync::Arc, time::Instant};

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    observability::metrics::Metrics,
    pipeline::{
        RadarPipeline,
        snapshot::{RadarSnapshot, SnapshotBoard},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTrigger {
    Scheduled,
    Manual,
}

impl PassTrigger {
    fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PassContext {
    pub pass_id: Uuid,
    pub trigger: PassTrigger,
}

impl PassContext {
    #[must_use]
    pub fn new(pass_id: Uuid, trigger: PassTrigger) -> Self {
        Self { pass_id, trigger }
    }

    #[must_use]
    pub fn scheduled() -> Self {
        Self::new(Uuid::new_v4(), PassTrigger::Scheduled)
    }

    #[must_use]
    pub fn manual() -> Self {
        Self::new(Uuid::new_v4(), PassTrigger::Manual)
    }
}

/// Runs passes and publishes their snapshots. Cheap to clone.
#[derive(Clone)]
pub struct Scheduler {
    pipeline: Arc<RadarPipeline>,
    board: SnapshotBoard,
    metrics: Arc<Metrics>,
}

impl Scheduler {
    #[must_use]
    pub fn new(pipeline: Arc<RadarPipeline>, board: SnapshotBoard, metrics: Arc<Metrics>) -> Self {
        Self {
            pipeline,
            board,
            metrics,
        }
    }

    #[must_use]
    pub fn board(&self) -> &SnapshotBoard {
        &self.board
    }

    /// 1 回分のパスを実行し、成功したらスナップショットを公開する。
    ///
    /// 失敗したパスは公開済みのスナップショットに触れない。
    ///
    /// # Errors
    /// 編集フィードの取得に失敗した場合はエラーを返す。
    pub async fn run_pass(&self, context: PassContext) -> Result<Arc<RadarSnapshot>> {
        tracing::info!(
            pass_id = %context.pass_id,
            trigger = context.trigger.as_str(),
            "running radar pass"
        );
        let started = Instant::now();

        let outcome = self.pipeline.run_pass(context.pass_id, Utc::now()).await;
        self.metrics
            .pass_duration
            .observe(started.elapsed().as_secs_f64());

        match outcome {
            Ok(snapshot) => {
                self.metrics.passes_completed.inc();
                self.metrics.contested_topics.set(snapshot.stats.contested as f64);
                self.metrics.edit_wars.set(snapshot.stats.edit_wars as f64);
                tracing::info!(
                    pass_id = %context.pass_id,
                    edits = snapshot.stats.total_edits,
                    contested = snapshot.stats.contested,
                    edit_wars = snapshot.stats.edit_wars,
                    views_degraded = snapshot.views_degraded,
                    "radar pass completed"
                );
                let snapshot = Arc::new(snapshot);
                if !self.board.publish(Arc::clone(&snapshot)) {
                    tracing::debug!(pass_id = %context.pass_id, "newer snapshot already published");
                }
                Ok(snapshot)
            }
            Err(error) => {
                self.metrics.passes_failed.inc();
                tracing::error!(pass_id = %context.pass_id, error = %error, "radar pass failed");
                Err(error.into())
            }
        }
    }
}
