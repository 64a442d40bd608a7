//! JSON-lines step intake for the standalone binary.
//!
//! Each non-blank line is one step:
//!
//! ```json
//! {"kind": "text2image", "params": {"prompt": "a red fox"}}
//! {"id": "0190...", "kind": "text2video", "params": {...}, "artifact_id": "a-17"}
//! ```
//!
//! The step is inserted as `Pending` and a `step.pending` event is
//! published for it.

use mediagen_core::{StepId, StepRecord};
use mediagen_events::{EventBus, InMemoryStepStore, StepEvent};
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize)]
struct StepLine {
    #[serde(default)]
    id: Option<StepId>,
    kind: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    artifact_id: Option<String>,
}

impl StepLine {
    fn into_record(self) -> StepRecord {
        let step = StepRecord::pending(self.id.unwrap_or_else(StepId::new_v4), self.kind, self.params);
        match self.artifact_id {
            Some(artifact_id) => step.with_artifact_id(artifact_id),
            None => step,
        }
    }
}

/// Counts from one [`feed_lines`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub accepted: usize,
    pub rejected: usize,
}

/// Read steps from `reader` until EOF, a read error, or cancellation.
///
/// Malformed lines are logged and counted, never fatal.
pub async fn feed_lines<R>(
    reader: R,
    store: &InMemoryStepStore,
    bus: &EventBus,
    cancel: CancellationToken,
) -> FeedSummary
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut summary = FeedSummary::default();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Step feed read failed, stopping intake");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<StepLine>(&line) {
            Ok(parsed) => {
                let step = parsed.into_record();
                let id = step.id;
                tracing::info!(step_id = %id, kind = %step.kind, "Step received");
                store.insert(step).await;
                bus.publish(StepEvent::pending(id));
                summary.accepted += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed step line");
                summary.rejected += 1;
            }
        }
    }

    tracing::info!(
        accepted = summary.accepted,
        rejected = summary.rejected,
        "Step feed finished",
    );
    summary
}
