//! Event loop: one spawned handler task per `step.pending` event.

use std::sync::Arc;

use mediagen_events::StepEvent;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::dispatcher::StepHandler;

/// Consume step events until cancelled or until the bus closes.
///
/// Cancellation stops intake only; handler tasks already spawned keep
/// running. The returned tracker is closed, so the caller can wait for
/// them to drain.
pub async fn run(
    mut events: broadcast::Receiver<StepEvent>,
    handler: Arc<StepHandler>,
    cancel: CancellationToken,
) -> TaskTracker {
    let tracker = TaskTracker::new();
    tracing::info!(dummy_mode = handler.dummy_mode(), "Step runner started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(in_flight = tracker.len(), "Step runner shutting down");
                break;
            }
            received = events.recv() => match received {
                Ok(event) if event.is_pending() => {
                    let handler = Arc::clone(&handler);
                    tracker.spawn(async move {
                        if let Err(e) = handler.handle(event.step_id).await {
                            tracing::warn!(
                                step_id = %event.step_id,
                                error = %e,
                                "Step handler returned an error",
                            );
                        }
                    });
                }
                Ok(event) => {
                    tracing::debug!(event_type = %event.event_type, "Ignoring event");
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Step runner lagged, some events were missed");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, step runner shutting down");
                    break;
                }
            }
        }
    }

    tracker.close();
    tracker
}
