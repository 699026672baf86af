use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use quiz_core::model::SessionState;

use super::flow::QuizFlowService;

/// What the countdown task reports once per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// Whole seconds left on the clock.
    Remaining(u64),
    /// The deadline passed and the session was force-submitted.
    Expired,
}

/// The once-per-second countdown task.
///
/// Its only effects are emitting `TickEvent`s and forcing submission at the
/// deadline. It stops on its own when the session is finalized elsewhere or
/// the event receiver goes away; `cancel` stops it explicitly and guarantees
/// no further events are observable afterwards. The finalize idempotency in
/// the session makes the race between a late tick and a manual submit
/// harmless.
pub struct SessionTicker {
    cancel: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl SessionTicker {
    /// Spawn the countdown over a shared session.
    #[must_use]
    pub fn spawn(
        flow: Arc<QuizFlowService>,
        session: Arc<Mutex<SessionState>>,
        events: mpsc::UnboundedSender<TickEvent>,
    ) -> Self {
        let cancel = Arc::new(Notify::new());
        let cancelled = Arc::clone(&cancel);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = cancelled.notified() => break,
                    _ = interval.tick() => {
                        let now = flow.now();
                        let mut guard = session.lock().await;
                        if guard.is_finalized() {
                            break;
                        }
                        if guard.is_expired(now) {
                            if let Err(err) = flow.submit(&mut guard).await {
                                warn!(error = %err, "forced submission failed");
                            }
                            let _ = events.send(TickEvent::Expired);
                            break;
                        }
                        if events
                            .send(TickEvent::Remaining(guard.remaining_seconds(now)))
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
        });

        Self { cancel, handle }
    }

    /// Stop the task and wait for it to exit. No events follow.
    pub async fn cancel(self) {
        self.cancel.notify_one();
        let _ = self.handle.await;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
