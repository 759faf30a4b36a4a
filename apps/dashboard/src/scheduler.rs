//! Poll scheduler and debounced resize redraw.
//!
//! One repeating timer drives the fetch -> cache -> render sequence; ticks do
//! not cancel in-flight refreshes, ordering is enforced by the cache's
//! sequence guard. A separate debounced channel re-renders charts from the
//! cached snapshot on viewport resize, with no network call. Both timers are
//! cancelled on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::charts::Viewport;
use crate::controller::DashboardContext;

/// Quiet period before a resize burst triggers one redraw.
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(250);

/// Handle over the scheduler's timers.
pub struct PollScheduler {
    poll_task: JoinHandle<()>,
    resize_task: JoinHandle<()>,
    resize_tx: mpsc::UnboundedSender<Viewport>,
}

/// Starts the poll loop and the resize debouncer.
///
/// The first refresh fires immediately, subsequent ones every
/// `config.poll_interval`.
pub fn start(ctx: Arc<DashboardContext>) -> PollScheduler {
    let interval = ctx.config.poll_interval;
    info!("poll scheduler started ({:?} interval)", interval);

    let poll_ctx = ctx.clone();
    let poll_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            // Fire-and-forget: a slow response must not delay the next tick,
            // and the cache discards anything that lost the ordering race.
            let ctx = poll_ctx.clone();
            tokio::spawn(async move {
                ctx.refresh().await;
            });
        }
    });

    let (resize_tx, mut resize_rx) = mpsc::unbounded_channel::<Viewport>();
    let resize_task = tokio::spawn(async move {
        while let Some(mut viewport) = resize_rx.recv().await {
            // Collapse the burst: keep replacing until the channel stays
            // quiet for the debounce window.
            loop {
                tokio::select! {
                    next = resize_rx.recv() => match next {
                        Some(v) => viewport = v,
                        None => return,
                    },
                    _ = tokio::time::sleep(RESIZE_DEBOUNCE) => break,
                }
            }
            debug!("debounced resize redraw at {}x{}", viewport.width, viewport.height);
            ctx.redraw_charts(viewport);
        }
    });

    PollScheduler {
        poll_task,
        resize_task,
        resize_tx,
    }
}

impl PollScheduler {
    /// Reports a viewport resize; the redraw happens after the quiet period.
    pub fn notify_resize(&self, viewport: Viewport) {
        let _ = self.resize_tx.send(viewport);
    }

    /// Cancels both timers. Chart handles are destroyed by the context's
    /// own teardown.
    pub fn shutdown(self) {
        self.poll_task.abort();
        self.resize_task.abort();
        info!("poll scheduler stopped");
    }
}
