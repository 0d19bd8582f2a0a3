//! Timer-driven cosmetic progress for an in-flight submission.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, warn};

use crate::page::PageState;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Advances the page's progress one step per period until stopped. It never
/// moves past the last step; reaching 100% is left to the caller.
pub struct ProgressAnimator {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ProgressAnimator {
    /// A zero `period` is raised to one millisecond.
    pub fn start(page: Arc<watch::Sender<PageState>>, period: Duration) -> Self {
        let period = period.max(MIN_PERIOD);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let advanced = page.send_if_modified(|state| state.progress.advance());
                        if advanced {
                            debug!(
                                step = page.borrow().progress.current_step(),
                                "progress advanced"
                            );
                        }
                    }
                }
            }
        });

        Self { stop_tx, handle }
    }

    /// Stops the timer. Once this returns the page is no longer touched.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(error) = self.handle.await {
            if error.is_panic() {
                warn!(%error, "progress animator panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn advances_every_period_and_caps_at_last_step() {
        let page = Arc::new(watch::Sender::new(PageState::default()));
        let animator = ProgressAnimator::start(Arc::clone(&page), Duration::from_secs(2));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(page.borrow().progress.current_step(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(page.borrow().progress.current_step(), 3);
        assert!(!page.borrow().progress.is_complete());

        animator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_progress() {
        let page = Arc::new(watch::Sender::new(PageState::default()));
        let animator = ProgressAnimator::start(Arc::clone(&page), Duration::from_secs(2));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        animator.stop().await;
        let frozen = page.borrow().progress;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(page.borrow().progress, frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_still_ticks_without_panicking() {
        let page = Arc::new(watch::Sender::new(PageState::default()));
        let animator = ProgressAnimator::start(Arc::clone(&page), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(page.borrow().progress.current_step(), 3);

        animator.stop().await;
    }
}
