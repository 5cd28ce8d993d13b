// Overlay visibility state machine with a timed auto-hide deadline.
// The deadline is an abortable task that feeds a hide input back into the
// surface loop; at most one is live at a time.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::surface::ControlInput;

/// Visibility states of the control overlay.
#[derive(Debug)]
enum OverlayState {
    /// Controls are hidden.
    Hidden,
    /// Controls are visible; `hide_timer` holds the armed auto-hide
    /// deadline, `None` when no deadline applies (paused or dragging).
    Visible { hide_timer: Option<JoinHandle<()>> },
}

/// Governs when the control overlay is shown vs auto-hidden.
pub struct ControlsVisibility {
    state: OverlayState,
    delay: Duration,
}

impl ControlsVisibility {
    /// Controls start out visible with no deadline, matching the state
    /// before playback is ready.
    pub fn new(delay: Duration) -> Self {
        Self {
            state: OverlayState::Visible { hide_timer: None },
            delay,
        }
    }

    pub fn visible(&self) -> bool {
        !matches!(self.state, OverlayState::Hidden)
    }

    /// Show the overlay. When `arm` is true (playing and not dragging) a
    /// fresh auto-hide deadline replaces any existing one; otherwise the
    /// overlay stays up indefinitely.
    pub fn show(&mut self, arm: bool, input: &UnboundedSender<ControlInput>) {
        self.cancel_timer();
        let hide_timer = if arm {
            let tx = input.clone();
            let delay = self.delay;
            Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(ControlInput::HideControls);
            }))
        } else {
            None
        };
        trace!(armed = arm, "controls shown");
        self.state = OverlayState::Visible { hide_timer };
    }

    /// Hide immediately, dropping any armed deadline.
    pub fn hide(&mut self) {
        self.cancel_timer();
        self.state = OverlayState::Hidden;
    }

    /// Back to the initial visible-unarmed state.
    pub fn reset(&mut self) {
        self.cancel_timer();
        self.state = OverlayState::Visible { hide_timer: None };
    }

    fn cancel_timer(&mut self) {
        if let OverlayState::Visible { hide_timer } = &mut self.state
            && let Some(timer) = hide_timer.take()
        {
            timer.abort();
        }
    }
}

impl Drop for ControlsVisibility {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn armed_show_fires_hide_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut visibility = ControlsVisibility::new(Duration::from_millis(3000));

        visibility.show(true, &tx);
        assert!(visibility.visible());

        // Let the spawned hide-timer register its sleep deadline against the
        // paused clock before advancing time.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(2999)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert!(matches!(rx.try_recv(), Ok(ControlInput::HideControls)));
    }

    #[tokio::test(start_paused = true)]
    async fn reshow_replaces_the_deadline() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut visibility = ControlsVisibility::new(Duration::from_millis(3000));

        visibility.show(true, &tx);
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(2000)).await;

        // Activity at 2s defers the hide a full window from now.
        visibility.show(true, &tx);
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(2000)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(1001)).await;
        tokio::task::yield_now().await;
        assert!(matches!(rx.try_recv(), Ok(ControlInput::HideControls)));
    }

    #[tokio::test(start_paused = true)]
    async fn unarmed_show_never_hides() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut visibility = ControlsVisibility::new(Duration::from_millis(3000));

        visibility.show(false, &tx);
        tokio::time::advance(Duration::from_secs(60)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
        assert!(visibility.visible());
    }

    #[tokio::test(start_paused = true)]
    async fn hide_cancels_the_pending_deadline() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut visibility = ControlsVisibility::new(Duration::from_millis(3000));

        visibility.show(true, &tx);
        visibility.hide();
        assert!(!visibility.visible());

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
