// Tap classification and single/double disambiguation for touch surfaces.
// The recognizer is a pure decision function over tap timestamps; the timer
// that resolves a provisional single tap lives in the control surface.

use std::time::Duration;
use tokio::time::Instant;

/// Horizontal bands of the touch surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapZone {
    Left,
    Center,
    Right,
}

impl TapZone {
    /// First 30% of the width is left, last 30% is right, the rest center.
    pub fn classify(x: f64, width: f64) -> TapZone {
        if width <= 0.0 {
            return TapZone::Center;
        }
        let fraction = x / width;
        if fraction < 0.3 {
            TapZone::Left
        } else if fraction > 0.7 {
            TapZone::Right
        } else {
            TapZone::Center
        }
    }
}

/// Outcome of feeding one tap into the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapDecision {
    /// Second tap in the same zone inside the window: the double-tap action
    /// fires now and any pending single-tap timer must be cancelled.
    Double(TapZone),
    /// Provisionally a single tap: arm the deferred timer, replacing any
    /// live one.
    Deferred(TapZone),
}

/// Single/double tap disambiguation with a per-zone match requirement.
#[derive(Debug)]
pub struct GestureRecognizer {
    window: Duration,
    last_tap: Option<(Instant, TapZone)>,
}

impl GestureRecognizer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_tap: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Classify a new tap against the previous one.
    ///
    /// A double tap requires the same zone and an elapsed time strictly
    /// between zero and the window. On a double tap the state resets to
    /// neutral so a third rapid tap starts a fresh sequence instead of
    /// chaining into another double.
    pub fn on_tap(&mut self, zone: TapZone, now: Instant) -> TapDecision {
        if let Some((at, last_zone)) = self.last_tap {
            let elapsed = now.duration_since(at);
            if last_zone == zone && elapsed > Duration::ZERO && elapsed < self.window {
                self.last_tap = None;
                return TapDecision::Double(zone);
            }
        }
        self.last_tap = Some((now, zone));
        TapDecision::Deferred(zone)
    }

    pub fn reset(&mut self) {
        self.last_tap = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> GestureRecognizer {
        GestureRecognizer::new(Duration::from_millis(300))
    }

    #[test]
    fn zone_bands() {
        assert_eq!(TapZone::classify(0.0, 100.0), TapZone::Left);
        assert_eq!(TapZone::classify(29.9, 100.0), TapZone::Left);
        assert_eq!(TapZone::classify(30.0, 100.0), TapZone::Center);
        assert_eq!(TapZone::classify(70.0, 100.0), TapZone::Center);
        assert_eq!(TapZone::classify(70.1, 100.0), TapZone::Right);
        assert_eq!(TapZone::classify(99.0, 100.0), TapZone::Right);
    }

    #[test]
    fn zone_classification_tolerates_degenerate_width() {
        assert_eq!(TapZone::classify(10.0, 0.0), TapZone::Center);
    }

    #[tokio::test(start_paused = true)]
    async fn same_zone_within_window_is_double() {
        let mut g = recognizer();
        let first = Instant::now();
        assert_eq!(
            g.on_tap(TapZone::Right, first),
            TapDecision::Deferred(TapZone::Right)
        );
        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(
            g.on_tap(TapZone::Right, Instant::now()),
            TapDecision::Double(TapZone::Right)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn taps_at_window_boundary_stay_single() {
        let mut g = recognizer();
        g.on_tap(TapZone::Left, Instant::now());
        tokio::time::advance(Duration::from_millis(300)).await;
        assert_eq!(
            g.on_tap(TapZone::Left, Instant::now()),
            TapDecision::Deferred(TapZone::Left)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn different_zones_never_combine() {
        let mut g = recognizer();
        g.on_tap(TapZone::Left, Instant::now());
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(
            g.on_tap(TapZone::Right, Instant::now()),
            TapDecision::Deferred(TapZone::Right)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn third_rapid_tap_does_not_chain() {
        let mut g = recognizer();
        g.on_tap(TapZone::Center, Instant::now());
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(
            g.on_tap(TapZone::Center, Instant::now()),
            TapDecision::Double(TapZone::Center)
        );
        tokio::time::advance(Duration::from_millis(100)).await;
        // The double reset the state: this starts a fresh sequence.
        assert_eq!(
            g.on_tap(TapZone::Center, Instant::now()),
            TapDecision::Deferred(TapZone::Center)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn simultaneous_duplicate_tap_is_not_double() {
        let mut g = recognizer();
        let now = Instant::now();
        g.on_tap(TapZone::Left, now);
        // Zero elapsed time is outside the strict (0, window) interval.
        assert_eq!(g.on_tap(TapZone::Left, now), TapDecision::Deferred(TapZone::Left));
    }
}
