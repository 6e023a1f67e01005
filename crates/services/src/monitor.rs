use chrono::{DateTime, Duration, Utc};

use exam_core::model::{IntegrityEvent, IntegrityEventKind};

/// How long a focus-loss warning stays up if the student does not return.
pub const WARNING_GRACE_SECONDS: i64 = 5;

/// Hidden transitions closer together than this collapse into one violation.
pub const FLICKER_COLLAPSE_SECONDS: i64 = 1;

/// The transient focus-loss banner, while it is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWarning {
    pub raised_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Decision logic over the two proctoring signal streams.
///
/// Holds only transient state (last focus loss, current warning window); the
/// permanent violation log lives on the session, and status is never touched
/// from here. The warning expires lazily, so no background timer is needed.
///
/// An overlapping focus loss during an active window restarts the window from
/// the newer loss.
#[derive(Debug, Clone, Default)]
pub struct IntegrityMonitor {
    last_focus_loss: Option<DateTime<Utc>>,
    warning: Option<ActiveWarning>,
}

impl IntegrityMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a "hidden" transition from the visibility stream.
    ///
    /// Returns the violation to record, or `None` when the transition is
    /// flicker that collapses into the previous loss.
    pub fn observe_hidden(&mut self, now: DateTime<Utc>) -> Option<IntegrityEvent> {
        let collapse = self.last_focus_loss.is_some_and(|last| {
            now.signed_duration_since(last) < Duration::seconds(FLICKER_COLLAPSE_SECONDS)
        });
        self.last_focus_loss = Some(now);
        if collapse {
            return None;
        }

        self.warning = Some(ActiveWarning {
            raised_at: now,
            expires_at: now + Duration::seconds(WARNING_GRACE_SECONDS),
        });
        Some(IntegrityEvent::new(IntegrityEventKind::FocusLost, now))
    }

    /// The student came back; the displayed warning clears immediately.
    ///
    /// Returns `true` when a warning was showing, so the caller can mark the
    /// recorded events acknowledged. The events themselves stay on the log.
    pub fn observe_visible(&mut self) -> bool {
        self.warning.take().is_some()
    }

    /// The warning currently showing, if its window has not lapsed.
    #[must_use]
    pub fn active_warning(&self, now: DateTime<Utc>) -> Option<ActiveWarning> {
        self.warning.filter(|warning| now < warning.expires_at)
    }

    /// Drop a lapsed warning window.
    ///
    /// Returns `true` when a window just ran out, so the caller can mark the
    /// recorded events acknowledged.
    pub fn expire_warning(&mut self, now: DateTime<Utc>) -> bool {
        match self.warning {
            Some(warning) if now >= warning.expires_at => {
                self.warning = None;
                true
            }
            _ => false,
        }
    }

    /// Fabricate the violation for a camera acquisition failure or a
    /// mid-session stream drop. No banner is attached to these, so the event
    /// arrives already acknowledged.
    #[must_use]
    pub fn camera_dropped(&self, now: DateTime<Utc>) -> IntegrityEvent {
        IntegrityEvent::acknowledged(IntegrityEventKind::CameraDropped, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_now;

    #[test]
    fn rapid_flicker_collapses_into_one_violation() {
        let mut monitor = IntegrityMonitor::new();
        let start = fixed_now();

        assert!(monitor.observe_hidden(start).is_some());
        assert!(
            monitor
                .observe_hidden(start + Duration::milliseconds(500))
                .is_none()
        );
    }

    #[test]
    fn chained_flicker_keeps_collapsing() {
        let mut monitor = IntegrityMonitor::new();
        let start = fixed_now();

        assert!(monitor.observe_hidden(start).is_some());
        // each transition is within a second of the previous one
        for i in 1..=4 {
            assert!(
                monitor
                    .observe_hidden(start + Duration::milliseconds(900 * i))
                    .is_none()
            );
        }
    }

    #[test]
    fn distant_losses_each_count() {
        let mut monitor = IntegrityMonitor::new();
        let start = fixed_now();

        assert!(monitor.observe_hidden(start).is_some());
        assert!(monitor.observe_hidden(start + Duration::seconds(10)).is_some());
    }

    #[test]
    fn warning_lapses_after_the_grace_window() {
        let mut monitor = IntegrityMonitor::new();
        let start = fixed_now();
        monitor.observe_hidden(start);

        assert!(monitor.active_warning(start + Duration::seconds(4)).is_some());
        assert!(monitor.active_warning(start + Duration::seconds(5)).is_none());

        assert!(monitor.expire_warning(start + Duration::seconds(5)));
        assert!(!monitor.expire_warning(start + Duration::seconds(6)));
    }

    #[test]
    fn returning_clears_the_warning_immediately() {
        let mut monitor = IntegrityMonitor::new();
        let start = fixed_now();
        monitor.observe_hidden(start);

        assert!(monitor.observe_visible());
        assert!(monitor.active_warning(start + Duration::seconds(1)).is_none());
        assert!(!monitor.observe_visible());
    }

    #[test]
    fn overlapping_loss_restarts_the_window() {
        let mut monitor = IntegrityMonitor::new();
        let start = fixed_now();

        monitor.observe_hidden(start);
        let second = start + Duration::seconds(3);
        assert!(monitor.observe_hidden(second).is_some());

        let warning = monitor.active_warning(second).unwrap();
        assert_eq!(warning.raised_at, second);
        assert_eq!(warning.expires_at, second + Duration::seconds(WARNING_GRACE_SECONDS));
        // still up past the first loss's deadline
        assert!(monitor.active_warning(start + Duration::seconds(6)).is_some());
    }

    #[test]
    fn camera_drop_is_recorded_without_a_banner() {
        let monitor = IntegrityMonitor::new();
        let event = monitor.camera_dropped(fixed_now());

        assert_eq!(event.kind, IntegrityEventKind::CameraDropped);
        assert!(event.acknowledged);
        assert!(monitor.active_warning(fixed_now()).is_none());
    }
}
