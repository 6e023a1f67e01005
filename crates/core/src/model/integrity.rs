use chrono::{DateTime, Utc};

/// What kind of supervision signal was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityEventKind {
    /// The exam surface lost visibility or focus (tab switch, minimize).
    FocusLost,
    /// The camera stream failed to start or dropped mid-session.
    CameraDropped,
}

/// One recorded violation. Events are never removed, only acknowledged once
/// their transient warning has run its course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityEvent {
    pub kind: IntegrityEventKind,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
}

impl IntegrityEvent {
    #[must_use]
    pub fn new(kind: IntegrityEventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            timestamp,
            acknowledged: false,
        }
    }

    /// An event whose warning already ran its course when it was recorded.
    /// Camera drops have no dismissable banner, so they arrive this way.
    #[must_use]
    pub fn acknowledged(kind: IntegrityEventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            timestamp,
            acknowledged: true,
        }
    }

    pub fn acknowledge(&mut self) {
        self.acknowledged = true;
    }
}

/// Liveness state of the proctoring camera. Only presence is modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraState {
    #[default]
    Off,
    RequestedOn,
    On,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn new_events_start_unacknowledged() {
        let mut event = IntegrityEvent::new(IntegrityEventKind::FocusLost, fixed_now());
        assert!(!event.acknowledged);

        event.acknowledge();
        assert!(event.acknowledged);
    }

    #[test]
    fn camera_state_defaults_to_off() {
        assert_eq!(CameraState::default(), CameraState::Off);
    }
}
