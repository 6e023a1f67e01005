//! Second-granular countdown for a timed exam attempt.
//!
//! The countdown is pure state; the 1 Hz drive lives in the services layer so
//! tests can step it deterministically.

/// Outcome of advancing or arming the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The countdown has not been armed yet.
    Idle,
    /// One second elapsed; this many seconds remain.
    Running(u32),
    /// The countdown just reached zero. Reported exactly once.
    Expired,
    /// The countdown was stopped, or had already expired.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running,
    Stopped,
}

/// Monotone countdown from a fixed duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    duration: u32,
    remaining: u32,
    state: State,
    expired: bool,
}

impl Countdown {
    #[must_use]
    pub fn new(duration_seconds: u32) -> Self {
        Self {
            duration: duration_seconds,
            remaining: duration_seconds,
            state: State::Idle,
            expired: false,
        }
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn has_expired(&self) -> bool {
        self.expired
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    /// Arm the countdown. A zero-duration countdown expires right here, so the
    /// expiry signal is still emitted exactly once.
    pub fn start(&mut self) -> Tick {
        match self.state {
            State::Idle if self.remaining == 0 => {
                self.expired = true;
                self.state = State::Stopped;
                Tick::Expired
            }
            State::Idle => {
                self.state = State::Running;
                Tick::Running(self.remaining)
            }
            State::Running => Tick::Running(self.remaining),
            State::Stopped => Tick::Stopped,
        }
    }

    /// Advance by one second. Never decrements below zero; reports `Expired`
    /// exactly once and stops afterwards.
    pub fn tick(&mut self) -> Tick {
        match self.state {
            State::Idle => Tick::Idle,
            State::Stopped => Tick::Stopped,
            State::Running => {
                self.remaining = self.remaining.saturating_sub(1);
                if self.remaining == 0 {
                    self.expired = true;
                    self.state = State::Stopped;
                    Tick::Expired
                } else {
                    Tick::Running(self.remaining)
                }
            }
        }
    }

    /// Halt ticking. Idempotent; used when a submission is underway.
    pub fn stop(&mut self) {
        self.state = State::Stopped;
    }

    /// Resume ticking after a `stop()` that did not lead to termination.
    ///
    /// Has no effect once the countdown has expired or was never armed.
    pub fn resume(&mut self) {
        if self.state == State::Stopped && !self.expired && self.remaining > 0 {
            self.state = State::Running;
        }
    }
}

/// Format a second count as zero-padded `HH:MM:SS` with unbounded hours.
#[must_use]
pub fn format_hms(total_seconds: u32) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_expires_exactly_once() {
        let mut countdown = Countdown::new(5);
        assert_eq!(countdown.start(), Tick::Running(5));

        let mut expirations = 0;
        for _ in 0..5 {
            if countdown.tick() == Tick::Expired {
                expirations += 1;
            }
        }

        assert_eq!(countdown.remaining_seconds(), 0);
        assert_eq!(expirations, 1);
        assert!(countdown.has_expired());
    }

    #[test]
    fn zero_duration_expires_at_start() {
        let mut countdown = Countdown::new(0);
        assert_eq!(countdown.start(), Tick::Expired);
        assert_eq!(countdown.remaining_seconds(), 0);
        assert_eq!(countdown.tick(), Tick::Stopped);
    }

    #[test]
    fn ticks_after_expiry_are_inert() {
        let mut countdown = Countdown::new(1);
        countdown.start();
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.tick(), Tick::Stopped);
        assert_eq!(countdown.tick(), Tick::Stopped);
        assert_eq!(countdown.remaining_seconds(), 0);
    }

    #[test]
    fn tick_before_start_is_idle() {
        let mut countdown = Countdown::new(10);
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.remaining_seconds(), 10);
    }

    #[test]
    fn stop_is_idempotent_and_resume_restores_ticking() {
        let mut countdown = Countdown::new(10);
        countdown.start();
        countdown.tick();
        countdown.stop();
        countdown.stop();
        assert_eq!(countdown.tick(), Tick::Stopped);
        assert_eq!(countdown.remaining_seconds(), 9);

        countdown.resume();
        assert_eq!(countdown.tick(), Tick::Running(8));
    }

    #[test]
    fn resume_after_expiry_does_nothing() {
        let mut countdown = Countdown::new(1);
        countdown.start();
        assert_eq!(countdown.tick(), Tick::Expired);
        countdown.resume();
        assert_eq!(countdown.tick(), Tick::Stopped);
    }

    #[test]
    fn formats_zero_padded_hms() {
        assert_eq!(format_hms(3661), "01:01:01");
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(59), "00:00:59");
        assert_eq!(format_hms(7200), "02:00:00");
    }

    #[test]
    fn hour_field_is_unbounded() {
        assert_eq!(format_hms(100 * 3600 + 61), "100:01:01");
    }
}
