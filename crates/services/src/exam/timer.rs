/// Countdown for the question currently on screen.
///
/// Driven by explicit `tick` calls. It fires at most once per arming: after expiring
/// or being cancelled it stays silent until `restart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionTimer {
    limit_secs: u32,
    remaining_secs: u32,
    state: TimerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Running,
    Cancelled,
    Expired,
    /// A zero limit means no countdown at all.
    Disabled,
}

impl QuestionTimer {
    #[must_use]
    pub fn start(limit_secs: u32) -> Self {
        let state = if limit_secs == 0 {
            TimerState::Disabled
        } else {
            TimerState::Running
        };
        Self {
            limit_secs,
            remaining_secs: limit_secs,
            state,
        }
    }

    /// Advance by `secs`. Returns true exactly when this tick runs the timer out.
    pub fn tick(&mut self, secs: u32) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(secs);
        if self.remaining_secs == 0 {
            self.state = TimerState::Expired;
            return true;
        }
        false
    }

    pub fn cancel(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Cancelled;
        }
    }

    /// Re-arm with the original limit for the next question.
    pub fn restart(&mut self) {
        *self = Self::start(self.limit_secs);
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn limit_secs(&self) -> u32 {
        self.limit_secs
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_once() {
        let mut timer = QuestionTimer::start(3);
        assert!(!timer.tick(1));
        assert!(!timer.tick(1));
        assert!(timer.tick(1));
        assert!(!timer.tick(1));
        assert_eq!(timer.state(), TimerState::Expired);
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn large_tick_expires_immediately() {
        let mut timer = QuestionTimer::start(30);
        assert!(timer.tick(45));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timer = QuestionTimer::start(2);
        timer.tick(1);
        timer.cancel();
        assert!(!timer.tick(5));
        assert_eq!(timer.state(), TimerState::Cancelled);
        assert_eq!(timer.remaining_secs(), 1);
    }

    #[test]
    fn restart_rearms_full_limit() {
        let mut timer = QuestionTimer::start(2);
        timer.tick(2);
        timer.restart();
        assert!(timer.is_running());
        assert_eq!(timer.remaining_secs(), 2);
    }

    #[test]
    fn zero_limit_disables_countdown() {
        let mut timer = QuestionTimer::start(0);
        assert!(!timer.tick(100));
        assert_eq!(timer.state(), TimerState::Disabled);
    }
}
