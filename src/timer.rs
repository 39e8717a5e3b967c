//! Kitchen countdown ticking in hundredths of a second.

use std::time::Duration;
use uuid::Uuid;

pub const TICK: Duration = Duration::from_millis(10);
const TICKS_PER_SECOND: u32 = 100;

pub const DONE_TITLE: &str = "Time is up!";
pub const DONE_BODY: &str = "Go check out the oven";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("Set a duration before starting the timer")]
    ZeroDuration,

    #[error("Minutes and seconds must be below 60")]
    OutOfRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    /// Identifies the pending "time is up" notification for this run.
    pub id: Uuid,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub fractions: u32,
    running: bool,
}

impl Countdown {
    pub fn start(hours: u32, minutes: u32, seconds: u32) -> Result<Self, TimerError> {
        if hours == 0 && minutes == 0 && seconds == 0 {
            return Err(TimerError::ZeroDuration);
        }
        if minutes >= 60 || seconds >= 60 {
            return Err(TimerError::OutOfRange);
        }
        Ok(Self {
            id: Uuid::now_v7(),
            hours,
            minutes,
            seconds,
            fractions: 0,
            running: true,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance by one hundredth. Returns false once the countdown has expired.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        if self.fractions > 0 {
            self.fractions -= 1;
        } else if self.seconds > 0 {
            self.seconds -= 1;
            self.fractions = TICKS_PER_SECOND - 1;
        } else if self.minutes > 0 {
            self.minutes -= 1;
            self.seconds = 59;
            self.fractions = TICKS_PER_SECOND - 1;
        } else if self.hours > 0 {
            self.hours -= 1;
            self.minutes = 59;
            self.seconds = 59;
            self.fractions = TICKS_PER_SECOND - 1;
        }

        if self.remaining().is_zero() {
            self.running = false;
        }
        self.running
    }

    /// Reset to zero and stop.
    pub fn stop(&mut self) {
        self.hours = 0;
        self.minutes = 0;
        self.seconds = 0;
        self.fractions = 0;
        self.running = false;
    }

    /// `HH:MM:SS`; fractions are not shown.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }

    pub fn remaining(&self) -> Duration {
        Self::total_duration(self.hours, self.minutes, self.seconds) + TICK * self.fractions
    }

    /// Length of the whole run as configured at start.
    pub fn total_duration(hours: u32, minutes: u32, seconds: u32) -> Duration {
        let secs = u64::from(hours) * 3600 + u64::from(minutes) * 60 + u64::from(seconds);
        Duration::from_secs(secs)
    }

    /// Drive the countdown on a tokio interval, calling `on_second` each
    /// time the displayed value changes. Returns when the time is up.
    pub async fn run(&mut self, period: Duration, mut on_second: impl FnMut(&Countdown)) {
        let mut interval = tokio::time::interval(period);
        let mut shown = self.display();
        on_second(&*self);

        while self.running {
            interval.tick().await;
            self.tick();
            let current = self.display();
            if current != shown {
                shown = current;
                on_second(&*self);
            }
        }
        tracing::debug!(id = %self.id, "countdown finished");
    }
}
