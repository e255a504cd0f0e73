// SPDX-License-Identifier: MIT

//! The two timeouts a session driver races against its process's output
//! (§4.3): a hard wall clock from session start, and a silence timeout that
//! resets on every line.

use std::time::Duration;
use tokio::time::{sleep_until, Instant, Sleep};

pub struct SessionTimeouts {
    wall_deadline: Instant,
    silence_timeout: Duration,
}

impl SessionTimeouts {
    pub fn new(wall_timeout: Duration, silence_timeout: Duration) -> Self {
        Self { wall_deadline: Instant::now() + wall_timeout, silence_timeout }
    }

    pub fn wall_clock_sleep(&self) -> Sleep {
        sleep_until(self.wall_deadline)
    }

    /// A fresh sleep counting down from `last_activity`; call again after
    /// each line so the silence window keeps resetting.
    pub fn silence_sleep(&self, last_activity: Instant) -> Sleep {
        sleep_until(last_activity + self.silence_timeout)
    }
}

#[cfg(test)]
#[path = "timeout_tests.rs"]
mod tests;
