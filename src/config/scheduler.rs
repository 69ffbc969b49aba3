// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::time::Duration;

use serde::Deserialize;

use super::{duration::parse_duration, error::ConfigError};

const DEFAULT_PAUSE_POLL: Duration = Duration::from_millis(50);
const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// A YAML representation of the scheduler timing configuration.
#[derive(Deserialize, Clone, Default)]
pub struct Scheduler {
    /// How often a paused timing loop wakes up to check for a stop.
    pause_poll: Option<String>,
    /// How long stop waits for the timing loop to exit.
    stop_timeout: Option<String>,
}

impl Scheduler {
    /// Returns the pause polling interval.
    pub fn pause_poll(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.pause_poll, DEFAULT_PAUSE_POLL)
    }

    /// Returns the stop timeout.
    pub fn stop_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.stop_timeout, DEFAULT_STOP_TIMEOUT)
    }
}
