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

const DEFAULT_DEVICE: &str = "terminal";
const DEFAULT_PRESS_DURATION: Duration = Duration::from_millis(50);
const MAX_THREAD_PRIORITY: u8 = 99;

/// A YAML representation of the actuator configuration.
#[derive(Deserialize, Clone, Default)]
pub struct Actuator {
    /// The actuator device. Names starting with "mock" select the recording mock.
    device: Option<String>,

    /// How long each chord is held down before it is released.
    press_duration: Option<String>,

    /// Priority (0-99) for the thread that times and emits the notes.
    thread_priority: Option<u8>,
}

impl Actuator {
    /// New will create a new actuator configuration.
    pub fn new(device: &str) -> Actuator {
        Actuator {
            device: Some(device.to_string()),
            press_duration: None,
            thread_priority: None,
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    /// Returns the press duration from the configuration.
    pub fn press_duration(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.press_duration, DEFAULT_PRESS_DURATION)
    }

    /// Returns the timing thread priority, if one was configured.
    pub fn thread_priority(&self) -> Result<Option<u8>, ConfigError> {
        match self.thread_priority {
            Some(priority) if priority > MAX_THREAD_PRIORITY => {
                Err(ConfigError::ThreadPriority(priority))
            }
            priority => Ok(priority),
        }
    }
}
