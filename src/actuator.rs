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
use std::{collections::BTreeSet, error::Error, fmt, sync::Arc};

use tracing::info;

use crate::config;

pub mod keymap;
pub mod mock;
pub mod terminal;

/// A set of symbols pressed simultaneously.
pub type Chord = BTreeSet<String>;

/// An actuator turns symbolic key presses into an effect on some external target.
pub trait Device: fmt::Display + std::marker::Send + std::marker::Sync {
    /// Acquires a live target for the device. Called before every playback session; an
    /// error here means there is nothing to play to.
    fn acquire(&self) -> Result<(), Box<dyn Error>>;

    /// Presses the given symbols as one chord. Returns once the press has completed.
    fn press(&self, symbols: &Chord) -> Result<(), Box<dyn Error>>;
}

/// Gets a device from the given configuration.
pub fn get_device(config: &config::Actuator) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device)));
    };

    let device: Arc<dyn Device> = match device {
        terminal::NAME => Arc::new(terminal::Device::new(config.press_duration()?)),
        _ => return Err(config::ConfigError::UnknownDevice(device.to_string()).into()),
    };
    info!(device = device.to_string(), "Using actuator.");
    Ok(device)
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use crate::config;

    use super::get_device;

    #[test]
    fn test_get_device() -> Result<(), Box<dyn Error>> {
        assert_eq!(
            "mock-keys (Mock)",
            get_device(&config::Actuator::new("mock-keys"))?.to_string()
        );
        assert_eq!(
            "terminal",
            get_device(&config::Actuator::new("terminal"))?.to_string()
        );
        assert!(get_device(&config::Actuator::new("window")).is_err());
        Ok(())
    }
}
