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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use parking_lot::Mutex;
use tracing::debug;

use super::Chord;

/// A press recorded by the mock device.
#[derive(Clone, Debug)]
pub struct Press {
    /// When the press happened.
    pub at: Instant,
    /// The symbols that were pressed.
    pub symbols: Chord,
}

/// A mock device. Doesn't actually press anything, but remembers every press.
#[derive(Clone)]
pub struct Device {
    name: String,
    available: Arc<AtomicBool>,
    presses: Arc<Mutex<Vec<Press>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            available: Arc::new(AtomicBool::new(true)),
            presses: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Controls whether acquiring the device succeeds.
    #[cfg(test)]
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Returns a copy of every press so far.
    #[cfg(test)]
    pub fn presses(&self) -> Vec<Press> {
        self.presses.lock().clone()
    }

    /// Returns the number of presses so far.
    #[cfg(test)]
    pub fn press_count(&self) -> usize {
        self.presses.lock().len()
    }

    /// Returns the symbols of every press so far, flattened in press order.
    #[cfg(test)]
    pub fn pressed_symbols(&self) -> Vec<String> {
        self.presses
            .lock()
            .iter()
            .flat_map(|press| press.symbols.iter().cloned())
            .collect()
    }
}

impl super::Device for Device {
    fn acquire(&self) -> Result<(), Box<dyn Error>> {
        if !self.available.load(Ordering::Relaxed) {
            return Err(format!("{} has no target", self.name).into());
        }
        Ok(())
    }

    fn press(&self, symbols: &Chord) -> Result<(), Box<dyn Error>> {
        debug!(device = self.name, symbols = ?symbols, "Pressing.");
        self.presses.lock().push(Press {
            at: Instant::now(),
            symbols: symbols.clone(),
        });
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}
