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
    io::{self, Write},
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use parking_lot::Mutex;
use tracing::{info, span, Level};

use super::{keymap, Chord};

/// The configuration name of the terminal device.
pub const NAME: &str = "terminal";

/// A device that "presses" keys by writing them to a terminal, one chord per line. The
/// chord is held for the press duration before the call returns, like a real key press.
pub struct Device {
    writer: Mutex<Box<dyn Write + Send>>,
    press_duration: Duration,
    acquired: AtomicBool,
}

impl Device {
    /// Creates a terminal device writing to standard output.
    pub fn new(press_duration: Duration) -> Device {
        Device::with_writer(Box::new(io::stdout()), press_duration)
    }

    /// Creates a terminal device writing to the given writer.
    pub fn with_writer(writer: Box<dyn Write + Send>, press_duration: Duration) -> Device {
        Device {
            writer: Mutex::new(writer),
            press_duration,
            acquired: AtomicBool::new(false),
        }
    }
}

impl super::Device for Device {
    fn acquire(&self) -> Result<(), Box<dyn Error>> {
        let span = span!(Level::INFO, "terminal device");
        let _enter = span.enter();

        self.writer.lock().flush()?;
        if !self.acquired.swap(true, Ordering::Relaxed) {
            info!("Terminal acquired.");
        }
        Ok(())
    }

    fn press(&self, symbols: &Chord) -> Result<(), Box<dyn Error>> {
        let keys = keymap::keys_for(symbols);
        if keys.is_empty() {
            return Ok(());
        }

        {
            let mut writer = self.writer.lock();
            let line = keys
                .iter()
                .map(|key| key.to_string())
                .collect::<Vec<String>>()
                .join(" ");
            writeln!(writer, "{}", line)?;
            writer.flush()?;
        }

        // Hold the chord down.
        thread::sleep(self.press_duration);
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", NAME)
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, io, sync::Arc, time::Duration};

    use parking_lot::Mutex;

    use crate::actuator::{Chord, Device as _};

    use super::Device;

    /// A writer that can be inspected after it has been handed to the device.
    #[derive(Clone, Default)]
    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn chord(symbols: &[&str]) -> Chord {
        symbols.iter().map(|symbol| symbol.to_string()).collect()
    }

    #[test]
    fn test_terminal_press() -> Result<(), Box<dyn Error>> {
        let writer = SharedWriter::default();
        let device = Device::with_writer(Box::new(writer.clone()), Duration::ZERO);

        device.acquire()?;
        device.press(&chord(&["1Key0", "1Key1"]))?;
        device.press(&chord(&["Unknown"]))?;
        device.press(&chord(&["2Key14"]))?;

        let written = String::from_utf8(writer.0.lock().clone())?;
        assert_eq!("y u\n/\n", written);
        Ok(())
    }
}
