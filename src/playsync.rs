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
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Waits shorter than this are finished by spinning instead of parking, for accuracy.
const SPIN_THRESHOLD: Duration = Duration::from_millis(2);

/// Represents the current gate state.
#[derive(PartialEq, Clone, Copy, Debug)]
enum GateState {
    Running,
    Paused,
    Stopped,
}

/// How a timed wait ended.
#[derive(PartialEq, Debug)]
pub enum Wait {
    /// The deadline was reached.
    Reached,
    /// The gate was paused before the deadline.
    Paused,
    /// The gate was stopped before the deadline.
    Stopped,
}

/// A play gate is handed to a timing loop for one playback session. The scheduler pauses,
/// resumes and stops the session through it; the loop is responsible for respecting it.
/// A stopped gate never runs again.
#[derive(Clone)]
pub struct PlayGate {
    state: Arc<Mutex<GateState>>,
    condvar: Arc<Condvar>,
}

impl PlayGate {
    /// Creates a new, running play gate.
    pub fn new() -> PlayGate {
        PlayGate {
            state: Arc::new(Mutex::new(GateState::Running)),
            condvar: Arc::new(Condvar::new()),
        }
    }

    /// Returns true if the gate has been stopped.
    pub fn is_stopped(&self) -> bool {
        *self.state.lock() == GateState::Stopped
    }

    /// Returns true if the gate is paused.
    pub fn is_paused(&self) -> bool {
        *self.state.lock() == GateState::Paused
    }

    /// Pauses a running gate. Returns true if the gate was running.
    pub fn pause(&self) -> bool {
        self.transition(GateState::Running, GateState::Paused)
    }

    /// Resumes a paused gate. Returns true if the gate was paused.
    pub fn resume(&self) -> bool {
        self.transition(GateState::Paused, GateState::Running)
    }

    /// Stops the gate. Stopping also releases a pause, so a paused waiter observes the stop.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if *state != GateState::Stopped {
            *state = GateState::Stopped;
            self.condvar.notify_all();
        }
    }

    fn transition(&self, from: GateState, to: GateState) -> bool {
        let mut state = self.state.lock();
        if *state != from {
            return false;
        }
        *state = to;
        self.condvar.notify_all();
        true
    }

    /// Blocks while the gate is paused, waking at least every poll interval. Returns the time
    /// spent paused, or None if the gate was stopped.
    pub fn wait_while_paused(&self, poll: Duration) -> Option<Duration> {
        let mut paused_at = None;
        let mut state = self.state.lock();
        loop {
            match *state {
                GateState::Stopped => return None,
                GateState::Running => {
                    return Some(paused_at.map_or(Duration::ZERO, |at: Instant| at.elapsed()))
                }
                GateState::Paused => {
                    paused_at.get_or_insert_with(Instant::now);
                    let _ = self.condvar.wait_for(&mut state, poll);
                }
            }
        }
    }

    /// Blocks until the deadline unless the gate is paused or stopped first.
    pub fn wait_until(&self, deadline: Instant) -> Wait {
        let mut state = self.state.lock();
        loop {
            match *state {
                GateState::Stopped => return Wait::Stopped,
                GateState::Paused => return Wait::Paused,
                GateState::Running => {}
            }

            let now = Instant::now();
            if now + SPIN_THRESHOLD >= deadline {
                break;
            }
            let _ = self.condvar.wait_until(&mut state, deadline - SPIN_THRESHOLD);
        }
        drop(state);

        spin_sleep::sleep(deadline.saturating_duration_since(Instant::now()));
        Wait::Reached
    }
}

#[cfg(test)]
mod test {
    use std::{
        thread,
        time::{Duration, Instant},
    };

    use super::*;

    #[test]
    fn test_play_gate_transitions() {
        let gate = PlayGate::new();
        assert!(!gate.is_paused());
        assert!(!gate.resume());
        assert!(gate.pause());
        assert!(gate.is_paused());
        assert!(!gate.pause());
        assert!(gate.resume());
        assert!(!gate.is_paused());

        gate.pause();
        gate.stop();
        assert!(gate.is_stopped());
        assert!(!gate.is_paused());
        assert!(!gate.pause());
        assert!(!gate.resume());
    }

    #[test]
    fn test_wait_until_reached() {
        let gate = PlayGate::new();
        let deadline = Instant::now() + Duration::from_millis(30);
        assert_eq!(Wait::Reached, gate.wait_until(deadline));
        assert!(Instant::now() >= deadline);

        // A deadline in the past returns immediately.
        assert_eq!(Wait::Reached, gate.wait_until(Instant::now()));
    }

    #[test]
    fn test_wait_until_stopped() {
        let gate = PlayGate::new();
        let join = {
            let gate = gate.clone();
            thread::spawn(move || gate.wait_until(Instant::now() + Duration::from_secs(30)))
        };

        thread::sleep(Duration::from_millis(20));
        gate.stop();
        assert_eq!(Wait::Stopped, join.join().expect("waiter panicked"));
    }

    #[test]
    fn test_wait_until_paused() {
        let gate = PlayGate::new();
        let join = {
            let gate = gate.clone();
            thread::spawn(move || gate.wait_until(Instant::now() + Duration::from_secs(30)))
        };

        thread::sleep(Duration::from_millis(20));
        gate.pause();
        assert_eq!(Wait::Paused, join.join().expect("waiter panicked"));
    }

    #[test]
    fn test_wait_while_paused() {
        let gate = PlayGate::new();
        assert_eq!(Some(Duration::ZERO), gate.wait_while_paused(Duration::from_millis(5)));

        gate.pause();
        let join = {
            let gate = gate.clone();
            thread::spawn(move || gate.wait_while_paused(Duration::from_millis(5)))
        };
        thread::sleep(Duration::from_millis(50));
        gate.resume();
        let paused = join.join().expect("waiter panicked");
        assert!(paused.is_some_and(|paused| paused >= Duration::from_millis(30)));

        gate.pause();
        let join = {
            let gate = gate.clone();
            thread::spawn(move || gate.wait_while_paused(Duration::from_millis(5)))
        };
        thread::sleep(Duration::from_millis(20));
        gate.stop();
        assert_eq!(None, join.join().expect("waiter panicked"));
    }
}
