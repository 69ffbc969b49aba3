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
    io,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::{Mutex, RwLock};
use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{debug, error, info, span, warn, Level, Span};

use crate::{
    actuator,
    playsync::{PlayGate, Wait},
    sheet::Sheet,
};

/// Errors surfaced to direct callers of the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("no sheet loaded")]
    NoSheetLoaded,

    #[error("actuator unavailable: {0}")]
    ActuatorUnavailable(String),

    #[error("cannot load a sheet while {0} is playing")]
    AlreadyPlaying(String),

    #[error("unable to start the timing loop: {0}")]
    Spawn(#[from] io::Error),
}

/// Receives notifications from the timing loop. Both methods are called on the timing
/// loop's thread, never on the thread that called play or stop.
pub trait PlaybackListener: Send + Sync {
    /// Called after each group has been pressed, with the number of groups pressed so far.
    fn on_progress(&self, _current: usize, _total: usize) {}

    /// Called once when a sheet plays to the end. Never called for a stopped sheet.
    fn on_complete(&self) {}
}

/// A listener that ignores everything.
pub struct NoopListener;

impl PlaybackListener for NoopListener {}

/// Timing options for the scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// How often a paused timing loop wakes up to check for a stop.
    pub pause_poll: Duration,
    /// How long stop waits for the timing loop to exit.
    pub stop_timeout: Duration,
    /// Priority (0-99) to give the timing loop thread.
    pub thread_priority: Option<u8>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            pause_poll: Duration::from_millis(50),
            stop_timeout: Duration::from_secs(1),
            thread_priority: None,
        }
    }
}

/// One running timing loop.
struct Session {
    /// Identifies the session so a loop can tell whether it is still the current one.
    id: u64,
    gate: PlayGate,
    /// Receives once the timing loop has exited.
    done: Receiver<()>,
    join: thread::JoinHandle<()>,
}

struct State {
    sheet: Option<Arc<Sheet>>,
    /// Index of the next group to press.
    cursor: usize,
    /// Number of groups in the loaded sheet.
    total: usize,
    session: Option<Session>,
    next_session_id: u64,
}

impl State {
    fn is_current(&self, id: u64) -> bool {
        self.session.as_ref().is_some_and(|session| session.id == id)
    }
}

/// Plays one sheet at a time against an actuator, pressing each group of notes at its
/// scheduled offset on a dedicated timing thread.
pub struct Scheduler {
    /// The device to press keys through.
    device: Arc<dyn actuator::Device>,
    /// Progress and completion listener.
    listener: Arc<RwLock<Arc<dyn PlaybackListener>>>,
    /// Sheet, cursor and session. Shared with the timing loop.
    state: Arc<Mutex<State>>,
    options: Options,
    /// The logging span.
    span: Span,
}

impl Scheduler {
    /// Creates a new, idle scheduler.
    pub fn new(device: Arc<dyn actuator::Device>, options: Options) -> Scheduler {
        Scheduler {
            device,
            listener: Arc::new(RwLock::new(Arc::new(NoopListener))),
            state: Arc::new(Mutex::new(State {
                sheet: None,
                cursor: 0,
                total: 0,
                session: None,
                next_session_id: 0,
            })),
            options,
            span: span!(Level::INFO, "scheduler"),
        }
    }

    /// Replaces the progress and completion listener.
    pub fn set_listener(&self, listener: Arc<dyn PlaybackListener>) {
        *self.listener.write() = listener;
    }

    /// Loads a sheet and rewinds to its start. Does not start playback.
    pub fn load(&self, sheet: Arc<Sheet>) -> Result<(), SchedulerError> {
        let _enter = self.span.enter();

        let mut state = self.state.lock();
        if state.session.is_some() {
            let current = state
                .sheet
                .as_ref()
                .map(|sheet| sheet.name().to_string())
                .unwrap_or_default();
            return Err(SchedulerError::AlreadyPlaying(current));
        }

        info!(sheet = sheet.name(), tempo = sheet.tempo(), "Loading sheet.");
        state.total = sheet.groups().len();
        state.cursor = 0;
        state.sheet = Some(sheet);
        Ok(())
    }

    /// Starts playback of the loaded sheet, or resumes it if it is paused. Playing an
    /// already playing sheet does nothing.
    pub fn play(&self) -> Result<(), SchedulerError> {
        let _enter = self.span.enter();

        let mut state = self.state.lock();
        let sheet = match &state.sheet {
            Some(sheet) => sheet.clone(),
            None => return Err(SchedulerError::NoSheetLoaded),
        };

        if let Some(session) = &state.session {
            if session.gate.resume() {
                info!(sheet = sheet.name(), "Resuming playback.");
            } else {
                info!(sheet = sheet.name(), "Scheduler is already playing.");
            }
            return Ok(());
        }

        self.device
            .acquire()
            .map_err(|e| SchedulerError::ActuatorUnavailable(e.to_string()))?;

        state.next_session_id += 1;
        let id = state.next_session_id;
        let gate = PlayGate::new();
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
        let timing_loop = TimingLoop {
            id,
            sheet: sheet.clone(),
            device: self.device.clone(),
            listener: self.listener.clone(),
            state: self.state.clone(),
            gate: gate.clone(),
            options: self.options,
        };

        let join = thread::Builder::new()
            .name("timing loop".to_string())
            .spawn(move || {
                timing_loop.run();
                // The receiver may already be gone if nobody is waiting.
                let _ = done_tx.send(());
            })?;

        info!(sheet = sheet.name(), groups = state.total, "Starting playback.");
        state.session = Some(Session {
            id,
            gate,
            done: done_rx,
            join,
        });
        Ok(())
    }

    /// Pauses playback in place. Does nothing if nothing is playing.
    pub fn pause(&self) {
        let _enter = self.span.enter();

        let state = self.state.lock();
        if let Some(session) = &state.session {
            if session.gate.pause() {
                info!(cursor = state.cursor, "Pausing playback.");
            }
        }
    }

    /// Resumes paused playback. Does nothing if playback is not paused.
    pub fn resume(&self) {
        let _enter = self.span.enter();

        let state = self.state.lock();
        if let Some(session) = &state.session {
            if session.gate.resume() {
                info!(cursor = state.cursor, "Resuming playback.");
            }
        }
    }

    /// Stops playback, rewinds to the start and waits a bounded time for the timing loop to
    /// exit. A stop is not a completion: the completion listener is not called. Stopping an
    /// idle scheduler does nothing.
    pub fn stop(&self) {
        let _enter = self.span.enter();

        let session = {
            let mut state = self.state.lock();
            state.cursor = 0;
            state.session.take()
        };

        let Some(session) = session else {
            info!("Scheduler is not active, nothing to stop.");
            return;
        };

        info!("Stopping playback.");
        session.gate.stop();

        // A listener may stop playback from the timing loop itself.
        if session.join.thread().id() == thread::current().id() {
            return;
        }

        match session.done.recv_timeout(self.options.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if session.join.join().is_err() {
                    error!("Timing loop panicked.");
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    timeout = ?self.options.stop_timeout,
                    "Timing loop did not exit in time, leaving it to finish on its own."
                );
            }
        }
    }

    /// Returns true if a sheet is playing or paused.
    pub fn is_playing(&self) -> bool {
        self.state.lock().session.is_some()
    }

    /// Returns true if playback is paused.
    pub fn is_paused(&self) -> bool {
        self.state
            .lock()
            .session
            .as_ref()
            .is_some_and(|session| session.gate.is_paused())
    }

    /// Returns the number of groups pressed so far and the total number of groups.
    pub fn position(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.cursor, state.total)
    }

    /// Returns the loaded sheet.
    pub fn sheet(&self) -> Option<Arc<Sheet>> {
        self.state.lock().sheet.clone()
    }
}

/// Everything the timing thread needs for one session.
struct TimingLoop {
    id: u64,
    sheet: Arc<Sheet>,
    device: Arc<dyn actuator::Device>,
    listener: Arc<RwLock<Arc<dyn PlaybackListener>>>,
    state: Arc<Mutex<State>>,
    gate: PlayGate,
    options: Options,
}

impl TimingLoop {
    fn run(self) {
        let span = span!(Level::INFO, "timing loop", sheet = self.sheet.name());
        let _enter = span.enter();

        self.raise_priority();

        let groups = self.sheet.groups();
        let total = groups.len();
        if total == 0 {
            self.complete();
            return;
        }

        let factor = self.sheet.tempo_factor();
        let scaled = |offset_ms: u64| Duration::from_secs_f64(offset_ms as f64 * factor / 1000.0);

        let start_index = self.state.lock().cursor.min(total);
        let mut anchor = Instant::now();
        if start_index > 0 {
            // Keep the spacing from the last pressed group.
            let elapsed = scaled(groups[start_index - 1].offset_ms());
            anchor = anchor.checked_sub(elapsed).unwrap_or(anchor);
        }

        for (index, group) in groups.iter().enumerate().skip(start_index) {
            loop {
                match self.gate.wait_while_paused(self.options.pause_poll) {
                    // Paused time is not part of the sheet. Moving the anchor keeps the
                    // remaining groups at their written spacing instead of bursting them out.
                    Some(paused) => anchor += paused,
                    None => {
                        info!(cursor = index, "Playback stopped.");
                        return;
                    }
                }

                match self.gate.wait_until(anchor + scaled(group.offset_ms())) {
                    Wait::Reached => break,
                    Wait::Paused => continue,
                    Wait::Stopped => {
                        info!(cursor = index, "Playback stopped.");
                        return;
                    }
                }
            }

            if let Err(e) = self.device.press(group.symbols()) {
                error!(
                    err = e.as_ref(),
                    offset_ms = group.offset_ms(),
                    "Error pressing keys."
                );
            }

            {
                let mut state = self.state.lock();
                if !state.is_current(self.id) {
                    return;
                }
                state.cursor = index + 1;
            }

            debug!(current = index + 1, total, "Pressed group.");
            self.listener().on_progress(index + 1, total);
        }

        self.complete();
    }

    /// Marks the session finished and notifies the listener, unless the session was stopped.
    fn complete(&self) {
        let finished = {
            let mut state = self.state.lock();
            if state.is_current(self.id) {
                state.session = None;
                state.cursor = 0;
                true
            } else {
                false
            }
        };

        if finished {
            info!("Playback complete.");
            self.listener().on_complete();
        }
    }

    fn listener(&self) -> Arc<dyn PlaybackListener> {
        self.listener.read().clone()
    }

    fn raise_priority(&self) {
        let Some(priority) = self.options.thread_priority else {
            return;
        };

        match ThreadPriorityValue::try_from(priority) {
            Ok(value) => {
                if let Err(e) = set_current_thread_priority(ThreadPriority::Crossplatform(value)) {
                    warn!(error = %e, priority, "Failed to raise timing loop priority.");
                }
            }
            Err(e) => warn!(error = %e, priority, "Invalid timing loop priority."),
        }
    }
}
