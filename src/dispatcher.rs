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
    collections::VecDeque,
    fmt,
    path::PathBuf,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;
use tracing::{debug, error, info, span, warn, Level, Span};

use crate::{
    catalog::Catalog,
    config,
    scheduler::{PlaybackListener, Scheduler, SchedulerError},
    sheet::{Sheet, SheetError},
    util,
};

/// A resolved song waiting to be played.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// The display name of the song.
    pub song_name: String,
    /// Who asked for it.
    pub requester: String,
    /// The sheet file the name resolved to.
    pub path: PathBuf,
}

/// The outcome of handling one message.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    /// The song was added to the queue at the given 1-based position.
    Queued { song_name: String, position: usize },
    /// Nothing in the catalog matched the requested name.
    NotFound { song_name: String },
    /// A snapshot of the pending requests.
    Queue(Vec<Request>),
    /// The current song was skipped.
    Skipped { song_name: Option<String> },
    /// Skip was asked for while nothing was playing.
    NothingToSkip,
    /// The message was not a command.
    Ignored,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Queued {
                song_name,
                position,
            } => write!(f, "Queued {} at position {}", song_name, position),
            Reply::NotFound { song_name } => write!(f, "No sheet found for {}", song_name),
            Reply::Queue(requests) if requests.is_empty() => write!(f, "The queue is empty"),
            Reply::Queue(requests) => {
                write!(f, "Queue:")?;
                for (i, request) in requests.iter().enumerate() {
                    write!(f, " {}. {} ({})", i + 1, request.song_name, request.requester)?;
                }
                Ok(())
            }
            Reply::Skipped {
                song_name: Some(song_name),
            } => write!(f, "Skipped {}", song_name),
            Reply::Skipped { song_name: None } => write!(f, "Skipped"),
            Reply::NothingToSkip => write!(f, "Nothing is playing"),
            Reply::Ignored => Ok(()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no sheet matches {0}")]
    SheetResolutionFailed(String),

    #[error("unable to load {path}: {source}")]
    SheetLoadFailed {
        path: PathBuf,
        #[source]
        source: SheetError,
    },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

struct Queue {
    /// Requests waiting to be played, oldest first.
    pending: VecDeque<Request>,
    /// The request currently handed to the scheduler.
    current: Option<Request>,
}

/// Turns chat messages into song requests and keeps the scheduler fed from a FIFO queue.
pub struct Dispatcher {
    scheduler: Arc<Scheduler>,
    catalog: Arc<Catalog>,
    commands: config::Commands,
    /// The pending queue and the in-flight request.
    queue: Mutex<Queue>,
    /// Held for the duration of an advance so that only one thread starts the next request.
    advancing: Mutex<()>,
    span: Span,
}

impl Dispatcher {
    /// Creates a dispatcher and registers it as the scheduler's listener, so finished songs
    /// advance the queue.
    pub fn new(
        scheduler: Arc<Scheduler>,
        catalog: Arc<Catalog>,
        commands: config::Commands,
    ) -> Arc<Dispatcher> {
        let dispatcher = Arc::new(Dispatcher {
            scheduler,
            catalog,
            commands,
            queue: Mutex::new(Queue {
                pending: VecDeque::new(),
                current: None,
            }),
            advancing: Mutex::new(()),
            span: span!(Level::INFO, "dispatcher"),
        });

        dispatcher.scheduler.set_listener(Arc::new(Relay {
            dispatcher: Arc::downgrade(&dispatcher),
        }));
        dispatcher
    }

    /// Handles one inbound message.
    pub fn on_message(&self, sender: &str, text: &str) -> Reply {
        let _enter = self.span.enter();
        debug!(sender, text, "Message received.");

        for prefix in self.commands.request_prefixes() {
            if let Some(rest) = text.strip_prefix(prefix.as_str()) {
                let song_name = rest.trim();
                if song_name.is_empty() {
                    return Reply::Ignored;
                }
                return match self.request_song(song_name, sender) {
                    Ok((resolved, position)) => Reply::Queued {
                        song_name: resolved,
                        position,
                    },
                    Err(_) => Reply::NotFound {
                        song_name: song_name.to_string(),
                    },
                };
            }
        }

        let command = text.trim();
        if command == self.commands.queue() {
            Reply::Queue(self.queue())
        } else if command == self.commands.skip() {
            self.skip()
        } else {
            Reply::Ignored
        }
    }

    /// Resolves the name and queues the song. Returns the resolved song name and its 1-based
    /// position in the queue. Starts playback right away if the scheduler is idle.
    pub fn request_song(
        &self,
        name: &str,
        requester: &str,
    ) -> Result<(String, usize), DispatchError> {
        let _enter = self.span.enter();

        let Some(path) = self.catalog.resolve(name) else {
            let err = DispatchError::SheetResolutionFailed(name.to_string());
            warn!(requester, err = %err, "Request not found.");
            return Err(err);
        };

        let request = Request {
            song_name: util::stem_display(&path).to_string(),
            requester: requester.to_string(),
            path,
        };
        let song_name = request.song_name.clone();

        let position = {
            let mut queue = self.queue.lock();
            queue.pending.push_back(request);
            queue.pending.len()
        };
        info!(song = song_name, requester, position, "Request queued.");

        if !self.scheduler.is_playing() {
            self.advance("idle");
        }
        Ok((song_name, position))
    }

    /// Stops the current song and moves on to the next request. The rest of the queue is kept.
    /// The whole skip holds the advance lock, so a song finishing on its own at the same
    /// moment cannot start the next request only to have it stopped here.
    pub fn skip(&self) -> Reply {
        let _enter = self.span.enter();
        let _advancing = self.advancing.lock();

        if !self.scheduler.is_playing() {
            info!("Nothing to skip.");
            return Reply::NothingToSkip;
        }

        let song_name = self.current().map(|request| request.song_name);
        info!(song = ?song_name, "Skipping.");
        self.scheduler.stop();
        self.advance_locked("skip");
        Reply::Skipped { song_name }
    }

    /// The request currently handed to the scheduler.
    pub fn current(&self) -> Option<Request> {
        self.queue.lock().current.clone()
    }

    /// A snapshot of the pending requests, oldest first.
    pub fn queue(&self) -> Vec<Request> {
        self.queue.lock().pending.iter().cloned().collect()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().pending.len()
    }

    /// Called when the scheduler finishes a song on its own.
    fn finished(&self) {
        self.advance("complete");
    }

    /// Pops requests until one starts playing or the queue runs dry. Requests that fail to
    /// load are reported and dropped.
    fn advance(&self, reason: &str) {
        let _enter = self.span.enter();
        let _advancing = self.advancing.lock();
        self.advance_locked(reason);
    }

    /// Advances with the advance lock already held.
    fn advance_locked(&self, reason: &str) {
        if self.scheduler.is_playing() {
            debug!(reason, "Scheduler is busy, not advancing.");
            return;
        }

        loop {
            let request = {
                let mut queue = self.queue.lock();
                let next = queue.pending.pop_front();
                queue.current = next.clone();
                next
            };

            let Some(request) = request else {
                info!(reason, "Queue is empty, waiting for requests.");
                return;
            };

            match self.start(&request) {
                Ok(()) => {
                    info!(
                        reason,
                        song = request.song_name,
                        requester = request.requester,
                        "Playing request."
                    );
                    return;
                }
                Err(e) => {
                    error!(
                        err = %e,
                        song = request.song_name,
                        "Unable to play request, moving on."
                    );
                }
            }
        }
    }

    fn start(&self, request: &Request) -> Result<(), DispatchError> {
        let sheet = Sheet::load(&request.path).map_err(|source| DispatchError::SheetLoadFailed {
            path: request.path.clone(),
            source,
        })?;
        self.scheduler.load(Arc::new(sheet))?;
        self.scheduler.play()?;
        Ok(())
    }
}

/// Forwards scheduler notifications to the dispatcher without keeping it alive.
struct Relay {
    dispatcher: Weak<Dispatcher>,
}

impl PlaybackListener for Relay {
    fn on_progress(&self, current: usize, total: usize) {
        debug!(current, total, "Playback progress.");
    }

    fn on_complete(&self) {
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            dispatcher.finished();
        }
    }
}
