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
use std::io;
use std::sync::Arc;

use tokio::sync::mpsc::{self, Sender};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, span, Level};

use crate::config;
use crate::dispatcher::{Dispatcher, Reply};

pub mod lines;

/// One delivered chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// The display name of whoever sent the message.
    pub sender: String,
    pub text: String,
}

/// A source of chat messages. Connecting to and reconnecting to whatever transport carries the
/// messages is entirely up to the driver.
pub trait Driver: Send + Sync + 'static {
    fn monitor_messages(&self, messages_tx: Sender<Message>) -> JoinHandle<Result<(), io::Error>>;
}

/// Gets the driver for the configured message source.
pub fn driver(config: &config::Source) -> Arc<dyn Driver> {
    match config {
        config::Source::Stdin => Arc::new(lines::Driver::stdin()),
        config::Source::File(file) => Arc::new(lines::Driver::file(file.path())),
    }
}

/// Feeds messages from a driver into the dispatcher until the driver closes.
pub struct Live {
    handle: JoinHandle<()>,
}

impl Live {
    /// Starts relaying messages from the driver to the dispatcher.
    pub fn new(dispatcher: Arc<Dispatcher>, driver: Arc<dyn Driver>) -> Live {
        Live {
            handle: tokio::spawn(async move { Live::relay_messages(dispatcher, driver).await }),
        }
    }

    /// Join will block until the message source closes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Hands each message to the dispatcher in arrival order. The dispatcher may block on the
    /// scheduler, so each message is handled on a blocking thread and awaited before the next.
    async fn relay_messages(dispatcher: Arc<Dispatcher>, driver: Arc<dyn Driver>) {
        let span = span!(Level::INFO, "live");
        let _enter = span.enter();

        let (messages_tx, mut messages_rx) = mpsc::channel(1);
        let join_handle = driver.monitor_messages(messages_tx);

        info!("Waiting for requests.");

        while let Some(message) = messages_rx.recv().await {
            let dispatcher = dispatcher.clone();
            let sender = message.sender.clone();
            let reply = tokio::task::spawn_blocking(move || {
                dispatcher.on_message(&message.sender, &message.text)
            })
            .await;

            match reply {
                Ok(Reply::Ignored) => {}
                Ok(reply) => info!(sender, reply = reply.to_string(), "Replied."),
                Err(e) => error!("Error handling message: {}", e),
            }
        }

        info!("Message source closed.");
        match join_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Message source failed: {}", e),
            Err(e) => error!("Error waiting for message source to stop: {}", e),
        }
    }
}
