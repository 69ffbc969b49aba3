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
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, Level};

use super::Message;

/// The sender used for lines that don't name one.
const ANONYMOUS: &str = "anonymous";

enum Input {
    Stdin,
    File(PathBuf),
}

/// A driver that reads "sender: text" lines, one message per line.
pub struct Driver {
    input: Input,
}

impl Driver {
    /// Reads messages typed on standard input.
    pub fn stdin() -> Driver {
        Driver {
            input: Input::Stdin,
        }
    }

    /// Replays a message log, then closes.
    pub fn file(path: &str) -> Driver {
        Driver {
            input: Input::File(PathBuf::from(path)),
        }
    }

    fn relay_lines<R>(messages_tx: &Sender<Message>, reader: R) -> Result<(), io::Error>
    where
        R: BufRead,
    {
        for line in reader.lines() {
            let Some(message) = parse_line(&line?) else {
                continue;
            };
            messages_tx
                .blocking_send(message)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        }
        Ok(())
    }
}

/// Splits a line into a message. Blank lines carry no message.
pub fn parse_line(line: &str) -> Option<Message> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (sender, text) = match line.split_once(':') {
        Some((sender, text)) if !sender.trim().is_empty() => (sender.trim(), text.trim()),
        Some((_, text)) => (ANONYMOUS, text.trim()),
        None => (ANONYMOUS, line),
    };
    Some(Message {
        sender: sender.to_string(),
        text: text.to_string(),
    })
}

impl super::Driver for Driver {
    fn monitor_messages(&self, messages_tx: Sender<Message>) -> JoinHandle<Result<(), io::Error>> {
        let file = match &self.input {
            Input::Stdin => None,
            Input::File(path) => Some(path.clone()),
        };

        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "lines driver");
            let _enter = span.enter();

            match file {
                Some(path) => {
                    info!(path = ?path, "Replaying messages.");
                    Self::relay_lines(&messages_tx, BufReader::new(File::open(path)?))
                }
                None => {
                    info!("Reading messages from stdin.");
                    Self::relay_lines(&messages_tx, io::stdin().lock())
                }
            }
        })
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs, io};

    use tokio::sync::mpsc;

    use crate::source::{Driver as _, Message};

    use super::{parse_line, Driver};

    fn message(sender: &str, text: &str) -> Option<Message> {
        Some(Message {
            sender: sender.to_string(),
            text: text.to_string(),
        })
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(message("alice", "request foo"), parse_line("alice: request foo"));
        assert_eq!(message("alice", "a: b"), parse_line("  alice :a: b  "));
        assert_eq!(message("anonymous", "skip"), parse_line("skip"));
        assert_eq!(message("anonymous", "queue"), parse_line(": queue"));
        assert_eq!(None, parse_line("   "));
    }

    #[test]
    fn test_relay_lines() -> Result<(), io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Message>(8);
        Driver::relay_lines(&sender, "alice: play foo\n\nbob: queue\n".as_bytes())?;
        drop(sender);

        assert_eq!(message("alice", "play foo"), receiver.blocking_recv());
        assert_eq!(message("bob", "queue"), receiver.blocking_recv());
        assert_eq!(None, receiver.blocking_recv());
        Ok(())
    }

    #[tokio::test]
    async fn test_file_driver() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("messages.log");
        fs::write(&path, "alice: request foo\nbob: skip\n")?;

        let (sender, mut receiver) = mpsc::channel::<Message>(1);
        let handle = Driver::file(&path.to_string_lossy()).monitor_messages(sender);

        let mut received = Vec::new();
        while let Some(message) = receiver.recv().await {
            received.push(message);
        }
        handle.await??;
        assert_eq!(
            vec![message("alice", "request foo"), message("bob", "skip")],
            received.into_iter().map(Some).collect::<Vec<_>>()
        );

        let (sender, _receiver) = mpsc::channel::<Message>(1);
        let handle = Driver::file(&dir.path().join("missing.log").to_string_lossy())
            .monitor_messages(sender);
        assert!(handle.await?.is_err());
        Ok(())
    }
}
