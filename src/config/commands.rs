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
use serde::Deserialize;

const DEFAULT_REQUEST_PREFIXES: &[&str] = &["request ", "play ", "song "];
const DEFAULT_QUEUE: &str = "queue";
const DEFAULT_SKIP: &str = "skip";

/// The chat command vocabulary understood by the request dispatcher.
#[derive(Deserialize, Clone, Default)]
pub struct Commands {
    /// Prefixes that introduce a song request. The remainder of the message is the song name.
    request_prefixes: Option<Vec<String>>,
    /// The exact message that lists the pending requests.
    queue: Option<String>,
    /// The exact message that skips the current request.
    skip: Option<String>,
}

impl Commands {
    /// Creates a new command vocabulary.
    pub fn new(request_prefixes: &[&str], queue: &str, skip: &str) -> Commands {
        Commands {
            request_prefixes: Some(request_prefixes.iter().map(|p| p.to_string()).collect()),
            queue: Some(queue.to_string()),
            skip: Some(skip.to_string()),
        }
    }

    /// Gets the request prefixes.
    pub fn request_prefixes(&self) -> Vec<String> {
        match &self.request_prefixes {
            Some(prefixes) => prefixes.clone(),
            None => DEFAULT_REQUEST_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
        }
    }

    /// Gets the queue listing command.
    pub fn queue(&self) -> &str {
        self.queue.as_deref().unwrap_or(DEFAULT_QUEUE)
    }

    /// Gets the skip command.
    pub fn skip(&self) -> &str {
        self.skip.as_deref().unwrap_or(DEFAULT_SKIP)
    }
}
