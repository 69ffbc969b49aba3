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

/// Allows users to specify where chat messages come from.
#[derive(Deserialize, Clone, Default, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Source {
    /// Reads "sender: text" lines from standard input.
    #[default]
    Stdin,
    /// Replays "sender: text" lines from a file.
    File(FileSource),
}

/// A message log to replay.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct FileSource {
    path: String,
}

impl FileSource {
    /// Gets the path of the message log.
    pub fn path(&self) -> &str {
        &self.path
    }
}
