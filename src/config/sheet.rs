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

/// A JSON representation of a single note.
#[derive(Deserialize, Clone, Debug)]
pub struct Note {
    /// The offset of the note from the start of the sheet, in milliseconds.
    time: u64,
    /// The symbolic key to press.
    key: String,
}

impl Note {
    /// Gets the offset of the note in milliseconds.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Gets the symbolic key of the note.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// A JSON representation of a sheet. Several spellings of the metadata fields exist
/// in the wild, so all of them are accepted here and reconciled by the accessors.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    song_name: Option<String>,
    name: Option<String>,
    author: Option<String>,
    transcribed_by: Option<String>,
    transcriber: Option<String>,
    bpm: Option<u32>,
    #[serde(default)]
    song_notes: Vec<Note>,
}

/// Sheet files hold either a single sheet object or an array wrapping one.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum Document {
    Single(Sheet),
    Wrapped(Vec<Sheet>),
}

impl Document {
    /// Returns the sheet held by this document, if there is one.
    pub fn into_sheet(self) -> Option<Sheet> {
        match self {
            Document::Single(sheet) => Some(sheet),
            Document::Wrapped(sheets) => sheets.into_iter().next(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

impl Sheet {
    /// Gets the name of the sheet, preferring songName over name.
    pub fn name(&self) -> Option<&str> {
        non_empty(&self.song_name).or_else(|| non_empty(&self.name))
    }

    /// Gets the author of the original piece.
    pub fn author(&self) -> Option<&str> {
        non_empty(&self.author)
    }

    /// Gets the person who transcribed the sheet.
    pub fn transcriber(&self) -> Option<&str> {
        non_empty(&self.transcribed_by).or_else(|| non_empty(&self.transcriber))
    }

    /// Gets the declared tempo.
    pub fn bpm(&self) -> Option<u32> {
        self.bpm
    }

    /// Gets the notes of the sheet.
    pub fn notes(&self) -> &[Note] {
        &self.song_notes
    }
}
