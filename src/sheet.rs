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
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use encoding_rs::{Encoding, GBK};

use crate::actuator::Chord;
use crate::config;
use crate::util;

/// The tempo that note offsets are written against.
pub const BASE_TEMPO: u32 = 120;

const UNKNOWN_NAME: &str = "Unknown";

/// Errors that can occur while reading a sheet.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("sheet is not valid UTF-8, UTF-16 or GBK text")]
    Encoding,

    #[error("unable to parse sheet: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("sheet document contains no sheet")]
    Empty,
}

/// A single timed key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    offset_ms: u64,
    symbol: String,
}

impl Note {
    pub fn new(offset_ms: u64, symbol: &str) -> Note {
        Note {
            offset_ms,
            symbol: symbol.to_string(),
        }
    }

    pub fn offset_ms(&self) -> u64 {
        self.offset_ms
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

/// All of the notes sharing one offset. A group is always emitted as one press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    offset_ms: u64,
    symbols: Chord,
}

impl Group {
    pub fn offset_ms(&self) -> u64 {
        self.offset_ms
    }

    pub fn symbols(&self) -> &Chord {
        &self.symbols
    }
}

/// A parsed piece. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Sheet {
    /// The name of the piece.
    name: String,
    /// The author of the original piece.
    author: Option<String>,
    /// The person who transcribed the piece.
    transcriber: Option<String>,
    /// The tempo the sheet should be played at.
    tempo: u32,
    /// The notes in insertion order.
    notes: Vec<Note>,
    /// The offset of the last note.
    duration_ms: u64,
}

impl Sheet {
    /// Creates a new sheet. A tempo of zero is treated as the base tempo.
    pub fn new(
        name: &str,
        author: Option<String>,
        transcriber: Option<String>,
        tempo: u32,
        notes: Vec<Note>,
    ) -> Sheet {
        let duration_ms = notes.iter().map(|note| note.offset_ms).max().unwrap_or(0);
        Sheet {
            name: name.to_string(),
            author,
            transcriber,
            tempo: if tempo == 0 { BASE_TEMPO } else { tempo },
            notes,
            duration_ms,
        }
    }

    /// Reads and parses the sheet file at the given path.
    pub fn load(path: &Path) -> Result<Sheet, SheetError> {
        let bytes = fs::read(path).map_err(|source| SheetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Sheet::parse(&decode(&bytes)?)
    }

    /// Parses a sheet from its JSON text.
    pub fn parse(text: &str) -> Result<Sheet, SheetError> {
        let document: config::sheet::Document = serde_json::from_str(text)?;
        let sheet = document.into_sheet().ok_or(SheetError::Empty)?;

        Ok(Sheet::new(
            sheet.name().unwrap_or(UNKNOWN_NAME),
            sheet.author().map(str::to_string),
            sheet.transcriber().map(str::to_string),
            sheet.bpm().unwrap_or(BASE_TEMPO),
            sheet
                .notes()
                .iter()
                .map(|note| Note::new(note.time(), note.key()))
                .collect(),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn transcriber(&self) -> Option<&str> {
        self.transcriber.as_deref()
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// The offset of the last note in milliseconds, or zero for an empty sheet.
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// The unscaled duration of the sheet.
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// The factor note offsets are scaled by to honor the tempo.
    pub fn tempo_factor(&self) -> f64 {
        if self.tempo == 0 {
            return 1.0;
        }
        f64::from(BASE_TEMPO) / f64::from(self.tempo)
    }

    /// Collapses the notes into groups of simultaneous notes, sorted by offset.
    pub fn groups(&self) -> Vec<Group> {
        let mut by_offset: BTreeMap<u64, Chord> = BTreeMap::new();
        for note in self.notes.iter() {
            by_offset
                .entry(note.offset_ms)
                .or_default()
                .insert(note.symbol.clone());
        }

        by_offset
            .into_iter()
            .map(|(offset_ms, symbols)| Group { offset_ms, symbols })
            .collect()
    }
}

impl fmt::Display for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Tempo: {}, Notes: {}, Duration: {})",
            self.name,
            self.tempo,
            self.notes.len(),
            util::duration_minutes_seconds(self.duration()),
        )?;
        if let Some(author) = &self.author {
            write!(f, " by {}", author)?;
        }
        Ok(())
    }
}

/// Decodes sheet bytes. A byte order mark selects UTF-8 or UTF-16. Without one the text is
/// strict UTF-8, or GBK for sheets saved by Chinese-locale editors.
fn decode(bytes: &[u8]) -> Result<String, SheetError> {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        return decode_strict(encoding, &bytes[bom_length..]);
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }
    decode_strict(GBK, bytes)
}

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, SheetError> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(SheetError::Encoding);
    }
    Ok(text.into_owned())
}
