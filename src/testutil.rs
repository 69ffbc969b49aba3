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
    fs,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::{
    scheduler::PlaybackListener,
    sheet::{Note, Sheet},
};

/// Wait for the given predicate to return true or fail.
pub fn eventually<F>(predicate: F, error_msg: &str)
where
    F: Fn() -> bool,
{
    let start = Instant::now();
    let tick = Duration::from_millis(10);
    let timeout = Duration::from_secs(3);

    loop {
        if start.elapsed() > timeout {
            panic!("{}", error_msg);
        }
        if predicate() {
            return;
        }
        thread::sleep(tick);
    }
}

/// Builds a sheet from (offset, symbol) pairs.
pub fn sheet(name: &str, tempo: u32, notes: &[(u64, &str)]) -> Sheet {
    Sheet::new(
        name,
        None,
        None,
        tempo,
        notes
            .iter()
            .map(|(offset_ms, symbol)| Note::new(*offset_ms, symbol))
            .collect(),
    )
}

/// Writes a sheet file with the given notes into the directory and returns its path.
pub fn write_sheet(dir: &Path, file_name: &str, notes: &[(u64, &str)]) -> PathBuf {
    let song_name = Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    let notes: Vec<serde_json::Value> = notes
        .iter()
        .map(|(time, key)| serde_json::json!({"time": time, "key": key}))
        .collect();
    let document = serde_json::json!([{
        "songName": song_name,
        "bpm": 120,
        "songNotes": notes,
    }]);

    let path = dir.join(file_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("unable to create sheet directory");
    }
    fs::write(&path, document.to_string()).expect("unable to write sheet");
    path
}

/// A playback listener that records what it was told.
#[derive(Default)]
pub struct RecordingListener {
    progress: Mutex<Vec<(usize, usize)>>,
    completions: Mutex<usize>,
}

impl RecordingListener {
    pub fn progress(&self) -> Vec<(usize, usize)> {
        self.progress.lock().clone()
    }

    pub fn completions(&self) -> usize {
        *self.completions.lock()
    }
}

impl PlaybackListener for RecordingListener {
    fn on_progress(&self, current: usize, total: usize) {
        self.progress.lock().push((current, total));
    }

    fn on_complete(&self) {
        *self.completions.lock() += 1;
    }
}
