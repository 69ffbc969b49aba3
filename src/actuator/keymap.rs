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

//! Maps sheet symbols onto the keys of a 15-key instrument laid out as three rows of five.

use super::Chord;

/// Keys in symbol index order: top row, middle row, bottom row.
const KEYS: [char; 15] = [
    'y', 'u', 'i', 'o', 'p',
    'h', 'j', 'k', 'l', ';',
    'n', 'm', ',', '.', '/',
];

/// Sheets number their keys per instrument. Both instrument prefixes share one layout.
const SYMBOL_PREFIXES: [&str; 2] = ["1Key", "2Key"];

/// Returns the key for the given symbol, if the symbol is known.
pub fn key_for(symbol: &str) -> Option<char> {
    let index = SYMBOL_PREFIXES
        .iter()
        .find_map(|prefix| symbol.strip_prefix(prefix))?;
    let index: usize = index.parse().ok()?;
    KEYS.get(index).copied()
}

/// Returns the keys for a chord, dropping unknown symbols and duplicates.
pub fn keys_for(chord: &Chord) -> Vec<char> {
    let mut keys: Vec<char> = Vec::with_capacity(chord.len());
    for key in chord.iter().filter_map(|symbol| key_for(symbol)) {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
