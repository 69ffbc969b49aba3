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
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::RwLock;
use tracing::{debug, error, info, span, Level, Span};

use crate::util;

/// The extension of sheet files.
const SHEET_EXTENSION: &str = "json";

/// A lazily built index of the sheet files under one directory. The index is built on first
/// use and kept until it is explicitly rebuilt.
pub struct Catalog {
    /// The directory the catalog covers.
    root: PathBuf,
    /// Sheet files in discovery order. None until first use.
    entries: RwLock<Option<Arc<Vec<PathBuf>>>>,
    /// The logging span.
    span: Span,
}

impl Catalog {
    /// Creates a catalog over the given directory. Nothing is read until first use.
    pub fn new(root: &Path) -> Catalog {
        Catalog {
            root: root.to_path_buf(),
            entries: RwLock::new(None),
            span: span!(Level::INFO, "catalog"),
        }
    }

    /// The directory the catalog covers.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists every sheet file in discovery order, building the index if needed.
    pub fn list(&self) -> Arc<Vec<PathBuf>> {
        if let Some(entries) = self.entries.read().as_ref() {
            return entries.clone();
        }

        let mut entries = self.entries.write();
        if let Some(entries) = entries.as_ref() {
            return entries.clone();
        }
        let built = Arc::new(self.discover());
        *entries = Some(built.clone());
        built
    }

    /// Rescans the directory and returns the number of sheets found.
    pub fn rebuild(&self) -> usize {
        let built = Arc::new(self.discover());
        let count = built.len();
        *self.entries.write() = Some(built);
        count
    }

    /// Resolves a song name to a sheet file. An exact, case-insensitive match on the file stem
    /// wins. Otherwise the shortest stem containing the query wins, with ties going to the
    /// first sheet discovered.
    pub fn resolve(&self, query: &str) -> Option<PathBuf> {
        let _enter = self.span.enter();

        let found = self
            .matches(query)
            .into_iter()
            .min_by_key(|path| util::stem_display(path).chars().count());
        debug!(query, path = ?found, "Resolved.");
        found
    }

    /// Returns every sheet a song name could mean, in discovery order. An exact,
    /// case-insensitive stem match is returned alone. Otherwise every stem containing the
    /// query is returned.
    pub fn matches(&self, query: &str) -> Vec<PathBuf> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let entries = self.list();
        let stems: Vec<(String, &PathBuf)> = entries
            .iter()
            .map(|path| (util::stem_display(path).to_lowercase(), path))
            .collect();

        if let Some((_, path)) = stems.iter().find(|(stem, _)| *stem == query) {
            return vec![(*path).clone()];
        }

        stems
            .iter()
            .filter(|(stem, _)| stem.contains(&query))
            .map(|(_, path)| (*path).clone())
            .collect()
    }

    /// Selects sheets either by 1-based position in the listing or by name. More than one
    /// sheet comes back only when a name is ambiguous.
    pub fn select(&self, selector: &str) -> Vec<PathBuf> {
        let selector = selector.trim();
        if let Ok(index) = selector.parse::<usize>() {
            if index > 0 {
                if let Some(path) = self.list().get(index - 1) {
                    return vec![path.clone()];
                }
            }
        }
        self.matches(selector)
    }

    fn discover(&self) -> Vec<PathBuf> {
        let _enter = self.span.enter();

        let mut found = Vec::new();
        if let Err(e) = discover_into(&self.root, &mut found) {
            error!(err = %e, root = ?self.root, "Error reading sheet directory.");
        }
        info!(root = ?self.root, sheets = found.len(), "Built catalog.");
        found
    }
}

/// Recurses into the directory, collecting sheet files in sorted order. Unreadable
/// subdirectories are logged and skipped.
fn discover_into(dir: &Path, found: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            // Skip .git subdirectories.
            if path.ends_with(".git") {
                continue;
            }
            if let Err(e) = discover_into(&path, found) {
                error!(err = %e, dir = ?path, "Error reading sheet directory.");
            }
            continue;
        }

        let is_sheet = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(SHEET_EXTENSION));
        if is_sheet {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs};

    use crate::testutil::write_sheet;

    use super::Catalog;

    #[test]
    fn test_exact_beats_substring() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        write_sheet(dir.path(), "foobar.json", &[(0, "1Key0")]);
        let foo = write_sheet(dir.path(), "foo.json", &[(0, "1Key0")]);
        let catalog = Catalog::new(dir.path());

        assert_eq!(Some(foo.clone()), catalog.resolve("foo"));
        assert_eq!(Some(foo), catalog.resolve("  FOO "));
        Ok(())
    }

    #[test]
    fn test_shortest_substring() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        write_sheet(dir.path(), "a long bar song.json", &[(0, "1Key0")]);
        let short = write_sheet(dir.path(), "bar song.json", &[(0, "1Key0")]);
        let catalog = Catalog::new(dir.path());

        assert_eq!(Some(short), catalog.resolve("Bar"));
        assert_eq!(None, catalog.resolve("missing"));
        assert_eq!(None, catalog.resolve("   "));
        Ok(())
    }

    #[test]
    fn test_tie_goes_to_first_discovered() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let barbaz = write_sheet(dir.path(), "barbaz.json", &[(0, "1Key0")]);
        write_sheet(dir.path(), "foobar.json", &[(0, "1Key0")]);
        let catalog = Catalog::new(dir.path());

        assert_eq!(Some(barbaz), catalog.resolve("bar"));
        Ok(())
    }

    #[test]
    fn test_discovery() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let nested = write_sheet(dir.path(), "nested/deep/tune.JSON", &[(0, "1Key0")]);
        let top = write_sheet(dir.path(), "top.json", &[(0, "1Key0")]);
        write_sheet(dir.path(), ".git/ignored.json", &[(0, "1Key0")]);
        fs::write(dir.path().join("notes.txt"), "not a sheet")?;

        let catalog = Catalog::new(dir.path());
        assert_eq!(vec![nested.clone(), top.clone()], *catalog.list());
        assert_eq!(vec![nested.clone()], catalog.select("1"));
        assert_eq!(vec![top.clone()], catalog.select("2"));
        assert!(catalog.select("3").is_empty());
        assert_eq!(vec![top.clone()], catalog.select("top"));
        assert_eq!(None, catalog.resolve("ignored"));

        // An ambiguous name selects every candidate; resolve still picks one.
        assert_eq!(vec![nested, top.clone()], catalog.select("t"));
        assert_eq!(Some(top), catalog.resolve("t"));
        Ok(())
    }

    #[test]
    fn test_cached_until_rebuild() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        write_sheet(dir.path(), "first.json", &[(0, "1Key0")]);
        let catalog = Catalog::new(dir.path());
        assert_eq!(1, catalog.list().len());

        let second = write_sheet(dir.path(), "second.json", &[(0, "1Key0")]);
        assert_eq!(None, catalog.resolve("second"));

        assert_eq!(2, catalog.rebuild());
        assert_eq!(Some(second), catalog.resolve("second"));
        Ok(())
    }

    #[test]
    fn test_missing_directory() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let catalog = Catalog::new(&dir.path().join("missing"));
        assert!(catalog.list().is_empty());
        assert_eq!(None, catalog.resolve("anything"));
        Ok(())
    }
}
