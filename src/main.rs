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
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use clap::{crate_version, Parser, Subcommand};
use tokio::sync::{mpsc, Notify};
use tracing::warn;

use sheetplay::actuator;
use sheetplay::catalog::Catalog;
use sheetplay::scheduler::{self, PlaybackListener, Scheduler};
use sheetplay::sheet::Sheet;
use sheetplay::util;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Plays key sheets and serves a live song request queue."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists and verifies all sheets in the given directory.
    Sheets {
        /// The path to the sheet directory on disk.
        path: String,
    },
    /// Plays one sheet to the end. Type pause, resume, status or stop while it plays.
    Play {
        /// The name or catalog number of the sheet to play.
        song: Option<String>,
        /// Plays the sheet at this path instead of looking it up in the catalog.
        #[arg(short, long, conflicts_with = "song")]
        file: Option<String>,
        /// The path to the sheet directory.
        #[arg(short, long)]
        sheets: Option<String>,
        /// The actuator to press keys through.
        #[arg(short, long, default_value = "terminal")]
        device: String,
    },
    /// Starts serving song requests using the given player config.
    Live {
        /// The path to the player config.
        player_path: String,
    },
}

/// Prints progress on one line and signals when the sheet is done.
struct ConsoleListener {
    done: Notify,
}

impl PlaybackListener for ConsoleListener {
    fn on_progress(&self, current: usize, total: usize) {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "\r{}/{}", current, total);
        let _ = stdout.flush();
    }

    fn on_complete(&self) {
        self.done.notify_one();
    }
}

/// Forwards typed lines to the play loop. Runs on a plain thread so that waiting on stdin never
/// holds up shutdown.
fn read_controls() -> mpsc::Receiver<String> {
    let (lines_tx, lines_rx) = mpsc::channel(1);
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                return;
            };
            if lines_tx.blocking_send(line.trim().to_lowercase()).is_err() {
                return;
            }
        }
    });
    lines_rx
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sheets { path } => {
            let catalog = Catalog::new(&PathBuf::from(&path));
            let sheets = catalog.list();

            if sheets.is_empty() {
                println!("No sheets found in {}.", path.as_str());
                return Ok(());
            }

            println!("Sheets (count: {}):", sheets.len());
            for (i, sheet_path) in sheets.iter().enumerate() {
                match Sheet::load(sheet_path) {
                    Ok(sheet) => println!("{:>4}. {}", i + 1, sheet),
                    Err(e) => println!(
                        "{:>4}. {} (unable to load: {})",
                        i + 1,
                        util::stem_display(sheet_path),
                        e
                    ),
                }
            }
        }
        Commands::Play {
            song,
            file,
            sheets,
            device,
        } => {
            let path = match (file, song) {
                (Some(file), _) => PathBuf::from(file),
                (None, Some(song)) => {
                    let catalog =
                        Catalog::new(&sheetplay::config::sheets_dir(sheets.as_deref(), None));
                    let mut candidates = catalog.select(&song);
                    match candidates.len() {
                        0 => return Err(format!("no sheet matches {}", song).into()),
                        1 => candidates.remove(0),
                        _ => {
                            println!("{} matches more than one sheet:", song);
                            for candidate in candidates.iter() {
                                println!("- {}", util::stem_display(candidate));
                            }
                            return Err("ambiguous song name".into());
                        }
                    }
                }
                (None, None) => return Err("either a song or --file is required".into()),
            };

            let sheet = Arc::new(Sheet::load(&path)?);
            println!("Playing {}", sheet);
            if let Some(transcriber) = sheet.transcriber() {
                println!("Transcribed by {}", transcriber);
            }

            let device = actuator::get_device(&sheetplay::config::Actuator::new(&device))?;
            let scheduler = Scheduler::new(device, scheduler::Options::default());
            let listener = Arc::new(ConsoleListener {
                done: Notify::new(),
            });
            scheduler.set_listener(listener.clone());
            scheduler.load(sheet)?;
            scheduler.play()?;

            let mut controls = read_controls();
            loop {
                tokio::select! {
                    _ = listener.done.notified() => {
                        println!("\nDone.");
                        break;
                    }
                    result = tokio::signal::ctrl_c() => {
                        result?;
                        scheduler.stop();
                        println!("\nStopped.");
                        break;
                    }
                    Some(control) = controls.recv() => match control.as_str() {
                        "pause" => scheduler.pause(),
                        "resume" => scheduler.resume(),
                        "status" => {
                            let (current, total) = scheduler.position();
                            let name = scheduler
                                .sheet()
                                .map(|sheet| sheet.name().to_string())
                                .unwrap_or_default();
                            let state = if scheduler.is_paused() { "paused" } else { "playing" };
                            println!("{}: {}/{} ({})", name, current, total, state);
                        }
                        "stop" => {
                            scheduler.stop();
                            println!("Stopped.");
                            break;
                        }
                        "" => {}
                        other => warn!(input = other, "Unrecognized input"),
                    },
                }
            }
        }
        Commands::Live { player_path } => {
            sheetplay::config::init_live(&PathBuf::from(player_path))?
                .join()
                .await?;
        }
    }

    Ok(())
}
