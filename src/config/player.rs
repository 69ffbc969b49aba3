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
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use super::actuator::Actuator;
use super::commands::Commands;
use super::error::ConfigError;
use super::scheduler::Scheduler;
use super::source::Source;

/// The configuration for the live request player.
#[derive(Deserialize, Clone)]
pub struct Player {
    /// The directory holding the sheet catalog.
    sheets: String,
    /// The actuator configuration.
    #[serde(default)]
    actuator: Actuator,
    /// The chat command vocabulary.
    #[serde(default)]
    commands: Commands,
    /// The scheduler timing configuration.
    #[serde(default)]
    scheduler: Scheduler,
    /// Where chat messages come from.
    #[serde(default)]
    source: Source,
}

impl Player {
    /// Parse a player configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Player, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Player>()?)
    }

    /// Gets the catalog directory, honoring the environment override.
    pub fn sheets(&self) -> PathBuf {
        super::sheets_dir(None, Some(&self.sheets))
    }

    pub fn actuator(&self) -> &Actuator {
        &self.actuator
    }

    pub fn commands(&self) -> &Commands {
        &self.commands
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn source(&self) -> &Source {
        &self.source
    }
}
