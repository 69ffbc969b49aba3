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
use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

pub mod actuator;
pub mod commands;
mod duration;
pub mod error;
pub mod player;
pub mod scheduler;
pub mod sheet;
pub mod source;

pub use self::actuator::Actuator;
pub use self::commands::Commands;
pub use self::error::ConfigError;
pub use self::player::Player;
pub use self::source::Source;

/// Environment variable that overrides the catalog directory.
const SHEETS_ENV: &str = "SHEETPLAY_SHEETS";
/// The catalog directory used when nothing else is configured.
const DEFAULT_SHEETS_DIR: &str = "sheets";

/// Resolves the catalog directory.
///
/// Priority:
/// 1. A directory given on the command line
/// 2. SHEETPLAY_SHEETS environment variable
/// 3. The configured directory
/// 4. ./sheets
pub fn sheets_dir(explicit: Option<&str>, configured: Option<&str>) -> PathBuf {
    if let Some(dir) = explicit {
        return PathBuf::from(dir);
    }

    if let Ok(dir) = env::var(SHEETS_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    PathBuf::from(configured.unwrap_or(DEFAULT_SHEETS_DIR))
}

/// Builds the scheduler options from the configuration.
pub fn scheduler_options(
    scheduler: &scheduler::Scheduler,
    actuator: &Actuator,
) -> Result<crate::scheduler::Options, ConfigError> {
    Ok(crate::scheduler::Options {
        pause_poll: scheduler.pause_poll()?,
        stop_timeout: scheduler.stop_timeout()?,
        thread_priority: actuator.thread_priority()?,
    })
}

/// Initializes the scheduler, dispatcher and message source from the given config file and
/// returns the live loop. Realistically, the live loop only exits when the source closes.
pub fn init_live(player_path: &Path) -> Result<crate::source::Live, Box<dyn Error>> {
    let player_config = Player::deserialize(player_path)?;
    let device = crate::actuator::get_device(player_config.actuator())?;
    let options = scheduler_options(player_config.scheduler(), player_config.actuator())?;
    let scheduler = Arc::new(crate::scheduler::Scheduler::new(device, options));
    let catalog = Arc::new(crate::catalog::Catalog::new(&player_config.sheets()));
    info!(
        sheets = catalog.root().display().to_string(),
        "Serving requests."
    );

    let dispatcher =
        crate::dispatcher::Dispatcher::new(scheduler, catalog, player_config.commands().clone());
    Ok(crate::source::Live::new(
        dispatcher,
        crate::source::driver(player_config.source()),
    ))
}

#[cfg(test)]
mod test {
    use std::{env, error::Error, fs, time::Duration};

    use serial_test::serial;

    use super::{sheets_dir, ConfigError, Player, Source, SHEETS_ENV};

    #[test]
    fn test_player_config() -> Result<(), Box<dyn Error>> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("player.yaml");
        fs::write(
            &path,
            r#"
sheets: /srv/sheets
actuator:
  device: mock-keys
  press_duration: 20ms
  thread_priority: 60
commands:
  request_prefixes: ["点播 ", "点歌 "]
  queue: 队列
  skip: 跳过
scheduler:
  pause_poll: 10ms
  stop_timeout: 2s
source:
  kind: file
  path: /tmp/messages.log
"#,
        )?;

        let player = Player::deserialize(&path)?;
        assert_eq!("mock-keys", player.actuator().device());
        assert_eq!(Duration::from_millis(20), player.actuator().press_duration()?);
        assert_eq!(Some(60), player.actuator().thread_priority()?);
        assert_eq!(
            vec!["点播 ".to_string(), "点歌 ".to_string()],
            player.commands().request_prefixes()
        );
        assert_eq!("队列", player.commands().queue());
        assert_eq!("跳过", player.commands().skip());
        assert_eq!(Duration::from_millis(10), player.scheduler().pause_poll()?);
        assert_eq!(Duration::from_secs(2), player.scheduler().stop_timeout()?);
        match player.source() {
            Source::File(file) => assert_eq!("/tmp/messages.log", file.path()),
            Source::Stdin => panic!("expected a file source"),
        }
        Ok(())
    }

    #[test]
    fn test_player_config_defaults() -> Result<(), Box<dyn Error>> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("player.yaml");
        fs::write(&path, "sheets: /srv/sheets\n")?;

        let player = Player::deserialize(&path)?;
        assert_eq!("terminal", player.actuator().device());
        assert_eq!(Duration::from_millis(50), player.actuator().press_duration()?);
        assert_eq!(None, player.actuator().thread_priority()?);
        assert_eq!(3, player.commands().request_prefixes().len());
        assert_eq!("queue", player.commands().queue());
        assert_eq!("skip", player.commands().skip());
        assert_eq!(Duration::from_millis(50), player.scheduler().pause_poll()?);
        assert_eq!(Duration::from_secs(1), player.scheduler().stop_timeout()?);
        assert_eq!(&Source::Stdin, player.source());
        Ok(())
    }

    #[test]
    fn test_player_config_invalid_values() -> Result<(), Box<dyn Error>> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("player.yaml");
        fs::write(
            &path,
            "sheets: /srv/sheets\nactuator:\n  press_duration: soon\n  thread_priority: 120\n",
        )?;

        let player = Player::deserialize(&path)?;
        assert!(matches!(
            player.actuator().press_duration(),
            Err(ConfigError::Duration { .. })
        ));
        assert!(matches!(
            player.actuator().thread_priority(),
            Err(ConfigError::ThreadPriority(120))
        ));

        assert!(matches!(
            Player::deserialize(&temp_dir.path().join("missing.yaml")),
            Err(ConfigError::Load(_))
        ));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_sheets_dir_env_override() {
        let original = env::var(SHEETS_ENV).ok();

        env::set_var(SHEETS_ENV, "/from/env");
        assert_eq!(
            "/from/env",
            sheets_dir(None, Some("/configured")).to_string_lossy()
        );

        // The command line beats the environment.
        assert_eq!(
            "/from/flag",
            sheets_dir(Some("/from/flag"), Some("/configured")).to_string_lossy()
        );

        env::set_var(SHEETS_ENV, "");
        assert_eq!(
            "/configured",
            sheets_dir(None, Some("/configured")).to_string_lossy()
        );

        env::remove_var(SHEETS_ENV);
        assert_eq!("sheets", sheets_dir(None, None).to_string_lossy());
        assert_eq!("/from/flag", sheets_dir(Some("/from/flag"), None).to_string_lossy());

        if let Some(val) = original {
            env::set_var(SHEETS_ENV, val);
        }
    }
}
