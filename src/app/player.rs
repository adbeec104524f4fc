use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, Stdio};

use anyhow::{Context, Result, bail};

const DEFAULT_PLAYER: &str = "mpg123";

pub(crate) trait Player {
    fn play(&mut self, path: &Path) -> Result<()>;
}

/// Runs an external command-line player and waits for it to finish.
pub(crate) struct CommandPlayer {
    bin: PathBuf,
}

impl CommandPlayer {
    pub(crate) fn from_env() -> Self {
        Self {
            bin: resolve_player_bin_from_env(env::var_os("TELLME_PLAYER")),
        }
    }
}

impl Player for CommandPlayer {
    fn play(&mut self, path: &Path) -> Result<()> {
        let status = ProcessCommand::new(&self.bin)
            .arg("-q")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("failed to launch {}", self.bin.display()))?;
        if !status.success() {
            bail!("{} exited with status: {status}", self.bin.display());
        }
        Ok(())
    }
}

pub(crate) fn resolve_player_bin_from_env(env_value: Option<OsString>) -> PathBuf {
    match env_value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_PLAYER),
    }
}
