mod cache;
mod extract;
mod fetch;
mod lookup;
mod navigator;
mod player;
mod saver;
mod tui;
mod words;


use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::config::{self, Config};

use self::fetch::{Fetcher, FixtureFetcher, LiveFetcher};
use self::lookup::Lookup;
use self::navigator::Navigator;
use self::player::CommandPlayer;
use self::saver::Saver;
use self::tui::TerminalConsole;
use self::words::{Boundary, WordQueue};

const FIXTURE_DIR_ENV: &str = "TELLME_FIXTURE_DIR";

pub fn run(cli: Cli) -> Result<()> {
    let config = config::load(&cli)?;
    config.check_word_sources(&cli.words)?;
    init_logging(&config);
    log::debug!("configuration: {config:?}");

    let fetcher = fetcher_from_env(&config, env::var_os(FIXTURE_DIR_ENV).map(PathBuf::from));
    let temp_dir = tempfile::Builder::new()
        .prefix("tellme")
        .tempdir()
        .context("failed to create temporary directory")?;
    let download_dir = env::current_dir().context("failed to resolve working directory")?;

    let mut queue = word_queue(&config, &cli.words)?;
    let lookup = Lookup::new(&config, fetcher.as_ref());
    let saver = Saver::new(&config, fetcher.as_ref(), download_dir, temp_dir.path());

    if config.interactive {
        let mut console = TerminalConsole::open()?;
        let mut player = CommandPlayer::from_env();
        let outcome = Navigator::new(&mut queue, lookup, saver, &mut console, &mut player).run();
        console.close()?;
        outcome
    } else {
        let saved = run_batch(&mut queue, &lookup, &saver)?;
        log::info!("saved {saved} file(s)");
        Ok(())
    }
}

/// `VERBOSE=yes` means debug output; `RUST_LOG` still wins when set.
fn init_logging(config: &Config) {
    let default_level = if config.verbose { "debug" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn fetcher_from_env(config: &Config, fixture_dir: Option<PathBuf>) -> Box<dyn Fetcher> {
    match fixture_dir {
        Some(dir) if !dir.as_os_str().is_empty() => {
            log::debug!("serving pages from fixtures in {}", dir.display());
            Box::new(FixtureFetcher::new(dir, &config.language))
        }
        _ => Box::new(LiveFetcher::default()),
    }
}

fn word_queue(config: &Config, word_args: &[String]) -> Result<WordQueue> {
    if let Some(file) = &config.word_file {
        return WordQueue::from_file(file);
    }
    if !word_args.is_empty() {
        return Ok(WordQueue::from_args(word_args));
    }
    Ok(WordQueue::from_stdin())
}

/// Saves the first pronunciation of every word. Words without pronunciations
/// and failed saves are skipped. Returns the number of files produced.
fn run_batch(queue: &mut WordQueue, lookup: &Lookup<'_>, saver: &Saver<'_>) -> Result<usize> {
    let mut saved = 0;
    let mut index = 0;
    while let Some(slot) = queue.at(index).context("failed to read word list")? {
        if slot.boundary == Some(Boundary::EndOfList) {
            break;
        }
        index += 1;

        let list = lookup.resolve(&slot.word);
        let Some(first) = list.first() else {
            continue;
        };
        match saver.save(first) {
            Ok(Some(path)) => {
                log::debug!("'{}' -> {}", slot.word, path.display());
                saved += 1;
            }
            Ok(None) => {}
            Err(err) => log::warn!("could not save '{}': {err}", slot.word),
        }
    }
    Ok(saved)
}
