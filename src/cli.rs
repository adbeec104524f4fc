use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Default, Parser)]
#[command(
    name = "tellme",
    version,
    about = "Fetch, cache and play word pronunciations from Forvo"
)]
pub struct Cli {
    /// Browse pronunciations interactively
    #[arg(short = 'i', long, value_name = "yes|no", value_parser = ["yes", "no"])]
    pub interactive: Option<String>,

    /// Ask the search page whether a word has pronunciations before fetching it
    #[arg(long, value_name = "yes|no", value_parser = ["yes", "no"])]
    pub check: Option<String>,

    /// Save the chosen audio file into the current directory
    #[arg(short = 'd', long, value_name = "yes|no", value_parser = ["yes", "no"])]
    pub download: Option<String>,

    /// Keep fetched audio in the cache directory
    #[arg(short = 'c', long, value_name = "yes|no", value_parser = ["yes", "no"])]
    pub cache: Option<String>,

    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Pronunciation language (en, es, de, ...)
    #[arg(short = 'l', long, value_name = "LANG")]
    pub lang: Option<String>,

    /// Audio file type
    #[arg(short = 't', long = "type", value_name = "mp3|ogg", value_parser = ["mp3", "ogg"])]
    pub audio_type: Option<String>,

    #[arg(long, value_name = "yes|no", value_parser = ["yes", "no"])]
    pub verbose: Option<String>,

    /// Read words from a file, one per line
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Words to look up; standard input is read when none are given
    pub words: Vec<String>,
}

impl Cli {
    /// Flag values keyed by their configuration names.
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                out.push((key, value));
            }
        };
        push("INTERACTIVE", self.interactive.clone());
        push("PRONUNCIATION_CHECK", self.check.clone());
        push("DOWNLOAD", self.download.clone());
        push("CACHE", self.cache.clone());
        push(
            "CACHE_DIR",
            self.cache_dir.as_ref().map(|p| p.display().to_string()),
        );
        push("LANG", self.lang.clone());
        push("ATYPE", self.audio_type.clone());
        push("VERBOSE", self.verbose.clone());
        push("FILE", self.file.as_ref().map(|p| p.display().to_string()));
        out
    }
}
