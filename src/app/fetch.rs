use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use super::extract::PronunciationRecord;
use crate::http::get_bytes_with_retries;

pub(crate) const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const FETCH_ATTEMPTS: usize = 10;

#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("{url} is unreachable: {detail}")]
    Unreachable { url: String, detail: String },

    #[error("fixture {} is unavailable: {source}", .path.display())]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no fixture mapping for {0}")]
    UnsupportedUrl(String),
}

/// Source of page and audio bytes, chosen once at startup.
pub(crate) trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Audio bytes for the record's selected format.
    fn fetch_audio(&self, record: &PronunciationRecord) -> Result<Vec<u8>, FetchError> {
        self.fetch(&record.selected_url)
    }

    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let bytes = self.fetch(url)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

pub(crate) struct LiveFetcher {
    timeout: Duration,
    attempts: usize,
}

impl LiveFetcher {
    pub(crate) fn new(timeout: Duration, attempts: usize) -> Self {
        Self { timeout, attempts }
    }
}

impl Default for LiveFetcher {
    fn default() -> Self {
        Self::new(FETCH_TIMEOUT, FETCH_ATTEMPTS)
    }
}

impl Fetcher for LiveFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        log::debug!("fetching {url}");
        get_bytes_with_retries(url, self.timeout, self.attempts).map_err(|detail| {
            FetchError::Unreachable {
                url: url.to_string(),
                detail,
            }
        })
    }
}

/// Serves the same URLs the live fetcher would request from files named
/// `forvo_{lang}_{key}.{ext}` under `root`.
pub(crate) struct FixtureFetcher {
    root: PathBuf,
    language: String,
}

impl FixtureFetcher {
    pub(crate) fn new(root: impl Into<PathBuf>, language: &str) -> Self {
        Self {
            root: root.into(),
            language: language.to_string(),
        }
    }

    pub(crate) fn fixture_path(&self, url: &str) -> Result<PathBuf, FetchError> {
        let name = fixture_name(url, &self.language)
            .ok_or_else(|| FetchError::UnsupportedUrl(url.to_string()))?;
        Ok(self.root.join(name))
    }
}

impl Fetcher for FixtureFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.fixture_path(url)?;
        log::debug!("serving {url} from {}", path.display());
        read_fixture(&path)
    }

    fn fetch_audio(&self, record: &PronunciationRecord) -> Result<Vec<u8>, FetchError> {
        let path = self.root.join(audio_fixture_name(&self.language, record));
        log::debug!("serving {} from {}", record.selected_url, path.display());
        read_fixture(&path)
    }
}

fn read_fixture(path: &Path) -> Result<Vec<u8>, FetchError> {
    fs::read(path).map_err(|source| FetchError::Fixture {
        path: path.to_path_buf(),
        source,
    })
}

/// Maps a page or search URL to its fixture file name. Only the first path
/// segment after the host selects the kind of page, so words such as `word`
/// or `search` map like any other.
///
/// - `.../word/{word}/#{lang}` -> `forvo_{lang}_{word}.html`
/// - `.../search/{word}/{lang}/` -> `forvo_{lang}_{word}_search.html`
pub(crate) fn fixture_name(url: &str, default_language: &str) -> Option<String> {
    let (path, fragment) = match url.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (url, None),
    };
    let rest = path.split_once("://").map_or(path, |(_, rest)| rest);
    let segments: Vec<&str> = rest
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    match segments.get(1).copied() {
        Some("word") => {
            let word = segments.get(2)?;
            let language = fragment
                .filter(|lang| !lang.is_empty())
                .unwrap_or(default_language);
            Some(format!("forvo_{language}_{word}.html"))
        }
        Some("search") => {
            let word = segments.get(2)?;
            let language = segments.get(3).copied().unwrap_or(default_language);
            Some(format!("forvo_{language}_{word}_search.html"))
        }
        _ => None,
    }
}

/// Audio fixtures are keyed by the word, not by the clip name in the URL:
/// `forvo_{lang}_{word}.{format}`.
pub(crate) fn audio_fixture_name(language: &str, record: &PronunciationRecord) -> String {
    format!("forvo_{language}_{}", record.local_file.display())
}
