use super::extract::{
    ExtractError, ProbeVerdict, PronunciationRecord, extract_pronunciations, probe_verdict,
};
use super::fetch::{FetchError, Fetcher};
use crate::config::Config;

pub(crate) const FORVO_URL: &str = "https://forvo.com";

pub(crate) fn word_page_url(word: &str, language: &str) -> String {
    format!("{FORVO_URL}/word/{word}/#{language}")
}

pub(crate) fn search_page_url(word: &str, language: &str) -> String {
    format!("{FORVO_URL}/search/{word}/{language}/")
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum LookupError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Resolves words into pronunciation lists: optional existence probe, word
/// page fetch, then extraction.
pub(crate) struct Lookup<'a> {
    config: &'a Config,
    fetcher: &'a dyn Fetcher,
}

impl<'a> Lookup<'a> {
    pub(crate) fn new(config: &'a Config, fetcher: &'a dyn Fetcher) -> Self {
        Self { config, fetcher }
    }

    /// Never fails: any problem is logged and the word gets an empty list.
    pub(crate) fn resolve(&self, word: &str) -> Vec<PronunciationRecord> {
        match self.try_resolve(word) {
            Ok(list) => list,
            Err(err) => {
                log::warn!("skipping '{word}': {err}");
                Vec::new()
            }
        }
    }

    pub(crate) fn try_resolve(&self, word: &str) -> Result<Vec<PronunciationRecord>, LookupError> {
        if self.config.pronunciation_check && self.probe(word) == ProbeVerdict::Absent {
            log::debug!("search page reports no pronunciations for '{word}'");
            return Ok(Vec::new());
        }

        let page = self
            .fetcher
            .fetch_text(&word_page_url(word, &self.config.language))?;
        let list = extract_pronunciations(&page, word, self.config)?;
        for record in &list {
            log::debug!(
                "'{word}' by {}: {} [{} | {}]",
                record.author,
                record.audio_base_name,
                record.mp3_url,
                record.ogg_url
            );
        }
        Ok(list)
    }

    /// Advisory only: an unreachable or unrecognised search page is `Unknown`.
    pub(crate) fn probe(&self, word: &str) -> ProbeVerdict {
        match self
            .fetcher
            .fetch_text(&search_page_url(word, &self.config.language))
        {
            Ok(page) => probe_verdict(&page),
            Err(err) => {
                log::debug!("existence probe for '{word}' failed: {err}");
                ProbeVerdict::Unknown
            }
        }
    }
}
