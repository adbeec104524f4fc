//! Pattern extraction over Forvo's word page markup.
//!
//! Only the one markup shape Forvo serves is understood: a
//! `language-container-{lang}` block holding a `<ul>` whose `<li>` items each
//! carry a `Play(...)` handler with the base64 audio token, the author line
//! and a `(sex from country)` span.

use std::path::PathBuf;
use std::sync::OnceLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;
use thiserror::Error;

use super::cache::{file_component, locate};
use crate::config::{AudioFormat, Config};

pub(crate) const AUDIO_URL: &str = "https://audio00.forvo.com/audios";

const UNKNOWN_COUNTRY: &str = "Unknown";

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ExtractError {
    #[error("no pronunciation block for language '{0}'")]
    BlockNotFound(String),

    #[error("pronunciation block contains no entries")]
    NoEntriesFound,

    #[error("pronunciation entry #{0} does not match the expected markup")]
    MalformedEntry(usize),

    #[error("pronunciation entry #{index} has an undecodable audio token: {detail}")]
    BadAudioToken { index: usize, detail: String },
}

/// One author's recording of a word with every derived location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PronunciationRecord {
    pub(crate) word: String,
    pub(crate) author: String,
    pub(crate) sex: String,
    pub(crate) country: String,
    pub(crate) audio_base_name: String,
    pub(crate) mp3_url: String,
    pub(crate) ogg_url: String,
    pub(crate) selected_url: String,
    pub(crate) cache_dir: PathBuf,
    pub(crate) cache_file: PathBuf,
    /// Bare file name written into the download directory.
    pub(crate) local_file: PathBuf,
}

impl PronunciationRecord {
    pub(crate) fn full_author(&self) -> String {
        format!("{} ({} from {})", self.author, self.sex, self.country)
    }
}

fn entries_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)^.*?<ul.*?>(.*?)</ul>.*?</article>").expect("invalid block regex")
    })
}

fn item_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)<li.*?>(.*?)</li>").expect("invalid item regex"))
}

fn entry_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r#"(?is)onclick="Play\(\d+,.*?,.*?,'(.*?)'.*?>\s*"#,
            r"Pronunciation by\s+(.*?)\s+</span>\s*",
            r#"<span class="from">\((.*?)(?:\s+from\s+(.*?))?\)</span>"#,
        ))
        .expect("invalid entry regex")
    })
}

fn author_link_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?is)^<span class="ofLink".*?>(.*?)</span>"#)
            .expect("invalid author regex")
    })
}

fn words_found_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(\d+)\s+words?\s+found").expect("invalid search regex")
    })
}

/// Parses every pronunciation of `word` in `config.language` from a word page.
///
/// All-or-nothing: one malformed entry fails the whole page.
pub(crate) fn extract_pronunciations(
    page: &str,
    word: &str,
    config: &Config,
) -> Result<Vec<PronunciationRecord>, ExtractError> {
    let marker = format!("id=\"language-container-{}\"", config.language);
    let block_start = page
        .find(&marker)
        .ok_or_else(|| ExtractError::BlockNotFound(config.language.clone()))?;
    let entries = entries_regex()
        .captures(&page[block_start..])
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ExtractError::BlockNotFound(config.language.clone()))?;

    let chunks: Vec<&str> = item_regex()
        .captures_iter(entries.as_str())
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    if chunks.is_empty() {
        return Err(ExtractError::NoEntriesFound);
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| extract_entry(index, chunk, word, config))
        .collect()
}

fn extract_entry(
    index: usize,
    chunk: &str,
    word: &str,
    config: &Config,
) -> Result<PronunciationRecord, ExtractError> {
    let caps = entry_regex()
        .captures(chunk)
        .ok_or(ExtractError::MalformedEntry(index))?;
    let field = |group: usize| caps.get(group).map_or("", |m| m.as_str().trim());

    let audio_base_name = decode_audio_token(field(1)).map_err(|detail| {
        ExtractError::BadAudioToken { index, detail }
    })?;

    let raw_author = field(2);
    let author = author_link_regex()
        .captures(raw_author)
        .and_then(|inner| inner.get(1))
        .map_or(raw_author, |m| m.as_str().trim())
        .to_string();
    let sex = field(3).to_lowercase();
    let country = match field(4) {
        "" => UNKNOWN_COUNTRY.to_string(),
        country => country.to_string(),
    };

    let mp3_url = audio_url(AudioFormat::Mp3, &audio_base_name);
    let ogg_url = audio_url(AudioFormat::Ogg, &audio_base_name);
    let selected_url = match config.audio_format {
        AudioFormat::Mp3 => mp3_url.clone(),
        AudioFormat::Ogg => ogg_url.clone(),
    };
    let (cache_dir, cache_file) = locate(
        &config.cache_dir,
        config.audio_format,
        &config.language,
        word,
        &author,
    );

    Ok(PronunciationRecord {
        word: word.to_string(),
        author,
        sex,
        country,
        audio_base_name,
        mp3_url,
        ogg_url,
        selected_url,
        cache_dir,
        cache_file,
        local_file: PathBuf::from(format!(
            "{}.{}",
            file_component(word),
            config.audio_format
        )),
    })
}

/// Decodes the shared audio token and drops its format extension.
fn decode_audio_token(token: &str) -> Result<String, String> {
    let bytes = BASE64.decode(token).map_err(|err| err.to_string())?;
    let decoded = String::from_utf8(bytes).map_err(|err| err.to_string())?;
    let base = [".mp3", ".ogg"]
        .iter()
        .find_map(|ext| decoded.strip_suffix(ext))
        .unwrap_or(&decoded);
    if base.is_empty() {
        return Err("empty audio token".to_string());
    }
    Ok(base.to_string())
}

fn audio_url(format: AudioFormat, base_name: &str) -> String {
    let ext = format.extension();
    format!("{AUDIO_URL}/{ext}/{base_name}.{ext}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProbeVerdict {
    /// The search page reports zero matching words.
    Absent,
    /// Anything else, including pages this parser does not recognise.
    Unknown,
}

pub(crate) fn probe_verdict(search_page: &str) -> ProbeVerdict {
    let reported = words_found_regex()
        .captures(search_page)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok());
    match reported {
        Some(0) => ProbeVerdict::Absent,
        _ => ProbeVerdict::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn config(format: AudioFormat) -> Config {
        Config {
            language: "en".to_string(),
            audio_format: format,
            cache: true,
            download: false,
            interactive: false,
            pronunciation_check: false,
            verbose: false,
            cache_dir: PathBuf::new(),
            word_file: None,
        }
    }

    fn entry(token: &str, author: &str, from: &str) -> String {
        format!(
            r#"<li class="pronunciation">
  <div class="play" onclick="Play(42,'AAA','BBB',false,'{token}','CCC','h');return false;"></div>
  <span class="info">Pronunciation by  {author}  </span>
  <span class="from">({from})</span>
</li>"#
        )
    }

    fn page(lang: &str, entries: &[String]) -> String {
        format!(
            r#"<html><body>
<article class="pronunciations">
<div id="language-container-{lang}" class="list">
<header><h2>pronunciations</h2></header>
<ul class="show-all-pronunciations">
{}
</ul>
</div>
</article>
</body></html>"#,
            entries.join("\n")
        )
    }

    // base64("test.mp3")
    const TOKEN: &str = "dGVzdC5tcDM=";

    #[test]
    fn extracts_every_entry_in_document_order() {
        let html = page(
            "en",
            &[
                entry(TOKEN, "Alice", "Female from Ireland"),
                entry(TOKEN, "Bob", "Male from Canada"),
            ],
        );
        let list = extract_pronunciations(&html, "test", &config(AudioFormat::Mp3))
            .expect("page should parse");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].author, "Alice");
        assert_eq!(list[0].sex, "female");
        assert_eq!(list[0].country, "Ireland");
        assert_eq!(list[1].author, "Bob");
        assert_eq!(list[1].full_author(), "Bob (male from Canada)");
    }

    #[test]
    fn derives_both_audio_urls_and_selects_configured_format() {
        let html = page("en", &[entry(TOKEN, "Alice", "Female from Ireland")]);

        let mp3 = extract_pronunciations(&html, "test", &config(AudioFormat::Mp3))
            .expect("page should parse");
        assert_eq!(mp3[0].audio_base_name, "test");
        assert_eq!(mp3[0].mp3_url, format!("{AUDIO_URL}/mp3/test.mp3"));
        assert_eq!(mp3[0].ogg_url, format!("{AUDIO_URL}/ogg/test.ogg"));
        assert_eq!(mp3[0].selected_url, mp3[0].mp3_url);
        assert_eq!(mp3[0].local_file, PathBuf::from("test.mp3"));

        let ogg = extract_pronunciations(&html, "test", &config(AudioFormat::Ogg))
            .expect("page should parse");
        assert_eq!(ogg[0].selected_url, ogg[0].ogg_url);
        assert_eq!(ogg[0].cache_file, PathBuf::from("ogg/en/09/test_Alice.ogg"));
        assert_eq!(ogg[0].local_file, PathBuf::from("test.ogg"));
    }

    #[test]
    fn file_names_never_carry_path_separators() {
        let html = page("en", &[entry(TOKEN, "../Eve", "Female from Ireland")]);
        let list = extract_pronunciations(&html, "AC/DC", &config(AudioFormat::Mp3))
            .expect("page should parse");

        assert_eq!(list[0].word, "AC/DC");
        assert_eq!(list[0].local_file, PathBuf::from("AC_DC.mp3"));
        assert_eq!(list[0].cache_file.parent(), Some(list[0].cache_dir.as_path()));
        assert!(list[0].cache_file.ends_with("AC_DC_.._Eve.mp3"));
    }

    #[test]
    fn unwraps_linked_author_names() {
        let linked = r#"<span class="ofLink" data-p1="user" data-p2="Carol" >Carol</span>"#;
        let html = page("en", &[entry(TOKEN, linked, "Female from Malta")]);
        let list = extract_pronunciations(&html, "test", &config(AudioFormat::Mp3))
            .expect("page should parse");
        assert_eq!(list[0].author, "Carol");
        assert_eq!(list[0].cache_file, PathBuf::from("mp3/en/09/test_Carol.mp3"));
    }

    #[test]
    fn country_defaults_to_unknown_when_clause_is_absent() {
        let html = page("en", &[entry(TOKEN, "Dave", "Male")]);
        let list = extract_pronunciations(&html, "test", &config(AudioFormat::Mp3))
            .expect("page should parse");
        assert_eq!(list[0].sex, "male");
        assert_eq!(list[0].country, "Unknown");
    }

    #[test]
    fn other_language_block_is_not_found() {
        let html = page("nl", &[entry(TOKEN, "Eva", "Female from Netherlands")]);
        assert_eq!(
            extract_pronunciations(&html, "test", &config(AudioFormat::Mp3)),
            Err(ExtractError::BlockNotFound("en".to_string()))
        );
    }

    #[test]
    fn empty_block_reports_no_entries() {
        let html = page("en", &[]);
        assert_eq!(
            extract_pronunciations(&html, "test", &config(AudioFormat::Mp3)),
            Err(ExtractError::NoEntriesFound)
        );
    }

    #[test]
    fn one_malformed_entry_fails_the_whole_page() {
        let html = page(
            "en",
            &[
                entry(TOKEN, "Alice", "Female from Ireland"),
                "<li>recorded by someone</li>".to_string(),
            ],
        );
        assert_eq!(
            extract_pronunciations(&html, "test", &config(AudioFormat::Mp3)),
            Err(ExtractError::MalformedEntry(1))
        );
    }

    #[test]
    fn invalid_base64_token_is_reported() {
        let html = page("en", &[entry("!!not-base64!!", "Alice", "Female from Ireland")]);
        assert!(matches!(
            extract_pronunciations(&html, "test", &config(AudioFormat::Mp3)),
            Err(ExtractError::BadAudioToken { index: 0, .. })
        ));
    }

    #[test]
    fn probe_reports_absent_only_for_zero_matches() {
        assert_eq!(probe_verdict("<p>0 words found</p>"), ProbeVerdict::Absent);
        assert_eq!(probe_verdict("<p>10 words found</p>"), ProbeVerdict::Unknown);
        assert_eq!(probe_verdict("<p>1 word found</p>"), ProbeVerdict::Unknown);
        assert_eq!(probe_verdict("<html></html>"), ProbeVerdict::Unknown);
    }
}
