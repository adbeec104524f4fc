use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::extract::PronunciationRecord;
use super::fetch::{FetchError, Fetcher};
use crate::config::Config;

#[derive(Debug, Error)]
pub(crate) enum SaveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SaveError + '_ {
    move |source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Materializes a record's audio where the configuration wants it.
///
/// | cache | download | interactive | result                               |
/// |-------|----------|-------------|--------------------------------------|
/// | yes   | yes      | any         | cache (fetch on miss), copy to cwd   |
/// | yes   | no       | any         | cache path                           |
/// | no    | yes      | any         | fetched straight into cwd            |
/// | no    | no       | yes         | fetched into the per-run temp dir    |
/// | no    | no       | no          | nothing                              |
pub(crate) struct Saver<'a> {
    config: &'a Config,
    fetcher: &'a dyn Fetcher,
    download_dir: PathBuf,
    temp_dir: &'a Path,
}

impl<'a> Saver<'a> {
    pub(crate) fn new(
        config: &'a Config,
        fetcher: &'a dyn Fetcher,
        download_dir: impl Into<PathBuf>,
        temp_dir: &'a Path,
    ) -> Self {
        Self {
            config,
            fetcher,
            download_dir: download_dir.into(),
            temp_dir,
        }
    }

    /// Returns the playable file, or `None` when the configuration asks for
    /// nothing to be stored.
    pub(crate) fn save(&self, record: &PronunciationRecord) -> Result<Option<PathBuf>, SaveError> {
        let local_path = self.download_dir.join(&record.local_file);

        if self.config.cache {
            self.populate_cache(record)?;
            if self.config.download {
                fs::copy(&record.cache_file, &local_path).map_err(io_error(&local_path))?;
                log::info!("saved {}", local_path.display());
                return Ok(Some(local_path));
            }
            return Ok(Some(record.cache_file.clone()));
        }

        if self.config.download {
            self.fetch_into(record, &local_path)?;
            log::info!("saved {}", local_path.display());
            return Ok(Some(local_path));
        }

        if self.config.interactive {
            let file_name = record
                .cache_file
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| record.local_file.clone());
            let temp_path = self.temp_dir.join(file_name);
            self.fetch_into(record, &temp_path)?;
            return Ok(Some(temp_path));
        }

        Ok(None)
    }

    /// Cache entries are immutable: an existing file is a hit and is never
    /// fetched again.
    fn populate_cache(&self, record: &PronunciationRecord) -> Result<(), SaveError> {
        if record.cache_file.is_file() {
            log::debug!("cache hit {}", record.cache_file.display());
            return Ok(());
        }

        log::debug!("cache miss {}", record.cache_file.display());
        fs::create_dir_all(&record.cache_dir).map_err(io_error(&record.cache_dir))?;
        let bytes = self.fetcher.fetch_audio(record)?;

        // Publish with a rename so a cache file is either absent or complete.
        let partial = record.cache_file.with_extension("part");
        fs::write(&partial, &bytes).map_err(io_error(&partial))?;
        fs::rename(&partial, &record.cache_file).map_err(io_error(&record.cache_file))
    }

    fn fetch_into(&self, record: &PronunciationRecord, dst: &Path) -> Result<(), SaveError> {
        let bytes = self.fetcher.fetch_audio(record)?;
        if let Some(parent) = dst.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::write(dst, &bytes).map_err(io_error(dst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::app::cache::locate;
    use crate::config::AudioFormat;

    struct CountingFetcher {
        body: Vec<u8>,
        calls: RefCell<Vec<String>>,
        fail: bool,
    }

    impl CountingFetcher {
        fn serving(body: &[u8]) -> Self {
            Self {
                body: body.to_vec(),
                calls: RefCell::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::serving(b"")
            }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl Fetcher for CountingFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.borrow_mut().push(url.to_string());
            if self.fail {
                return Err(FetchError::Unreachable {
                    url: url.to_string(),
                    detail: "offline".to_string(),
                });
            }
            Ok(self.body.clone())
        }
    }

    fn config(cache_root: &Path, cache: bool, download: bool, interactive: bool) -> Config {
        Config {
            language: "en".to_string(),
            audio_format: AudioFormat::Mp3,
            cache,
            download,
            interactive,
            pronunciation_check: false,
            verbose: false,
            cache_dir: cache_root.to_path_buf(),
            word_file: None,
        }
    }

    fn record(config: &Config, author: &str) -> PronunciationRecord {
        let (cache_dir, cache_file) = locate(
            &config.cache_dir,
            config.audio_format,
            &config.language,
            "test",
            author,
        );
        PronunciationRecord {
            word: "test".to_string(),
            author: author.to_string(),
            sex: "male".to_string(),
            country: "USA".to_string(),
            audio_base_name: "test".to_string(),
            mp3_url: "https://audio00.forvo.com/audios/mp3/test.mp3".to_string(),
            ogg_url: "https://audio00.forvo.com/audios/ogg/test.ogg".to_string(),
            selected_url: "https://audio00.forvo.com/audios/mp3/test.mp3".to_string(),
            cache_dir,
            cache_file,
            local_file: PathBuf::from("test.mp3"),
        }
    }

    struct Dirs {
        cache: tempfile::TempDir,
        download: tempfile::TempDir,
        temp: tempfile::TempDir,
    }

    fn dirs() -> Dirs {
        Dirs {
            cache: tempfile::tempdir().expect("cache dir"),
            download: tempfile::tempdir().expect("download dir"),
            temp: tempfile::tempdir().expect("temp dir"),
        }
    }

    #[test]
    fn cache_only_fetches_once_and_returns_cache_path() {
        let dirs = dirs();
        let config = config(dirs.cache.path(), true, false, false);
        let fetcher = CountingFetcher::serving(b"ID3-audio");
        let saver = Saver::new(&config, &fetcher, dirs.download.path(), dirs.temp.path());
        let item = record(&config, "Author1");

        let first = saver.save(&item).expect("first save");
        let second = saver.save(&item).expect("second save");

        assert_eq!(first, Some(item.cache_file.clone()));
        assert_eq!(first, second);
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(fs::read(&item.cache_file).expect("cache file"), b"ID3-audio");
        assert!(!item.cache_file.with_extension("part").exists());
    }

    #[test]
    fn cache_and_download_copies_into_download_dir() {
        let dirs = dirs();
        let config = config(dirs.cache.path(), true, true, false);
        let fetcher = CountingFetcher::serving(b"ID3-audio");
        let saver = Saver::new(&config, &fetcher, dirs.download.path(), dirs.temp.path());
        let item = record(&config, "Author1");

        let path = saver.save(&item).expect("save").expect("path");
        saver.save(&item).expect("second save");

        assert_eq!(path, dirs.download.path().join("test.mp3"));
        assert_eq!(fs::read(&path).expect("local file"), b"ID3-audio");
        assert!(item.cache_file.is_file());
        assert_eq!(fetcher.call_count(), 1);
    }

    #[test]
    fn existing_cache_entry_is_never_rewritten() {
        let dirs = dirs();
        let config = config(dirs.cache.path(), true, false, false);
        let item = record(&config, "Author1");
        fs::create_dir_all(&item.cache_dir).expect("cache dir");
        fs::write(&item.cache_file, b"original").expect("seed cache");
        let fetcher = CountingFetcher::serving(b"different");
        let saver = Saver::new(&config, &fetcher, dirs.download.path(), dirs.temp.path());

        saver.save(&item).expect("save");

        assert_eq!(fetcher.call_count(), 0);
        assert_eq!(fs::read(&item.cache_file).expect("cache file"), b"original");
    }

    #[test]
    fn download_without_cache_writes_only_local_file() {
        let dirs = dirs();
        let config = config(dirs.cache.path(), false, true, true);
        let fetcher = CountingFetcher::serving(b"ID3-audio");
        let saver = Saver::new(&config, &fetcher, dirs.download.path(), dirs.temp.path());
        let item = record(&config, "Author1");

        let path = saver.save(&item).expect("save");

        assert_eq!(path, Some(dirs.download.path().join("test.mp3")));
        assert!(!item.cache_dir.exists());
    }

    #[test]
    fn interactive_without_storage_uses_temp_dir() {
        let dirs = dirs();
        let config = config(dirs.cache.path(), false, false, true);
        let fetcher = CountingFetcher::serving(b"ID3-audio");
        let saver = Saver::new(&config, &fetcher, dirs.download.path(), dirs.temp.path());
        let item = record(&config, "Author2");

        let path = saver.save(&item).expect("save").expect("path");

        assert_eq!(path, dirs.temp.path().join("test_Author2.mp3"));
        assert_eq!(fs::read(&path).expect("temp file"), b"ID3-audio");
    }

    #[test]
    fn batch_without_storage_fetches_nothing() {
        let dirs = dirs();
        let config = config(dirs.cache.path(), false, false, false);
        let fetcher = CountingFetcher::serving(b"ID3-audio");
        let saver = Saver::new(&config, &fetcher, dirs.download.path(), dirs.temp.path());

        assert_eq!(saver.save(&record(&config, "Author1")).expect("save"), None);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[test]
    fn failed_fetch_leaves_no_cache_entry() {
        let dirs = dirs();
        let config = config(dirs.cache.path(), true, true, false);
        let fetcher = CountingFetcher::failing();
        let saver = Saver::new(&config, &fetcher, dirs.download.path(), dirs.temp.path());
        let item = record(&config, "Author1");

        let err = saver.save(&item).expect_err("fetch should fail");

        assert!(matches!(err, SaveError::Fetch(FetchError::Unreachable { .. })));
        assert!(!item.cache_file.exists());
        assert!(!dirs.download.path().join("test.mp3").exists());
    }
}
