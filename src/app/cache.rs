use std::path::{Path, PathBuf};

use crate::config::AudioFormat;

/// Shard bucket for `word`: the first two hex characters of its md5 digest.
pub(crate) fn shard(word: &str) -> String {
    let digest = format!("{:x}", md5::compute(word.as_bytes()));
    digest[..2].to_string()
}

/// `{root}/{format}/{language}/{shard}/{word}_{author}.{format}`.
///
/// Pure: nothing is created on disk.
pub(crate) fn locate(
    cache_root: &Path,
    format: AudioFormat,
    language: &str,
    word: &str,
    author: &str,
) -> (PathBuf, PathBuf) {
    let dir = cache_root
        .join(format.extension())
        .join(language)
        .join(shard(word));
    let file = dir.join(format!(
        "{}_{}.{}",
        file_component(word),
        file_component(author),
        format.extension()
    ));
    (dir, file)
}

/// Escapes path separators so a word or author name always stays a single
/// file name component. Ordinary names pass through unchanged.
pub(crate) fn file_component(raw: &str) -> String {
    raw.chars()
        .map(|ch| match ch {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect()
}
