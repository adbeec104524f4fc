use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Boundary {
    BeginningOfList,
    EndOfList,
}

/// Result of [`WordQueue::at`]: the word shown for an index plus the
/// boundary that was hit when the index fell outside the known words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) word: String,
    pub(crate) boundary: Option<Boundary>,
}

/// Ordered, append-only list of words. Stream-backed queues pull one line
/// per step past the known end; nothing is ever evicted.
pub(crate) struct WordQueue {
    words: Vec<String>,
    source: Option<Box<dyn BufRead>>,
    /// The source is the terminal the keys come from.
    on_terminal: bool,
}

impl WordQueue {
    pub(crate) fn from_args(args: &[String]) -> Self {
        Self {
            words: args
                .iter()
                .map(|word| word.trim())
                .filter(|word| !word.is_empty())
                .map(str::to_string)
                .collect(),
            source: None,
            on_terminal: false,
        }
    }

    pub(crate) fn from_reader(reader: impl BufRead + 'static) -> Self {
        Self {
            words: Vec::new(),
            source: Some(Box::new(reader)),
            on_terminal: false,
        }
    }

    /// Marks the source as the interactive terminal; see [`Self::pull_needs_terminal`].
    pub(crate) fn on_terminal(mut self, on_terminal: bool) -> Self {
        self.on_terminal = on_terminal;
        self
    }

    pub(crate) fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open word file {}", path.display()))?;
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub(crate) fn from_stdin() -> Self {
        let on_terminal = io::stdin().is_terminal();
        Self::from_reader(BufReader::new(io::stdin())).on_terminal(on_terminal)
    }

    pub(crate) fn len(&self) -> usize {
        self.words.len()
    }

    /// True once no further words can ever be appended from the source.
    pub(crate) fn is_exhausted(&self) -> bool {
        self.source.is_none()
    }

    /// True when `at(index)` would read a line from a terminal source, which
    /// needs the terminal in line mode.
    pub(crate) fn pull_needs_terminal(&self, index: isize) -> bool {
        if !self.on_terminal || self.is_exhausted() {
            return false;
        }
        self.words.is_empty()
            || usize::try_from(index).is_ok_and(|index| index >= self.words.len())
    }

    /// Looks up `index`. Past the known end a stream-backed queue pulls one
    /// more word and returns it. `Ok(None)` only when no word exists at all.
    pub(crate) fn at(&mut self, index: isize) -> io::Result<Option<Slot>> {
        if self.words.is_empty() && !self.pull()? {
            return Ok(None);
        }

        if index < 0 {
            return Ok(Some(Slot {
                word: self.words[0].clone(),
                boundary: Some(Boundary::BeginningOfList),
            }));
        }

        let index = index as usize;
        if index < self.words.len() {
            return Ok(Some(Slot {
                word: self.words[index].clone(),
                boundary: None,
            }));
        }

        if self.pull()? {
            return Ok(Some(Slot {
                word: self.words[self.words.len() - 1].clone(),
                boundary: None,
            }));
        }

        Ok(Some(Slot {
            word: self.words[self.words.len() - 1].clone(),
            boundary: Some(Boundary::EndOfList),
        }))
    }

    /// Splices `word` in right after `index` and returns its position.
    pub(crate) fn insert_after(&mut self, index: usize, word: &str) -> usize {
        let position = (index + 1).min(self.words.len());
        self.words.insert(position, word.trim().to_string());
        position
    }

    /// Appends the next non-blank line of the source; false once it is drained.
    fn pull(&mut self) -> io::Result<bool> {
        let Some(source) = self.source.as_mut() else {
            return Ok(false);
        };

        let mut line = String::new();
        loop {
            line.clear();
            if source.read_line(&mut line)? == 0 {
                self.source = None;
                return Ok(false);
            }
            let word = line.trim();
            if !word.is_empty() {
                self.words.push(word.to_string());
                return Ok(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|word| word.to_string()).collect()
    }

    fn slot(word: &str, boundary: Option<Boundary>) -> Option<Slot> {
        Some(Slot {
            word: word.to_string(),
            boundary,
        })
    }

    #[test]
    fn argument_queue_filters_empty_words() {
        let queue = WordQueue::from_args(&args(&["tafel", "", "  ", "stoel"]));
        assert_eq!(queue.len(), 2);
        assert!(queue.is_exhausted());
    }

    #[test]
    fn argument_queue_reports_both_boundaries() {
        let mut queue = WordQueue::from_args(&args(&["tafel", "stoel"]));
        assert_eq!(
            queue.at(-1).expect("lookup"),
            slot("tafel", Some(Boundary::BeginningOfList))
        );
        assert_eq!(queue.at(1).expect("lookup"), slot("stoel", None));
        assert_eq!(
            queue.at(2).expect("lookup"),
            slot("stoel", Some(Boundary::EndOfList))
        );
    }

    #[test]
    fn stream_queue_grows_one_word_per_step() {
        let mut queue = WordQueue::from_reader(Cursor::new("tafel\n\n  \nstoel\nkast\n"));
        assert_eq!(queue.at(0).expect("lookup"), slot("tafel", None));
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.at(1).expect("lookup"), slot("stoel", None));
        assert_eq!(queue.len(), 2);
        assert!(!queue.is_exhausted());
    }

    #[test]
    fn stream_queue_keeps_seen_words_for_backward_steps() {
        let mut queue = WordQueue::from_reader(Cursor::new("tafel\nstoel\n"));
        queue.at(0).expect("lookup");
        queue.at(1).expect("lookup");
        assert_eq!(queue.at(0).expect("lookup"), slot("tafel", None));
        assert_eq!(
            queue.at(-1).expect("lookup"),
            slot("tafel", Some(Boundary::BeginningOfList))
        );
    }

    #[test]
    fn drained_stream_reports_end_with_last_word() {
        let mut queue = WordQueue::from_reader(Cursor::new("tafel\n"));
        queue.at(0).expect("lookup");
        assert_eq!(
            queue.at(1).expect("lookup"),
            slot("tafel", Some(Boundary::EndOfList))
        );
        assert!(queue.is_exhausted());
    }

    #[test]
    fn empty_sources_yield_no_word() {
        assert_eq!(WordQueue::from_args(&[]).at(0).expect("lookup"), None);
        assert_eq!(
            WordQueue::from_reader(Cursor::new("\n\n")).at(0).expect("lookup"),
            None
        );
    }

    #[test]
    fn inserted_word_lands_after_current_position() {
        let mut queue = WordQueue::from_args(&args(&["tafel", "stoel"]));
        let position = queue.insert_after(0, " kast ");
        assert_eq!(position, 1);
        assert_eq!(queue.at(1).expect("lookup"), slot("kast", None));
        assert_eq!(queue.at(2).expect("lookup"), slot("stoel", None));
    }

    #[test]
    fn only_terminal_pulls_need_the_terminal() {
        let mut queue = WordQueue::from_reader(Cursor::new("tafel\nstoel\n")).on_terminal(true);
        assert!(queue.pull_needs_terminal(0));
        queue.at(0).expect("lookup");
        assert!(!queue.pull_needs_terminal(0));
        assert!(!queue.pull_needs_terminal(-1));
        assert!(queue.pull_needs_terminal(1));

        let piped = WordQueue::from_reader(Cursor::new("tafel\n"));
        assert!(!piped.pull_needs_terminal(0));
        assert!(!WordQueue::from_args(&args(&["tafel"])).pull_needs_terminal(1));
    }

    #[test]
    fn drained_terminal_source_needs_no_terminal() {
        let mut queue = WordQueue::from_reader(Cursor::new("tafel\n")).on_terminal(true);
        queue.at(0).expect("lookup");
        queue.at(1).expect("lookup");
        assert!(!queue.pull_needs_terminal(1));
    }
}
