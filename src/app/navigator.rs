use std::collections::HashMap;

use anyhow::Result;

use super::extract::PronunciationRecord;
use super::lookup::Lookup;
use super::player::Player;
use super::saver::Saver;
use super::words::{Slot, WordQueue};

const KEY_ENTER: char = '\n';
const KEY_ESC: char = '\x1b';
const KEY_BACKSPACE: char = '\x08';
const KEY_DELETE: char = '\x7f';
const KEY_INTERRUPT: char = '\x03';

pub(crate) trait Screen {
    /// Redraws the whole menu; the previous frame is discarded.
    fn show(&mut self, menu: &Menu<'_>) -> Result<()>;

    /// Releases the terminal while a word is read from it as a plain line.
    fn suspend(&mut self) -> Result<()> {
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }
}

pub(crate) trait KeySource {
    /// Blocks for one key. Enter arrives as `'\n'`, Esc as `'\x1b'` and
    /// Ctrl-C as `'\x03'`.
    fn read_key(&mut self) -> Result<char>;
}

pub(crate) trait Console: Screen + KeySource {}

impl<T: Screen + KeySource> Console for T {}

/// Keys offered in the current state; everything else is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Allowed {
    pub(crate) next_word: bool,
    pub(crate) previous_word: bool,
    pub(crate) next_entry: bool,
    pub(crate) previous_entry: bool,
    pub(crate) choose: bool,
    pub(crate) replay: bool,
    pub(crate) retry: bool,
}

impl Allowed {
    fn permits(&self, key: char) -> bool {
        match key {
            'q' | 'e' | KEY_INTERRUPT => true,
            'n' | KEY_ENTER => self.next_word,
            'p' => self.previous_word,
            'j' => self.next_entry,
            'k' => self.previous_entry,
            'r' => self.replay,
            't' => self.retry,
            '0'..='9' => self.choose,
            _ => false,
        }
    }
}

/// Everything a screen needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Menu<'a> {
    pub(crate) word: &'a str,
    /// One line per pronunciation; empty in the miss state.
    pub(crate) entries: &'a [String],
    pub(crate) selected: usize,
    pub(crate) allowed: Allowed,
    pub(crate) digits: &'a str,
    pub(crate) prompt: Option<&'a str>,
    pub(crate) message: Option<&'a str>,
}

impl Menu<'_> {
    pub(crate) fn is_miss(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NavigationState {
    pub(crate) word_index: usize,
    pub(crate) word: String,
    pub(crate) pronunciation_index: usize,
    /// Shown by the next render, then dropped.
    pub(crate) last_error: Option<String>,
}

enum Flow {
    Continue,
    Quit,
}

/// Number of digits needed to address the largest valid index.
pub(crate) fn index_width(len: usize) -> usize {
    len.saturating_sub(1).to_string().len()
}

/// Interactive browser over words and their pronunciations.
pub(crate) struct Navigator<'a> {
    queue: &'a mut WordQueue,
    lookup: Lookup<'a>,
    saver: Saver<'a>,
    console: &'a mut dyn Console,
    player: &'a mut dyn Player,
    lists: HashMap<String, Vec<PronunciationRecord>>,
    state: NavigationState,
    pending_play: bool,
}

impl<'a> Navigator<'a> {
    pub(crate) fn new(
        queue: &'a mut WordQueue,
        lookup: Lookup<'a>,
        saver: Saver<'a>,
        console: &'a mut dyn Console,
        player: &'a mut dyn Player,
    ) -> Self {
        Self {
            queue,
            lookup,
            saver,
            console,
            player,
            lists: HashMap::new(),
            state: NavigationState::default(),
            pending_play: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &NavigationState {
        &self.state
    }

    pub(crate) fn run(&mut self) -> Result<()> {
        let Some(first) = self.word_at(0)? else {
            return Ok(());
        };
        self.enter_word(0, first.word);

        loop {
            let list = self.current_list();
            let entries: Vec<String> = list.iter().map(PronunciationRecord::full_author).collect();
            let allowed = self.allowed(list.len());

            self.render(&entries, allowed, "", None)?;
            if self.pending_play && !list.is_empty() {
                self.pending_play = false;
                if !self.play_current(&list) {
                    self.render(&entries, allowed, "", None)?;
                }
            }

            if let Flow::Quit = self.handle_keys(&entries, allowed)? {
                return Ok(());
            }
        }
    }

    /// Word lookup that hands the terminal over while a line is read from it.
    fn word_at(&mut self, index: isize) -> Result<Option<Slot>> {
        if !self.queue.pull_needs_terminal(index) {
            return Ok(self.queue.at(index)?);
        }
        self.console.suspend()?;
        let slot = self.queue.at(index);
        self.console.resume()?;
        Ok(slot?)
    }

    fn enter_word(&mut self, index: usize, word: String) {
        self.state.word_index = index;
        self.state.word = word;
        self.state.pronunciation_index = 0;
        self.pending_play = true;
    }

    /// Memoized per word: a missing key means not fetched yet, an empty list
    /// means the word has no pronunciations.
    fn current_list(&mut self) -> Vec<PronunciationRecord> {
        let word = self.state.word.clone();
        let lookup = &self.lookup;
        let list = self
            .lists
            .entry(word)
            .or_insert_with_key(|word| lookup.resolve(word))
            .clone();
        if self.state.pronunciation_index >= list.len() {
            self.state.pronunciation_index = 0;
        }
        list
    }

    fn allowed(&self, len: usize) -> Allowed {
        let index = self.state.word_index;
        let at_last_word = index + 1 >= self.queue.len() && self.queue.is_exhausted();
        let entry = self.state.pronunciation_index;
        Allowed {
            next_word: !at_last_word,
            previous_word: index > 0,
            next_entry: len > 0 && entry + 1 < len,
            previous_entry: len > 0 && entry > 0,
            choose: len > 0,
            replay: len > 0,
            retry: len == 0,
        }
    }

    fn render(
        &mut self,
        entries: &[String],
        allowed: Allowed,
        digits: &str,
        prompt: Option<&str>,
    ) -> Result<()> {
        let message = self.state.last_error.take();
        let menu = Menu {
            word: &self.state.word,
            entries,
            selected: self.state.pronunciation_index,
            allowed,
            digits,
            prompt,
            message: message.as_deref(),
        };
        self.console.show(&menu)
    }

    /// Saves and plays the current selection. False when a message was queued.
    fn play_current(&mut self, list: &[PronunciationRecord]) -> bool {
        let Some(record) = list.get(self.state.pronunciation_index) else {
            return true;
        };
        let path = match self.saver.save(record) {
            Ok(Some(path)) => path,
            Ok(None) => return true,
            Err(err) => {
                log::warn!("could not save '{}': {err}", record.word);
                self.state.last_error = Some(format!("Nothing to play: {err}"));
                return false;
            }
        };
        if let Err(err) = self.player.play(&path) {
            self.state.last_error = Some(format!("Playback failed: {err:#}"));
            return false;
        }
        true
    }

    /// Reads keys until one changes state or requests a fresh frame.
    fn handle_keys(&mut self, entries: &[String], allowed: Allowed) -> Result<Flow> {
        loop {
            let key = self.console.read_key()?;
            if !allowed.permits(key) {
                continue;
            }
            return match key {
                'q' | KEY_INTERRUPT => Ok(Flow::Quit),
                'n' | KEY_ENTER => self.step_word(1),
                'p' => self.step_word(-1),
                'j' => {
                    self.select_entry(self.state.pronunciation_index + 1);
                    Ok(Flow::Continue)
                }
                'k' => {
                    self.select_entry(self.state.pronunciation_index.saturating_sub(1));
                    Ok(Flow::Continue)
                }
                'r' => {
                    self.pending_play = true;
                    Ok(Flow::Continue)
                }
                't' => {
                    self.lists.remove(&self.state.word);
                    self.pending_play = true;
                    Ok(Flow::Continue)
                }
                'e' => self.insert_word(entries, allowed),
                digit => self.choose_by_number(digit, entries, allowed),
            };
        }
    }

    fn select_entry(&mut self, index: usize) {
        self.state.pronunciation_index = index;
        self.pending_play = true;
    }

    fn step_word(&mut self, delta: isize) -> Result<Flow> {
        let target = self.state.word_index as isize + delta;
        let Some(slot) = self.word_at(target)? else {
            return Ok(Flow::Continue);
        };
        if slot.boundary.is_some() {
            self.state.last_error = Some(match delta {
                d if d < 0 => "Already at the first word.".to_string(),
                _ => "No more words.".to_string(),
            });
            return Ok(Flow::Continue);
        }
        self.enter_word(target as usize, slot.word);
        Ok(Flow::Continue)
    }

    /// Collects digits until the index width is reached. An out-of-range
    /// number is rejected and needs one dismissal key.
    fn choose_by_number(&mut self, first: char, entries: &[String], allowed: Allowed) -> Result<Flow> {
        let width = index_width(entries.len());
        let mut digits = String::new();
        let mut key = first;
        loop {
            digits.push(key);
            let number = digits.parse::<usize>().unwrap_or(usize::MAX);
            if number >= entries.len() {
                self.state.last_error = Some(format!(
                    "Number you entered is too big ({digits}). Press any key..."
                ));
                self.render(entries, allowed, "", None)?;
                if self.console.read_key()? == KEY_INTERRUPT {
                    return Ok(Flow::Quit);
                }
                return Ok(Flow::Continue);
            }
            if digits.len() >= width {
                self.select_entry(number);
                return Ok(Flow::Continue);
            }

            self.render(entries, allowed, &digits, None)?;
            key = loop {
                let next = self.console.read_key()?;
                if next.is_ascii_digit() {
                    break next;
                }
                if next == KEY_ESC {
                    return Ok(Flow::Continue);
                }
                if next == KEY_INTERRUPT {
                    return Ok(Flow::Quit);
                }
            };
        }
    }

    /// Prompts for a word, splices it in after the current one and moves to it.
    fn insert_word(&mut self, entries: &[String], allowed: Allowed) -> Result<Flow> {
        let mut buffer = String::new();
        loop {
            self.render(entries, allowed, "", Some(&buffer))?;
            match self.console.read_key()? {
                KEY_ENTER => break,
                KEY_ESC => return Ok(Flow::Continue),
                KEY_INTERRUPT => return Ok(Flow::Quit),
                KEY_BACKSPACE | KEY_DELETE => {
                    buffer.pop();
                }
                ch if !ch.is_control() => buffer.push(ch),
                _ => {}
            }
        }

        let word = buffer.trim();
        if word.is_empty() {
            return Ok(Flow::Continue);
        }
        let position = self.queue.insert_after(self.state.word_index, word);
        self.enter_word(position, word.to_string());
        Ok(Flow::Continue)
    }
}
