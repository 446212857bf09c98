//! User input state.
//!
//! Manages the single-line prompt buffer, command history, and history
//! navigation.

/// User input state.
///
/// Encapsulates the text buffer, command history, and navigation state.
pub struct InputState {
    buffer: String,
    /// Cursor position as a byte offset into `buffer` (always on a char
    /// boundary).
    cursor: usize,

    /// Command history for up/down navigation.
    pub history: Vec<String>,

    /// Current position in history (None = not navigating).
    history_index: Option<usize>,

    /// Draft text saved when navigating history.
    draft: Option<String>,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            history: Vec::new(),
            history_index: None,
            draft: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Cursor position in characters, for rendering.
    pub fn cursor_chars(&self) -> usize {
        self.buffer[..self.cursor].chars().count()
    }

    pub fn insert_char(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.stop_history_navigation();
    }

    pub fn backspace(&mut self) {
        if let Some(ch) = self.buffer[..self.cursor].chars().next_back() {
            self.cursor -= ch.len_utf8();
            self.buffer.remove(self.cursor);
            self.stop_history_navigation();
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.buffer.len() {
            self.buffer.remove(self.cursor);
            self.stop_history_navigation();
        }
    }

    pub fn move_left(&mut self) {
        if let Some(ch) = self.buffer[..self.cursor].chars().next_back() {
            self.cursor -= ch.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.buffer[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.buffer.len();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.history_index = None;
        self.draft = None;
    }

    /// Takes the trimmed buffer for submission, recording it in history.
    ///
    /// Returns `None` for whitespace-only input, leaving the buffer as is.
    pub fn take_submission(&mut self) -> Option<String> {
        let text = self.buffer.trim().to_string();
        if text.is_empty() {
            return None;
        }
        if self.history.last() != Some(&text) {
            self.history.push(text.clone());
        }
        self.clear();
        Some(text)
    }

    /// Moves up in history, saving the current buffer as a draft first.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.history_index {
            None => {
                self.draft = Some(self.buffer.clone());
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_index = Some(index);
        self.set_text(self.history[index].clone());
    }

    /// Moves down in history, restoring the draft past the newest entry.
    pub fn history_next(&mut self) {
        let Some(index) = self.history_index else {
            return;
        };
        if index + 1 < self.history.len() {
            self.history_index = Some(index + 1);
            self.set_text(self.history[index + 1].clone());
        } else {
            self.history_index = None;
            let draft = self.draft.take().unwrap_or_default();
            self.set_text(draft);
        }
    }

    fn stop_history_navigation(&mut self) {
        self.history_index = None;
        self.draft = None;
    }
}
