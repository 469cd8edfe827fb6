//! Text surface abstraction and its rope-backed implementation.
//!
//! The document lifecycle only ever reads or replaces the *whole* content of a
//! surface; fine-grained edits are the shell's business and are reported to
//! the lifecycle as content-changed notifications.

use ropey::Rope;
use std::fmt;

/// Live editable text owned by the editing widget.
pub trait TextSurface {
    /// Full current content.
    fn text(&self) -> String;

    /// Replace the entire content. This is a programmatic load, not a user
    /// edit, and must not be treated as a content change by callers.
    fn replace_all(&mut self, content: &str);

    fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
}

impl fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBuffer")
            .field("chars", &self.rope.len_chars())
            .field("lines", &self.rope.len_lines())
            .finish()
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
        }
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Total number of lines. An empty buffer has one (empty) line, matching ropey.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Return the requested line as an owned `String` (including trailing newline if present).
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx < self.rope.len_lines() {
            Some(self.rope.line(idx).to_string())
        } else {
            None
        }
    }

    /// Insert text at a char index, clamped to the end of the buffer.
    pub fn insert(&mut self, char_idx: usize, text: &str) {
        let at = char_idx.min(self.rope.len_chars());
        self.rope.insert(at, text);
    }

    pub fn append(&mut self, text: &str) {
        self.insert(self.rope.len_chars(), text);
    }

    /// Append `line` followed by a newline.
    pub fn push_line(&mut self, line: &str) {
        self.append(line);
        self.append("\n");
    }

    /// Remove the last non-empty line (with its newline). Returns the removed
    /// text without the newline, or `None` when the buffer is empty.
    pub fn pop_line(&mut self) -> Option<String> {
        let len = self.rope.len_chars();
        if len == 0 {
            return None;
        }
        // Skip the empty trailing line ropey reports after a final '\n'.
        let mut idx = self.rope.len_lines() - 1;
        if idx > 0 && self.rope.line(idx).len_chars() == 0 {
            idx -= 1;
        }
        let start = self.rope.line_to_char(idx);
        let mut removed = self.rope.slice(start..len).to_string();
        self.rope.remove(start..len);
        if removed.ends_with('\n') {
            removed.pop();
        }
        Some(removed)
    }
}

impl TextSurface for TextBuffer {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn replace_all(&mut self, content: &str) {
        self.rope = Rope::from_str(content);
    }

    fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }
}
