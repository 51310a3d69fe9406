//! Documents navigated by a session.

use crate::NavError;
use crate::events::{DocumentChange, ListenerSet, Subscription};
use ropey::Rope;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a document object. Two handles to the same document share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

impl DocumentId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A text document as seen by navigation.
pub trait NavDocument {
    /// Stable identity of this document.
    fn id(&self) -> DocumentId;

    /// Full document text.
    fn text(&self) -> Cow<'_, str>;

    /// Document length in chars.
    fn len_chars(&self) -> usize;

    /// The char at `offset`, or `None` past the end.
    fn char_at(&self, offset: usize) -> Option<char>;

    /// The text in `start..end` (char offsets, clamped).
    fn slice(&self, start: usize, end: usize) -> String;

    /// Subscribe to edit notifications.
    fn subscribe_changes(&self, listener: Box<dyn FnMut(&DocumentChange) + Send>) -> Subscription;
}

/// Rope-backed in-memory document.
pub struct TextDocument {
    id: DocumentId,
    rope: Rope,
    version: u64,
    listeners: ListenerSet<DocumentChange>,
}

impl TextDocument {
    /// Create a document holding `text`.
    pub fn new(text: &str) -> Self {
        Self {
            id: DocumentId::next(),
            rope: Rope::from_str(text),
            version: 0,
            listeners: ListenerSet::new(),
        }
    }

    /// Edit counter, incremented by every edit.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Insert `text` at char offset `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<(), NavError> {
        self.replace(offset, offset, text)
    }

    /// Delete the chars in `start..end`.
    pub fn delete(&mut self, start: usize, end: usize) -> Result<(), NavError> {
        self.replace(start, end, "")
    }

    /// Replace the chars in `start..end` with `text` and notify listeners.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> Result<(), NavError> {
        let len = self.rope.len_chars();
        for offset in [start, end] {
            if offset > len {
                return Err(NavError::OffsetOutOfBounds { offset, len });
            }
        }
        let (start, end) = (start.min(end), start.max(end));
        if start == end && text.is_empty() {
            return Ok(());
        }

        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.version += 1;

        self.listeners.emit(&DocumentChange {
            version: self.version,
            start,
            removed: end - start,
            inserted: text.chars().count(),
        });
        Ok(())
    }
}

impl NavDocument for TextDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn text(&self) -> Cow<'_, str> {
        Cow::from(&self.rope)
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.rope.get_char(offset)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        let len = self.rope.len_chars();
        let (start, end) = (start.min(len), end.min(len));
        if start >= end {
            return String::new();
        }
        self.rope.slice(start..end).to_string()
    }

    fn subscribe_changes(&self, listener: Box<dyn FnMut(&DocumentChange) + Send>) -> Subscription {
        self.listeners.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_edits_bump_version_and_notify() {
        let mut doc = TextDocument::new("hello");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = doc.subscribe_changes(Box::new(move |c| seen_clone.lock().unwrap().push(c.clone())));

        doc.insert(5, " world").unwrap();
        doc.delete(0, 1).unwrap();

        assert_eq!(doc.text(), "ello world");
        assert_eq!(doc.version(), 2);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[1],
            DocumentChange {
                version: 2,
                start: 0,
                removed: 1,
                inserted: 0
            }
        );
    }

    #[test]
    fn test_out_of_bounds_edit_is_rejected() {
        let mut doc = TextDocument::new("abc");
        let err = doc.insert(4, "x").unwrap_err();
        assert!(matches!(err, NavError::OffsetOutOfBounds { offset: 4, len: 3 }));
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_char_access_uses_char_offsets() {
        let doc = TextDocument::new("a👋b\n");
        assert_eq!(doc.len_chars(), 4);
        assert_eq!(doc.char_at(1), Some('👋'));
        assert_eq!(doc.char_at(3), Some('\n'));
        assert_eq!(doc.char_at(4), None);
        assert_eq!(doc.slice(1, 3), "👋b");
    }
}
