//! Word lookup around the caret.

use crate::search::{MatchRange, is_word_char};
use unicode_segmentation::UnicodeSegmentation;

/// The word under `offset` (char offset), or the word ending exactly at `offset`.
///
/// Words follow Unicode word boundaries; a segment counts as a word when it contains an
/// alphanumeric char or `_`.
pub fn word_range_at(text: &str, offset: usize) -> Option<MatchRange> {
    let mut char_start = 0;
    let mut ending_here = None;

    for segment in text.split_word_bounds() {
        let char_len = segment.chars().count();
        let range = MatchRange::new(char_start, char_start + char_len);
        char_start = range.end;

        if range.start > offset {
            break;
        }
        if !segment.chars().any(is_word_char) {
            continue;
        }
        if range.start <= offset && offset < range.end {
            return Some(range);
        }
        if range.end == offset {
            ending_here = Some(range);
        }
    }

    ending_here
}
