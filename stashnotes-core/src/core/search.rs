//! Substring search over note snapshots.
//!
//! Matching is a pure function of the query, the notes it is given, and the
//! configured [`MatchMode`]. Results are always ordered most recently
//! modified first, with ties broken by ascending ID, so two searches over the
//! same state return identical sequences.

use crate::Note;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;

/// How query text and note text are compared.
///
/// Every mode is diacritic-sensitive: `"cafe"` does not match `"café"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    /// Unicode lowercase mapping on both sides.
    #[default]
    IgnoreCase,
    /// Only ASCII letters are folded; other characters must match exactly.
    AsciiIgnoreCase,
    /// Exact substring match.
    CaseSensitive,
}

impl MatchMode {
    fn fold<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            Self::IgnoreCase => Cow::Owned(text.to_lowercase()),
            Self::AsciiIgnoreCase => Cow::Owned(text.to_ascii_lowercase()),
            Self::CaseSensitive => Cow::Borrowed(text),
        }
    }
}

/// A query string folded once for repeated matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    needle: String,
    mode: MatchMode,
}

impl SearchQuery {
    pub fn new(text: &str, mode: MatchMode) -> Self {
        Self {
            text: text.to_string(),
            needle: mode.fold(text).into_owned(),
            mode,
        }
    }

    /// The query as the caller wrote it.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Returns `true` if the query is a substring of the note's title or content.
    ///
    /// The empty query matches every note.
    pub fn matches(&self, note: &Note) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        self.mode.fold(&note.title).contains(&self.needle)
            || self.mode.fold(&note.content).contains(&self.needle)
    }
}

/// Returns copies of every note matched by `query`, in listing order.
pub fn search<'a, I>(notes: I, query: &SearchQuery) -> Vec<Note>
where
    I: IntoIterator<Item = &'a Note>,
{
    let mut hits: Vec<Note> = notes
        .into_iter()
        .filter(|note| query.matches(note))
        .cloned()
        .collect();
    hits.sort_by(listing_order);
    hits
}

/// Most recently modified first; ties by ascending ID.
pub fn listing_order(a: &Note, b: &Note) -> Ordering {
    b.revision.cmp(&a.revision).then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoteId;

    fn note(id: u64, title: &str, content: &str, revision: u64) -> Note {
        Note {
            id: NoteId::new(id),
            title: title.to_string(),
            content: content.to_string(),
            created_at: 0,
            modified_at: 0,
            revision,
        }
    }

    fn ids(notes: &[Note]) -> Vec<u64> {
        notes.iter().map(|n| n.id.as_u64()).collect()
    }

    fn corpus() -> Vec<Note> {
        vec![
            note(1, "Milk", "buy 2%", 1),
            note(2, "Work", "finish report", 2),
            note(3, "Groceries", "MILK and bread", 3),
        ]
    }

    #[test]
    fn test_substring_matches_title_or_content_ignoring_case() {
        let notes = corpus();
        let hits = search(&notes, &SearchQuery::new("milk", MatchMode::IgnoreCase));
        assert_eq!(ids(&hits), vec![3, 1]);

        let hits = search(&notes, &SearchQuery::new("REPORT", MatchMode::IgnoreCase));
        assert_eq!(ids(&hits), vec![2]);
    }

    #[test]
    fn test_empty_query_returns_everything_newest_first() {
        let notes = corpus();
        let hits = search(&notes, &SearchQuery::new("", MatchMode::IgnoreCase));
        assert_eq!(ids(&hits), vec![3, 2, 1]);
    }

    #[test]
    fn test_ties_are_broken_by_ascending_id() {
        let notes = vec![note(9, "a", "", 5), note(4, "a", "", 5), note(7, "a", "", 6)];
        let hits = search(&notes, &SearchQuery::new("a", MatchMode::IgnoreCase));
        assert_eq!(ids(&hits), vec![7, 4, 9]);
    }

    #[test]
    fn test_order_does_not_depend_on_input_order() {
        let mut notes = corpus();
        let query = SearchQuery::new("", MatchMode::IgnoreCase);
        let first = search(&notes, &query);
        notes.reverse();
        assert_eq!(search(&notes, &query), first);
    }

    #[test]
    fn test_match_modes() {
        let notes = vec![note(1, "Ärger", "Straße", 1)];

        let unicode = SearchQuery::new("ärger", MatchMode::IgnoreCase);
        assert!(unicode.matches(&notes[0]));

        let ascii = SearchQuery::new("ärger", MatchMode::AsciiIgnoreCase);
        assert!(!ascii.matches(&notes[0]));
        assert!(SearchQuery::new("STRAßE", MatchMode::AsciiIgnoreCase).matches(&notes[0]));

        let exact = SearchQuery::new("straße", MatchMode::CaseSensitive);
        assert!(!exact.matches(&notes[0]));
        assert!(SearchQuery::new("Straße", MatchMode::CaseSensitive).matches(&notes[0]));
    }

    #[test]
    fn test_matching_is_diacritic_sensitive() {
        let notes = vec![note(1, "café", "", 1)];
        assert!(!SearchQuery::new("cafe", MatchMode::IgnoreCase).matches(&notes[0]));
    }
}
