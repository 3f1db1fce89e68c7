use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a note, assigned by the repository at creation time.
///
/// Identifiers come from the backend's id sequence and are never handed out
/// twice for the same store, even after the note they named is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(u64);

impl NoteId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted title/content record.
///
/// Values handed out by the store are independent copies; changing one never
/// affects the stored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub modified_at: i64,
    /// Logical modification clock. Strictly increases with every persisted change.
    /// Local to one store, so it stays out of the serialized form.
    #[serde(skip)]
    pub(crate) revision: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Note {
        Note {
            id: NoteId::new(1),
            title: "Milk".to_string(),
            content: "buy 2%".to_string(),
            created_at: 1234567890,
            modified_at: 1234567890,
            revision: 1,
        }
    }

    #[test]
    fn test_clone_is_independent() {
        let note = sample();
        let mut copy = note.clone();
        copy.title.push_str(" and eggs");

        assert_eq!(note.title, "Milk");
        assert_ne!(note, copy);
    }

    #[test]
    fn test_note_id_serializes_as_number() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains(r#""id":1"#));
        assert!(json.contains("modifiedAt"));
    }

    #[test]
    fn test_revision_is_not_serialized() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("revision"));

        let back: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(back.revision, 0);
        assert_eq!(back.title, "Milk");
    }
}
