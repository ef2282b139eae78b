use serde::Serialize;

/// One addressable verse within a corpus.
///
/// The numeric id is corpus-local and never leaves the service; responses
/// carry the locator fields and text only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verse {
    pub id: i32,
    pub book: String,
    pub chapter: i32,
    pub verse: i32,
    pub text: String,
}

/// Wire shape of a verse in search responses.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VerseRecord {
    pub book: String,
    pub chapter: i32,
    pub verse: i32,
    pub text: String,
}

impl From<Verse> for VerseRecord {
    fn from(v: Verse) -> Self {
        Self {
            book: v.book,
            chapter: v.chapter,
            verse: v.verse,
            text: v.text,
        }
    }
}

/// Ranked nearest-neighbor hit produced by the similarity engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredVerse {
    pub verse_id: i32,
    /// `1 - cosine_distance(query, stored)`.
    pub score: f64,
}
