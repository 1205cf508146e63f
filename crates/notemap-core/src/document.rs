//! Documents as supplied by an embedding source.

use serde::{Deserialize, Serialize};

use crate::id::NoteId;

/// Default preview length in characters.
pub const PREVIEW_CHARS: usize = 120;

/// A note with its precomputed embedding and display metadata.
///
/// An empty `vector` means the source has no embedding for this note yet;
/// such documents are excluded from the graph and lower its coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: NoteId,
    #[serde(default)]
    pub vector: Vec<f32>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Length of the full note body in characters.
    #[serde(default)]
    pub content_length: usize,
}

impl Document {
    pub fn new(id: impl Into<NoteId>, vector: Vec<f32>) -> Self {
        Document {
            id: id.into(),
            vector,
            title: String::new(),
            preview: String::new(),
            tags: Vec::new(),
            content_length: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the preview from a full body, also recording its length.
    pub fn with_body(mut self, body: &str) -> Self {
        self.preview = preview_text(body, PREVIEW_CHARS);
        self.content_length = body.chars().count();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` if the document carries any of the given tags.
    /// An absent or empty filter matches everything.
    pub fn matches_tags(&self, filter: Option<&[String]>) -> bool {
        match filter {
            None => true,
            Some(wanted) if wanted.is_empty() => true,
            Some(wanted) => self.tags.iter().any(|t| wanted.contains(t)),
        }
    }
}

/// Collapses a note body into a single-line preview of at most `n`
/// characters, appending an ellipsis when truncated.
pub fn preview_text(text: &str, n: usize) -> String {
    let flat = text.trim().replace('\n', " ");
    if flat.chars().count() > n {
        let mut out: String = flat.chars().take(n).collect();
        out.push('…');
        out
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_with_ellipsis() {
        let body = format!("  {}\nend  ", "x".repeat(130));
        let preview = preview_text(&body, 120);
        assert_eq!(preview.chars().count(), 121);
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn preview_flattens_newlines() {
        assert_eq!(preview_text("one\ntwo", 120), "one two");
    }

    #[test]
    fn with_body_records_length() {
        let doc = Document::new("a", vec![1.0]).with_body("héllo");
        assert_eq!(doc.content_length, 5);
        assert_eq!(doc.preview, "héllo");
    }

    #[test]
    fn tag_matching() {
        let doc = Document::new("a", vec![]).with_tags(["rust", "graphs"]);
        assert!(doc.matches_tags(None));
        assert!(doc.matches_tags(Some(&[])));
        assert!(doc.matches_tags(Some(&["graphs".to_string()])));
        assert!(!doc.matches_tags(Some(&["cooking".to_string()])));
    }

    #[test]
    fn missing_fields_default() {
        let doc: Document = serde_json::from_str(r#"{"id":"n1"}"#).unwrap();
        assert!(doc.vector.is_empty());
        assert!(doc.tags.is_empty());
        assert_eq!(doc.content_length, 0);
    }
}
