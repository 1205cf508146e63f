//! Visual attributes as a pure function of graph data.
//!
//! The graph and layout never own rendering state. A renderer asks for a
//! [`StyleDescriptor`] per node and an [`EdgeStyle`] per edge each time it
//! draws, passing in whether the element is currently highlighted.

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::node::Node;

const BASE_RADIUS: f32 = 6.0;
const RADIUS_PER_SQRT_DEGREE: f32 = 2.5;
const MAX_RADIUS: f32 = 24.0;
const HIGHLIGHT_SCALE: f32 = 1.35;
const RESTING_OPACITY: f32 = 0.85;
const DETAILED_CONTENT_CHARS: usize = 500;

/// Coarse note category used for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Idea,
    Detailed,
    Technology,
    Note,
}

impl NoteKind {
    /// Classifies a note from its title and body length. Rules apply in
    /// order; the first match wins.
    pub fn classify(node: &Node) -> Self {
        let lower = node.title.to_lowercase();
        if lower.contains("business") || lower.contains("idea") {
            NoteKind::Idea
        } else if node.content_length > DETAILED_CONTENT_CHARS {
            NoteKind::Detailed
        } else if node.title.contains("AI") || lower.contains("tech") {
            NoteKind::Technology
        } else {
            NoteKind::Note
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            NoteKind::Idea => "#FF6B6B",
            NoteKind::Detailed => "#4ECDC4",
            NoteKind::Technology => "#45B7D1",
            NoteKind::Note => "#96CEB4",
        }
    }
}

/// How to draw one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleDescriptor {
    pub kind: NoteKind,
    pub color: &'static str,
    pub radius: f32,
    pub opacity: f32,
    /// Text to draw next to the node, only when highlighted.
    pub label: Option<String>,
}

/// How to draw one edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub color: String,
    pub width: f32,
    pub label: String,
}

pub fn style_for(node: &Node, is_highlighted: bool) -> StyleDescriptor {
    let kind = NoteKind::classify(node);
    let base = (BASE_RADIUS + RADIUS_PER_SQRT_DEGREE * (node.degree as f32).sqrt()).min(MAX_RADIUS);

    if is_highlighted {
        StyleDescriptor {
            kind,
            color: kind.color(),
            radius: base * HIGHLIGHT_SCALE,
            opacity: 1.0,
            label: Some(node.label()),
        }
    } else {
        StyleDescriptor {
            kind,
            color: kind.color(),
            radius: base,
            opacity: RESTING_OPACITY,
            label: None,
        }
    }
}

/// Stroke alpha tracks similarity; highlighted edges are drawn thicker.
pub fn edge_style(edge: &Edge, is_highlighted: bool) -> EdgeStyle {
    let alpha = edge.weight.clamp(0.0, 1.0);
    EdgeStyle {
        color: format!("rgba(100, 100, 100, {alpha:.2})"),
        width: if is_highlighted { 2.5 } else { 1.0 },
        label: format!("{:.2}", edge.weight),
    }
}
