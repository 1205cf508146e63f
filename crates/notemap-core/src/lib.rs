pub mod builder;
pub mod cancel;
pub mod config;
pub mod document;
pub mod edge;
pub mod error;
pub mod graph;
pub mod hash;
pub mod id;
pub mod node;
pub mod position;
pub mod quality;
pub mod similarity;
pub mod source;
pub mod style;

// Re-export commonly used types
pub use builder::{BuildOutput, SimilarityGraphBuilder};
pub use cancel::CancelToken;
pub use config::{Dimensionality, GraphParams, LayoutStrategy, MapConfig};
pub use document::Document;
pub use edge::Edge;
pub use error::{CoreError, SourceError};
pub use graph::{Coverage, GraphSnapshot, GraphStats, NoteGraph};
pub use id::{EdgeId, NoteId};
pub use node::Node;
pub use position::Position;
pub use quality::DataQualityWarning;
pub use source::{EmbeddingSource, InMemorySource, JsonFileSource};
pub use style::{edge_style, style_for, EdgeStyle, NoteKind, StyleDescriptor};
