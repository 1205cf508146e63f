//! Interactive session over a note similarity map.
//!
//! A [`GraphSession`] owns one view's graph, layout, pins and focus. It
//! moves through `Empty → Building → LayingOut → Settled`, runs builds and
//! layouts off the interaction path, discards superseded results and
//! publishes [`SessionEvent`]s to subscribers.

pub mod error;
pub mod events;
pub mod highlight;
pub mod session;
pub mod state;

pub use error::SessionError;
pub use events::SessionEvent;
pub use highlight::{Focus, HighlightSet};
pub use session::GraphSession;
pub use state::{RefreshOutcome, SessionId, SessionState};
