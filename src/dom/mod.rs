//! In-memory page model the engine runs against: node arena, shadow trees,
//! a CSS-subset selector engine, inline-style layout approximation and an
//! event system whose listeners can emulate host-page frameworks.

pub mod dom_model;
pub mod events;
pub mod html;
pub mod selector;
pub mod style;

pub use dom_model::{Document, FileEntry, NodeId, Rect};
pub use events::{DispatchResult, DomEvent};
pub use html::{parse_html, serialize_children};
