pub mod discovery;
pub mod scoring;
pub mod selectors;

pub use discovery::{discover_fields, skip_reason};
