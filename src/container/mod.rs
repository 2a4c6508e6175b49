pub mod keywords;
pub mod scorer;

pub use scorer::{ContainerScore, expand_outward, pick_best, resolve_container, score_container};
