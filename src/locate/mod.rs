pub mod label;
pub mod locator;

pub use label::{LabelCandidate, LabelSource, resolve_label};
pub use locator::{relocate, resolve_xpath, unique_selectors, xpath_of};
