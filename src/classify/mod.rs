pub mod checkable;
pub mod classifier;
pub mod file;
pub mod grouping;
pub mod kind;
pub mod select;
pub mod text;

use classifier::FieldClassifier;

pub use classifier::{ClassifyContext, run_classifiers};
pub use grouping::{CheckableGroup, GroupSource, GroupingResult, group_checkables};
pub use kind::{ElementKind, element_kind};

/// Text, select, checkable, file: results are concatenated in this order.
pub fn default_classifiers() -> Vec<Box<dyn FieldClassifier>> {
    vec![
        Box::new(text::TextClassifier),
        Box::new(select::SelectClassifier),
        Box::new(checkable::CheckableClassifier),
        Box::new(file::FileClassifier),
    ]
}
