pub mod field_model;
pub mod markers;
pub mod session;
pub mod test_values;
pub mod value;

pub use field_model::{Field, FieldOption, FieldType, FieldValue, GroupType};
pub use session::DetectionSession;
pub use value::is_checked;
