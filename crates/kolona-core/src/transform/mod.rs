//! Derived columns: a formula applied to one field of every record.

pub mod driver;
pub mod formula;
pub mod position;
pub mod presets;

pub use driver::{apply, CollisionPolicy, SourceSelector, TransformOutcome, TransformSpec};
pub use formula::{EvalFailure, Formula};
pub use position::ColumnPosition;
pub use presets::Preset;
