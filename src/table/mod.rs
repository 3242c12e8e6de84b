//! Column-level helpers over Arrow `RecordBatch`es.
//!
//! Every table in the crate is a single `RecordBatch`; these helpers cover the
//! everyday moves (look up a column, read it as a typed vector, add or drop a
//! column, slice rows) so the analysis modules can stay short.

pub mod access;
pub mod columns;
pub mod frame;
pub mod join;
pub mod rows;
pub mod summary;

pub use access::{
    array_f64, array_i64, array_str, bool_values, column, column_names, f64_values, i64_values,
    str_values,
};
pub use columns::{
    drop_columns, from_columns, map_column_names, rename_columns, select_columns, with_column,
};
pub use frame::{array_of, frame_of, to_batch, to_frame};
pub use join::left_join;
pub use rows::{append_rows, concat, head, sample, slice, tail, take_rows};
pub use summary::{describe, info, nunique, unique, value_counts};
