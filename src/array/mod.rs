//! Dense numeric arrays: the products × quarters matrix and 3-D cube
//! reductions, reshaping, stacking, broadcasting and fancy indexing, plus
//! the loop/kernel/parallel speed comparison.

pub mod cube;
pub mod matrix;
pub mod speed;

pub use cube::{
    adjust_columns, adjust_rows, arange, argmax_cell, column_stack, first_last_growth, hstack,
    mask_values, mean_last_axis, monthly_to_quarterly, pick_cells, random_cube, reshape,
    select_rows, totals_along, unravel_index, vstack, SalesCube,
};
pub use matrix::{consistency_label, OverallMetrics, QuarterlyMatrix, RowExtremes};
pub use speed::{discount_kernel, discount_loop, discount_parallel};
