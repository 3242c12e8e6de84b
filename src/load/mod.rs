//! CSV loading: read every cell as text, infer one type per column, then
//! convert. Conversions can also be applied column by column afterwards.

pub mod convert;
pub mod date_parser;
pub mod infer;
pub mod reader;
pub mod utils;

pub use convert::{convert_column, to_bool, to_date, to_datetime, to_int, to_numeric};
pub use reader::{load_csv_with_schema, read_csv, read_csv_from};
