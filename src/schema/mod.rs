//! Declared dataset layouts and validation of loaded tables against them.

pub mod arrow;
pub mod types;
pub mod validate;

use ::arrow::datatypes::SchemaRef;
use once_cell::sync::Lazy;
use std::sync::Arc;

pub use self::arrow::{build_arrow_schema, map_to_arrow_type};
pub use types::Column;
pub use validate::validate;

static SALES_SCHEMA: Lazy<SchemaRef> =
    Lazy::new(|| Arc::new(build_arrow_schema(types::SALES_COLUMNS)));
static CLEAN_ORDERS_SCHEMA: Lazy<SchemaRef> =
    Lazy::new(|| Arc::new(build_arrow_schema(types::CLEAN_ORDERS_COLUMNS)));
static ECOMMERCE_SCHEMA: Lazy<SchemaRef> =
    Lazy::new(|| Arc::new(build_arrow_schema(types::ECOMMERCE_COLUMNS)));

pub fn sales_schema() -> SchemaRef {
    SALES_SCHEMA.clone()
}

pub fn clean_orders_schema() -> SchemaRef {
    CLEAN_ORDERS_SCHEMA.clone()
}

pub fn ecommerce_schema() -> SchemaRef {
    ECOMMERCE_SCHEMA.clone()
}
