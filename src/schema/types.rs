use serde::Serialize;

/// One declared column: name plus a type name understood by
/// [`map_to_arrow_type`](super::arrow::map_to_arrow_type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub ty: &'static str,
}

const fn col(name: &'static str, ty: &'static str) -> Column {
    Column { name, ty }
}

/// The generated daily sales table handed from the generator to the reports.
pub const SALES_COLUMNS: &[Column] = &[
    col("Date", "date"),
    col("Product", "text"),
    col("Region", "text"),
    col("Quantity", "int"),
    col("Unit_Price", "int"),
    col("Revenue", "int"),
];

/// Orders after the cleaning pass of the transformation report.
pub const CLEAN_ORDERS_COLUMNS: &[Column] = &[
    col("order_id", "int"),
    col("customer_name", "text"),
    col("order_date", "date"),
    col("product", "text"),
    col("quantity", "int"),
    col("unit_price", "float"),
    col("region", "text"),
    col("payment_method", "text"),
    col("discount_pct", "float"),
    col("customer_rating", "float"),
    col("gross_revenue", "float"),
    col("discount_amount", "float"),
    col("net_revenue", "float"),
];

/// The merged customer × transaction table of the e-commerce report, as
/// written to `clean_ecommerce_data`.
pub const ECOMMERCE_COLUMNS: &[Column] = &[
    col("transaction_id", "text"),
    col("customer_id", "text"),
    col("transaction_date", "datetime"),
    col("product_category", "text"),
    col("product_name", "text"),
    col("quantity", "int"),
    col("unit_price", "int"),
    col("discount_percent", "int"),
    col("net_amount", "float"),
    col("payment_method", "text"),
    col("delivery_status", "text"),
    col("city", "text"),
    col("customer_segment", "text"),
];
