//! Sale response shapes.

use serde::Serialize;
use utoipa::ToSchema;

/// Columns of a shaped sale, in response order.
pub const SALE_FIELDS: [&str; 8] = [
    "user_id",
    "sales_id",
    "product_id",
    "transaction_ts",
    "product_title",
    "product_cost",
    "category",
    "num_items",
];

/// Average spend of one user across all of their sales.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AverageSpend {
    /// User the average was computed for.
    pub user_id: i64,
    /// Mean product cost rounded to 2 decimal places; `null` when the user
    /// has no sales.
    pub average_spend: Option<f64>,
}
