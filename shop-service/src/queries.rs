//! 命名查询表
//!
//! Built-in SQL for every endpoint. Columns are returned as stored;
//! `product_cost` stays `NUMERIC`.

use common::errors::AppResult;
use common::models::QueryCatalog;

pub const CATEGORIES: &str = "categories";
pub const PRODUCTS: &str = "products";
pub const PRODUCT: &str = "product";
pub const USERS: &str = "users";
pub const USER: &str = "user";
pub const SALES_AVERAGE: &str = "sales_average";
pub const USER_SALES: &str = "user_sales";
pub const USER_SALES_LATEST: &str = "user_sales_latest";

const PRODUCT_COLUMNS: &str = "p.product_id, p.product_title, p.product_description, \
     p.product_cost, c.category_name AS category";

const SALE_COLUMNS: &str = "s.user_id, s.sales_id, s.product_id, s.transaction_ts, \
     p.product_title, p.product_cost, \
     c.category_name AS category, s.num_items";

fn default_queries() -> Vec<(&'static str, String)> {
    vec![
        (
            CATEGORIES,
            "SELECT category_id, category_name FROM categories ORDER BY category_id".to_string(),
        ),
        (
            PRODUCTS,
            format!(
                "SELECT {PRODUCT_COLUMNS} FROM products p \
                 JOIN categories c ON c.category_id = p.category_id \
                 ORDER BY p.product_id"
            ),
        ),
        (
            PRODUCT,
            format!(
                "SELECT {PRODUCT_COLUMNS} FROM products p \
                 JOIN categories c ON c.category_id = p.category_id \
                 WHERE p.product_id = :product_id"
            ),
        ),
        (
            USERS,
            "SELECT user_id, first_name, last_name, email FROM users ORDER BY user_id".to_string(),
        ),
        (
            USER,
            "SELECT user_id FROM users WHERE user_id = :user_id".to_string(),
        ),
        (
            SALES_AVERAGE,
            "SELECT s.user_id, p.product_cost FROM sales s \
             JOIN products p ON p.product_id = s.product_id \
             WHERE s.user_id = :user_id"
                .to_string(),
        ),
        (
            USER_SALES,
            format!(
                "SELECT {SALE_COLUMNS} FROM sales s \
                 JOIN products p ON p.product_id = s.product_id \
                 JOIN categories c ON c.category_id = p.category_id \
                 WHERE s.user_id = :user_id \
                 AND s.transaction_ts::date BETWEEN :date_from AND :date_to \
                 ORDER BY s.transaction_ts"
            ),
        ),
        (
            USER_SALES_LATEST,
            format!(
                "SELECT {SALE_COLUMNS} FROM sales s \
                 JOIN products p ON p.product_id = s.product_id \
                 JOIN categories c ON c.category_id = p.category_id \
                 WHERE s.user_id = :user_id \
                 ORDER BY s.transaction_ts DESC LIMIT :limit"
            ),
        ),
    ]
}

/// Built-in queries, overridden by the JSON file at `override_path` if set.
pub fn build_catalog(override_path: Option<&str>) -> AppResult<QueryCatalog> {
    let mut catalog = QueryCatalog::new(default_queries())?;
    if let Some(path) = override_path {
        catalog.extend_from_json_file(path)?;
        tracing::info!(path, queries = catalog.len(), "已加载自定义查询表");
    }
    Ok(catalog)
}
