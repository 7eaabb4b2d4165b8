//! 路由模块

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/products", get(handlers::list_products))
        .route("/api/products/{id}", get(handlers::get_product))
        .route("/api/users", get(handlers::list_users))
        .route("/api/users/{id}/average_spend", get(handlers::get_average_spend))
        .route("/api/users/{id}/sales", get(handlers::list_user_sales))
        .route("/api/users/{id}/sales/latest", get(handlers::list_latest_user_sales))
        .route("/api/health", get(handlers::health_check))
}
