//! 商城只读查询服务
//!
//! 提供以下功能：
//! - 商品分类、商品与用户查询
//! - 用户销售记录（按日期范围 / 最近 N 条）
//! - 用户平均消费统计

mod aggregator;
mod connection;
mod executor;
mod extract;
mod handlers;
mod queries;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::{load_dotenv, AppConfig};
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "shop-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "商城查询服务 API",
        version = "0.1.0",
        description = "商品、用户与销售只读查询微服务"
    ),
    paths(
        handlers::list_categories,
        handlers::list_products,
        handlers::get_product,
        handlers::list_users,
        handlers::get_average_spend,
        handlers::list_user_sales,
        handlers::list_latest_user_sales,
        handlers::health_check,
    ),
    components(schemas(
        common::models::AverageSpend,
        common::response::ErrorDetail,
        common::response::HealthResponse,
    )),
    tags(
        (name = "catalog", description = "分类与商品端点"),
        (name = "users", description = "用户端点"),
        (name = "sales", description = "销售记录端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::load_with_service(SERVICE_NAME);
    let state = AppState::new(config.clone()).context("初始化应用状态失败 (检查 DB_* 环境变量)")?;

    let app = create_router(state);

    let addr = config.listen_addr();
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {}", addr))?;
    axum::serve(listener, app).await.context("服务启动失败")?;
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::testing::{self, RecordingConnector};

    fn app() -> Router {
        let state = AppState::with_connector(
            AppConfig::from_lookup(SERVICE_NAME, |_| None),
            testing::connection_config(),
            queries::build_catalog(None).unwrap(),
            Arc::new(RecordingConnector::refusing("unused")),
        );
        create_router(state)
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let response = app()
            .oneshot(
                Request::get("/api/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_openapi_lists_endpoints() {
        let response = app()
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/api/users/{id}/sales"].is_object());
        assert!(doc["paths"]["/api/products/{id}"].is_object());
    }
}
