//! Handler模块

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use validator::{Validate, ValidationError};

use common::errors::{AppError, AppResult};
use common::models::{AverageSpend, QueryParams, Record};
use common::response::{ErrorDetail, HealthResponse};

use crate::aggregator;
use crate::extract::{ApiPath, ValidQuery};
use crate::queries;
use crate::state::AppState;

const DEFAULT_LATEST_SALES: u32 = 5;

/// 销售记录日期范围（闭区间）
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
#[validate(schema(function = "validate_sales_range"))]
pub struct SalesRange {
    /// 起始日期 (YYYY-MM-DD)
    pub date_from: NaiveDate,
    /// 截止日期 (YYYY-MM-DD)
    pub date_to: NaiveDate,
}

fn validate_sales_range(range: &SalesRange) -> Result<(), ValidationError> {
    if range.date_from > range.date_to {
        let mut error = ValidationError::new("date_range");
        error.message = Some("date_from must not be after date_to".into());
        return Err(error);
    }
    Ok(())
}

/// 最近销售记录数量
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LatestSalesQuery {
    /// 返回条数，默认 5
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

/// 列出所有商品分类
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "catalog",
    responses(
        (status = 200, description = "分类列表"),
        (status = 500, description = "数据库错误", body = ErrorDetail)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Record>>> {
    let categories = state
        .executor
        .run_named(queries::CATEGORIES, QueryParams::new())
        .await?;
    Ok(Json(categories))
}

/// 列出所有商品
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "catalog",
    responses(
        (status = 200, description = "商品列表"),
        (status = 500, description = "数据库错误", body = ErrorDetail)
    )
)]
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Record>>> {
    let products = state
        .executor
        .run_named(queries::PRODUCTS, QueryParams::new())
        .await?;
    Ok(Json(products))
}

/// 根据 ID 获取商品
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "catalog",
    params(
        ("id" = i64, Path, description = "商品 ID")
    ),
    responses(
        (status = 200, description = "商品详情"),
        (status = 404, description = "商品未找到", body = ErrorDetail),
        (status = 422, description = "ID 无效", body = ErrorDetail),
        (status = 500, description = "数据库错误", body = ErrorDetail)
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Record>> {
    state
        .executor
        .run_named(queries::PRODUCT, QueryParams::new().with("product_id", id))
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| AppError::not_found("product", id))
}

/// 列出所有用户（不含邮箱）
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "用户列表"),
        (status = 500, description = "数据库错误", body = ErrorDetail)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<Record>>> {
    let users = state
        .executor
        .run_named(queries::USERS, QueryParams::new())
        .await?;
    Ok(Json(users.iter().map(|user| user.without("email")).collect()))
}

/// 用户平均消费
#[utoipa::path(
    get,
    path = "/api/users/{id}/average_spend",
    tag = "users",
    params(
        ("id" = i64, Path, description = "用户 ID")
    ),
    responses(
        (status = 200, description = "平均消费", body = AverageSpend),
        (status = 422, description = "ID 无效", body = ErrorDetail),
        (status = 500, description = "数据库错误", body = ErrorDetail)
    )
)]
pub async fn get_average_spend(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> AppResult<Json<AverageSpend>> {
    let sales = state
        .executor
        .run_named(queries::SALES_AVERAGE, QueryParams::new().with("user_id", user_id))
        .await?;
    Ok(Json(AverageSpend {
        user_id,
        average_spend: aggregator::average_spend(&sales)?,
    }))
}

/// 用户在日期范围内的销售记录
#[utoipa::path(
    get,
    path = "/api/users/{id}/sales",
    tag = "sales",
    params(
        ("id" = i64, Path, description = "用户 ID"),
        SalesRange
    ),
    responses(
        (status = 200, description = "销售记录"),
        (status = 404, description = "用户未找到", body = ErrorDetail),
        (status = 422, description = "日期参数缺失或范围无效", body = ErrorDetail),
        (status = 500, description = "数据库错误", body = ErrorDetail)
    )
)]
pub async fn list_user_sales(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
    ValidQuery(range): ValidQuery<SalesRange>,
) -> AppResult<Json<Vec<Record>>> {
    ensure_user_exists(&state, user_id).await?;

    let params = QueryParams::new()
        .with("user_id", user_id)
        .with("date_from", range.date_from)
        .with("date_to", range.date_to);
    let sales = state.executor.run_named(queries::USER_SALES, params).await?;
    shape_sales(&sales)
}

/// 用户最近的销售记录
#[utoipa::path(
    get,
    path = "/api/users/{id}/sales/latest",
    tag = "sales",
    params(
        ("id" = i64, Path, description = "用户 ID"),
        LatestSalesQuery
    ),
    responses(
        (status = 200, description = "最近的销售记录"),
        (status = 404, description = "用户未找到", body = ErrorDetail),
        (status = 422, description = "参数无效", body = ErrorDetail),
        (status = 500, description = "数据库错误", body = ErrorDetail)
    )
)]
pub async fn list_latest_user_sales(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
    ValidQuery(query): ValidQuery<LatestSalesQuery>,
) -> AppResult<Json<Vec<Record>>> {
    ensure_user_exists(&state, user_id).await?;

    let params = QueryParams::new()
        .with("user_id", user_id)
        .with("limit", query.limit.unwrap_or(DEFAULT_LATEST_SALES));
    let sales = state
        .executor
        .run_named(queries::USER_SALES_LATEST, params)
        .await?;
    shape_sales(&sales)
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        state.config.service_name.clone(),
        env!("CARGO_PKG_VERSION"),
    ))
}

async fn ensure_user_exists(state: &AppState, user_id: i64) -> AppResult<()> {
    let found = state
        .executor
        .run_named(queries::USER, QueryParams::new().with("user_id", user_id))
        .await?;
    if found.is_empty() {
        return Err(AppError::not_found("user", user_id));
    }
    Ok(())
}

fn shape_sales(sales: &[Record]) -> AppResult<Json<Vec<Record>>> {
    sales
        .iter()
        .map(aggregator::shape_sale)
        .collect::<AppResult<Vec<_>>>()
        .map(Json)
}
