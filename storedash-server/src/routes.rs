//! JSON endpoints for the dashboard.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use storedash_postgres::{
    AnalyticsSummary, CustomerLocation, OrdersPoint, RevenuePoint, StoreAccess, StoreId,
};

use crate::error::ApiError;
use crate::session::CurrentUser;
use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stores", get(list_stores))
        .route("/api/stores/{id}/analytics", get(analytics))
        .route("/api/stores/{id}/orders", get(orders))
        .route("/api/stores/{id}/revenue", get(revenue))
        .route("/api/stores/{id}/locations", get(locations))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct StoresResponse {
    stores: Vec<StoreAccess>,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    summary: AnalyticsSummary,
}

#[derive(Debug, Serialize)]
struct SeriesResponse<T> {
    data: Vec<T>,
}

async fn health() -> &'static str {
    "ok"
}

async fn list_stores(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<StoresResponse>, ApiError> {
    // A directory failure surfaces here as an empty list by design.
    let stores = state.directory.user_stores(&user.email).await;
    Ok(Json(StoresResponse { stores }))
}

async fn analytics(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state.dashboard.summary(StoreId::new(id)).await?;
    Ok(Json(SummaryResponse { summary }))
}

async fn orders(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<SeriesResponse<OrdersPoint>>, ApiError> {
    let data = state.dashboard.orders_series(StoreId::new(id)).await?;
    Ok(Json(SeriesResponse { data }))
}

async fn revenue(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<SeriesResponse<RevenuePoint>>, ApiError> {
    let data = state.dashboard.revenue_series(StoreId::new(id)).await?;
    Ok(Json(SeriesResponse { data }))
}

async fn locations(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<SeriesResponse<CustomerLocation>>, ApiError> {
    let data = state.dashboard.locations(StoreId::new(id)).await?;
    Ok(Json(SeriesResponse { data }))
}
