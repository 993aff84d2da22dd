// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::SessionContext, i18n::Locale},
    models::dashboard::{ActivityEntry, DashboardStats},
    services::dashboard_service::DEFAULT_ACTIVITY_LIMIT,
};

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

// GET /api/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Total, pendentes e concluídos", body = DashboardStats),
        (status = 401, description = "Não autorizado"),
        (status = 502, description = "Falha ao consultar; tente novamente")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .dashboard_service
        .get_stats()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/dashboard/activity
#[utoipa::path(
    get,
    path = "/api/dashboard/activity",
    tag = "Dashboard",
    params(
        ("limit" = Option<usize>, Query, description = "Quantidade de itens (padrão 5)")
    ),
    responses(
        (status = 200, description = "Movimentações mais recentes primeiro", body = Vec<ActivityEntry>),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_activity(
    State(app_state): State<AppState>,
    locale: Locale,
    SessionContext(sid): SessionContext,
    Query(query): Query<ActivityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let activity = app_state
        .dashboard_service
        .get_activity(sid, query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT))
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(activity)))
}
