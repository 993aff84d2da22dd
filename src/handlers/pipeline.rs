// src/handlers/pipeline.rs

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::SessionContext,
        i18n::Locale,
        rbac::{PipelineAccess, RequireRole},
    },
    models::{
        dashboard::PipelineBoard,
        registration::{Registration, RegistrationQuery, TransitionStatusPayload},
        status::B2bStatus,
    },
    services::registration_store::RegistrationStore,
};

// Store da sessão recarregado, como ao abrir a tela. Se o banco falhar,
// serve o que já estava carregado; sem nada carregado, é erro.
async fn fresh_store(app_state: &AppState, sid: Uuid) -> Result<Arc<RegistrationStore>, AppError> {
    let store = app_state.sessions.store_for(sid).await?;
    if !store.refresh().await && !store.is_loaded().await {
        return Err(AppError::CollaboratorFailure("list_registrations".into()));
    }
    Ok(store)
}

// GET /api/pipeline/board
#[utoipa::path(
    get,
    path = "/api/pipeline/board",
    tag = "Pipeline",
    responses(
        (status = 200, description = "Kanban: uma coluna por etapa, na ordem do funil", body = PipelineBoard),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Sem acesso ao CRM")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_board(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<PipelineAccess>,
    SessionContext(sid): SessionContext,
) -> Result<impl IntoResponse, ApiError> {
    let store = fresh_store(&app_state, sid)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(store.board().await)))
}

// GET /api/pipeline/registrations?q=...&status=...
#[utoipa::path(
    get,
    path = "/api/pipeline/registrations",
    tag = "Pipeline",
    params(
        ("q" = Option<String>, Query, description = "Busca por razão social, contato ou e-mail"),
        ("status" = Option<String>, Query, description = "Etapa exata; ausente ou 'all' = todas")
    ),
    responses(
        (status = 200, description = "Visão em tabela", body = Vec<Registration>),
        (status = 400, description = "Status inválido"),
        (status = 403, description = "Sem acesso ao CRM")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_registrations(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<PipelineAccess>,
    SessionContext(sid): SessionContext,
    Query(query): Query<RegistrationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match query.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(B2bStatus::from_wire(raw).ok_or_else(|| {
            AppError::InvalidStatus(raw.to_string()).to_api_error(&locale, &app_state.i18n_store)
        })?),
    };

    let store = fresh_store(&app_state, sid)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let registrations = store.search(query.q.as_deref(), status).await;
    Ok((StatusCode::OK, Json(registrations)))
}

// GET /api/pipeline/registrations/{id}
#[utoipa::path(
    get,
    path = "/api/pipeline/registrations/{id}",
    tag = "Pipeline",
    params(
        ("id" = Uuid, Path, description = "ID do cadastro")
    ),
    responses(
        (status = 200, description = "Cadastro com sócios e referências", body = Registration),
        (status = 404, description = "Cadastro não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_registration(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<PipelineAccess>,
    SessionContext(sid): SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = fresh_store(&app_state, sid)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let registration = store
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(registration)))
}

// PATCH /api/pipeline/registrations/{id}/status
#[utoipa::path(
    patch,
    path = "/api/pipeline/registrations/{id}/status",
    tag = "Pipeline",
    request_body = TransitionStatusPayload,
    params(
        ("id" = Uuid, Path, description = "ID do cadastro")
    ),
    responses(
        (status = 200, description = "Cadastro movido de etapa", body = Registration),
        (status = 400, description = "Status inválido"),
        (status = 404, description = "Cadastro não encontrado"),
        (status = 502, description = "Falha ao gravar; nada foi alterado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn transition_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<PipelineAccess>,
    SessionContext(sid): SessionContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state
        .sessions
        .store_for(sid)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let registration = store
        .transition(id, &payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(registration)))
}

// DELETE /api/pipeline/registrations/{id}
#[utoipa::path(
    delete,
    path = "/api/pipeline/registrations/{id}",
    tag = "Pipeline",
    params(
        ("id" = Uuid, Path, description = "ID do cadastro")
    ),
    responses(
        (status = 204, description = "Cadastro removido"),
        (status = 404, description = "Cadastro não encontrado"),
        (status = 502, description = "Falha ao remover; tente novamente")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_registration(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<PipelineAccess>,
    SessionContext(sid): SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state
        .sessions
        .store_for(sid)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    store
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
