// src/handlers/registrations.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::registration::{Registration, SubmitRegistrationPayload},
};

// POST /api/registrations (formulário público, sem login)
#[utoipa::path(
    post,
    path = "/api/registrations",
    tag = "Cadastro B2B",
    request_body = SubmitRegistrationPayload,
    responses(
        (status = 201, description = "Cadastro recebido e colocado no funil", body = Registration),
        (status = 400, description = "Campos inválidos (detalhes por campo)"),
        (status = 502, description = "Falha ao gravar; tente novamente")
    )
)]
pub async fn submit_registration(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SubmitRegistrationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = app_state
        .registration_service
        .submit(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(registration)))
}
