// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::i18n::Locale,
    models::auth::User,
};

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

// Sessão do token (`sid`), dona do store de cadastros
#[derive(Debug, Clone, Copy)]
pub struct SessionContext(pub Uuid);

// O middleware em si
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let locale = Locale::from_headers(request.headers());

    let Some(authorization) = request.headers().typed_get::<Authorization<Bearer>>() else {
        return AppError::InvalidToken
            .to_api_error(&locale, &app_state.i18n_store)
            .into_response();
    };

    match app_state.auth_service.validate_token(authorization.token()).await {
        Ok((user, claims)) => {
            // Insere o usuário e a sessão nos "extensions" da requisição
            request.extensions_mut().insert(AuthenticatedUser(user));
            request.extensions_mut().insert(SessionContext(claims.sid));
            next.run(request).await
        }
        Err(e) => e.to_api_error(&locale, &app_state.i18n_store).into_response(),
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .copied()
            .ok_or(AppError::InvalidToken)
    }
}
