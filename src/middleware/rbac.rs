// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::UserRole,
};

/// 1. O Trait que define quem pode passar
pub trait RoleDef: Send + Sync + 'static {
    fn allows(role: UserRole) -> bool;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        // A. Extrai Usuário (colocado pelo auth_guard)
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Confere o papel
        if !T::allows(user.0.role) {
            tracing::warn!("⛔ {} ({:?}) sem acesso à rota", user.0.email, user.0.role);
            return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

/// Gestão de usuários
pub struct AdminOnly;
impl RoleDef for AdminOnly {
    fn allows(role: UserRole) -> bool { role.is_admin() }
}

/// Kanban e tabela de cadastros
pub struct PipelineAccess;
impl RoleDef for PipelineAccess {
    fn allows(role: UserRole) -> bool { role.can_access_pipeline() }
}
