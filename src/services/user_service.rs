// src/services/user_service.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        validators::{format_cpf, format_phone},
    },
    db::UserRepository,
    models::auth::{CreateUserPayload, NewUser, UpdateUserPayload, User},
    services::auth::hash_password,
};

// Gestão de usuários (somente admin; a checagem de papel fica no handler)
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.repo.list_users().await.map_err(|e| {
            tracing::error!("🔥 Falha ao listar usuários: {}", e);
            AppError::CollaboratorFailure("list_users".into())
        })
    }

    pub async fn create(&self, payload: CreateUserPayload) -> Result<User, AppError> {
        payload.validate()?;

        let password_hash = hash_password(&payload.password).await?;
        let new_user = NewUser {
            full_name: payload.full_name.trim().to_string(),
            cpf: format_cpf(&payload.cpf),
            email: payload.email,
            whatsapp: payload.whatsapp.as_deref().map(format_phone),
            role: payload.role,
            password_hash,
        };

        let user = self.repo.create_user(&new_user).await.map_err(collaborator("create_user"))?;
        tracing::info!("👤 Usuário {} criado ({:?})", user.email, user.role);
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, mut payload: UpdateUserPayload) -> Result<User, AppError> {
        payload.validate()?;

        payload.full_name = payload.full_name.map(|n| n.trim().to_string());
        payload.cpf = payload.cpf.as_deref().map(format_cpf);
        payload.whatsapp = payload.whatsapp.as_deref().map(format_phone);

        self.repo.update_user(id, &payload).await.map_err(collaborator("update_user"))
    }

    /// Um admin não pode remover a própria conta.
    pub async fn delete(&self, id: Uuid, acting_user: Uuid) -> Result<(), AppError> {
        if id == acting_user {
            return Err(AppError::Forbidden);
        }
        self.repo.delete_user(id).await.map_err(collaborator("delete_user"))?;
        tracing::info!("🗑️ Usuário {} removido", id);
        Ok(())
    }
}

// Erros de domínio passam direto; o resto vira falha de colaborador
fn collaborator(operation: &'static str) -> impl Fn(AppError) -> AppError {
    move |e| match e {
        AppError::NotFound | AppError::EmailAlreadyExists => e,
        other => {
            tracing::error!("🔥 Falha em {}: {}", operation, other);
            AppError::CollaboratorFailure(operation.into())
        }
    }
}
